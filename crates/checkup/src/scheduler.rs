//! Interval scheduler and the worker pool that runs what it dispatches.
//!
//! The scheduler is a single task owning every countdown. It sleeps for the
//! smallest countdown, subtracts the time that actually passed from all of
//! them and queues every task that reached zero. The dispatch queue is
//! unbounded so a worker backlog never holds the loop. Workers pull from the
//! queue and push results to the persister. A check slower than its interval
//! may be queued again while a previous run is still in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::check::Check;
use crate::result::CheckResult;

/// One scheduled item and its countdown.
#[derive(Debug, Clone)]
pub struct Task<T> {
    item: T,
    repeat: Duration,
    left: Duration,
}

impl<T> Task<T> {
    pub fn new(item: T, repeat: Duration) -> Self {
        Self { item, repeat, left: repeat }
    }

    pub fn left(&self) -> Duration {
        self.left
    }
}

#[derive(Debug, Default)]
pub struct Scheduler<T> {
    tasks: Vec<Task<T>>,
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Schedule `item` every `repeat`, first firing after one full interval.
    pub fn add(&mut self, item: T, repeat: Duration) {
        self.tasks.push(Task::new(item, repeat));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task<T>] {
        &self.tasks
    }

    /// Smallest remaining countdown, `None` without tasks.
    pub fn next_wait(&self) -> Option<Duration> {
        self.tasks.iter().map(|task| task.left).min()
    }

    /// Advance every countdown by `elapsed` and return the items now due.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<T> {
        let mut due = Vec::new();
        for task in &mut self.tasks {
            task.left = task.left.saturating_sub(elapsed);
            if task.left.is_zero() {
                task.left = task.repeat;
                due.push(task.item.clone());
            }
        }
        due
    }
}

impl<T: Clone + Send + 'static> Scheduler<T> {
    /// Dispatch due items onto `queue` until every receiver is gone.
    ///
    /// Returns at once when there is nothing to schedule.
    pub async fn run(mut self, queue: mpsc::UnboundedSender<T>) {
        let Some(mut wait) = self.next_wait() else {
            info!("No checks to schedule");
            return;
        };

        loop {
            let slept_from = Instant::now();
            tokio::time::sleep(wait).await;
            let elapsed = slept_from.elapsed().max(wait);

            let due = self.tick(elapsed);
            debug!("Dispatching {} task(s) after {:?}", due.len(), elapsed);
            for item in due {
                if queue.send(item).is_err() {
                    debug!("Dispatch queue closed, stopping scheduler");
                    return;
                }
            }
            wait = match self.next_wait() {
                Some(next) => next,
                None => return,
            };
        }
    }
}

/// Start `workers` tasks running checks from `queue` on behalf of `from`.
pub fn spawn_workers(
    workers: usize,
    queue: mpsc::UnboundedReceiver<Arc<Check>>,
    from: String,
    results: mpsc::UnboundedSender<CheckResult>,
) -> Vec<JoinHandle<()>> {
    let queue = Arc::new(Mutex::new(queue));
    let from: Arc<str> = Arc::from(from);

    (0..workers)
        .map(|id| {
            let queue = queue.clone();
            let from = from.clone();
            let results = results.clone();
            tokio::spawn(async move {
                loop {
                    let next = queue.lock().await.recv().await;
                    let Some(check) = next else {
                        debug!("Worker {} stopping, dispatch queue closed", id);
                        return;
                    };
                    debug!("Worker {} running {}/{}", id, check.product, check.name());
                    let result = check.run(&from).await;
                    if results.send(result).is_err() {
                        debug!("Worker {} stopping, results channel closed", id);
                        return;
                    }
                }
            })
        })
        .collect()
}
