use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::info;

use crate::check::{self, Check};
use crate::config::Config;
use crate::error::LoadError;
use crate::persist::{Persister, REMOTE_TIMEOUT};
use crate::result::CheckResult;
use crate::scheduler::{Scheduler, spawn_workers};

#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Name this agent reports as and looks up in `Agents`
    pub hostname: String,

    /// Number of check workers, at least one
    pub workers: usize,
}

/// A running agent: persister, scheduler and workers.
#[derive(Debug)]
pub struct Agent {
    persister: Persister,
    checks: Vec<Arc<Check>>,
    handles: Vec<JoinHandle<()>>,
}

impl Agent {
    /// Start everything configured for `settings.hostname`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &Config, settings: AgentSettings) -> Result<Self, LoadError> {
        let options = &config.agent(&settings.hostname)?.options;
        let checks = check::init_all(config.checks_for(&settings.hostname)?);

        let client = reqwest::Client::builder().timeout(REMOTE_TIMEOUT).build().map_err(LoadError::Fetch)?;
        let persister = Persister::start(options, client);

        let mut scheduler = Scheduler::new();
        for check in &checks {
            scheduler.add(check.clone(), check.interval);
        }

        let mut handles = Vec::new();
        if !scheduler.is_empty() {
            let (queue, queue_rx) = mpsc::unbounded_channel();
            let workers = settings.workers.max(1);
            handles.extend(spawn_workers(workers, queue_rx, settings.hostname.clone(), persister.results()));
            handles.push(tokio::spawn(scheduler.run(queue)));
            info!("Agent {} scheduled {} check(s) on {} worker(s)", settings.hostname, checks.len(), workers);
        } else {
            info!("Agent {} has no checks to run", settings.hostname);
        }

        Ok(Self { persister, checks, handles })
    }

    /// Sender feeding peer results into the incoming stage.
    pub fn incoming(&self) -> UnboundedSender<CheckResult> {
        self.persister.incoming()
    }

    pub fn checks(&self) -> &[Arc<Check>] {
        &self.checks
    }

    /// Scheduler and worker tasks, empty when nothing is scheduled.
    pub fn handles(&self) -> &[JoinHandle<()>] {
        &self.handles
    }
}
