//! Two-stage result pipeline.
//!
//! Results produced locally first go to every remote collector, then into
//! the incoming stage. Results received from peers enter the incoming stage
//! directly. The incoming stage owns the [`StatusStore`] and rewrites the
//! status file after every update. A failed write stops the process.

mod atomic;
mod remote;
mod status;

use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, error, info, warn};

pub use atomic::write_file_atomic;
pub use remote::{REMOTE_TIMEOUT, RemoteFanout};
pub use status::StatusStore;

use crate::config::AgentOptions;
use crate::error::PersistError;
use crate::result::CheckResult;

/// Entry points of the pipeline. Both stages stop once every sender is gone.
#[derive(Debug, Clone)]
pub struct Persister {
    results: UnboundedSender<CheckResult>,
    incoming: UnboundedSender<CheckResult>,
}

impl Persister {
    /// Spawn both stages with the status file and remotes of `options`.
    pub fn start(options: &AgentOptions, client: Client) -> Self {
        let (results, results_rx) = unbounded_channel();
        let (incoming, incoming_rx) = unbounded_channel();

        let fanout = RemoteFanout::new(client, &options.remotes);
        info!(
            "Starting persister: file {}, {} remote(s)",
            options.file.as_deref().map_or("<none>".into(), |p| p.display().to_string()),
            fanout.endpoints().len()
        );

        tokio::spawn(forward_results(results_rx, fanout, incoming.clone()));
        tokio::spawn(store_incoming(incoming_rx, options.file.clone()));

        Self { results, incoming }
    }

    /// Sender for results produced by local checks.
    pub fn results(&self) -> UnboundedSender<CheckResult> {
        self.results.clone()
    }

    /// Sender for results received from peers.
    pub fn incoming(&self) -> UnboundedSender<CheckResult> {
        self.incoming.clone()
    }
}

async fn forward_results(
    mut results: UnboundedReceiver<CheckResult>,
    fanout: RemoteFanout,
    incoming: UnboundedSender<CheckResult>,
) {
    while let Some(result) = results.recv().await {
        for failure in fanout.deliver(&result).await {
            warn!("{}", failure);
        }
        if incoming.send(result).is_err() {
            debug!("Incoming stage gone, stopping results stage");
            return;
        }
    }
}

async fn store_incoming(mut incoming: UnboundedReceiver<CheckResult>, file: Option<PathBuf>) {
    let Some(path) = file else {
        while incoming.recv().await.is_some() {}
        return;
    };

    let mut store = StatusStore::new();
    while let Some(result) = incoming.recv().await {
        debug!("Storing result of {}/{}/{} from {}", result.host, result.product, result.group, result.from);
        if let Err(e) = save(&mut store, &path, result).await {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Merge `result` into `store` and rewrite the status file at `path`.
pub async fn save(store: &mut StatusStore, path: &Path, result: CheckResult) -> Result<(), PersistError> {
    store.record(result);
    let body = serde_json::to_vec(store).map_err(PersistError::Encode)?;

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_file_atomic(&target, &body))
        .await
        .map_err(|e| PersistError::Write { path: path.to_path_buf(), source: e.into() })?
}
