//! checkup - scheduled protocol probes for a fleet of peer agents
//!
//! Every agent runs the checks configured for its hostname, evaluates the
//! sub-tests of each check and pushes the outcome to its remote collectors
//! before merging it into a local status file. Collectors receive peer
//! results on the same endpoint and feed them through the same merge path.

pub mod agent;
pub mod api;
pub mod check;
pub mod config;
pub mod error;
pub mod jsonpath;
pub mod persist;
pub mod result;
pub mod scheduler;
pub mod tester;

// Re-export main types
pub use agent::{Agent, AgentSettings};
pub use check::Check;
pub use config::{AgentOptions, CheckConfig, Config, TestInfo};
pub use error::{ConfigError, DeliveryError, LoadError, PersistError, ProbeError};
pub use persist::{Persister, StatusStore};
pub use result::{CheckResult, TestResult};

/// Path of the receive endpoint, served locally and called on every remote.
pub const RESULTS_PATH: &str = "/api/v0/results";

/// Default listen address of the receive endpoint.
pub const DEFAULT_LISTEN: &str = ":8911";

/// Default size of the check worker pool.
pub const DEFAULT_WORKERS: usize = 4;
