//! Agent configuration: which checks exist and which host runs which.
//!
//! The document has two top-level maps. `Products` names lists of checks;
//! `Agents` maps a hostname to the products it runs and to where it keeps
//! and sends results:
//!
//! ```json
//! {
//!   "Products": {"shop": [{"Name": "home", "Service": "http", "Interval": "30s", ...}]},
//!   "Agents": {"web-1": {"Checks": ["shop"], "Options": {"File": "/var/lib/checkup/status.json",
//!                                                      "Remotes": ["http://collector:8911"]}}}
//! }
//! ```

mod options;
mod source;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use options::{Options, parse_duration};
pub use source::load;

use crate::error::LoadError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    #[serde(default)]
    pub products: BTreeMap<String, Vec<CheckConfig>>,

    #[serde(default)]
    pub agents: BTreeMap<String, AgentConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentConfig {
    /// Product names this host runs
    #[serde(default)]
    pub checks: Vec<String>,

    #[serde(default)]
    pub options: AgentOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentOptions {
    /// Local status file; no persistence when absent
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Base URLs of the collectors every result is sent to
    #[serde(default)]
    pub remotes: Vec<String>,
}

/// A configured probe as written in the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckConfig {
    pub name: String,

    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub group: String,

    /// Selects the tester, e.g. `http` or `json`
    pub service: String,

    pub interval: String,

    /// Test name to test settings, iterated in name order
    #[serde(default)]
    pub tests: BTreeMap<String, TestInfo>,

    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestInfo {
    #[serde(default)]
    pub problem: String,

    #[serde(default)]
    pub suggestion: String,

    #[serde(default)]
    pub arguments: Options,
}

impl Config {
    pub fn agent(&self, hostname: &str) -> Result<&AgentConfig, LoadError> {
        self.agents.get(hostname).ok_or_else(|| LoadError::UnknownHost(hostname.to_string()))
    }

    /// The checks `hostname` runs, paired with their product name.
    pub fn checks_for(&self, hostname: &str) -> Result<Vec<(String, CheckConfig)>, LoadError> {
        let agent = self.agent(hostname)?;
        let mut checks = Vec::new();
        for product in &agent.checks {
            match self.products.get(product) {
                Some(list) => {
                    checks.extend(list.iter().map(|check| (product.clone(), check.clone())));
                }
                None => warn!("Agent {} lists unknown product {}, skipping", hostname, product),
            }
        }
        Ok(checks)
    }
}
