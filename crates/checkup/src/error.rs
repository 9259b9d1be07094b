use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error;

use crate::jsonpath::PathError;

/// Invalid check configuration, detected once at tester init.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("need {0} field")]
    Missing(String),

    #[error("need {field} to be {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("unknown service {0}")]
    UnknownService(String),

    #[error("unknown test {0}")]
    UnknownTest(String),

    #[error("{test}: {source}")]
    InTest {
        test: String,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("invalid interval '{value}': {reason}")]
    Interval { value: String, reason: String },

    #[error("invalid URL '{url}': {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot change URL host to '{0}'")]
    HostOverride(String),

    #[error("invalid HTTP method '{0}'")]
    Method(String),

    #[error("invalid header '{0}'")]
    Header(String),

    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ConfigError {
    /// Attach the name of the test whose arguments were rejected.
    pub fn in_test(self, test: &str) -> Self {
        ConfigError::InTest { test: test.to_string(), source: Box::new(self) }
    }
}

/// Failure of the protocol action of one run.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("cannot fire check request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("cannot read check response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("cannot request JSON content: {0}")]
    Fetch(#[source] Box<ProbeError>),

    #[error("cannot unmarshal JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("cannot open connection: {0}")]
    Connect(String),

    #[error("cannot execute count query: {0}")]
    Query(String),

    #[error("cannot close connection: {0}")]
    Close(String),
}

/// Failure to hand a result to one remote collector.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("cannot marshal result: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("cannot PUT result to {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("PUT of result to {url}: server returned status {status}")]
    Status { url: String, status: u16 },
}

/// Failure to persist the status store. Fatal to the agent.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot marshal tests status: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("cannot write results JSON file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: IoError,
    },
}

/// Failure to obtain a usable configuration at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot GET from HTTP: {0}")]
    Fetch(#[source] reqwest::Error),

    #[error("cannot open file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: IoError,
    },

    #[error("cannot unmarshal checks: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot parse TOML checks: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("no configuration for host {0}")]
    UnknownHost(String),
}
