use std::io::Error as IoError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Cannot resolve listen address '{0}'")]
    Unresolved(String),
    #[error("Invalid worker count '{0}': need a whole number of at least 1")]
    Workers(String),
}
