use std::net::{SocketAddr, ToSocketAddrs};

use clap::{ArgAction, Parser};
use tracing::level_filters::LevelFilter;

use crate::error::AppError;

/// Run scheduled checks for this host and serve the results endpoint.
#[derive(Parser, Debug)]
#[command(name = "checkup-agent", version, about, long_about = None)]
pub struct Cli {
    /// Configuration source: a path, a file:// URL or an http(s):// URL
    #[arg(value_name = "CONFIG")]
    pub config: String,

    /// Address of the results endpoint; `:port` listens on all interfaces
    #[arg(short, long, default_value = checkup::DEFAULT_LISTEN, value_parser = listen_addr)]
    pub listen: SocketAddr,

    /// Number of parallel check workers
    #[arg(short, long, default_value_t = checkup::DEFAULT_WORKERS, value_parser = worker_count)]
    pub workers: usize,

    /// Name to look up in the Agents section, defaults to the machine hostname
    #[arg(long)]
    pub hostname: Option<String>,

    /// More output, repeat for trace
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    pub fn hostname(&self) -> String {
        match &self.hostname {
            Some(name) => name.clone(),
            None => gethostname::gethostname().to_string_lossy().into_owned(),
        }
    }
}

/// Parse a listen address. A bare `:port` binds every interface.
pub fn listen_addr(value: &str) -> Result<SocketAddr, AppError> {
    if let Some(port) = value.strip_prefix(':') {
        return Ok(format!("0.0.0.0:{port}").parse()?);
    }
    if let Ok(addr) = value.parse() {
        return Ok(addr);
    }
    value
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| AppError::Unresolved(value.to_string()))
}

fn worker_count(value: &str) -> Result<usize, AppError> {
    match value.parse::<usize>() {
        Ok(count) if count >= 1 => Ok(count),
        _ => Err(AppError::Workers(value.to_string())),
    }
}
