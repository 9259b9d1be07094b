#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;

use actix_web::{App, HttpServer};
use anyhow::Context;
use clap::Parser;
use checkup::{Agent, AgentSettings, CheckResult, api};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

mod cli;
mod error;

use cli::Cli;
use error::AppError;
use logger::init_tracing;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    let hostname = cli.hostname();
    let config = checkup::config::load(&cli.config)
        .await
        .with_context(|| format!("cannot load configuration from {}", cli.config))?;

    let agent = Agent::start(&config, AgentSettings { hostname: hostname.clone(), workers: cli.workers })
        .with_context(|| format!("cannot start agent {hostname}"))?;

    info!("Agent {} serving results on {}", hostname, cli.listen);
    run_server(cli.listen, agent.incoming()).await?;
    Ok(())
}

async fn run_server(addr: SocketAddr, incoming: UnboundedSender<CheckResult>) -> Result<(), AppError> {
    let incoming = api::incoming(incoming);
    HttpServer::new(move || App::new().app_data(incoming.clone()).configure(api::routes))
        .bind(addr)?
        .run()
        .await?;

    Ok(())
}
