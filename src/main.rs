mod agent;
mod backend;
mod cli;
mod config;
mod error;
mod printer;
mod state_machine;
mod store;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use agent::{Agent, TickRun, log_tick};
use backend::BackendClient;
use cli::{Cli, Command};
use config::AgentConfig;
use printer::DuetClient;
use store::{JsonFileStore, StateStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let config = AgentConfig::load(cli.config.as_deref())?;
    let store = JsonFileStore::new(&config.state_file);

    match cli.command_or_default() {
        Command::Status => {
            let record = store.read_record()?;
            ui::print_status(record.as_ref());
        }
        Command::Reset => {
            let previous = store.load()?;
            store.save(state_machine::AgentState::Busy)?;
            ui::print_reset(previous);
        }
        Command::Tick => {
            let agent = build_agent(&config, store)?;
            match agent.try_tick().await {
                TickRun::Finished(result) => log_tick(&result),
                TickRun::Skipped => tracing::warn!("tick skipped"),
            }
        }
        Command::Run => {
            tracing::info!(
                printer = %config.printer_ip,
                backend = %config.backend_url,
                interval_ms = config.poll_interval_ms,
                state_file = %store.path().display(),
                "duet job agent started"
            );
            let agent = Arc::new(build_agent(&config, store)?);
            agent
                .run(config.poll_interval(), async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "failed to listen for ctrl-c");
                        std::future::pending::<()>().await;
                    }
                })
                .await;
        }
    }

    Ok(())
}

fn build_agent(
    config: &AgentConfig,
    store: JsonFileStore,
) -> Result<Agent<DuetClient, BackendClient, JsonFileStore>> {
    config.validate()?;
    let timeout = config.request_timeout();
    let printer = DuetClient::new(&config.printer_ip, timeout).context("building printer client")?;
    let backend = BackendClient::new(&config.backend_url, &config.printer_ip, timeout)
        .context("building backend client")?;
    Ok(Agent::new(printer, backend, store, timeout))
}
