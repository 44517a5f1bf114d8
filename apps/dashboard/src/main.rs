use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use client_core::{CachingDataSource, DataSource, HttpDataSource, ViewCoordinator};
use shared::domain::TransactionId;
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, DashboardSettings};
use render::{render_employees, render_view};

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "Browse and approve ledger transactions")]
struct Cli {
    /// Overrides the configured server url.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, default_value = "dashboard.toml")]
    config: PathBuf,
    /// Sends every request to the server.
    #[arg(long)]
    no_cache: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Lists transactions for all employees or for one of them.
    List {
        #[arg(long)]
        employee: Option<String>,
        /// Pages to load when no employee filter is set.
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Lists the entries of the employee filter.
    Employees,
    /// Sets the approval flag of one transaction.
    Approve {
        transaction_id: String,
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        value: bool,
        #[arg(long)]
        employee: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli);
    info!(server_url = %settings.server_url, cache = settings.use_response_cache, "dashboard starting");

    let coordinator = ViewCoordinator::new(build_source(&settings)?);
    let event_log = spawn_event_log(&coordinator);
    let output = run(&coordinator, cli.command).await;
    event_log.abort();

    print!("{}", output?);
    if let Some(error) = coordinator.error() {
        bail!("dashboard request failed: {error}");
    }
    Ok(())
}

fn resolve_settings(cli: &Cli) -> DashboardSettings {
    let mut settings = load_settings(&cli.config);
    if let Some(server_url) = &cli.server_url {
        settings.server_url = server_url.clone();
    }
    if cli.no_cache {
        settings.use_response_cache = false;
    }
    settings
}

fn build_source(settings: &DashboardSettings) -> anyhow::Result<Arc<dyn DataSource>> {
    let http = HttpDataSource::new(&settings.server_url).context("failed to configure server url")?;
    if settings.use_response_cache {
        Ok(Arc::new(CachingDataSource::new(http)))
    } else {
        Ok(Arc::new(http))
    }
}

fn spawn_event_log(coordinator: &ViewCoordinator) -> JoinHandle<()> {
    let mut events = coordinator.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!(?event, "dashboard event"),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "dashboard events dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Drives the coordinator through one command and renders the result.
async fn run(coordinator: &ViewCoordinator, command: Command) -> anyhow::Result<String> {
    coordinator.on_page_load().await;

    match command {
        Command::Employees => Ok(render_employees(&coordinator.employee_options())),
        Command::List { employee, pages } => {
            select_employee(coordinator, employee.as_deref()).await?;
            for _ in 1..pages {
                if !coordinator.show_load_more() {
                    break;
                }
                coordinator.load_more().await;
            }
            Ok(render_view(&coordinator.view()))
        }
        Command::Approve {
            transaction_id,
            value,
            employee,
        } => {
            select_employee(coordinator, employee.as_deref()).await?;
            coordinator
                .set_transaction_approval(&TransactionId::from(transaction_id.as_str()), value)
                .await;
            Ok(render_view(&coordinator.view()))
        }
    }
}

async fn select_employee(
    coordinator: &ViewCoordinator,
    employee_id: Option<&str>,
) -> anyhow::Result<()> {
    let Some(employee_id) = employee_id else {
        return Ok(());
    };

    let options = coordinator.employee_options();
    if options.is_empty() {
        let reason = coordinator
            .error()
            .unwrap_or_else(|| "not loaded".to_string());
        bail!("employee list unavailable: {reason}");
    }
    let employee = options
        .into_iter()
        .find(|employee| !employee.is_empty_sentinel() && employee.id.as_str() == employee_id)
        .with_context(|| format!("unknown employee '{employee_id}'"))?;

    coordinator.select_employee(Some(&employee)).await;
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
