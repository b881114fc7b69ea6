//! archivo CLI
//!
//! Runs the statistics and listing views of the archive from the terminal,
//! against a local data directory or the hosted backend.

use std::path::PathBuf;
use std::sync::Arc;

use archivo::{
    config::load_config,
    error::Result,
    models::{Config, Page},
    services::{ReportOutput, RoleGatedLoader, ViewOutcome, ViewService},
    storage::{DataStore, LocalStore, SessionProvider, StaticSession, TableRoleLookup},
};
use clap::{Parser, Subcommand};
use serde::Serialize;

/// archivo - editorial archive reports
#[derive(Parser, Debug)]
#[command(
    name = "archivo",
    version,
    about = "Statistics and listings of the editorial archive"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Directory holding one JSON file per table (local mode)
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Use the hosted backend configured in [store]
    #[arg(long)]
    remote: bool,

    /// Signed-in user id (local mode); omit to act signed out
    #[arg(short, long)]
    user: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute a statistics report
    Report {
        name: String,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one page of a listing
    List {
        name: String,

        /// Page number (clamped to the last page)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Search term matched against the listing's search fields
        #[arg(short, long)]
        search: Option<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// List configured reports and listings
    Reports,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Wire session, role lookup and store for the selected mode.
fn build_service(cli: &Cli, config: Arc<Config>) -> Result<ViewService> {
    let (sessions, store): (Arc<dyn SessionProvider>, Arc<dyn DataStore>) = if cli.remote {
        remote_backend(&config)?
    } else {
        log::info!("Using local data directory {}", cli.data_dir.display());
        let sessions: Arc<dyn SessionProvider> = match &cli.user {
            Some(id) => Arc::new(StaticSession::user(id.as_str())),
            None => Arc::new(StaticSession::anonymous()),
        };
        let store: Arc<dyn DataStore> = Arc::new(LocalStore::new(&cli.data_dir));
        (sessions, store)
    };

    let roles = TableRoleLookup::from_config(Arc::clone(&store), &config.store);
    let loader = RoleGatedLoader::new(sessions, Arc::new(roles));
    Ok(ViewService::new(config, loader, store))
}

#[cfg(feature = "rest")]
fn remote_backend(config: &Config) -> Result<(Arc<dyn SessionProvider>, Arc<dyn DataStore>)> {
    let rest = Arc::new(archivo::storage::RestStore::from_config(&config.store)?);
    log::info!("Using hosted backend");
    let sessions: Arc<dyn SessionProvider> = rest.clone();
    let store: Arc<dyn DataStore> = rest;
    Ok((sessions, store))
}

#[cfg(not(feature = "rest"))]
fn remote_backend(_config: &Config) -> Result<(Arc<dyn SessionProvider>, Arc<dyn DataStore>)> {
    Err(archivo::error::AppError::config(
        "built without the 'rest' feature",
    ))
}

/// Print an outcome as JSON, or its data via `render`, or its message.
fn emit<T: Serialize>(
    outcome: &ViewOutcome<T>,
    json: bool,
    render: impl Fn(&T) -> Result<()>,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }
    match outcome {
        ViewOutcome::Ready(data) => render(data),
        other => {
            println!("{}", other.message().unwrap_or_default());
            Ok(())
        }
    }
}

fn render_report(output: &ReportOutput) -> Result<()> {
    match output {
        ReportOutput::Frequency { rows } => {
            for row in rows {
                println!("{:<32} {:>6}", row.label, row.count);
            }
        }
        ReportOutput::CrossTab(tab) => {
            println!("{:<12} {}", "", tab.columns.join("\t"));
            for row in &tab.rows {
                let counts: Vec<String> = row.counts.iter().map(|c| c.to_string()).collect();
                println!("{:<12} {}", row.label, counts.join("\t"));
            }
        }
    }
    Ok(())
}

fn render_page(page: &Page) -> Result<()> {
    println!(
        "Página {} de {} ({})",
        page.page_number,
        page.total_pages,
        page.range_label()
    );
    for record in &page.items {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Arc::new(load_config(&cli.config)?);
    log::debug!("Loaded configuration from {}", cli.config.display());

    match &cli.command {
        Command::Report { name, json } => {
            let service = build_service(&cli, Arc::clone(&config))?;
            let result = service.run_report(name).await;

            if let Ok(run) = &result {
                log::info!("{} ({} source rows)", run.title, run.source_rows);
            }
            let outcome = ViewOutcome::from_result(
                result.map(|run| run.output),
                &config.messages,
                ReportOutput::is_empty,
            );
            emit(&outcome, *json, render_report)?;
        }

        Command::List {
            name,
            page,
            search,
            json,
        } => {
            let service = build_service(&cli, Arc::clone(&config))?;
            let result = service.open_listing(name).await.map(|mut listing| {
                if let Some(term) = search {
                    listing.set_filter(term);
                }
                listing.go_to(*page)
            });

            let outcome = ViewOutcome::from_result(result, &config.messages, Page::is_empty);
            emit(&outcome, *json, render_page)?;
        }

        Command::Reports => {
            for report in &config.reports {
                println!(
                    "report   {:<24} {} [{}]",
                    report.name,
                    report.title,
                    report.roles.join(", ")
                );
            }
            for listing in &config.listings {
                println!("listing  {:<24} [{}]", listing.name, listing.roles.join(", "));
            }
        }

        Command::Validate => {
            // load_config already validated
            log::info!(
                "✓ Config OK ({} reports, {} listings)",
                config.reports.len(),
                config.listings.len()
            );
        }
    }

    Ok(())
}
