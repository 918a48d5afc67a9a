mod cli;
mod config;
mod datasources;
mod error;
mod logic;
mod models;
mod report;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use datasources::StoreClient;
use logic::{CycleOutcome, RainfallSyncService, RefreshSchedule};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

type Service = RainfallSyncService<StoreClient>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // RUST_LOG wins over -v; logs go to stderr so stdout stays parseable
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or_default();

    if let Commands::Init = command {
        Config::setup_interactive()?;
        return Ok(());
    }

    let config = match Config::load(cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Run `rainfall-dash init` or copy config/config.yaml.example to config/config.yaml");
            std::process::exit(1);
        }
    };

    if let Commands::Check = command {
        return run_check(&config).await;
    }

    let store = StoreClient::connect(&config)
        .await
        .context("Failed to connect to the observation store")?;
    let service = Arc::new(RainfallSyncService::new(Arc::new(store), &config));

    match command {
        Commands::Report { year, json } => run_report(&service, &config, year, json).await,
        Commands::Years => run_years(&service).await,
        Commands::Watch { year, json } => run_watch(service, &config, year, json).await,
        Commands::Check | Commands::Init => Ok(()),
    }
}

/// Discover years, then run one cycle for `year` or the default selection
async fn load(service: &Service, year: Option<i32>) -> error::Result<CycleOutcome> {
    service.discover_years().await?;
    match year {
        Some(y) => service.select_year(y).await,
        None => service.refresh().await,
    }
}

async fn print_state(service: &Service, config: &Config, json: bool) -> anyhow::Result<()> {
    let state = service.snapshot().await;
    if json {
        println!("{}", serde_json::to_string(&state)?);
    } else {
        print!("{}", report::render_table(&config.station.name, &state));
    }
    Ok(())
}

async fn run_report(
    service: &Service,
    config: &Config,
    year: Option<i32>,
    json: bool,
) -> anyhow::Result<()> {
    let result = load(service, year).await;

    if json {
        let stats = service.snapshot().await.stats;
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!(
            "{}",
            report::render_table(&config.station.name, &service.snapshot().await)
        );
    }

    result.map(|_| ()).context("Fetch cycle failed")
}

async fn run_years(service: &Service) -> anyhow::Result<()> {
    service.discover_years().await?;
    let state = service.snapshot().await;

    if state.available_years.is_empty() {
        println!("No years with data");
    }
    for year in &state.available_years {
        let marker = if Some(*year) == state.selected_year {
            " (default)"
        } else {
            ""
        };
        println!("{}{}", year, marker);
    }
    Ok(())
}

async fn run_watch(
    service: Arc<Service>,
    config: &Config,
    year: Option<i32>,
    json: bool,
) -> anyhow::Result<()> {
    let mut updates = service.subscribe();

    if let Err(e) = load(&service, year).await {
        tracing::warn!("Initial load failed: {}", e);
    }
    updates.borrow_and_update();
    print_state(&service, config, json).await?;

    let mut schedule = RefreshSchedule::start(Arc::clone(&service), config.refresh.interval());

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                updates.borrow_and_update();
                print_state(&service, config, json).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    schedule.stop();
    Ok(())
}

async fn run_check(config: &Config) -> anyhow::Result<()> {
    println!("Config: OK ({:?} backend, table {})", config.store.backend, config.store.table);

    let store = match StoreClient::connect(config).await {
        Ok(store) => store,
        Err(e) => {
            println!("Store: OFFLINE ({})", e);
            return Ok(());
        }
    };

    let service = RainfallSyncService::new(Arc::new(store), config);
    if service.check_connection().await {
        println!("Store: OK");
    } else {
        println!("Store: OFFLINE");
    }
    Ok(())
}
