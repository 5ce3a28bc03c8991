use airq_ledger::api::OpenWeatherMapClient;
use airq_ledger::config::Config;
use airq_ledger::db::{AirStore, SqliteStore};
use airq_ledger::router::{AirState, air_router};
use airq_ledger::service::{AggregationService, DeletionService, IngestionPipeline};
use airq_ledger::types::TimeRange;
use airq_ledger::types::cli::{Cli, Command};
use airq_ledger::AirError;
use clap::Parser;
use mimalloc::MiMalloc;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        base_url = %cfg.openweathermap_base_url,
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.loglevel,
    );

    match run(cli.command, cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, cfg: Config) -> Result<(), AirError> {
    let store: Arc<dyn AirStore> = Arc::new(
        SqliteStore::connect(&cfg.database_url, cfg.database_max_connections).await?,
    );
    let owm = Arc::new(OpenWeatherMapClient::new(&cfg)?);

    match command {
        Command::Sync { city, from, to } => {
            let range = TimeRange::new(from, to)?;
            let pipeline =
                IngestionPipeline::new(owm.clone(), owm, store, cfg.record_concurrency);
            let report = pipeline.sync(&city, range).await?;
            let totals = report.totals();
            info!(
                city = %report.city,
                range = %report.range,
                created = totals.created,
                existing = totals.existing,
                failed = totals.failed,
                failed_windows = report.failed_windows(),
                "successfully synced data to the database"
            );
        }
        Command::Delete { city } => {
            let report = DeletionService::new(owm, store).delete_city(&city).await?;
            info!(
                city = %city,
                records = report.records,
                "deleted all the records from the database"
            );
        }
        Command::Serve { listen } => {
            let aggregation = Arc::new(AggregationService::new(owm, store));
            let app = air_router(AirState::new(aggregation));

            let addr = listen.unwrap_or(cfg.listen_addr);
            let listener = TcpListener::bind(&addr).await?;
            info!("HTTP server listening on {}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
