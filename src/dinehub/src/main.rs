//! dinehub — restaurant operations analytics backend.
//!
//! Main entry point that loads configuration, seeds the order store and
//! starts the HTTP API, or prints a one-off loyalty report.

use anyhow::Context;
use clap::Parser;
use dinehub_api::ApiServer;
use dinehub_core::config::AppConfig;
use dinehub_core::{RequestContext, StoreFilter};
use dinehub_loyalty::{InsightsService, RefreshOutcome};
use dinehub_store::{load_restaurants, JsonFileOrderStore, MemoryOrderStore, OrderSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "dinehub")]
#[command(about = "Restaurant operations analytics backend")]
#[command(version)]
struct Cli {
    /// TOML config file (environment variables still take precedence)
    #[arg(long, env = "DINEHUB_CONFIG")]
    config: Option<String>,

    /// Node identifier (overrides config)
    #[arg(long, env = "DINEHUB__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "DINEHUB__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// JSON order export to load (overrides config)
    #[arg(long, env = "DINEHUB__STORE__ORDERS_FILE")]
    orders_file: Option<String>,

    /// JSON export of the restaurants collection (overrides config)
    #[arg(long, env = "DINEHUB__STORE__RESTAURANTS_FILE")]
    restaurants_file: Option<String>,

    /// Print loyalty insights for the order export as JSON and exit
    #[arg(long, default_value_t = false)]
    report: bool,

    /// Restaurant id to scope the report to ("all" for every store)
    #[arg(long)]
    store: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dinehub=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = match AppConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => {
            return Err(e).context("failed to load config file");
        }
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }
    };

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(path) = cli.orders_file {
        config.store.orders_file = Some(path);
    }
    if let Some(path) = cli.restaurants_file {
        config.store.restaurants_file = Some(path);
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        orders_file = config.store.orders_file.as_deref().unwrap_or("-"),
        "Configuration loaded"
    );

    if cli.report {
        return print_report(&config, StoreFilter::parse(cli.store.as_deref())).await;
    }

    let orders = Arc::new(MemoryOrderStore::new());
    if let Some(path) = &config.store.orders_file {
        let docs = JsonFileOrderStore::new(path)
            .fetch_orders()
            .await
            .with_context(|| format!("failed to load orders from {path}"))?;
        info!(count = docs.len(), path = %path, "Order store seeded");
        for doc in docs {
            orders.insert(doc);
        }
    }
    if let Some(path) = &config.store.restaurants_file {
        let restaurants = load_restaurants(path)
            .await
            .with_context(|| format!("failed to load restaurants from {path}"))?;
        let count = orders.register_restaurants(restaurants);
        info!(count, path = %path, "Restaurant directory loaded");
    }

    let api_server = ApiServer::new(config.clone(), orders);

    if let Err(e) = api_server.start_metrics() {
        warn!(error = %e, "Failed to start metrics exporter");
    }

    info!("dinehub is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}

async fn print_report(config: &AppConfig, store: StoreFilter) -> anyhow::Result<()> {
    let path = config
        .store
        .orders_file
        .as_deref()
        .context("--report needs an orders file (--orders-file or DINEHUB__STORE__ORDERS_FILE)")?;
    let source: Arc<dyn OrderSource> = Arc::new(JsonFileOrderStore::new(path));
    let service = InsightsService::new(
        source,
        &config.loyalty,
        Duration::from_millis(config.store.fetch_timeout_ms),
    );

    match service.refresh(&RequestContext::for_store(store)).await {
        RefreshOutcome::Published(insights) => {
            println!("{}", serde_json::to_string_pretty(&insights)?);
            Ok(())
        }
        RefreshOutcome::Failed(e) => Err(e).context("loyalty report failed"),
        RefreshOutcome::Superseded { generation } => {
            anyhow::bail!("report refresh {generation} was superseded")
        }
    }
}
