//! API server — HTTP REST endpoints plus the Prometheus exporter.

use crate::rest::{self, AppState};
use crate::{geo_proxy, loyalty_rest, order_rest, restaurant_rest};
use axum::routing::{delete, get, patch, put};
use axum::Router;
use dinehub_core::config::AppConfig;
use dinehub_store::MemoryOrderStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Main API server for the admin dashboard.
pub struct ApiServer {
    config: AppConfig,
    orders: Arc<MemoryOrderStore>,
}

impl ApiServer {
    pub fn new(config: AppConfig, orders: Arc<MemoryOrderStore>) -> Self {
        Self { config, orders }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let state = AppState::new(self.config.clone(), self.orders.clone());

        Router::new()
            // Loyalty and reporting
            .route("/v1/loyalty/insights", get(loyalty_rest::handle_insights))
            .route("/v1/loyalty/view", get(loyalty_rest::handle_insights_view))
            .route("/v1/orders/stats", get(loyalty_rest::handle_order_stats))
            .route("/v1/dashboard/content", get(loyalty_rest::handle_dashboard_content))
            // Order management
            .route(
                "/v1/orders",
                get(order_rest::handle_list_orders).post(order_rest::handle_create_order),
            )
            .route(
                "/v1/orders/:order_id/status",
                patch(order_rest::handle_update_status),
            )
            .route("/v1/orders/:order_id", delete(order_rest::handle_delete_order))
            // Restaurant directory
            .route("/v1/restaurants", get(restaurant_rest::handle_list_restaurants))
            .route(
                "/v1/restaurants/:restaurant_id",
                put(restaurant_rest::handle_put_restaurant),
            )
            // Map and search proxy
            .route("/v1/geo/geocode", get(geo_proxy::handle_geocode))
            .route("/v1/geo/reverse-geocode", get(geo_proxy::handle_reverse_geocode))
            .route("/v1/geo/directions", get(geo_proxy::handle_directions))
            .route("/v1/geo/search/local", get(geo_proxy::handle_local_search))
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = self.router();

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        if !self.config.metrics.enabled {
            info!("Metrics exporter disabled");
            return Ok(());
        }

        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
