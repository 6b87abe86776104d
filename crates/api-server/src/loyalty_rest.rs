//! Dashboard analytics endpoints: loyalty insights, order stats, content.

use crate::error::ApiError;
use crate::rest::{AppState, ScopeQuery};
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use dinehub_core::loyalty::LoyaltyInsights;
use dinehub_core::Order;
use dinehub_loyalty::{InsightsView, RefreshOutcome};
use dinehub_reporting::{order_stats, DashboardContent, OrderStats};
use dinehub_store::fetch_with_timeout;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// GET /v1/loyalty/insights — Recompute loyalty insights for the selected store.
pub async fn handle_insights(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<LoyaltyInsights>, ApiError> {
    metrics::counter!("loyalty.api.insights").increment(1);
    match state.insights.refresh(&query.context()).await {
        RefreshOutcome::Published(insights) => Ok(Json(insights)),
        RefreshOutcome::Failed(e) => Err(e.into()),
        RefreshOutcome::Superseded { .. } => Err(ApiError::Superseded),
    }
}

/// GET /v1/loyalty/view — The caller's last published insights state, without refreshing.
pub async fn handle_insights_view(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Json<InsightsView> {
    Json(state.insights.view_for(&query.context()))
}

/// GET /v1/orders/stats — Daily order counts and revenue.
pub async fn handle_order_stats(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<OrderStats>, ApiError> {
    let ctx = query.context();
    let docs = fetch_with_timeout(state.orders.as_ref(), state.fetch_timeout()).await?;
    let orders = Order::normalize_all(&docs, state.placeholder_name());
    Ok(Json(order_stats(&orders, &ctx.store, Utc::now())))
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    pub content: DashboardContent,
    /// Set when the content document could not be read; defaults are served.
    pub is_error: bool,
}

/// GET /v1/dashboard/content — Menu highlights and partner stores.
pub async fn handle_dashboard_content(
    State(state): State<AppState>,
    Query(query): Query<ContentQuery>,
) -> Json<ContentResponse> {
    let (document, is_error) = match &state.config.store.content_file {
        None => (None, false),
        Some(path) => match load_content(path).await {
            Ok(doc) => (doc, false),
            Err(e) => {
                warn!(path = %path, error = %e, "Dashboard content unavailable, serving defaults");
                (None, true)
            }
        },
    };

    let mut content = DashboardContent::sanitize(document.as_ref());
    if let (Some(lat), Some(lng)) = (query.lat, query.lng) {
        content.partner_stores = content
            .partner_stores
            .into_iter()
            .map(|store| store.with_distance_from((lat, lng)))
            .collect();
    }
    Json(ContentResponse { content, is_error })
}

/// Missing file is not an error: it means no content has been published yet.
async fn load_content(path: &str) -> anyhow::Result<Option<Value>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
