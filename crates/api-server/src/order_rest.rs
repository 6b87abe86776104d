//! Order management endpoints backing the admin order table.

use crate::error::ApiError;
use crate::rest::{AppState, ScopeQuery};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use dinehub_core::order::{OrderForm, OrderRecord, OrderStatus};
use serde::{Deserialize, Serialize};

/// GET /v1/orders — Orders for the selected store, newest first.
pub async fn handle_list_orders(
    State(state): State<AppState>,
    Query(query): Query<ScopeQuery>,
) -> Json<Vec<OrderRecord>> {
    let ctx = query.context();
    Json(state.orders.list_orders(&ctx.store, state.placeholder_name()))
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// POST /v1/orders — Create an order from the admin form.
pub async fn handle_create_order(
    State(state): State<AppState>,
    Json(form): Json<OrderForm>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    form.validate()?;
    let id = state.orders.create_order(&form, Utc::now());
    metrics::counter!("orders.api.created").increment(1);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// PATCH /v1/orders/:order_id/status — Move an order through its lifecycle.
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Result<StatusCode, ApiError> {
    state
        .orders
        .update_order_status(&order_id, update.status, Utc::now())?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/orders/:order_id
pub async fn handle_delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.orders.delete_order(&order_id)?;
    Ok(StatusCode::NO_CONTENT)
}
