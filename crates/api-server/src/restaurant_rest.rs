//! Restaurant name directory used to label orders.

use crate::error::ApiError;
use crate::rest::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dinehub_store::Restaurant;
use serde::Deserialize;
use tracing::info;

/// GET /v1/restaurants
pub async fn handle_list_restaurants(State(state): State<AppState>) -> Json<Vec<Restaurant>> {
    Json(state.orders.restaurants())
}

#[derive(Debug, Deserialize)]
pub struct RestaurantBody {
    pub name: String,
}

/// PUT /v1/restaurants/:restaurant_id — Add or rename a restaurant.
pub async fn handle_put_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
    Json(body): Json<RestaurantBody>,
) -> Result<StatusCode, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }
    state.orders.register_restaurant(restaurant_id.as_str(), name);
    info!(restaurant_id = %restaurant_id, "Restaurant registered");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_rest::{handle_create_order, handle_list_orders};
    use crate::rest::ScopeQuery;
    use axum::extract::Query;
    use dinehub_core::order::{DeliveryMethod, OrderForm, OrderStatus};
    use dinehub_core::{AppConfig, OrderDocument};
    use dinehub_store::MemoryOrderStore;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_registered_name_labels_orders() {
        let store = Arc::new(MemoryOrderStore::with_documents(vec![OrderDocument::from_value(
            "legacy-1",
            json!({"restaurantId": "r-1", "customerName": "Lee"}),
        )]));
        let state = AppState::new(AppConfig::default(), store);

        let status = handle_put_restaurant(
            State(state.clone()),
            Path("r-1".to_string()),
            Json(RestaurantBody {
                name: " Riverside ".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let form = OrderForm {
            restaurant_id: "r-1".into(),
            customer_name: "Kim".into(),
            phone: "010-1".into(),
            total_price: "9000".into(),
            delivery_method: DeliveryMethod::Pickup,
            notes: String::new(),
            status: OrderStatus::Pending,
        };
        handle_create_order(State(state.clone()), Json(form)).await.unwrap();

        let Json(orders) =
            handle_list_orders(State(state.clone()), Query(ScopeQuery::default())).await;
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.restaurant_name == "Riverside"));

        let Json(restaurants) = handle_list_restaurants(State(state)).await;
        assert_eq!(
            restaurants,
            vec![Restaurant {
                id: "r-1".into(),
                name: "Riverside".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryOrderStore::new()));
        let err = handle_put_restaurant(
            State(state),
            Path("r-1".to_string()),
            Json(RestaurantBody { name: "  ".into() }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
