//! In-process order collection backed by DashMap.

use crate::error::{StoreError, StoreResult};
use crate::source::OrderSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dinehub_core::order::{timestamp_value, OrderForm, OrderRecord, OrderStatus};
use dinehub_core::{OrderDocument, StoreFilter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// Entry in the restaurant name directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
}

/// Concurrent in-memory order collection plus a restaurant name directory.
pub struct MemoryOrderStore {
    orders: DashMap<String, OrderDocument>,
    restaurants: DashMap<String, String>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            restaurants: DashMap::new(),
        }
    }

    pub fn with_documents(docs: impl IntoIterator<Item = OrderDocument>) -> Self {
        let store = Self::new();
        for doc in docs {
            store.insert(doc);
        }
        store
    }

    /// Insert or replace a raw document.
    pub fn insert(&self, doc: OrderDocument) {
        self.orders.insert(doc.id.clone(), doc);
    }

    /// Add or rename a restaurant. Orders created or listed afterwards pick up the name.
    pub fn register_restaurant(&self, id: impl Into<String>, name: impl Into<String>) {
        self.restaurants.insert(id.into(), name.into());
    }

    pub fn register_restaurants(&self, restaurants: impl IntoIterator<Item = Restaurant>) -> usize {
        let mut count = 0;
        for restaurant in restaurants {
            self.register_restaurant(restaurant.id, restaurant.name);
            count += 1;
        }
        count
    }

    /// Restaurant directory ordered by id.
    pub fn restaurants(&self) -> Vec<Restaurant> {
        let mut list: Vec<Restaurant> = self
            .restaurants
            .iter()
            .map(|e| Restaurant {
                id: e.key().clone(),
                name: e.value().clone(),
            })
            .collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Create an order from the admin form, stamped with `now`. Returns the new id.
    pub fn create_order(&self, form: &OrderForm, now: DateTime<Utc>) -> String {
        let id = Uuid::new_v4().to_string();
        let mut fields = form.to_fields(now);
        if let Some(name) = self.restaurants.get(&form.restaurant_id) {
            fields.insert("restaurantName".into(), Value::from(name.value().clone()));
        }
        self.orders.insert(id.clone(), OrderDocument::new(id.clone(), fields));

        metrics::counter!("store.orders_created").increment(1);
        info!(order_id = %id, restaurant_id = %form.restaurant_id, "Order created");
        id
    }

    pub fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut doc = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| StoreError::NotFound(order_id.to_string()))?;
        let status = serde_json::to_value(status)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        doc.fields.insert("status".into(), status);
        doc.fields.insert("updatedAt".into(), timestamp_value(now));
        debug!(order_id, "Order status updated");
        Ok(())
    }

    pub fn delete_order(&self, order_id: &str) -> StoreResult<()> {
        self.orders
            .remove(order_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(order_id.to_string()))
    }

    /// Orders for the admin table, newest first. A restaurant filter matches exactly.
    pub fn list_orders(&self, filter: &StoreFilter, placeholder_name: &str) -> Vec<OrderRecord> {
        let mut records: Vec<OrderRecord> = self
            .orders
            .iter()
            .filter(|entry| match filter.restaurant_id() {
                None => true,
                Some(wanted) => entry.value().str_field("restaurantId") == Some(wanted),
            })
            .map(|entry| {
                let mut record = OrderRecord::from_document(entry.value(), placeholder_name);
                if record.restaurant_name.is_empty() {
                    if let Some(id) = &record.restaurant_id {
                        if let Some(name) = self.restaurants.get(id) {
                            record.restaurant_name = name.value().clone();
                        }
                    }
                }
                record
            })
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        records
    }
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderSource for MemoryOrderStore {
    /// Snapshot ordered by document id, like a collection read.
    async fn fetch_orders(&self) -> StoreResult<Vec<OrderDocument>> {
        let mut docs: Vec<OrderDocument> = self.orders.iter().map(|e| e.value().clone()).collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
