//! Collections read from JSON exports on disk.
//!
//! Two layouts are accepted: an array of documents carrying an `id` field,
//! or an object keyed by document id.

use crate::error::{StoreError, StoreResult};
use crate::memory::Restaurant;
use crate::source::OrderSource;
use async_trait::async_trait;
use dinehub_core::OrderDocument;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct JsonFileOrderStore {
    path: PathBuf,
}

impl JsonFileOrderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Split a JSON export into documents.
pub fn parse_export(raw: &str) -> StoreResult<Vec<OrderDocument>> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| StoreError::Malformed(e.to_string()))?;

    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                let id = item
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("order-{idx}"));
                let mut doc = OrderDocument::from_value(id, item);
                doc.fields.remove("id");
                doc
            })
            .collect()),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(id, item)| OrderDocument::from_value(id, item))
            .collect()),
        other => Err(StoreError::Malformed(format!(
            "expected an array or object of orders, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Restaurant directory from an export of the restaurants collection.
/// Documents without a non-empty `name` are skipped.
pub fn parse_restaurants(raw: &str) -> StoreResult<Vec<Restaurant>> {
    let docs = parse_export(raw)?;
    let total = docs.len();
    let restaurants: Vec<Restaurant> = docs
        .iter()
        .filter_map(|doc| {
            doc.trimmed_field("name").map(|name| Restaurant {
                id: doc.id.clone(),
                name: name.to_string(),
            })
        })
        .collect();
    if restaurants.len() < total {
        warn!(skipped = total - restaurants.len(), "Restaurants without a name ignored");
    }
    Ok(restaurants)
}

pub async fn load_restaurants(path: impl AsRef<Path>) -> StoreResult<Vec<Restaurant>> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?;
    parse_restaurants(&raw)
}

#[async_trait]
impl OrderSource for JsonFileOrderStore {
    async fn fetch_orders(&self) -> StoreResult<Vec<OrderDocument>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            StoreError::Unavailable(format!("{}: {}", self.path.display(), e))
        })?;
        let docs = parse_export(&raw)?;
        debug!(path = %self.path.display(), count = docs.len(), "Order export loaded");
        Ok(docs)
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array_export() {
        let docs = parse_export(
            r#"[{"id": "a1", "phone": "010"}, {"customerName": "Kim"}]"#,
        )
        .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "a1");
        assert!(docs[0].get("id").is_none());
        assert_eq!(docs[1].id, "order-1");
    }

    #[test]
    fn test_parse_keyed_export() {
        let docs = parse_export(r#"{"x1": {"phone": "010"}, "x2": 5}"#).unwrap();
        assert_eq!(docs.len(), 2);
        let x2 = docs.iter().find(|d| d.id == "x2").unwrap();
        assert!(x2.fields.is_empty());
    }

    #[test]
    fn test_parse_rejects_scalars() {
        assert!(matches!(parse_export("42"), Err(StoreError::Malformed(_))));
        assert!(matches!(parse_export("{not json"), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_parse_restaurants() {
        let restaurants = parse_restaurants(
            r#"{"r-1": {"name": " Riverside "}, "r-2": {"name": ""}, "r-3": {"address": "Mapo"}}"#,
        )
        .unwrap();
        assert_eq!(
            restaurants,
            vec![Restaurant {
                id: "r-1".into(),
                name: "Riverside".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let store = JsonFileOrderStore::new("/nonexistent/dinehub/orders.json");
        assert!(matches!(
            store.fetch_orders().await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_reads_file() {
        let path = std::env::temp_dir().join(format!("dinehub-orders-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, r#"[{"id": "f1", "createdAt": "2024-01-01"}]"#)
            .await
            .unwrap();
        let docs = JsonFileOrderStore::new(&path).fetch_orders().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].timestamp_field("createdAt").is_some());
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_load_restaurants_into_store() {
        let path = std::env::temp_dir().join(format!("dinehub-restaurants-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, r#"[{"id": "r-1", "name": "Riverside"}, {"id": "r-2", "name": "Harbor Grill"}]"#)
            .await
            .unwrap();
        let store = crate::MemoryOrderStore::new();
        let count = store.register_restaurants(load_restaurants(&path).await.unwrap());
        assert_eq!(count, 2);
        assert_eq!(store.restaurants()[1].name, "Harbor Grill");
        let _ = tokio::fs::remove_file(&path).await;

        assert!(matches!(
            load_restaurants("/nonexistent/dinehub/restaurants.json").await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
