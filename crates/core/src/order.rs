//! Order documents and the boundary normalisation that turns loosely-typed
//! store records into typed values.
//!
//! Stored documents may have any field missing, null, or of the wrong type.
//! Everything downstream works on [`Order`] / [`OrderRecord`] only.

use crate::error::{DineError, DineResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

/// Fractional days from `earlier` to `later`, using plain millisecond arithmetic.
pub fn days_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / MS_PER_DAY
}

// ─── Raw documents ──────────────────────────────────────────────────────────

/// A raw record from the order collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDocument {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl OrderDocument {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build from a JSON value; non-object values yield an empty document.
    pub fn from_value(id: impl Into<String>, value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(id, fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String field, `None` when absent or not a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// String field that is non-empty after trimming, returned trimmed.
    pub fn trimmed_field(&self, key: &str) -> Option<&str> {
        self.str_field(key).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn number_field(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    pub fn timestamp_field(&self, key: &str) -> Option<DateTime<Utc>> {
        self.fields.get(key).and_then(parse_timestamp)
    }
}

/// Parse a stored timestamp.
///
/// Accepts a structured `{seconds, nanoseconds}` object (or the
/// underscore-prefixed export spelling) and ISO-like strings. Anything else
/// is unparseable.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).ok()?;
            DateTime::from_timestamp(seconds, nanos)
        }
        Value::String(raw) => parse_iso(raw.trim()),
        _ => None,
    }
}

fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Structured timestamp value as written by this service.
pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    serde_json::json!({
        "seconds": at.timestamp(),
        "nanoseconds": at.timestamp_subsec_nanos(),
    })
}

// ─── Normalised order ───────────────────────────────────────────────────────

/// Typed order used by the analytics paths.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Phone, else customer name, else the record id.
    pub customer_key: String,
    pub customer_name: String,
    pub restaurant_id: Option<String>,
    pub restaurant_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub total_amount: f64,
}

impl Order {
    /// Normalise a raw document, substituting `placeholder_name` for a missing customer name.
    pub fn from_document(doc: &OrderDocument, placeholder_name: &str) -> Self {
        let customer_key = doc
            .trimmed_field("phone")
            .or_else(|| doc.trimmed_field("customerName"))
            .unwrap_or(&doc.id)
            .to_string();
        let customer_name = doc
            .str_field("customerName")
            .filter(|s| !s.is_empty())
            .unwrap_or(placeholder_name)
            .to_string();

        Self {
            id: doc.id.clone(),
            customer_key,
            customer_name,
            restaurant_id: doc.str_field("restaurantId").map(str::to_string),
            restaurant_name: doc
                .str_field("restaurantName")
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            created_at: doc.timestamp_field("createdAt"),
            total_amount: doc
                .number_field("totalAmount")
                .or_else(|| doc.number_field("totalPrice"))
                .unwrap_or(0.0),
        }
    }

    pub fn normalize_all(docs: &[OrderDocument], placeholder_name: &str) -> Vec<Order> {
        docs.iter()
            .map(|doc| Order::from_document(doc, placeholder_name))
            .collect()
    }
}

// ─── Order management types ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Cooking,
    OutForDelivery,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    #[default]
    Delivery,
    Pickup,
}

/// Order creation payload as submitted by the admin form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderForm {
    pub restaurant_id: String,
    pub customer_name: String,
    #[serde(default)]
    pub phone: String,
    /// Free-text amount; non-numeric input is stored as 0.
    #[serde(default)]
    pub total_price: String,
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: OrderStatus,
}

impl OrderForm {
    pub fn validate(&self) -> DineResult<()> {
        if self.restaurant_id.trim().is_empty() {
            return Err(DineError::Validation("restaurantId must not be empty".into()));
        }
        if self.customer_name.trim().is_empty() && self.phone.trim().is_empty() {
            return Err(DineError::Validation(
                "either customerName or phone is required".into(),
            ));
        }
        Ok(())
    }

    pub fn parsed_total(&self) -> f64 {
        self.total_price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// Document fields for a newly created order, stamped with `now`.
    pub fn to_fields(&self, now: DateTime<Utc>) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("restaurantId".into(), Value::from(self.restaurant_id.clone()));
        fields.insert("customerName".into(), Value::from(self.customer_name.clone()));
        fields.insert("phone".into(), Value::from(self.phone.clone()));
        fields.insert("totalPrice".into(), Value::from(self.parsed_total()));
        fields.insert(
            "deliveryMethod".into(),
            serde_json::to_value(self.delivery_method).unwrap_or(Value::Null),
        );
        fields.insert(
            "status".into(),
            serde_json::to_value(self.status).unwrap_or(Value::Null),
        );
        fields.insert("notes".into(), Value::from(self.notes.clone()));
        fields.insert("createdAt".into(), timestamp_value(now));
        fields.insert("updatedAt".into(), timestamp_value(now));
        fields
    }
}

/// Order as listed in the admin order table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: String,
    pub customer_name: String,
    pub phone: String,
    pub restaurant_id: Option<String>,
    pub restaurant_name: String,
    pub total_price: f64,
    pub delivery_method: DeliveryMethod,
    pub status: OrderStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub notes: String,
}

impl OrderRecord {
    pub fn from_document(doc: &OrderDocument, placeholder_name: &str) -> Self {
        Self {
            id: doc.id.clone(),
            customer_name: doc
                .str_field("customerName")
                .unwrap_or(placeholder_name)
                .to_string(),
            phone: doc.str_field("phone").unwrap_or_default().to_string(),
            restaurant_id: doc.str_field("restaurantId").map(str::to_string),
            restaurant_name: doc.str_field("restaurantName").unwrap_or_default().to_string(),
            total_price: doc.number_field("totalPrice").unwrap_or(0.0),
            delivery_method: enum_field(doc, "deliveryMethod").unwrap_or_default(),
            status: enum_field(doc, "status").unwrap_or_default(),
            created_at: doc.timestamp_field("createdAt"),
            notes: doc.str_field("notes").unwrap_or_default().to_string(),
        }
    }
}

fn enum_field<T: serde::de::DeserializeOwned>(doc: &OrderDocument, key: &str) -> Option<T> {
    doc.get(key)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> OrderDocument {
        OrderDocument::from_value(id, value)
    }

    #[test]
    fn test_customer_key_precedence() {
        let with_phone = doc("o1", json!({"phone": " 010-1234 ", "customerName": "Kim"}));
        assert_eq!(Order::from_document(&with_phone, "Guest").customer_key, "010-1234");

        let blank_phone = doc("o2", json!({"phone": "   ", "customerName": " Kim "}));
        assert_eq!(Order::from_document(&blank_phone, "Guest").customer_key, "Kim");

        let nothing = doc("o3", json!({"phone": 42, "customerName": null}));
        let order = Order::from_document(&nothing, "Guest");
        assert_eq!(order.customer_key, "o3");
        assert_eq!(order.customer_name, "Guest");
    }

    #[test]
    fn test_structured_timestamp() {
        let value = json!({"seconds": 1_700_000_000, "nanoseconds": 500_000_000});
        let ts = parse_timestamp(&value).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_millis(), 500);

        let exported = json!({"_seconds": 1_700_000_000, "_nanoseconds": 0});
        assert!(parse_timestamp(&exported).is_some());
    }

    #[test]
    fn test_string_timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp(&json!("2024-03-01T12:30:00Z")), Some(expected));
        assert_eq!(parse_timestamp(&json!("2024-03-01T21:30:00+09:00")), Some(expected));
        assert_eq!(parse_timestamp(&json!("2024-03-01T12:30:00")), Some(expected));
        assert_eq!(parse_timestamp(&json!("2024-03-01 12:30:00")), Some(expected));
        assert_eq!(
            parse_timestamp(&json!("2024-03-01")),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unparseable_timestamps() {
        assert!(parse_timestamp(&json!(1_700_000_000)).is_none());
        assert!(parse_timestamp(&json!("yesterday")).is_none());
        assert!(parse_timestamp(&json!("")).is_none());
        assert!(parse_timestamp(&json!(true)).is_none());
        assert!(parse_timestamp(&json!({"nanoseconds": 5})).is_none());
        assert!(parse_timestamp(&Value::Null).is_none());
    }

    #[test]
    fn test_amount_fallback() {
        let a = doc("o1", json!({"totalAmount": 12000}));
        assert_eq!(Order::from_document(&a, "Guest").total_amount, 12000.0);
        let b = doc("o2", json!({"totalPrice": 8000.5}));
        assert_eq!(Order::from_document(&b, "Guest").total_amount, 8000.5);
        let c = doc("o3", json!({"totalAmount": "lots"}));
        assert_eq!(Order::from_document(&c, "Guest").total_amount, 0.0);
    }

    #[test]
    fn test_form_to_record() {
        let form = OrderForm {
            restaurant_id: "r-1".into(),
            customer_name: "Lee".into(),
            phone: "010".into(),
            total_price: "abc".into(),
            delivery_method: DeliveryMethod::Pickup,
            notes: String::new(),
            status: OrderStatus::Cooking,
        };
        assert!(form.validate().is_ok());
        let now = Utc.with_ymd_and_hms(2024, 5, 5, 9, 0, 0).unwrap();
        let record = OrderRecord::from_document(&OrderDocument::new("o1", form.to_fields(now)), "Guest");
        assert_eq!(record.total_price, 0.0);
        assert_eq!(record.delivery_method, DeliveryMethod::Pickup);
        assert_eq!(record.status, OrderStatus::Cooking);
        assert_eq!(record.created_at, Some(now));
    }

    #[test]
    fn test_record_defaults() {
        let record = OrderRecord::from_document(&doc("o9", json!({"status": "unknown"})), "Guest");
        assert_eq!(record.customer_name, "Guest");
        assert_eq!(record.phone, "");
        assert_eq!(record.status, OrderStatus::Pending);
        assert_eq!(record.delivery_method, DeliveryMethod::Delivery);
        assert!(record.created_at.is_none());
    }

    #[test]
    fn test_form_requires_restaurant() {
        let form = OrderForm {
            restaurant_id: " ".into(),
            customer_name: "Lee".into(),
            phone: String::new(),
            total_price: "1000".into(),
            delivery_method: DeliveryMethod::Delivery,
            notes: String::new(),
            status: OrderStatus::Pending,
        };
        assert!(matches!(form.validate(), Err(DineError::Validation(_))));
    }
}
