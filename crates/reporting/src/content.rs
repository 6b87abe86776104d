//! Dashboard editorial content: menu tips and partner store cards.
//!
//! The content document is edited by hand, so every field is validated and
//! the built-in defaults are used whenever nothing usable survives.

use crate::geo::{distance_label, haversine_distance_km};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerStore {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefit: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_image: Option<String>,
}

impl PartnerStore {
    fn fallback(id: &str, name: &str, area: &str, distance_km: f64, benefit: &str, lat: f64, lng: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            area: Some(area.to_string()),
            distance_km: Some(distance_km),
            distance_label: None,
            benefit: Some(benefit.to_string()),
            tags: Vec::new(),
            lat: Some(lat),
            lng: Some(lng),
            address: None,
            logo_image: None,
        }
    }

    /// Parse one card, `None` when `id` or `name` is missing or blank.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = non_blank(obj, "id")?;
        let name = non_blank(obj, "name")?;
        let tags: Vec<String> = obj
            .get("tags")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            id,
            name,
            area: string(obj, "area"),
            distance_km: lenient_number(obj, "distanceKm"),
            distance_label: string(obj, "distanceLabel"),
            benefit: string(obj, "benefit"),
            tags,
            lat: lenient_number(obj, "lat"),
            lng: lenient_number(obj, "lng"),
            address: string(obj, "address"),
            logo_image: string(obj, "logoImage"),
        })
    }

    /// Recompute distance from `origin` (lat, lng) when the store has coordinates.
    pub fn with_distance_from(mut self, origin: (f64, f64)) -> Self {
        if let (Some(lat), Some(lng)) = (self.lat, self.lng) {
            let km = haversine_distance_km(origin.0, origin.1, lat, lng);
            self.distance_km = Some(km);
            self.distance_label = Some(distance_label(km));
        }
        self
    }
}

fn string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn non_blank(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Numbers, or strings that parse as finite numbers.
fn lenient_number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    let parsed = match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardContent {
    pub menu_highlights: Vec<String>,
    pub partner_stores: Vec<PartnerStore>,
}

impl Default for DashboardContent {
    fn default() -> Self {
        Self {
            menu_highlights: vec![
                "Pinning your most popular dishes to the top speeds up ordering.".to_string(),
                "Today's recommended dish is also featured on the app home screen.".to_string(),
            ],
            partner_stores: vec![
                PartnerStore::fallback(
                    "hanriver-tteokbokki",
                    "Han River Tteokbokki",
                    "Yeouido",
                    0.4,
                    "Free side dish with QR orders",
                    37.5219,
                    126.9247,
                ),
                PartnerStore::fallback(
                    "midnight-pizza",
                    "Midnight Pizza",
                    "Hongik Univ.",
                    0.8,
                    "10% off for regulars",
                    37.5563,
                    126.9237,
                ),
                PartnerStore::fallback(
                    "green-tea",
                    "Green Tea Lounge",
                    "Seongsu",
                    1.1,
                    "Co-promote the matcha class",
                    37.5446,
                    127.0559,
                ),
            ],
        }
    }
}

impl DashboardContent {
    /// Validate a stored content document, filling gaps from the defaults.
    /// A missing document yields the defaults.
    pub fn sanitize(document: Option<&Value>) -> Self {
        let fallback = Self::default();
        let Some(doc) = document.and_then(Value::as_object) else {
            return fallback;
        };

        let menu_highlights: Vec<String> = doc
            .get("menuHighlights")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let partner_stores: Vec<PartnerStore> = doc
            .get("partnerStores")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(PartnerStore::from_value).collect())
            .unwrap_or_default();

        debug!(
            highlights = menu_highlights.len(),
            partners = partner_stores.len(),
            "Dashboard content sanitized"
        );

        Self {
            menu_highlights: if menu_highlights.is_empty() {
                fallback.menu_highlights
            } else {
                menu_highlights
            },
            partner_stores: if partner_stores.is_empty() {
                fallback.partner_stores
            } else {
                partner_stores
            },
        }
    }
}
