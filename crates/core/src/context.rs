//! Per-request context passed explicitly into every query and aggregation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token meaning "every restaurant" in query strings.
pub const ALL_STORES: &str = "all";

/// Restaurant scope of a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StoreFilter {
    #[default]
    All,
    Restaurant(String),
}

impl StoreFilter {
    /// Absent, blank, and `"all"` all mean no filtering.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some(ALL_STORES) => StoreFilter::All,
            Some(id) => StoreFilter::Restaurant(id.to_string()),
        }
    }

    /// Whether an order carrying `restaurant_id` is in scope.
    ///
    /// Orders without a restaurant id are never filtered out.
    pub fn admits(&self, restaurant_id: Option<&str>) -> bool {
        match (self, restaurant_id) {
            (StoreFilter::All, _) => true,
            (StoreFilter::Restaurant(_), None) => true,
            (StoreFilter::Restaurant(wanted), Some(id)) => id.is_empty() || id == wanted,
        }
    }

    pub fn restaurant_id(&self) -> Option<&str> {
        match self {
            StoreFilter::All => None,
            StoreFilter::Restaurant(id) => Some(id),
        }
    }
}

impl fmt::Display for StoreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreFilter::All => f.write_str(ALL_STORES),
            StoreFilter::Restaurant(id) => f.write_str(id),
        }
    }
}

impl Serialize for StoreFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StoreFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(StoreFilter::parse(raw.as_deref()))
    }
}

/// Signed-in user and selected store for a single request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub store: StoreFilter,
}

impl RequestContext {
    pub fn for_store(store: StoreFilter) -> Self {
        Self {
            user_id: None,
            store,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}
