//! Daily order volume and revenue for the dashboard chart.

use chrono::{DateTime, Utc};
use dinehub_core::{Order, StoreFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatEntry {
    /// UTC day, `YYYY-MM-DD`.
    pub date_key: String,
    pub count: u64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: u64,
    pub total_amount: f64,
    /// Ascending by day.
    pub entries: Vec<OrderStatEntry>,
}

/// Bucket in-scope orders by day. Orders without a timestamp land on `now`'s day.
pub fn order_stats(orders: &[Order], filter: &StoreFilter, now: DateTime<Utc>) -> OrderStats {
    let mut buckets: BTreeMap<String, OrderStatEntry> = BTreeMap::new();

    for order in orders {
        if !filter.admits(order.restaurant_id.as_deref()) {
            continue;
        }
        let date_key = order
            .created_at
            .unwrap_or(now)
            .format("%Y-%m-%d")
            .to_string();
        let entry = buckets
            .entry(date_key.clone())
            .or_insert_with(|| OrderStatEntry {
                date_key,
                count: 0,
                total_amount: 0.0,
            });
        entry.count += 1;
        entry.total_amount += order.total_amount;
    }

    let entries: Vec<OrderStatEntry> = buckets.into_values().collect();
    metrics::counter!("reporting.order_stats").increment(1);

    OrderStats {
        total_orders: entries.iter().map(|e| e.count).sum(),
        total_amount: entries.iter().map(|e| e.total_amount).sum(),
        entries,
    }
}
