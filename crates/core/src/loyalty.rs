//! Customer loyalty domain types — recency/frequency segments derived from
//! the order history.

use serde::{Deserialize, Serialize};

// ─── Segments ───────────────────────────────────────────────────────────────

/// One customer surfaced in a ranked segment list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltySegment {
    pub name: String,
    /// Total orders across the whole history, not just the trailing window.
    pub visits: usize,
    pub days_since: f64,
    pub last_visit_label: String,
    /// UTC calendar date of the last visit, `YYYY-MM-DD`.
    pub last_visit_date: String,
    /// Restaurant of the most recent order.
    pub favorite: Option<String>,
}

/// Which segment list a customer falls into, if any.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    LikelyReturning,
    AtRisk,
}

// ─── Insights ───────────────────────────────────────────────────────────────

/// Dashboard loyalty metrics for one store scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyInsights {
    /// Repeat customers as a percentage of active customers, trailing window.
    pub returning_rate: f64,
    /// Percentage-point change against the previous window.
    pub returning_change: f64,
    pub today_returning: u64,
    /// Mean days between consecutive orders, across all customers.
    pub avg_visit_cycle: f64,
    pub active_customers: u64,
    pub repeat_customers: u64,
    pub likely_returning: Vec<LoyaltySegment>,
    pub at_risk: Vec<LoyaltySegment>,
}

/// Human label for a visit `days` ago.
pub fn relative_days_label(days: f64) -> String {
    if days <= 0.5 {
        "today".to_string()
    } else if days <= 1.5 {
        "yesterday".to_string()
    } else {
        format!("{} days ago", days.round() as i64)
    }
}
