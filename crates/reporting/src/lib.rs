//! Dashboard reporting — daily order statistics and editorial content.

pub mod content;
pub mod geo;
pub mod stats;

pub use content::{DashboardContent, PartnerStore};
pub use stats::{order_stats, OrderStats};
