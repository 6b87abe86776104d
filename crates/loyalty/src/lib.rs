//! Customer loyalty analytics: recency/frequency aggregation over the order
//! history and a refresh service for dashboard callers.

pub mod engine;
pub mod service;

pub use engine::LoyaltyAggregator;
pub use service::{InsightsService, InsightsView, RefreshOutcome};
