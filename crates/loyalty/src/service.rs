//! Request-driven loyalty refresh with "latest request wins" semantics.
//!
//! Each caller (keyed by user id) has its own generation counter and
//! published view. When a fetch completes after the same caller started a
//! newer refresh, its result is dropped so a slow, stale request can never
//! overwrite a fresher view. Refreshes from different callers never
//! interfere with each other.

use crate::engine::LoyaltyAggregator;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dinehub_core::config::LoyaltyConfig;
use dinehub_core::loyalty::LoyaltyInsights;
use dinehub_core::{RequestContext, StoreFilter};
use dinehub_store::{fetch_with_timeout, OrderSource, StoreError};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Caller key used when a request carries no user id.
pub const ANONYMOUS_CALLER: &str = "anonymous";

/// Last published state, as the dashboard renders it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsView {
    pub data: Option<LoyaltyInsights>,
    pub is_loading: bool,
    pub is_error: bool,
    pub generation: u64,
    pub store: StoreFilter,
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Published(LoyaltyInsights),
    Failed(StoreError),
    /// The same caller started a newer refresh before this one finished.
    Superseded { generation: u64 },
}

#[derive(Default)]
struct CallerSlot {
    latest: AtomicU64,
    view: RwLock<InsightsView>,
}

pub struct InsightsService {
    source: Arc<dyn OrderSource>,
    aggregator: LoyaltyAggregator,
    fetch_timeout: Duration,
    callers: DashMap<String, Arc<CallerSlot>>,
    last_fetch_failed: AtomicBool,
}

impl InsightsService {
    pub fn new(source: Arc<dyn OrderSource>, config: &LoyaltyConfig, fetch_timeout: Duration) -> Self {
        Self {
            source,
            aggregator: LoyaltyAggregator::new(config),
            fetch_timeout,
            callers: DashMap::new(),
            last_fetch_failed: AtomicBool::new(false),
        }
    }

    pub fn aggregator(&self) -> &LoyaltyAggregator {
        &self.aggregator
    }

    /// Published view for the caller identified by `ctx`. Empty until that caller refreshes.
    pub fn view_for(&self, ctx: &RequestContext) -> InsightsView {
        self.callers
            .get(caller_key(ctx))
            .map(|slot| slot.view.read().clone())
            .unwrap_or_default()
    }

    /// Whether the most recently completed fetch, from any caller, failed.
    pub fn last_fetch_failed(&self) -> bool {
        self.last_fetch_failed.load(Ordering::SeqCst)
    }

    pub async fn refresh(&self, ctx: &RequestContext) -> RefreshOutcome {
        self.refresh_at(ctx, Utc::now()).await
    }

    /// Fetch, aggregate as of `now`, and publish unless the caller has moved on.
    pub async fn refresh_at(&self, ctx: &RequestContext, now: DateTime<Utc>) -> RefreshOutcome {
        let slot = self
            .callers
            .entry(caller_key(ctx).to_string())
            .or_default()
            .clone();

        let generation = slot.latest.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut view = slot.view.write();
            view.is_loading = true;
            view.generation = generation;
            view.store = ctx.store.clone();
        }

        let fetched = fetch_with_timeout(self.source.as_ref(), self.fetch_timeout).await;
        self.last_fetch_failed.store(fetched.is_err(), Ordering::SeqCst);

        // Check and publish under the same lock so an older run cannot slip in between.
        let mut view = slot.view.write();
        if slot.latest.load(Ordering::SeqCst) != generation {
            metrics::counter!("loyalty.refresh_superseded").increment(1);
            debug!(generation, store = %ctx.store, "Discarding superseded loyalty refresh");
            return RefreshOutcome::Superseded { generation };
        }

        match fetched {
            Ok(docs) => {
                let insights = self.aggregator.aggregate_documents(&docs, &ctx.store, now);
                *view = InsightsView {
                    data: Some(insights.clone()),
                    is_loading: false,
                    is_error: false,
                    generation,
                    store: ctx.store.clone(),
                };
                RefreshOutcome::Published(insights)
            }
            Err(e) => {
                warn!(
                    generation,
                    store = %ctx.store,
                    user = caller_key(ctx),
                    error = %e,
                    "Loyalty refresh failed"
                );
                *view = InsightsView {
                    data: None,
                    is_loading: false,
                    is_error: true,
                    generation,
                    store: ctx.store.clone(),
                };
                RefreshOutcome::Failed(e)
            }
        }
    }
}

fn caller_key(ctx: &RequestContext) -> &str {
    ctx.user_id.as_deref().unwrap_or(ANONYMOUS_CALLER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dinehub_core::OrderDocument;
    use dinehub_store::{MemoryOrderStore, StoreResult};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    /// First fetch is slow, later fetches return immediately.
    struct SlowFirstSource {
        calls: AtomicUsize,
        docs: Vec<OrderDocument>,
    }

    #[async_trait]
    impl OrderSource for SlowFirstSource {
        async fn fetch_orders(&self) -> StoreResult<Vec<OrderDocument>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Ok(self.docs.clone())
        }

        fn name(&self) -> &'static str {
            "slow-first"
        }
    }

    struct DownSource;

    #[async_trait]
    impl OrderSource for DownSource {
        async fn fetch_orders(&self) -> StoreResult<Vec<OrderDocument>> {
            Err(StoreError::Unavailable("offline".into()))
        }

        fn name(&self) -> &'static str {
            "down"
        }
    }

    fn sample_docs(now: DateTime<Utc>) -> Vec<OrderDocument> {
        let at = |days: i64| (now - chrono::Duration::days(days)).to_rfc3339();
        vec![
            OrderDocument::from_value("o1", json!({"phone": "010-1", "restaurantId": "r-1", "createdAt": at(1)})),
            OrderDocument::from_value("o2", json!({"phone": "010-1", "restaurantId": "r-1", "createdAt": at(4)})),
            OrderDocument::from_value("o3", json!({"phone": "010-2", "restaurantId": "r-2", "createdAt": at(2)})),
        ]
    }

    #[tokio::test]
    async fn test_latest_request_wins() {
        let now = Utc::now();
        let source = Arc::new(SlowFirstSource {
            calls: AtomicUsize::new(0),
            docs: sample_docs(now),
        });
        let service = InsightsService::new(source, &LoyaltyConfig::default(), Duration::from_secs(5));

        let all = RequestContext::for_store(StoreFilter::All);
        let r2 = RequestContext::for_store(StoreFilter::Restaurant("r-2".into()));
        let (stale, fresh) = tokio::join!(service.refresh_at(&all, now), service.refresh_at(&r2, now));

        assert!(matches!(stale, RefreshOutcome::Superseded { generation: 1 }));
        let RefreshOutcome::Published(insights) = fresh else {
            panic!("expected the newer refresh to publish");
        };
        assert_eq!(insights.active_customers, 1);

        let view = service.view_for(&r2);
        assert_eq!(view.generation, 2);
        assert_eq!(view.store, StoreFilter::Restaurant("r-2".into()));
        assert!(!view.is_loading);
        assert_eq!(view.data, Some(insights));
    }

    #[tokio::test]
    async fn test_callers_do_not_supersede_each_other() {
        let now = Utc::now();
        let source = Arc::new(SlowFirstSource {
            calls: AtomicUsize::new(0),
            docs: sample_docs(now),
        });
        let service = InsightsService::new(source, &LoyaltyConfig::default(), Duration::from_secs(5));

        let owner_a = RequestContext::for_store(StoreFilter::Restaurant("r-1".into())).with_user("owner-a");
        let owner_b = RequestContext::for_store(StoreFilter::Restaurant("r-2".into())).with_user("owner-b");
        let (a, b) = tokio::join!(service.refresh_at(&owner_a, now), service.refresh_at(&owner_b, now));

        let RefreshOutcome::Published(a) = a else {
            panic!("owner-a refresh should publish");
        };
        let RefreshOutcome::Published(b) = b else {
            panic!("owner-b refresh should publish");
        };
        assert_eq!(a.repeat_customers, 1);
        assert_eq!(b.repeat_customers, 0);

        let view_a = service.view_for(&owner_a);
        assert_eq!(view_a.generation, 1);
        assert_eq!(view_a.store, StoreFilter::Restaurant("r-1".into()));
        assert_eq!(view_a.data, Some(a));
        assert_eq!(service.view_for(&owner_b).data, Some(b));
        assert!(service.view_for(&RequestContext::default()).data.is_none());
    }

    #[tokio::test]
    async fn test_failure_sets_error_state() {
        let service = InsightsService::new(
            Arc::new(DownSource),
            &LoyaltyConfig::default(),
            Duration::from_secs(1),
        );
        let outcome = service.refresh(&RequestContext::default()).await;
        assert!(matches!(outcome, RefreshOutcome::Failed(StoreError::Unavailable(_))));
        assert!(service.last_fetch_failed());
        let view = service.view_for(&RequestContext::default());
        assert!(view.is_error);
        assert!(view.data.is_none());
        assert!(!view.is_loading);
    }

    #[tokio::test]
    async fn test_refresh_from_memory_store() {
        let now = Utc::now();
        let store = Arc::new(MemoryOrderStore::with_documents(sample_docs(now)));
        let service = InsightsService::new(store, &LoyaltyConfig::default(), Duration::from_secs(1));
        let ctx = RequestContext::for_store(StoreFilter::parse(Some("r-1"))).with_user("owner-1");

        let RefreshOutcome::Published(insights) = service.refresh_at(&ctx, now).await else {
            panic!("expected insights");
        };
        assert_eq!(insights.active_customers, 1);
        assert_eq!(insights.repeat_customers, 1);
        assert!((insights.returning_rate - 100.0).abs() < 1e-9);
    }
}
