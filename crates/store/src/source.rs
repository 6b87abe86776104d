use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use dinehub_core::OrderDocument;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Anything that can hand over the full order collection.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Fetch every order document. The result is an immutable snapshot.
    async fn fetch_orders(&self) -> StoreResult<Vec<OrderDocument>>;

    /// Short label used in logs.
    fn name(&self) -> &'static str;
}

/// Fetch from `source`, giving up after `timeout`.
pub async fn fetch_with_timeout(
    source: &dyn OrderSource,
    timeout: Duration,
) -> StoreResult<Vec<OrderDocument>> {
    let start = Instant::now();
    let result = match tokio::time::timeout(timeout, source.fetch_orders()).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(timeout.as_millis() as u64)),
    };

    let elapsed = start.elapsed();
    metrics::histogram!("store.fetch_latency_ms").record(elapsed.as_secs_f64() * 1000.0);

    match &result {
        Ok(docs) => {
            debug!(source = source.name(), count = docs.len(), ?elapsed, "Orders fetched");
        }
        Err(e) => {
            metrics::counter!("store.fetch_errors").increment(1);
            warn!(source = source.name(), error = %e, "Order fetch failed");
        }
    }
    result
}
