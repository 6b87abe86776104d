//! Loyalty aggregation: groups the order history by customer, measures
//! recency and frequency, and ranks customers who are likely to come back
//! or at risk of churning.

use chrono::{DateTime, Duration, Utc};
use dinehub_core::config::{LoyaltyConfig, MAX_WINDOW_DAYS};
use dinehub_core::loyalty::*;
use dinehub_core::order::{days_between, MS_PER_DAY};
use dinehub_core::{Order, OrderDocument, StoreFilter};
use std::collections::HashMap;
use tracing::{debug, info};

/// One dated visit in a customer's history.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub date: DateTime<Utc>,
    pub restaurant: Option<String>,
}

/// Per-customer working state, rebuilt on every aggregation.
#[derive(Debug, Clone)]
pub struct CustomerAggregate {
    pub key: String,
    pub name: String,
    pub visits: Vec<Visit>,
    pub last30_count: usize,
    pub prev_window_count: usize,
    /// Visits older than both windows.
    pub older_count: usize,
}

impl CustomerAggregate {
    fn new(key: String, name: String) -> Self {
        Self {
            key,
            name,
            visits: Vec::new(),
            last30_count: 0,
            prev_window_count: 0,
            older_count: 0,
        }
    }
}

/// Reference instants for one aggregation run.
#[derive(Debug, Clone, Copy)]
pub struct Windows {
    pub now: DateTime<Utc>,
    pub last30_start: DateTime<Utc>,
    pub prev60_start: DateTime<Utc>,
}

impl Windows {
    /// `window_days` is clamped to `0..=MAX_WINDOW_DAYS`; NaN counts as zero.
    pub fn new(now: DateTime<Utc>, window_days: f64) -> Self {
        let days = if window_days.is_nan() {
            0.0
        } else {
            window_days.clamp(0.0, MAX_WINDOW_DAYS)
        };
        let window = Duration::milliseconds((days * MS_PER_DAY) as i64);
        Self {
            now,
            last30_start: now - window,
            prev60_start: now - window - window,
        }
    }
}

/// Customer loyalty aggregator — stateless computation over an order snapshot.
pub struct LoyaltyAggregator {
    config: LoyaltyConfig,
}

impl LoyaltyAggregator {
    pub fn new(config: &LoyaltyConfig) -> Self {
        info!(
            window_days = config.window_days,
            at_risk_days = config.at_risk_days,
            segment_limit = config.segment_limit,
            "Loyalty aggregator initialized"
        );
        Self {
            config: config.clone(),
        }
    }

    /// Normalise raw documents and aggregate them.
    pub fn aggregate_documents(
        &self,
        docs: &[OrderDocument],
        filter: &StoreFilter,
        now: DateTime<Utc>,
    ) -> LoyaltyInsights {
        let orders = Order::normalize_all(docs, &self.config.default_customer_name);
        self.aggregate(&orders, filter, now)
    }

    /// Group in-scope, dated orders by customer key, in first-seen order.
    pub fn group_customers(
        &self,
        orders: &[Order],
        filter: &StoreFilter,
        windows: &Windows,
    ) -> Vec<CustomerAggregate> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut customers: Vec<CustomerAggregate> = Vec::new();
        let mut undated = 0u64;

        for order in orders {
            if !filter.admits(order.restaurant_id.as_deref()) {
                continue;
            }
            let Some(created_at) = order.created_at else {
                undated += 1;
                continue;
            };

            let slot = *index.entry(order.customer_key.as_str()).or_insert_with(|| {
                customers.push(CustomerAggregate::new(
                    order.customer_key.clone(),
                    order.customer_name.clone(),
                ));
                customers.len() - 1
            });
            let entry = &mut customers[slot];
            entry.visits.push(Visit {
                date: created_at,
                restaurant: order.restaurant_name.clone(),
            });
            if created_at >= windows.last30_start {
                entry.last30_count += 1;
            } else if created_at >= windows.prev60_start {
                entry.prev_window_count += 1;
            } else {
                entry.older_count += 1;
            }
        }

        if undated > 0 {
            metrics::counter!("loyalty.orders_skipped", "reason" => "no_timestamp")
                .increment(undated);
            debug!(undated, "Orders without a timestamp excluded");
        }
        customers
    }

    /// Which segment a customer belongs to, if any. At-risk wins over likely-returning.
    pub fn classify(&self, visits: usize, days_since: f64) -> Option<SegmentKind> {
        if visits < self.config.min_repeat_visits {
            return None;
        }
        if days_since >= self.config.at_risk_days {
            Some(SegmentKind::AtRisk)
        } else if days_since >= self.config.likely_min_days
            && days_since <= self.config.likely_max_days
        {
            Some(SegmentKind::LikelyReturning)
        } else {
            None
        }
    }

    /// Compute loyalty insights for `orders` as of `now`.
    pub fn aggregate(
        &self,
        orders: &[Order],
        filter: &StoreFilter,
        now: DateTime<Utc>,
    ) -> LoyaltyInsights {
        let windows = Windows::new(now, self.config.window_days);
        let mut customers = self.group_customers(orders, filter, &windows);

        let mut active = 0u64;
        let mut repeat = 0u64;
        let mut prev_active = 0u64;
        let mut prev_repeat = 0u64;
        let mut interval_sum = 0.0f64;
        let mut interval_count = 0u64;
        let mut today_returning = 0u64;
        let mut likely: Vec<LoyaltySegment> = Vec::new();
        let mut at_risk: Vec<LoyaltySegment> = Vec::new();
        let min_repeat = self.config.min_repeat_visits;

        for customer in customers.iter_mut() {
            if customer.last30_count > 0 {
                active += 1;
            }
            if customer.last30_count >= min_repeat {
                repeat += 1;
            }
            if customer.prev_window_count > 0 {
                prev_active += 1;
            }
            if customer.prev_window_count >= min_repeat {
                prev_repeat += 1;
            }

            customer.visits.sort_by(|a, b| b.date.cmp(&a.date));
            for pair in customer.visits.windows(2) {
                let delta = days_between(pair[0].date, pair[1].date);
                if delta > 0.0 {
                    interval_sum += delta;
                    interval_count += 1;
                }
            }

            // Grouping only creates a customer on their first visit.
            let Some(last) = customer.visits.first() else {
                continue;
            };
            let visits = customer.visits.len();
            let days_since = days_between(now, last.date);
            if days_since < self.config.today_threshold_days && visits >= min_repeat {
                today_returning += 1;
            }

            let Some(kind) = self.classify(visits, days_since) else {
                continue;
            };
            let segment = LoyaltySegment {
                name: customer.name.clone(),
                visits,
                days_since,
                last_visit_label: relative_days_label(days_since),
                last_visit_date: last.date.format("%Y-%m-%d").to_string(),
                favorite: last.restaurant.clone(),
            };
            match kind {
                SegmentKind::AtRisk => at_risk.push(segment),
                SegmentKind::LikelyReturning => likely.push(segment),
            }
        }

        let returning_rate = rate(repeat, active);
        let prev_rate = rate(prev_repeat, prev_active);
        let avg_visit_cycle = if interval_count > 0 {
            interval_sum / interval_count as f64
        } else {
            0.0
        };

        likely.sort_by(|a, b| a.days_since.total_cmp(&b.days_since));
        at_risk.sort_by(|a, b| b.days_since.total_cmp(&a.days_since));
        likely.truncate(self.config.segment_limit);
        at_risk.truncate(self.config.segment_limit);

        metrics::counter!("loyalty.aggregations").increment(1);
        metrics::histogram!("loyalty.customers").record(customers.len() as f64);

        debug!(
            store = %filter,
            customers = customers.len(),
            active,
            repeat,
            returning_rate,
            likely = likely.len(),
            at_risk = at_risk.len(),
            "Loyalty insights computed"
        );

        LoyaltyInsights {
            returning_rate,
            returning_change: returning_rate - prev_rate,
            today_returning,
            avg_visit_cycle,
            active_customers: active,
            repeat_customers: repeat,
            likely_returning: likely,
            at_risk,
        }
    }

    pub fn config(&self) -> &LoyaltyConfig {
        &self.config
    }
}

fn rate(repeat: u64, active: u64) -> f64 {
    if active > 0 {
        repeat as f64 / active as f64 * 100.0
    } else {
        0.0
    }
}
