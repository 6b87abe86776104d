//! End-to-end loyalty flow: order export on disk → store → aggregation.

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use dinehub_core::config::LoyaltyConfig;
    use dinehub_core::{OrderDocument, RequestContext, StoreFilter};
    use dinehub_loyalty::{InsightsService, LoyaltyAggregator, RefreshOutcome};
    use dinehub_store::{JsonFileOrderStore, MemoryOrderStore};
    use serde_json::json;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 9, 0, 0).unwrap()
    }

    /// A small week of trade across two restaurants, with the usual mess:
    /// blank phones, string and structured timestamps, a broken record.
    fn sample_export() -> serde_json::Value {
        let iso = |days: i64| (now() - Duration::days(days)).to_rfc3339();
        let ts = |days: i64| json!({"seconds": (now() - Duration::days(days)).timestamp(), "nanoseconds": 0});
        json!([
            {"id": "o1", "phone": "010-1111", "customerName": "Kim", "restaurantId": "r-1", "restaurantName": "Riverside", "createdAt": iso(4)},
            {"id": "o2", "phone": "010-1111", "customerName": "Kim", "restaurantId": "r-1", "restaurantName": "Riverside", "createdAt": ts(11)},
            {"id": "o3", "phone": "", "customerName": "Lee", "restaurantId": "r-2", "restaurantName": "Midnight Pizza", "createdAt": iso(23)},
            {"id": "o4", "phone": "   ", "customerName": "Lee", "restaurantId": "r-2", "restaurantName": "Midnight Pizza", "createdAt": iso(35)},
            {"id": "o5", "customerName": "Park", "restaurantId": "r-1", "createdAt": iso(0)},
            {"id": "o6", "phone": "010-1111", "restaurantId": "r-1", "createdAt": "not a date"},
            {"id": "o7", "restaurantId": "r-2", "createdAt": iso(2)}
        ])
    }

    #[tokio::test]
    async fn test_file_export_to_insights() {
        let path = std::env::temp_dir().join(format!("dinehub-flow-{}.json", std::process::id()));
        tokio::fs::write(&path, sample_export().to_string()).await.unwrap();

        let service = InsightsService::new(
            Arc::new(JsonFileOrderStore::new(&path)),
            &LoyaltyConfig::default(),
            std::time::Duration::from_secs(2),
        );
        let outcome = service
            .refresh_at(&RequestContext::for_store(StoreFilter::All), now())
            .await;
        let _ = tokio::fs::remove_file(&path).await;

        let RefreshOutcome::Published(insights) = outcome else {
            panic!("expected published insights, got {outcome:?}");
        };

        // Kim (2 in window), Lee (1 in window), Park (1), anonymous o7 (1).
        assert_eq!(insights.active_customers, 4);
        assert_eq!(insights.repeat_customers, 1);
        assert!((insights.returning_rate - 25.0).abs() < 1e-9);

        assert_eq!(insights.likely_returning.len(), 1);
        assert_eq!(insights.likely_returning[0].name, "Kim");
        assert_eq!(insights.likely_returning[0].favorite.as_deref(), Some("Riverside"));
        assert_eq!(insights.likely_returning[0].last_visit_label, "4 days ago");

        assert_eq!(insights.at_risk.len(), 1);
        assert_eq!(insights.at_risk[0].name, "Lee");
        assert_eq!(insights.at_risk[0].visits, 2);
    }

    #[tokio::test]
    async fn test_store_scope_through_memory_store() {
        let docs: Vec<OrderDocument> = sample_export()
            .as_array()
            .unwrap()
            .iter()
            .map(|v| OrderDocument::from_value(v["id"].as_str().unwrap(), v.clone()))
            .collect();
        let service = InsightsService::new(
            Arc::new(MemoryOrderStore::with_documents(docs)),
            &LoyaltyConfig::default(),
            std::time::Duration::from_secs(2),
        );

        let ctx = RequestContext::for_store(StoreFilter::parse(Some("r-2")));
        let RefreshOutcome::Published(insights) = service.refresh_at(&ctx, now()).await else {
            panic!("expected published insights");
        };
        assert!(insights.likely_returning.is_empty());
        assert_eq!(insights.at_risk.len(), 1);
        assert_eq!(insights.active_customers, 2);
    }

    #[test]
    fn test_rate_bounds_over_many_customers() {
        let aggregator = LoyaltyAggregator::new(&LoyaltyConfig::default());
        // Deterministic spread of visit patterns.
        let mut seed: u64 = 7;
        let mut docs = Vec::new();
        for i in 0..400 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let customer = (seed >> 33) % 60;
            let days = ((seed >> 17) % 90) as i64;
            docs.push(OrderDocument::from_value(
                format!("o{i}"),
                json!({
                    "phone": format!("010-{customer:04}"),
                    "createdAt": (now() - Duration::days(days)).to_rfc3339(),
                }),
            ));
        }

        let insights = aggregator.aggregate_documents(&docs, &StoreFilter::All, now());
        assert!(insights.returning_rate >= 0.0 && insights.returning_rate <= 100.0);
        assert!(insights.repeat_customers <= insights.active_customers);
        assert!(insights.likely_returning.len() <= 4);
        assert!(insights.at_risk.len() <= 4);
        assert!(insights
            .at_risk
            .windows(2)
            .all(|w| w[0].days_since >= w[1].days_since));
        assert_eq!(
            insights,
            aggregator.aggregate_documents(&docs, &StoreFilter::All, now())
        );
    }

    #[tokio::test]
    async fn test_display_name_stable_across_store_instances() {
        let iso = |days: i64| (now() - Duration::days(days)).to_rfc3339();
        let mut docs = vec![
            OrderDocument::from_value("a", json!({"phone": "010-1", "customerName": "Kim", "createdAt": iso(3)})),
            OrderDocument::from_value("b", json!({"phone": "010-1", "createdAt": iso(10)})),
        ];
        docs.extend((0..30).map(|i| {
            OrderDocument::from_value(
                format!("filler-{i}"),
                json!({"phone": format!("020-{i}"), "customerName": "Filler", "createdAt": iso(1)}),
            )
        }));

        for _ in 0..20 {
            let store = Arc::new(MemoryOrderStore::with_documents(docs.clone()));
            let service = InsightsService::new(store, &LoyaltyConfig::default(), std::time::Duration::from_secs(1));
            let RefreshOutcome::Published(insights) =
                service.refresh_at(&RequestContext::default(), now()).await
            else {
                panic!("expected insights");
            };
            assert_eq!(insights.likely_returning.len(), 1);
            assert_eq!(insights.likely_returning[0].name, "Kim");
            assert_eq!(insights.likely_returning[0].visits, 2);
        }
    }
}
