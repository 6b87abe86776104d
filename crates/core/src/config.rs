use crate::error::{DineError, DineResult};
use serde::Deserialize;

/// Upper bound for `loyalty.window_days`; keeps the window arithmetic in range.
pub const MAX_WINDOW_DAYS: f64 = 3650.0;

/// Root application configuration. Loaded from environment variables
/// with the prefix `DINEHUB__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub loyalty: LoyaltyConfig,
    #[serde(default)]
    pub geo: GeoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding the order collection. In-memory store when unset.
    #[serde(default)]
    pub orders_file: Option<String>,
    /// JSON document with dashboard menu highlights and partner stores.
    #[serde(default)]
    pub content_file: Option<String>,
    /// JSON export of the restaurants collection, used to fill in restaurant names.
    #[serde(default)]
    pub restaurants_file: Option<String>,
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

/// Credentials and endpoints for the map/search proxy. Requests fail with a
/// precondition error while the matching credential pair is unset.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoConfig {
    #[serde(default)]
    pub map_client_id: Option<String>,
    #[serde(default)]
    pub map_client_secret: Option<String>,
    #[serde(default)]
    pub search_client_id: Option<String>,
    #[serde(default)]
    pub search_client_secret: Option<String>,
    #[serde(default = "default_map_base_url")]
    pub map_base_url: String,
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,
    #[serde(default = "default_geo_timeout_ms")]
    pub timeout_ms: u64,
}

// Default functions
fn default_node_id() -> String {
    "dinehub-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_fetch_timeout_ms() -> u64 {
    10_000
}
fn default_map_base_url() -> String {
    "https://naveropenapi.apigw.ntruss.com".to_string()
}
fn default_search_base_url() -> String {
    "https://openapi.naver.com".to_string()
}
fn default_geo_timeout_ms() -> u64 {
    5_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            orders_file: None,
            content_file: None,
            restaurants_file: None,
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            map_client_id: None,
            map_client_secret: None,
            search_client_id: None,
            search_client_secret: None,
            map_base_url: default_map_base_url(),
            search_base_url: default_search_base_url(),
            timeout_ms: default_geo_timeout_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            store: StoreConfig::default(),
            loyalty: LoyaltyConfig::default(),
            geo: GeoConfig::default(),
        }
    }
}

// ─── Loyalty Config ─────────────────────────────────────────────────────────

/// Thresholds used when segmenting customers by visit recency.
#[derive(Debug, Clone, Deserialize)]
pub struct LoyaltyConfig {
    /// Length of the trailing activity window; the previous window has the same length.
    #[serde(default = "default_window_days")]
    pub window_days: f64,
    #[serde(default = "default_at_risk_days")]
    pub at_risk_days: f64,
    #[serde(default = "default_likely_min_days")]
    pub likely_min_days: f64,
    #[serde(default = "default_likely_max_days")]
    pub likely_max_days: f64,
    /// Customers seen more recently than this count as returning today.
    #[serde(default = "default_today_threshold_days")]
    pub today_threshold_days: f64,
    #[serde(default = "default_min_repeat_visits")]
    pub min_repeat_visits: usize,
    #[serde(default = "default_segment_limit")]
    pub segment_limit: usize,
    #[serde(default = "default_customer_name")]
    pub default_customer_name: String,
}

fn default_window_days() -> f64 { 30.0 }
fn default_at_risk_days() -> f64 { 21.0 }
fn default_likely_min_days() -> f64 { 3.0 }
fn default_likely_max_days() -> f64 { 14.0 }
fn default_today_threshold_days() -> f64 { 0.8 }
fn default_min_repeat_visits() -> usize { 2 }
fn default_segment_limit() -> usize { 4 }
fn default_customer_name() -> String { "Guest".to_string() }

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            at_risk_days: default_at_risk_days(),
            likely_min_days: default_likely_min_days(),
            likely_max_days: default_likely_max_days(),
            today_threshold_days: default_today_threshold_days(),
            min_repeat_visits: default_min_repeat_visits(),
            segment_limit: default_segment_limit(),
            default_customer_name: default_customer_name(),
        }
    }
}

impl LoyaltyConfig {
    /// Reject thresholds the aggregator cannot work with.
    pub fn validate(&self) -> DineResult<()> {
        if !(0.0..=MAX_WINDOW_DAYS).contains(&self.window_days) {
            return Err(DineError::Validation(format!(
                "loyalty.window_days must be between 0 and {MAX_WINDOW_DAYS}, got {}",
                self.window_days
            )));
        }
        let thresholds = [
            ("at_risk_days", self.at_risk_days),
            ("likely_min_days", self.likely_min_days),
            ("likely_max_days", self.likely_max_days),
            ("today_threshold_days", self.today_threshold_days),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(DineError::Validation(format!(
                    "loyalty.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.likely_min_days > self.likely_max_days {
            return Err(DineError::Validation(
                "loyalty.likely_min_days must not exceed loyalty.likely_max_days".into(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from environment variables and optional config file.
    pub fn load() -> DineResult<Self> {
        Self::load_from(None)
    }

    /// Same as [`AppConfig::load`], reading `path` as a TOML file first when given.
    /// Environment variables take precedence over file values.
    pub fn load_from(path: Option<&str>) -> DineResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::with_name(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("DINEHUB")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.loyalty.validate()?;
        Ok(config)
    }
}
