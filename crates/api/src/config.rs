use chrono::{FixedOffset, TimeDelta};
use opstats_core::stats::range::offset_from_minutes;
use opstats_core::stats::{
    AggregateOptions, DateOrder, DateRange, DeltaMode, DEFAULT_LEAD_IN_MINUTES,
};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    pub stats: StatsConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    ///
    /// JWT and statistics settings are read by [`JwtConfig::from_env`] and
    /// [`StatsConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            stats: StatsConfig::from_env(),
        }
    }
}

/// Settings that shape how saves are recorded and aggregated.
#[derive(Debug, Clone)]
pub struct StatsConfig {
    pub delta_mode: DeltaMode,
    pub date_order: DateOrder,
    /// Offset used to decide which calendar date a save belongs to.
    pub utc_offset: FixedOffset,
    /// Time credited before the first save of a group without explicit intervals.
    pub lead_in: TimeDelta,
}

impl Default for StatsConfig {
    fn default() -> Self {
        let defaults = AggregateOptions::default();
        Self {
            delta_mode: DeltaMode::default(),
            date_order: defaults.date_order,
            utc_offset: defaults.offset,
            lead_in: defaults.lead_in,
        }
    }
}

impl StatsConfig {
    /// Load statistics settings from environment variables.
    ///
    /// | Env Var                    | Default    |
    /// |----------------------------|------------|
    /// | `STATS_DELTA_MODE`         | `reported` |
    /// | `STATS_DATE_ORDER`         | `desc`     |
    /// | `STATS_UTC_OFFSET_MINUTES` | `0`        |
    /// | `STATS_LEAD_IN_MINUTES`    | `15`       |
    ///
    /// # Panics
    ///
    /// Panics if any variable is set to an unparseable value.
    pub fn from_env() -> Self {
        let delta_mode: DeltaMode = std::env::var("STATS_DELTA_MODE")
            .unwrap_or_else(|_| "reported".into())
            .parse()
            .unwrap_or_else(|e| panic!("{e}"));

        let date_order: DateOrder = std::env::var("STATS_DATE_ORDER")
            .unwrap_or_else(|_| "desc".into())
            .parse()
            .unwrap_or_else(|e| panic!("{e}"));

        let offset_minutes: i32 = std::env::var("STATS_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("STATS_UTC_OFFSET_MINUTES must be a valid i32");
        let utc_offset = offset_from_minutes(offset_minutes).unwrap_or_else(|e| panic!("{e}"));

        let lead_in_minutes: i64 = std::env::var("STATS_LEAD_IN_MINUTES")
            .unwrap_or_else(|_| DEFAULT_LEAD_IN_MINUTES.to_string())
            .parse()
            .expect("STATS_LEAD_IN_MINUTES must be a valid i64");
        assert!(
            lead_in_minutes >= 0,
            "STATS_LEAD_IN_MINUTES must not be negative"
        );

        Self {
            delta_mode,
            date_order,
            utc_offset,
            lead_in: TimeDelta::minutes(lead_in_minutes),
        }
    }

    /// Aggregation options for a request limited to `range`.
    pub fn aggregate_options(&self, range: DateRange) -> AggregateOptions {
        AggregateOptions {
            offset: self.utc_offset,
            lead_in: self.lead_in,
            date_order: self.date_order,
            range,
        }
    }
}
