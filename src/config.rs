//! Process-wide configuration, resolved once at startup.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! environment variables. The CLI applies its own flags last.
//!
//! ```json
//! {
//!   "base_url": "https://webapps.regionofwaterloo.ca/api/grt-routes/api",
//!   "timeout_secs": 10,
//!   "feeds": {
//!     "bus_positions": { "name": "bus_positions", "path": "vehiclepositions", "kind": "vehicle_positions" }
//!   }
//! }
//! ```

use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::model::{FeedKind, FeedSource};

pub const DEFAULT_BASE_URL: &str = "https://webapps.regionofwaterloo.ca/api/grt-routes/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) grt_snapshot/0.1";
pub const DEFAULT_RAIL_ROUTE_ID: &str = "301";

/// The five upstream feeds, in their fixed roles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedSet {
    pub bus_positions: FeedSource,
    pub rail_positions: FeedSource,
    pub bus_trip_updates: FeedSource,
    pub rail_trip_updates: FeedSource,
    pub alerts: FeedSource,
}

impl Default for FeedSet {
    fn default() -> Self {
        Self {
            bus_positions: FeedSource::new(
                "bus_positions",
                "vehiclepositions",
                FeedKind::VehiclePositions,
            ),
            rail_positions: FeedSource::new(
                "rail_positions",
                "ion/vehiclepositions",
                FeedKind::VehiclePositions,
            ),
            bus_trip_updates: FeedSource::new("bus_trip_updates", "tripupdates", FeedKind::TripUpdates),
            rail_trip_updates: FeedSource::new(
                "rail_trip_updates",
                "ion/tripupdates",
                FeedKind::TripUpdates,
            ),
            alerts: FeedSource::new("alerts", "alerts", FeedKind::Alerts),
        }
    }
}

impl FeedSet {
    /// Message type each role must publish, in [`FeedSet::iter`] order.
    const EXPECTED_KINDS: [FeedKind; 5] = [
        FeedKind::VehiclePositions,
        FeedKind::VehiclePositions,
        FeedKind::TripUpdates,
        FeedKind::TripUpdates,
        FeedKind::Alerts,
    ];

    pub fn iter(&self) -> impl Iterator<Item = &FeedSource> {
        [
            &self.bus_positions,
            &self.rail_positions,
            &self.bus_trip_updates,
            &self.rail_trip_updates,
            &self.alerts,
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub rail_route_id: String,
    pub feeds: FeedSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rail_route_id: DEFAULT_RAIL_ROUTE_ID.to_string(),
            feeds: FeedSet::default(),
        }
    }
}

impl Config {
    /// Loads the config from a JSON file at `path`. Missing keys keep their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{path}'"))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{path}'"))?;
        Ok(config)
    }

    /// Overrides fields from `GRT_*` environment variables.
    pub fn with_env(self) -> Result<Self> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = var("GRT_BASE_URL") {
            self.base_url = url;
        }
        if let Some(secs) = var("GRT_TIMEOUT_SECS") {
            self.timeout_secs = secs
                .parse()
                .with_context(|| format!("GRT_TIMEOUT_SECS is not a number: '{secs}'"))?;
        }
        if let Some(agent) = var("GRT_USER_AGENT") {
            self.user_agent = agent;
        }
        if let Some(route) = var("GRT_RAIL_ROUTE_ID") {
            self.rail_route_id = route;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base URL '{}'", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Base URL must be http or https, got '{}'", url.scheme());
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        if self.rail_route_id.is_empty() {
            bail!("rail_route_id must not be empty");
        }
        for (source, expected) in self.feeds.iter().zip(FeedSet::EXPECTED_KINDS) {
            if source.kind != expected {
                bail!(
                    "Feed '{}' is configured as {:?} but its role needs {:?}",
                    source.name,
                    source.kind,
                    expected
                );
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Joins the base URL and a feed path with exactly one slash.
    pub fn feed_url(&self, source: &FeedSource) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            source.path.trim_start_matches('/')
        )
    }
}
