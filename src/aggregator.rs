//! One aggregation cycle: fan out to every feed, wait for all of them, then
//! index, merge, normalize and assemble.

use std::sync::Arc;

use anyhow::{Result, ensure};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

use crate::alerts::normalize_alerts;
use crate::config::Config;
use crate::delay::build_delay_index;
use crate::fetch::{BasicClient, FeedHeaders, HttpClient, fetch_feed};
use crate::model::{RailStatus, RawFeedEntity, UnifiedSnapshot};
use crate::observe::{FeedObserver, TracingObserver};
use crate::vehicles::{PositionFeeds, merge_vehicles, synthetic_rail};

/// Decoded entities of every feed for one cycle.
#[derive(Debug, Clone, Default)]
pub struct FeedResults {
    pub bus_positions: Vec<RawFeedEntity>,
    pub rail_positions: Vec<RawFeedEntity>,
    pub bus_trip_updates: Vec<RawFeedEntity>,
    pub rail_trip_updates: Vec<RawFeedEntity>,
    pub alerts: Vec<RawFeedEntity>,
}

/// Builds a snapshot from already-fetched feeds.
///
/// # Errors
///
/// Fails only if the assembled vehicles contradict the rail status, which
/// indicates a defect rather than bad upstream data.
pub fn assemble(
    results: &FeedResults,
    rail_route_id: &str,
    now: DateTime<Utc>,
) -> Result<UnifiedSnapshot> {
    let epoch = now.timestamp();

    // Bus before rail: the rail feed wins on duplicate trip ids.
    let delays = build_delay_index(&[
        results.bus_trip_updates.as_slice(),
        results.rail_trip_updates.as_slice(),
    ]);
    debug!(trips = delays.len(), "Delay index built");

    let merged = merge_vehicles(
        PositionFeeds {
            bus: &results.bus_positions,
            rail: &results.rail_positions,
        },
        &delays,
        rail_route_id,
        epoch,
    );
    let alerts = normalize_alerts(&results.alerts);

    let rail_status = if merged.rail_live {
        RailStatus::Live
    } else {
        RailStatus::Demo
    };

    let placeholder = synthetic_rail(rail_route_id, epoch);
    let placeholders = merged
        .vehicles
        .iter()
        .filter(|v| **v == placeholder)
        .count();
    let expected = match rail_status {
        RailStatus::Live => 0,
        RailStatus::Demo => 1,
    };
    ensure!(
        placeholders == expected,
        "snapshot has {placeholders} synthetic rail vehicles with rail status {rail_status:?}"
    );

    Ok(UnifiedSnapshot {
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        vehicles: merged.vehicles,
        alerts,
        rail_status,
    })
}

/// Produces snapshots on demand. Holds configuration and a transport but no
/// per-cycle state.
pub struct Aggregator<C = FeedHeaders<BasicClient>> {
    client: C,
    config: Config,
    observer: Arc<dyn FeedObserver>,
}

impl Aggregator {
    /// Builds an aggregator with the default transport and `tracing` reporting.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = FeedHeaders::new(BasicClient::new()?, &config.user_agent)?;
        Ok(Self::with_client(client, config, Arc::new(TracingObserver)))
    }
}

impl<C: HttpClient> Aggregator<C> {
    pub fn with_client(client: C, config: Config, observer: Arc<dyn FeedObserver>) -> Self {
        Self {
            client,
            config,
            observer,
        }
    }

    /// Fetches all five feeds concurrently. Each fetch is fault-isolated, so
    /// this cannot fail.
    pub async fn fetch_all(&self) -> FeedResults {
        let feeds = &self.config.feeds;
        let observer = &*self.observer;

        let (bus_positions, rail_positions, bus_trip_updates, rail_trip_updates, alerts) = tokio::join!(
            fetch_feed(&self.client, &self.config, &feeds.bus_positions, observer),
            fetch_feed(&self.client, &self.config, &feeds.rail_positions, observer),
            fetch_feed(&self.client, &self.config, &feeds.bus_trip_updates, observer),
            fetch_feed(&self.client, &self.config, &feeds.rail_trip_updates, observer),
            fetch_feed(&self.client, &self.config, &feeds.alerts, observer),
        );

        FeedResults {
            bus_positions,
            rail_positions,
            bus_trip_updates,
            rail_trip_updates,
            alerts,
        }
    }

    #[tracing::instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn get_unified_snapshot(&self) -> Result<UnifiedSnapshot> {
        let results = self.fetch_all().await;
        let snapshot = assemble(&results, &self.config.rail_route_id, Utc::now())?;

        info!(
            vehicles = snapshot.vehicles.len(),
            alerts = snapshot.alerts.len(),
            rail_status = ?snapshot.rail_status,
            "Snapshot assembled"
        );
        Ok(snapshot)
    }
}
