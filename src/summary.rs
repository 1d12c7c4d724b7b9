//! Compact counts used for per-cycle logging and feed inspection.

use serde::Serialize;

use crate::model::{RailStatus, RawFeedEntity, UnifiedSnapshot, VehicleType};

/// Vehicles later than this are counted as delayed.
pub const DELAYED_THRESHOLD_SECS: i32 = 60;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SnapshotSummary {
    pub timestamp: String,
    pub buses: usize,
    pub rail: usize,
    pub delayed: usize,
    pub alerts: usize,
    pub ion_status: Option<RailStatus>,
}

impl SnapshotSummary {
    pub fn from_snapshot(snapshot: &UnifiedSnapshot) -> Self {
        let mut s = SnapshotSummary {
            timestamp: snapshot.timestamp.clone(),
            alerts: snapshot.alerts.len(),
            ion_status: Some(snapshot.rail_status),
            ..Default::default()
        };

        for v in &snapshot.vehicles {
            match v.vehicle_type {
                VehicleType::Bus => s.buses += 1,
                VehicleType::Rail => s.rail += 1,
            }
            if v.delay_seconds > DELAYED_THRESHOLD_SECS {
                s.delayed += 1;
            }
        }

        s
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn delayed_pct(&self) -> f64 {
        Self::pct(self.delayed, self.buses + self.rail)
    }
}

/// Per-payload entity counts of one decoded feed.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct FeedCounts {
    pub total_entities: usize,
    pub vehicles: usize,
    pub trip_updates: usize,
    pub alerts: usize,
    pub other: usize,

    pub with_trip_id: usize,
    pub with_route_id: usize,
    pub with_position: usize,
    pub with_bearing: usize,
    pub with_timestamp: usize,
    pub rail_vehicles: usize,
}

impl FeedCounts {
    pub fn from_entities(entities: &[RawFeedEntity], rail_route_id: &str) -> Self {
        let mut s = FeedCounts {
            total_entities: entities.len(),
            ..Default::default()
        };

        for e in entities {
            if let Some(v) = e.vehicle() {
                s.vehicles += 1;

                if let Some(trip) = &v.trip {
                    if trip.trip_id.is_some() {
                        s.with_trip_id += 1;
                    }
                    if trip.route_id.is_some() {
                        s.with_route_id += 1;
                    }
                    if trip.route_id.as_deref() == Some(rail_route_id) {
                        s.rail_vehicles += 1;
                    }
                }

                if let Some(pos) = &v.position {
                    s.with_position += 1;

                    if pos.bearing.is_some() {
                        s.with_bearing += 1;
                    }
                }

                if v.timestamp.is_some() {
                    s.with_timestamp += 1;
                }
            } else if e.trip_update().is_some() {
                s.trip_updates += 1;
            } else if e.alert().is_some() {
                s.alerts += 1;
            } else {
                s.other += 1;
            }
        }

        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alert, Coordinates, Payload, TripRef, VehiclePayload, VehiclePosition};

    fn vehicle(route: &str, delay: i32, vehicle_type: VehicleType) -> VehiclePosition {
        VehiclePosition {
            id: format!("{route}-{delay}"),
            vehicle_type,
            route_id: route.to_string(),
            latitude: 43.0,
            longitude: -80.0,
            bearing: 0,
            delay_seconds: delay,
            timestamp: 0,
        }
    }

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(SnapshotSummary::pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(SnapshotSummary::pct(50, 100), 50.0);
        assert_eq!(SnapshotSummary::pct(1, 4), 25.0);
    }

    #[test]
    fn test_snapshot_summary_counts() {
        let snapshot = UnifiedSnapshot {
            timestamp: "2026-10-17T12:00:00.000Z".to_string(),
            vehicles: vec![
                vehicle("7", 90, VehicleType::Bus),
                vehicle("12", 60, VehicleType::Bus),
                vehicle("301", 120, VehicleType::Rail),
                vehicle("8", -30, VehicleType::Bus),
            ],
            alerts: vec![Alert {
                id: "a1".to_string(),
                header: "h".to_string(),
                description: "d".to_string(),
                affected_routes: vec![],
            }],
            rail_status: RailStatus::Live,
        };

        let summary = SnapshotSummary::from_snapshot(&snapshot);
        assert_eq!(summary.buses, 3);
        assert_eq!(summary.rail, 1);
        assert_eq!(summary.delayed, 2);
        assert_eq!(summary.alerts, 1);
        assert_eq!(summary.ion_status, Some(RailStatus::Live));
        assert_eq!(summary.delayed_pct(), 50.0);
    }

    #[test]
    fn test_feed_counts_empty() {
        let counts = FeedCounts::from_entities(&[], "301");
        assert_eq!(counts, FeedCounts::default());
    }

    #[test]
    fn test_feed_counts_with_vehicle() {
        let entities = vec![
            RawFeedEntity {
                id: "v1".to_string(),
                payload: Some(Payload::Vehicle(VehiclePayload {
                    trip: Some(TripRef {
                        trip_id: Some("R1".to_string()),
                        route_id: Some("301".to_string()),
                    }),
                    position: Some(Coordinates {
                        latitude: 43.0,
                        longitude: -80.0,
                        bearing: Some(180.0),
                    }),
                    route_id: None,
                    timestamp: Some(1234567890),
                })),
            },
            RawFeedEntity {
                id: "x".to_string(),
                payload: None,
            },
        ];

        let counts = FeedCounts::from_entities(&entities, "301");
        assert_eq!(counts.total_entities, 2);
        assert_eq!(counts.vehicles, 1);
        assert_eq!(counts.with_trip_id, 1);
        assert_eq!(counts.with_bearing, 1);
        assert_eq!(counts.with_timestamp, 1);
        assert_eq!(counts.rail_vehicles, 1);
        assert_eq!(counts.other, 1);
    }
}
