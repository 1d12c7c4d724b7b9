//! Vehicle merge: positions + delays → client-ready vehicle records.

use tracing::debug;

use crate::delay::DelayIndex;
use crate::model::{RawFeedEntity, VehiclePayload, VehiclePosition, VehicleType};

pub const UNKNOWN_ROUTE: &str = "Unknown";

/// Placeholder rail vehicle emitted when the rail position feed is empty.
pub const SYNTHETIC_RAIL_ID: &str = "ION-DEMO";
pub const SYNTHETIC_RAIL_LATITUDE: f64 = 43.4723;
pub const SYNTHETIC_RAIL_LONGITUDE: f64 = -80.5449;
pub const SYNTHETIC_RAIL_DELAY_SECS: i32 = 120;

/// Decoded position feeds for one cycle, one per vehicle class.
#[derive(Debug, Clone, Copy)]
pub struct PositionFeeds<'a> {
    pub bus: &'a [RawFeedEntity],
    pub rail: &'a [RawFeedEntity],
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedVehicles {
    pub vehicles: Vec<VehiclePosition>,
    pub rail_live: bool,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

/// Route id resolution order: the trip's route, then the vehicle's own route,
/// then [`UNKNOWN_ROUTE`]. Empty strings count as absent at every step.
pub fn resolve_route_id(vehicle: &VehiclePayload) -> &str {
    non_empty(vehicle.trip.as_ref().and_then(|t| t.route_id.as_ref()))
        .or_else(|| non_empty(vehicle.route_id.as_ref()))
        .unwrap_or(UNKNOWN_ROUTE)
}

pub fn resolve_trip_id(vehicle: &VehiclePayload) -> Option<&str> {
    non_empty(vehicle.trip.as_ref().and_then(|t| t.trip_id.as_ref()))
}

pub fn classify(route_id: &str, rail_route_id: &str) -> VehicleType {
    if route_id == rail_route_id {
        VehicleType::Rail
    } else {
        VehicleType::Bus
    }
}

/// Rounds a compass bearing into `0..360`; missing or non-finite values become 0.
pub fn normalize_bearing(bearing: Option<f32>) -> u16 {
    match bearing {
        Some(b) if b.is_finite() => (b.round() as i64).rem_euclid(360) as u16,
        _ => 0,
    }
}

pub fn synthetic_rail(rail_route_id: &str, now: i64) -> VehiclePosition {
    VehiclePosition {
        id: SYNTHETIC_RAIL_ID.to_string(),
        vehicle_type: VehicleType::Rail,
        route_id: rail_route_id.to_string(),
        latitude: SYNTHETIC_RAIL_LATITUDE,
        longitude: SYNTHETIC_RAIL_LONGITUDE,
        bearing: 0,
        delay_seconds: SYNTHETIC_RAIL_DELAY_SECS,
        timestamp: now,
    }
}

/// Merges bus then rail positions with `delays`.
///
/// `now` (epoch seconds) fills missing vehicle timestamps and stamps the
/// synthetic rail entry, which is appended only when the rail feed had no
/// entities at all.
pub fn merge_vehicles(
    feeds: PositionFeeds<'_>,
    delays: &DelayIndex,
    rail_route_id: &str,
    now: i64,
) -> MergedVehicles {
    let rail_live = !feeds.rail.is_empty();

    let mut vehicles: Vec<VehiclePosition> = feeds
        .bus
        .iter()
        .chain(feeds.rail.iter())
        .filter_map(|entity| {
            let vehicle = entity.vehicle()?;
            let Some(position) = vehicle.position else {
                debug!(entity_id = %entity.id, "Skipping vehicle without position");
                return None;
            };

            let route_id = resolve_route_id(vehicle);
            let delay_seconds = resolve_trip_id(vehicle)
                .and_then(|trip_id| delays.get(trip_id))
                .copied()
                .unwrap_or(0);

            Some(VehiclePosition {
                id: entity.id.clone(),
                vehicle_type: classify(route_id, rail_route_id),
                route_id: route_id.to_string(),
                latitude: position.latitude,
                longitude: position.longitude,
                bearing: normalize_bearing(position.bearing),
                delay_seconds,
                timestamp: vehicle
                    .timestamp
                    .and_then(|t| i64::try_from(t).ok())
                    .unwrap_or(now),
            })
        })
        .collect();

    if !rail_live {
        vehicles.push(synthetic_rail(rail_route_id, now));
    }

    MergedVehicles {
        vehicles,
        rail_live,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, Payload, TripRef};

    const NOW: i64 = 1_760_000_000;

    fn vehicle(id: &str, route: Option<&str>, trip: Option<&str>) -> RawFeedEntity {
        RawFeedEntity {
            id: id.to_string(),
            payload: Some(Payload::Vehicle(VehiclePayload {
                trip: Some(TripRef {
                    trip_id: trip.map(str::to_string),
                    route_id: route.map(str::to_string),
                }),
                route_id: None,
                position: Some(Coordinates {
                    latitude: 43.45,
                    longitude: -80.49,
                    bearing: None,
                }),
                timestamp: None,
            })),
        }
    }

    #[test]
    fn test_route_fallback_chain() {
        let mut v = VehiclePayload {
            trip: Some(TripRef {
                trip_id: None,
                route_id: Some("7".to_string()),
            }),
            route_id: Some("8".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_route_id(&v), "7");

        v.trip = None;
        assert_eq!(resolve_route_id(&v), "8");

        v.trip = Some(TripRef {
            trip_id: None,
            route_id: Some(String::new()),
        });
        assert_eq!(resolve_route_id(&v), "8");

        v.route_id = None;
        assert_eq!(resolve_route_id(&v), UNKNOWN_ROUTE);
    }

    #[test]
    fn test_classify_is_exact_match() {
        assert_eq!(classify("301", "301"), VehicleType::Rail);
        assert_eq!(classify("3010", "301"), VehicleType::Bus);
        assert_eq!(classify(" 301", "301"), VehicleType::Bus);
        assert_eq!(classify(UNKNOWN_ROUTE, "301"), VehicleType::Bus);
        assert_eq!(classify("7", "301"), VehicleType::Bus);
    }

    #[test]
    fn test_normalize_bearing() {
        assert_eq!(normalize_bearing(None), 0);
        assert_eq!(normalize_bearing(Some(359.4)), 359);
        assert_eq!(normalize_bearing(Some(359.6)), 0);
        assert_eq!(normalize_bearing(Some(-90.0)), 270);
        assert_eq!(normalize_bearing(Some(f32::NAN)), 0);
    }

    #[test]
    fn test_bus_vehicle_gets_delay() {
        let bus = vec![vehicle("b1", Some("7"), Some("T1"))];
        let rail = vec![vehicle("r1", Some("301"), Some("R1"))];
        let delays: DelayIndex = [("T1".to_string(), 90)].into_iter().collect();

        let merged = merge_vehicles(
            PositionFeeds {
                bus: &bus,
                rail: &rail,
            },
            &delays,
            "301",
            NOW,
        );

        assert!(merged.rail_live);
        assert_eq!(merged.vehicles.len(), 2);
        let b = &merged.vehicles[0];
        assert_eq!(b.route_id, "7");
        assert_eq!(b.vehicle_type, VehicleType::Bus);
        assert_eq!(b.delay_seconds, 90);
        assert_eq!(b.bearing, 0);
        assert_eq!(b.timestamp, NOW);

        let r = &merged.vehicles[1];
        assert_eq!(r.vehicle_type, VehicleType::Rail);
        assert_eq!(r.delay_seconds, 0);
        assert!(merged.vehicles.iter().all(|v| v.id != SYNTHETIC_RAIL_ID));
    }

    #[test]
    fn test_vehicle_without_trip_id_has_zero_delay() {
        let bus = vec![vehicle("b1", Some("7"), None)];
        let delays: DelayIndex = [("T1".to_string(), 90)].into_iter().collect();
        let merged = merge_vehicles(
            PositionFeeds {
                bus: &bus,
                rail: &[],
            },
            &delays,
            "301",
            NOW,
        );
        assert_eq!(merged.vehicles[0].delay_seconds, 0);
    }

    #[test]
    fn test_empty_rail_feed_adds_one_synthetic_vehicle() {
        let bus = vec![vehicle("b1", Some("7"), None)];
        let merged = merge_vehicles(
            PositionFeeds {
                bus: &bus,
                rail: &[],
            },
            &DelayIndex::new(),
            "301",
            NOW,
        );

        assert!(!merged.rail_live);
        let synthetic: Vec<_> = merged
            .vehicles
            .iter()
            .filter(|v| v.id == SYNTHETIC_RAIL_ID)
            .collect();
        assert_eq!(synthetic.len(), 1);
        assert_eq!(synthetic[0].vehicle_type, VehicleType::Rail);
        assert_eq!(synthetic[0].route_id, "301");
        assert_eq!(synthetic[0].latitude, SYNTHETIC_RAIL_LATITUDE);
        assert_eq!(synthetic[0].longitude, SYNTHETIC_RAIL_LONGITUDE);
        assert_ne!(synthetic[0].delay_seconds, 0);
        assert_eq!(synthetic[0].timestamp, NOW);
    }

    #[test]
    fn test_rail_feed_with_only_non_vehicle_entities_is_live() {
        let rail = vec![RawFeedEntity {
            id: "odd".to_string(),
            payload: None,
        }];
        let merged = merge_vehicles(
            PositionFeeds {
                bus: &[],
                rail: &rail,
            },
            &DelayIndex::new(),
            "301",
            NOW,
        );
        assert!(merged.rail_live);
        assert!(merged.vehicles.is_empty());
    }

    #[test]
    fn test_feed_timestamp_and_bearing_kept() {
        let mut entity = vehicle("b1", Some("12"), None);
        if let Some(Payload::Vehicle(v)) = entity.payload.as_mut() {
            v.timestamp = Some(1_700_000_123);
            v.position = Some(Coordinates {
                latitude: 43.0,
                longitude: -80.0,
                bearing: Some(45.0),
            });
        }
        let bus = vec![entity];
        let merged = merge_vehicles(
            PositionFeeds {
                bus: &bus,
                rail: &[],
            },
            &DelayIndex::new(),
            "301",
            NOW,
        );
        assert_eq!(merged.vehicles[0].timestamp, 1_700_000_123);
        assert_eq!(merged.vehicles[0].bearing, 45);
    }

    #[test]
    fn test_drops_entities_without_vehicle_or_position() {
        let mut no_position = vehicle("b2", Some("7"), None);
        if let Some(Payload::Vehicle(v)) = no_position.payload.as_mut() {
            v.position = None;
        }
        let bus = vec![
            RawFeedEntity {
                id: "b0".to_string(),
                payload: None,
            },
            vehicle("b1", Some("7"), None),
            no_position,
        ];
        let rail = vec![vehicle("r1", Some("301"), None)];
        let merged = merge_vehicles(
            PositionFeeds {
                bus: &bus,
                rail: &rail,
            },
            &DelayIndex::new(),
            "301",
            NOW,
        );
        let ids: Vec<_> = merged.vehicles.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "r1"]);
    }
}
