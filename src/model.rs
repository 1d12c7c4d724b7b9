//! Domain types shared by the aggregation pipeline.
//!
//! [`RawFeedEntity`] is the decoded, per-cycle input; [`UnifiedSnapshot`] and the
//! records it holds are the client-facing output whose serialized shape is a
//! compatibility contract with existing consumers.

use serde::{Deserialize, Serialize};

/// Which GTFS-Realtime message type a feed publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    VehiclePositions,
    TripUpdates,
    Alerts,
}

/// One upstream binary resource, addressed relative to the configured base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub path: String,
    pub kind: FeedKind,
}

impl FeedSource {
    pub fn new(name: &str, path: &str, kind: FeedKind) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind,
        }
    }
}

/// A decoded feed entity. `payload` is `None` when the entity carries none of
/// the message types this crate understands.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeedEntity {
    pub id: String,
    pub payload: Option<Payload>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Vehicle(VehiclePayload),
    TripUpdate(TripUpdatePayload),
    Alert(AlertPayload),
}

impl RawFeedEntity {
    pub fn vehicle(&self) -> Option<&VehiclePayload> {
        match &self.payload {
            Some(Payload::Vehicle(v)) => Some(v),
            _ => None,
        }
    }

    pub fn trip_update(&self) -> Option<&TripUpdatePayload> {
        match &self.payload {
            Some(Payload::TripUpdate(u)) => Some(u),
            _ => None,
        }
    }

    pub fn alert(&self) -> Option<&AlertPayload> {
        match &self.payload {
            Some(Payload::Alert(a)) => Some(a),
            _ => None,
        }
    }
}

/// Trip reference carried by vehicle and trip-update payloads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripRef {
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub bearing: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehiclePayload {
    pub trip: Option<TripRef>,
    /// Route reported on the vehicle itself rather than on its trip.
    pub route_id: Option<String>,
    pub position: Option<Coordinates>,
    pub timestamp: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripUpdatePayload {
    pub trip: TripRef,
    /// Arrival delay of each stop-time update, in feed order.
    pub stop_arrival_delays: Vec<Option<i32>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertPayload {
    pub header: Vec<String>,
    pub description: Vec<String>,
    pub informed_route_ids: Vec<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    #[serde(rename = "BUS")]
    Bus,
    #[serde(rename = "LRT")]
    Rail,
}

/// A client-ready vehicle record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePosition {
    pub id: String,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub route_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bearing: u16,
    pub delay_seconds: i32,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub header: String,
    pub description: String,
    pub affected_routes: Vec<String>,
}

/// Whether the rail line in a snapshot comes from the live feed or is the
/// synthetic placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RailStatus {
    Live,
    Demo,
}

/// The aggregate result of one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedSnapshot {
    pub timestamp: String,
    pub vehicles: Vec<VehiclePosition>,
    pub alerts: Vec<Alert>,
    #[serde(rename = "ionStatus")]
    pub rail_status: RailStatus,
}
