//! Protobuf validation and decoding for GTFS Realtime feeds.

use prost::Message;

use crate::error::FeedError;
use crate::gtfs_rt::{self, FeedMessage};
use crate::model::{
    AlertPayload, Coordinates, Payload, RawFeedEntity, TripRef, TripUpdatePayload,
    VehiclePayload,
};

/// Bodies shorter than this are treated as an empty feed.
pub const MIN_FEED_BYTES: usize = 10;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// # Errors
///
/// Returns [`FeedError::Decode`] if the bytes are not valid protobuf for a `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage, FeedError> {
    Ok(FeedMessage::decode(bytes)?)
}

/// Rejects bodies that cannot be a feed before attempting a decode.
pub fn validate(bytes: &[u8]) -> Result<(), FeedError> {
    if bytes.len() < MIN_FEED_BYTES {
        return Err(FeedError::Empty { len: bytes.len() });
    }
    if looks_like_markup(bytes) {
        return Err(FeedError::Malformed);
    }
    Ok(())
}

/// Sniffs for an HTML/XML error page.
///
/// A BOM and leading spaces, tabs and carriage returns are skipped. `0x0A` is
/// never skipped: an encoded `FeedMessage` starts with that header tag, and the
/// next byte is the header length, which may be `<` (60). After a newline, `<`
/// only counts as markup when followed by a letter, `!` or `?`, none of which
/// can start an encoded `FeedHeader`.
fn looks_like_markup(bytes: &[u8]) -> bool {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let start = body
        .iter()
        .position(|b| !matches!(b, b' ' | b'\t' | b'\r'))
        .unwrap_or(body.len());

    match &body[start..] {
        [b'<', ..] => true,
        [b'\n', b'<', next, ..] => next.is_ascii_alphabetic() || matches!(next, b'!' | b'?'),
        _ => false,
    }
}

/// Validates, decodes and converts a feed body in one step.
pub fn decode_entities(bytes: &[u8]) -> Result<Vec<RawFeedEntity>, FeedError> {
    validate(bytes)?;
    let feed = parse_feed(bytes)?;
    Ok(to_raw_entities(feed))
}

/// Converts every entity of a decoded feed, preserving feed order.
pub fn to_raw_entities(feed: FeedMessage) -> Vec<RawFeedEntity> {
    feed.entity.into_iter().map(to_raw_entity).collect()
}

fn to_raw_entity(entity: gtfs_rt::FeedEntity) -> RawFeedEntity {
    let payload = if let Some(v) = entity.vehicle {
        Some(Payload::Vehicle(vehicle_payload(v)))
    } else if let Some(u) = entity.trip_update {
        Some(Payload::TripUpdate(trip_update_payload(u)))
    } else {
        entity.alert.map(|a| Payload::Alert(alert_payload(a)))
    };

    RawFeedEntity {
        id: entity.id,
        payload,
    }
}

fn trip_ref(trip: gtfs_rt::TripDescriptor) -> TripRef {
    TripRef {
        trip_id: trip.trip_id,
        route_id: trip.route_id,
    }
}

fn vehicle_payload(v: gtfs_rt::VehiclePosition) -> VehiclePayload {
    VehiclePayload {
        trip: v.trip.map(trip_ref),
        // GTFS-RT has no route field on the vehicle descriptor.
        route_id: None,
        position: v.position.map(|p| Coordinates {
            latitude: f64::from(p.latitude),
            longitude: f64::from(p.longitude),
            bearing: p.bearing,
        }),
        timestamp: v.timestamp,
    }
}

fn trip_update_payload(u: gtfs_rt::TripUpdate) -> TripUpdatePayload {
    TripUpdatePayload {
        trip: trip_ref(u.trip),
        stop_arrival_delays: u
            .stop_time_update
            .into_iter()
            .map(|stu| stu.arrival.and_then(|a| a.delay))
            .collect(),
    }
}

fn translations(text: Option<gtfs_rt::TranslatedString>) -> Vec<String> {
    text.map(|t| t.translation.into_iter().map(|tr| tr.text).collect())
        .unwrap_or_default()
}

fn alert_payload(a: gtfs_rt::Alert) -> AlertPayload {
    AlertPayload {
        header: translations(a.header_text),
        description: translations(a.description_text),
        informed_route_ids: a.informed_entity.into_iter().map(|ie| ie.route_id).collect(),
    }
}
