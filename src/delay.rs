//! Trip id → delay lookup built from trip-update feeds.

use std::collections::HashMap;

use crate::model::{RawFeedEntity, TripUpdatePayload};

pub type DelayIndex = HashMap<String, i32>;

/// Delay of the first stop-time update's arrival; later stops are ignored.
pub fn first_stop_delay(update: &TripUpdatePayload) -> i32 {
    update
        .stop_arrival_delays
        .first()
        .copied()
        .flatten()
        .unwrap_or(0)
}

/// Builds the delay index from `feeds`, walked in slice order.
///
/// When a trip id appears more than once, the later occurrence wins, so callers
/// must pass feeds in their documented order (bus before rail).
pub fn build_delay_index(feeds: &[&[RawFeedEntity]]) -> DelayIndex {
    let mut index = DelayIndex::new();

    for entity in feeds.iter().flat_map(|feed| feed.iter()) {
        let Some(update) = entity.trip_update() else {
            continue;
        };
        let Some(trip_id) = update.trip.trip_id.as_deref().filter(|id| !id.is_empty()) else {
            continue;
        };
        index.insert(trip_id.to_string(), first_stop_delay(update));
    }

    index
}
