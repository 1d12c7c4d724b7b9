//! Service alert normalization.

use crate::model::{Alert, RawFeedEntity};

pub const DEFAULT_ALERT_HEADER: &str = "Service Alert";
pub const DEFAULT_ALERT_DESCRIPTION: &str = "Check grt.ca for details.";

fn first_translation<'a>(translations: &'a [String], fallback: &'a str) -> &'a str {
    translations.first().map(String::as_str).unwrap_or(fallback)
}

/// Converts alert entities in feed order. Missing text is defaulted, never dropped.
pub fn normalize_alerts(feed: &[RawFeedEntity]) -> Vec<Alert> {
    feed.iter()
        .filter_map(|entity| {
            let alert = entity.alert()?;
            Some(Alert {
                id: entity.id.clone(),
                header: first_translation(&alert.header, DEFAULT_ALERT_HEADER).to_string(),
                description: first_translation(&alert.description, DEFAULT_ALERT_DESCRIPTION)
                    .to_string(),
                affected_routes: alert
                    .informed_route_ids
                    .iter()
                    .flatten()
                    .filter(|route| !route.is_empty())
                    .cloned()
                    .collect(),
            })
        })
        .collect()
}
