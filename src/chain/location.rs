//! H3 location helpers. Hotspots assert at resolution 12.

use crate::error::{OnboardingError, Result};
use h3o::{LatLng, Resolution};

pub const LOCATION_RESOLUTION: Resolution = Resolution::Twelve;

/// H3 cell index for a coordinate.
pub fn h3_location(lat: f64, lng: f64) -> Result<u64> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(OnboardingError::InvalidLocation {
            lat,
            lng,
            reason: "coordinate out of range".to_string(),
        });
    }
    let coord = LatLng::new(lat, lng).map_err(|e| OnboardingError::InvalidLocation {
        lat,
        lng,
        reason: e.to_string(),
    })?;
    Ok(u64::from(coord.to_cell(LOCATION_RESOLUTION)))
}

/// Location to assert for an optional coordinate pair. A missing or zero
/// component means "leave the location alone".
pub fn requested_location(lat: Option<f64>, lng: Option<f64>) -> Result<Option<u64>> {
    match (lat, lng) {
        (Some(lat), Some(lng)) if lat != 0.0 && lng != 0.0 => h3_location(lat, lng).map(Some),
        _ => Ok(None),
    }
}

/// A first-time assert, an unknown target, or a moved hotspot all count as a change.
pub fn location_changed(previous: Option<u64>, next: Option<u64>) -> bool {
    match (previous, next) {
        (Some(previous), Some(next)) => previous != next,
        _ => true,
    }
}

/// Hex form of an H3 index, as shown by explorers.
pub fn location_to_hex(location: u64) -> String {
    format!("{location:x}")
}
