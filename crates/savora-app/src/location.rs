//! Geolocation fallback.
//!
//! The backend's geocode endpoint turns coordinates into a display label;
//! when it is unreachable or returns garbage, the UI falls back to a fixed
//! label and to the last location the device reported, cached under a fixed
//! key. Only the parsing and the cache seam live here - the HTTP call is
//! the frontend's problem.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed storage key for the cached device location.
pub const LOCATION_CACHE_KEY: &str = "savora:last-location";

/// Display label used when geocoding fails.
pub const LOCATION_UNAVAILABLE: &str = "Location unavailable";

/// Last known device location, cached as a geolocation fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastKnownLocation {
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
    /// Unix epoch milliseconds of the fix.
    pub timestamp: u64,
}

/// Storage seam for the location cache.
///
/// The web frontend backs this with local storage under
/// [`LOCATION_CACHE_KEY`]; tests and headless shells use
/// [`MemoryLocationCache`].
pub trait LocationCache {
    /// Last stored location, if any.
    fn load(&self) -> Option<LastKnownLocation>;

    /// Replace the stored location.
    fn store(&mut self, location: LastKnownLocation);
}

/// In-memory cache for tests and platforms without local storage.
#[derive(Debug, Default)]
pub struct MemoryLocationCache {
    slot: Option<LastKnownLocation>,
}

impl LocationCache for MemoryLocationCache {
    fn load(&self) -> Option<LastKnownLocation> {
        self.slot
    }

    fn store(&mut self, location: LastKnownLocation) {
        self.slot = Some(location);
    }
}

/// Extract a display label from a geocode response body.
///
/// The endpoint answers `{"locationName": ...}` or `{"name": ...}`
/// depending on the provider behind it; anything else (malformed JSON,
/// missing fields, non-string values) falls back to
/// [`LOCATION_UNAVAILABLE`].
pub fn location_label(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["locationName", "name"]
                .iter()
                .find_map(|field| value.get(field).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| LOCATION_UNAVAILABLE.to_string())
}
