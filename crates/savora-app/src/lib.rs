//! Session layer for the Savora client
//!
//! The pieces a UI frontend mounts once per session: the [`Session`]
//! container owning the cart and the notification channel's observable
//! surface, and the geolocation fallback used while geocoding is
//! unavailable.
//!
//! # Components
//!
//! - [`Session`]: dependency-injected state container handed to the UI tree
//!   root; never an ambient module-level global
//! - [`LocationCache`] / [`MemoryLocationCache`]: storage seam for the
//!   last-known device location
//! - [`location_label`]: geocode response parsing with a safe fallback

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod location;
mod session;

pub use location::{
    LOCATION_CACHE_KEY, LOCATION_UNAVAILABLE, LastKnownLocation, LocationCache,
    MemoryLocationCache, location_label,
};
pub use session::Session;
