//! Distance-based delivery pricing.
//!
//! Pure and total for every non-negative distance. Callers use this to
//! construct a [`crate::DeliveryOption`] price before selecting it on the
//! cart; the cart itself has no knowledge of distances.

/// Flat fee for deliveries up to [`SHORT_RANGE_KM`].
const BASE_FEE: f64 = 250.0;

/// Flat fee for deliveries between [`MID_RANGE_KM`] and [`LONG_RANGE_KM`].
const MID_FEE: f64 = 345.0;

/// Fee added per kilometer beyond [`LONG_RANGE_KM`].
const LONG_RANGE_RATE: f64 = 15.0;

/// Upper bound of the flat short-range band.
const SHORT_RANGE_KM: f64 = 5.0;

/// Upper bound of the interpolated band.
const MID_RANGE_KM: f64 = 10.0;

/// Upper bound of the flat mid-range band.
const LONG_RANGE_KM: f64 = 20.0;

/// Delivery fee in currency units for a delivery over `distance_km`
/// kilometers.
///
/// Piecewise-linear: flat up to 5 km, interpolated from 250 to 345 between
/// 5 and 10 km, flat up to 20 km, then 15 per extra kilometer.
pub fn delivery_fee(distance_km: f64) -> f64 {
    if distance_km <= SHORT_RANGE_KM {
        BASE_FEE
    } else if distance_km <= MID_RANGE_KM {
        let per_km = (MID_FEE - BASE_FEE) / (MID_RANGE_KM - SHORT_RANGE_KM);
        BASE_FEE + per_km * (distance_km - SHORT_RANGE_KM)
    } else if distance_km <= LONG_RANGE_KM {
        MID_FEE
    } else {
        MID_FEE + LONG_RANGE_RATE * (distance_km - LONG_RANGE_KM)
    }
}
