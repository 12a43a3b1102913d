//! Geometry Helpers
//!
//! Great-circle distance and delivery-time estimation for the assignment
//! engine. All trigonometry is in radians; distances are geodesic, not
//! road-network based.

use crate::model::GeoPoint;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assumed average courier speed in km/h.
pub const AVG_SPEED_KMH: f64 = 30.0;

/// Haversine distance between two points, in kilometres.
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    // h can drift above 1.0 for antipodal points
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Route distance for one assignment: channel home to order pickup, then
/// pickup to delivery.
pub fn route_distance_km(home: &GeoPoint, pickup: &GeoPoint, delivery: &GeoPoint) -> f64 {
    haversine_km(home, pickup) + haversine_km(pickup, delivery)
}

/// Estimated delivery time in minutes: channel prep time plus travel at the
/// constant average speed.
pub fn delivery_eta_minutes(prep_time_minutes: u32, distance_km: f64) -> f64 {
    f64::from(prep_time_minutes) + distance_km / AVG_SPEED_KMH * 60.0
}
