use geo::{EuclideanDistance, Point};
use crate::models::LocationPoint;

/// Squared planar distance between two points, exact for any `i32` input
///
/// Used as the ranking key so that ties are detected without floating point
/// error. Each coordinate difference fits in an `i64` and its square in a
/// `u128`, so the sum cannot overflow.
#[inline]
pub fn squared_distance(a: LocationPoint, b: LocationPoint) -> u128 {
    let d_lat = (i64::from(a.latitude) - i64::from(b.latitude)).unsigned_abs() as u128;
    let d_lon = (i64::from(a.longitude) - i64::from(b.longitude)).unsigned_abs() as u128;
    d_lat * d_lat + d_lon * d_lon
}

/// Euclidean distance in raw (lat, lon) degree space treated as a flat plane
///
/// This is not a geodesic distance; results are meaningless as kilometres
/// and degrade near the poles and across the antimeridian.
#[inline]
pub fn euclidean_distance(a: LocationPoint, b: LocationPoint) -> f64 {
    to_point(a).euclidean_distance(&to_point(b))
}

#[inline]
fn to_point(p: LocationPoint) -> Point<f64> {
    Point::new(f64::from(p.longitude), f64::from(p.latitude))
}
