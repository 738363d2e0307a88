//! Great-circle distance between coordinate-bearing location strings.
//!
//! Locations arrive as free text from portals and client devices. When a
//! string embeds a `lat,lon` pair (e.g. `"24.7136,46.6753"` or
//! `"Riyadh (24.71, 46.68)"`) we can compute a real distance; otherwise
//! callers must fall back to string comparison. Coordinates here are
//! self-reported, not verified GPS.

/// Earth radius in kilometres, as used by the Haversine formula.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Compute the Haversine great-circle distance in km between two points.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Extract the first `lat,lon` pair embedded anywhere in a location string.
///
/// Returns `None` when no parseable pair is present. Out-of-range values
/// (|lat| > 90, |lon| > 180) are rejected so street numbers separated by
/// commas are not mistaken for coordinates.
pub fn parse_coordinates(location: &str) -> Option<(f64, f64)> {
    let parts: Vec<&str> = location.split(',').collect();
    for window in parts.windows(2) {
        let lat = trailing_number(window[0]);
        let lon = leading_number(window[1]);
        if let (Some(lat), Some(lon)) = (lat, lon) {
            if lat.abs() <= 90.0 && lon.abs() <= 180.0 {
                return Some((lat, lon));
            }
        }
    }
    None
}

/// Distance in km between two location strings, if both carry coordinates.
pub fn distance_km(loc_a: &str, loc_b: &str) -> Option<f64> {
    let (lat1, lon1) = parse_coordinates(loc_a)?;
    let (lat2, lon2) = parse_coordinates(loc_b)?;
    Some(haversine_km(lat1, lon1, lat2, lon2))
}

/// Parse the trailing numeric token of a string fragment (e.g. the `24.71`
/// in `"Riyadh (24.71"`).
fn trailing_number(fragment: &str) -> Option<f64> {
    let trimmed = fragment.trim_end();
    let start = trimmed
        .rfind(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .map_or(0, |i| i + 1);
    trimmed.get(start..)?.parse().ok()
}

/// Parse the leading numeric token of a string fragment (e.g. the `46.68`
/// in `"46.68)"` or `" 46.68 Jeddah"`).
fn leading_number(fragment: &str) -> Option<f64> {
    let trimmed = fragment.trim_start();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(trimmed.len());
    trimmed.get(..end)?.parse().ok()
}
