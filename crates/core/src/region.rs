//! Coarse city-to-region mapping for the admin heatmap.

/// Known city/region pairs. Matching is substring-based in both
/// directions so `"Jeddah - King Rd Branch"` still resolves.
const REGIONS: &[(&str, &str)] = &[
    ("Riyadh", "Riyadh"),
    ("Jeddah", "Makkah"),
    ("Mecca", "Makkah"),
    ("Makkah", "Makkah"),
    ("Taif", "Makkah"),
    ("Dammam", "Eastern Province"),
    ("Khobar", "Eastern Province"),
    ("Dhahran", "Eastern Province"),
    ("Medina", "Madinah"),
    ("Madinah", "Madinah"),
    ("Abha", "Asir"),
    ("Tabuk", "Tabuk"),
    ("Hail", "Hail"),
    ("Buraydah", "Qassim"),
];

/// Resolve the administrative region for a location string, if known.
pub fn region_for_location(location: &str) -> Option<&'static str> {
    for (city, region) in REGIONS {
        if location.contains(city) || city.contains(location) {
            return Some(region);
        }
    }
    None
}
