//! Human-readable label for a pair of coordinates.

use crate::provider::{ReverseGeocode, ReverseGeocoder};

pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// "City, Country" for the coordinates. Never fails: lookup errors and
/// empty answers degrade to [`UNKNOWN_LOCATION`].
pub async fn resolve_label(geocoder: &dyn ReverseGeocoder, latitude: f64, longitude: f64) -> String {
    match geocoder.reverse_geocode(latitude, longitude).await {
        Ok(place) => format_label(&place),
        Err(error) => {
            tracing::warn!(%error, latitude, longitude, "reverse geocoding failed");
            UNKNOWN_LOCATION.to_string()
        }
    }
}

/// City falls back to locality; each missing part reads "Unknown".
pub fn format_label(place: &ReverseGeocode) -> String {
    let settlement = non_empty(&place.city).or_else(|| non_empty(&place.locality));
    let country = non_empty(&place.country_name);

    match (settlement, country) {
        (None, None) => UNKNOWN_LOCATION.to_string(),
        (settlement, country) => format!(
            "{}, {}",
            settlement.unwrap_or(UNKNOWN),
            country.unwrap_or(UNKNOWN)
        ),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeGeocoder;

    fn place(city: Option<&str>, locality: Option<&str>, country: Option<&str>) -> ReverseGeocode {
        ReverseGeocode {
            city: city.map(str::to_string),
            locality: locality.map(str::to_string),
            country_name: country.map(str::to_string),
        }
    }

    #[test]
    fn prefers_city_over_locality() {
        let label = format_label(&place(Some("Karachi"), Some("Saddar"), Some("Pakistan")));
        assert_eq!(label, "Karachi, Pakistan");
    }

    #[test]
    fn empty_city_falls_back_to_locality() {
        let label = format_label(&place(Some(""), Some("Saddar"), Some("Pakistan")));
        assert_eq!(label, "Saddar, Pakistan");
    }

    #[test]
    fn missing_parts_read_unknown() {
        assert_eq!(format_label(&place(None, None, Some("Pakistan"))), "Unknown, Pakistan");
        assert_eq!(format_label(&place(Some("Karachi"), None, None)), "Karachi, Unknown");
        assert_eq!(format_label(&place(None, Some(" "), None)), UNKNOWN_LOCATION);
    }

    #[tokio::test]
    async fn lookup_failure_degrades_to_unknown_location() {
        let geocoder = FakeGeocoder { fail: true };
        assert_eq!(resolve_label(&geocoder, 1.0, 2.0).await, UNKNOWN_LOCATION);
    }

    #[tokio::test]
    async fn successful_lookup_is_formatted() {
        let geocoder = FakeGeocoder::default();
        assert_eq!(resolve_label(&geocoder, 1.5, 2.0).await, "City 1.5, Testland");
    }
}
