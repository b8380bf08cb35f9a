//! Place name resolution

use super::{strip_country, Coordinates, RouteError};
use std::collections::HashMap;
use tracing::debug;

/// Resolves a place name to coordinates
pub trait Geocoder: Send + Sync {
    /// Resolve a place, failing when it cannot be located
    fn resolve(&self, place: &str) -> Result<Coordinates, RouteError>;
}

/// Built-in US city table for offline runs
const KNOWN_CITIES: &[(&str, f64, f64)] = &[
    ("albuquerque, nm", 35.0844, -106.6504),
    ("atlanta, ga", 33.7490, -84.3880),
    ("austin, tx", 30.2672, -97.7431),
    ("bakersfield, ca", 35.3733, -119.0187),
    ("boise, id", 43.6150, -116.2023),
    ("boston, ma", 42.3601, -71.0589),
    ("charlotte, nc", 35.2271, -80.8431),
    ("chicago, il", 41.8781, -87.6298),
    ("cleveland, oh", 41.4993, -81.6944),
    ("dallas, tx", 32.7767, -96.7970),
    ("denver, co", 39.7392, -104.9903),
    ("detroit, mi", 42.3314, -83.0458),
    ("el paso, tx", 31.7619, -106.4850),
    ("fresno, ca", 36.7378, -119.7871),
    ("houston, tx", 29.7604, -95.3698),
    ("indianapolis, in", 39.7684, -86.1581),
    ("jacksonville, fl", 30.3322, -81.6557),
    ("kansas city, mo", 39.0997, -94.5786),
    ("las vegas, nv", 36.1699, -115.1398),
    ("los angeles, ca", 34.0522, -118.2437),
    ("memphis, tn", 35.1495, -90.0490),
    ("miami, fl", 25.7617, -80.1918),
    ("minneapolis, mn", 44.9778, -93.2650),
    ("nashville, tn", 36.1627, -86.7816),
    ("new orleans, la", 29.9511, -90.0715),
    ("new york, ny", 40.7128, -74.0060),
    ("oklahoma city, ok", 35.4676, -97.5164),
    ("orlando, fl", 28.5383, -81.3792),
    ("philadelphia, pa", 39.9526, -75.1652),
    ("phoenix, az", 33.4484, -112.0740),
    ("portland, or", 45.5152, -122.6784),
    ("reno, nv", 39.5296, -119.8138),
    ("sacramento, ca", 38.5816, -121.4944),
    ("salt lake city, ut", 40.7608, -111.8910),
    ("san antonio, tx", 29.4241, -98.4936),
    ("san diego, ca", 32.7157, -117.1611),
    ("san francisco, ca", 37.7749, -122.4194),
    ("san jose, ca", 37.3382, -121.8863),
    ("seattle, wa", 47.6062, -122.3321),
    ("st. louis, mo", 38.6270, -90.1994),
    ("tucson, az", 32.2226, -110.9747),
    ("washington, dc", 38.9072, -77.0369),
];

/// Offline geocoder backed by a city table, literal coordinates and registered places
#[derive(Debug, Clone)]
pub struct StaticGeocoder {
    places: HashMap<String, Coordinates>,
}

impl StaticGeocoder {
    /// Create a geocoder preloaded with the built-in city table
    pub fn new() -> Self {
        let places = KNOWN_CITIES
            .iter()
            .map(|&(name, latitude, longitude)| {
                (name.to_string(), Coordinates { latitude, longitude })
            })
            .collect();
        Self { places }
    }

    /// Create a geocoder that knows only literal coordinates and registered places
    pub fn empty() -> Self {
        Self { places: HashMap::new() }
    }

    /// Register an additional place
    pub fn with_place(mut self, name: &str, coordinates: Coordinates) -> Self {
        self.places.insert(normalize(name), coordinates);
        self
    }

    /// Number of places the geocoder knows by name
    pub fn len(&self) -> usize {
        self.places.len()
    }

    /// Check whether no named places are known
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl Default for StaticGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Geocoder for StaticGeocoder {
    fn resolve(&self, place: &str) -> Result<Coordinates, RouteError> {
        if let Some(coordinates) = parse_literal(place)? {
            return Ok(coordinates);
        }

        let key = normalize(place);
        match self.places.get(&key) {
            Some(coordinates) => {
                debug!(place = %place, coordinates = %coordinates, "Resolved place");
                Ok(*coordinates)
            }
            None => Err(RouteError::UnknownLocation(place.to_string())),
        }
    }
}

/// Parse "lat,lon"; Ok(None) when the text is not a coordinate pair
fn parse_literal(place: &str) -> Result<Option<Coordinates>, RouteError> {
    let Some((lat, lon)) = place.split_once(',') else {
        return Ok(None);
    };
    match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
        (Ok(latitude), Ok(longitude)) => Coordinates::new(latitude, longitude).map(Some),
        _ => Ok(None),
    }
}

fn normalize(place: &str) -> String {
    strip_country(place)
        .split(',')
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join(", ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_known_cities_case_insensitively() {
        let geocoder = StaticGeocoder::new();
        let a = geocoder.resolve("San Diego, CA").unwrap();
        let b = geocoder.resolve("  san   diego,ca, USA ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.latitude, 32.7157);
    }

    #[test]
    fn test_resolves_literal_coordinates() {
        let geocoder = StaticGeocoder::empty();
        let c = geocoder.resolve("40.5, -111.25").unwrap();
        assert_eq!(c, Coordinates { latitude: 40.5, longitude: -111.25 });
        assert!(matches!(
            geocoder.resolve("140.5, -111.25"),
            Err(RouteError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn test_unknown_place_fails() {
        let geocoder = StaticGeocoder::new();
        assert_eq!(
            geocoder.resolve("Atlantis, XX"),
            Err(RouteError::UnknownLocation("Atlantis, XX".to_string()))
        );
    }

    #[test]
    fn test_registered_places() {
        let depot = Coordinates { latitude: 33.0, longitude: -117.0 };
        let geocoder = StaticGeocoder::empty().with_place("Depot, CA", depot);
        assert_eq!(geocoder.len(), 1);
        assert_eq!(geocoder.resolve("depot, ca").unwrap(), depot);
    }
}
