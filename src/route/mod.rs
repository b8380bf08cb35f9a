//! Route resolution for simulated trips
//!
//! This module resolves the configured start and end places into coordinates,
//! measures the trip distance, and decides the legal speed used to size
//! stationary-mode runs. Both lookups sit behind traits so the simulation can
//! be driven by deterministic fakes.
//!
//! # Usage Example
//!
//! ```rust
//! use tpms_telemetry_simulator::route::*;
//! use tpms_telemetry_simulator::types::SimulationConfig;
//!
//! let config = SimulationConfig::default();
//! let plan = RoutePlan::resolve(&config, &StaticGeocoder::new(), &StraightLineRouteProvider::new())?;
//! assert!(plan.distance_miles > 100.0);
//! # Ok::<(), RouteError>(())
//! ```

pub mod distance;
pub mod geocoder;
pub mod plan;

pub use distance::*;
pub use geocoder::*;
pub use plan::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mean Earth radius in statute miles
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Speed used for stationary-mode duration when both places are in one state
pub const INTRASTATE_SPEED_MPH: f64 = 55.0;

/// Speed used for stationary-mode duration when the trip crosses a state line
pub const INTERSTATE_SPEED_MPH: f64 = 65.0;

/// Errors raised while resolving a route
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    /// The geocoder has no entry for the place
    #[error("Could not find location: {0}")]
    UnknownLocation(String),

    /// Literal coordinates were outside the valid range
    #[error("Invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates {
        /// Parsed latitude
        latitude: f64,
        /// Parsed longitude
        longitude: f64,
    },

    /// The distance provider could not produce a distance
    #[error("Route distance unavailable: {0}")]
    DistanceUnavailable(String),
}

/// A point on the Earth's surface in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude, -90 to 90
    pub latitude: f64,
    /// Longitude, -180 to 180
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting values outside the valid range
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, RouteError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(RouteError::InvalidCoordinates { latitude, longitude });
        }
        Ok(Self { latitude, longitude })
    }

    /// Great-circle distance in miles (Haversine formula)
    pub fn distance_miles(&self, other: &Coordinates) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_MILES * c
    }

    /// Linear interpolation towards `other`; `t` is clamped to [0, 1]
    pub fn interpolate(&self, other: &Coordinates, t: f64) -> Coordinates {
        let t = t.clamp(0.0, 1.0);
        Coordinates {
            latitude: self.latitude + (other.latitude - self.latitude) * t,
            longitude: self.longitude + (other.longitude - self.longitude) * t,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Which legal speed sizes a stationary-mode run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalSpeedPolicy {
    /// Compare the state suffixes of the two place names
    Auto,
    /// Always 55 mph
    Intrastate,
    /// Always 65 mph
    Interstate,
}

impl LegalSpeedPolicy {
    /// Legal speed in mph for a trip between the two named places.
    ///
    /// `Auto` falls back to the interstate speed when either place has no
    /// recognizable two-letter state suffix (for example literal coordinates).
    pub fn legal_speed_mph(&self, start: &str, end: &str) -> f64 {
        match self {
            LegalSpeedPolicy::Intrastate => INTRASTATE_SPEED_MPH,
            LegalSpeedPolicy::Interstate => INTERSTATE_SPEED_MPH,
            LegalSpeedPolicy::Auto => match (state_suffix(start), state_suffix(end)) {
                (Some(a), Some(b)) if a == b => INTRASTATE_SPEED_MPH,
                _ => INTERSTATE_SPEED_MPH,
            },
        }
    }
}

impl fmt::Display for LegalSpeedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegalSpeedPolicy::Auto => write!(f, "auto"),
            LegalSpeedPolicy::Intrastate => write!(f, "intrastate"),
            LegalSpeedPolicy::Interstate => write!(f, "interstate"),
        }
    }
}

impl FromStr for LegalSpeedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(LegalSpeedPolicy::Auto),
            "intrastate" => Ok(LegalSpeedPolicy::Intrastate),
            "interstate" => Ok(LegalSpeedPolicy::Interstate),
            _ => Err(format!("Unknown legal speed policy: {}", s)),
        }
    }
}

/// Extract the upper-cased two-letter state code from "City, ST[, USA]"
pub fn state_suffix(place: &str) -> Option<String> {
    let normalized = strip_country(place);
    let (_, suffix) = normalized.rsplit_once(',')?;
    let suffix = suffix.trim();
    if suffix.len() == 2 && suffix.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(suffix.to_ascii_uppercase())
    } else {
        None
    }
}

/// Drop a trailing ", USA" / ", US" country qualifier
pub(crate) fn strip_country(place: &str) -> &str {
    let trimmed = place.trim();
    for suffix in [", usa", ", us", ",usa", ",us"] {
        if trimmed.len() > suffix.len() {
            let split = trimmed.len() - suffix.len();
            if trimmed.is_char_boundary(split) && trimmed[split..].eq_ignore_ascii_case(suffix) {
                return trimmed[..split].trim_end();
            }
        }
    }
    trimmed
}
