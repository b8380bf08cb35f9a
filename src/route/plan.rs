//! Resolved route for a simulation run

use super::{Coordinates, Geocoder, RouteDistanceProvider, RouteError};
use crate::types::SimulationConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Route geometry shared by every vehicle in a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePlan {
    /// Starting place as configured
    pub start_name: String,
    /// Ending place as configured
    pub end_name: String,
    /// Resolved starting coordinates
    pub start: Coordinates,
    /// Resolved ending coordinates
    pub end: Coordinates,
    /// Travel distance in miles
    pub distance_miles: f64,
    /// Points along the route, endpoints included
    pub waypoints: Vec<Coordinates>,
    /// Legal speed used to size stationary-mode runs
    pub legal_speed_mph: f64,
}

impl RoutePlan {
    /// Resolve both places and measure the route once, before any vehicle runs
    pub fn resolve(
        config: &SimulationConfig,
        geocoder: &dyn Geocoder,
        provider: &dyn RouteDistanceProvider,
    ) -> Result<Self, RouteError> {
        let start = geocoder.resolve(&config.start_location)?;
        let end = geocoder.resolve(&config.end_location)?;
        let distance_miles = provider.distance_miles(&start, &end)?;

        let mut waypoints = provider.waypoints(&start, &end);
        if waypoints.len() < 2 {
            waypoints = vec![start, end];
        }

        let legal_speed_mph = config
            .legal_speed_policy
            .legal_speed_mph(&config.start_location, &config.end_location);

        info!(
            start = %config.start_location,
            end = %config.end_location,
            distance_miles = distance_miles,
            legal_speed_mph = legal_speed_mph,
            "Route resolved"
        );

        Ok(Self {
            start_name: config.start_location.clone(),
            end_name: config.end_location.clone(),
            start,
            end,
            distance_miles,
            waypoints,
            legal_speed_mph,
        })
    }

    /// Build a plan directly from known geometry
    pub fn from_parts(start: Coordinates, end: Coordinates, distance_miles: f64, legal_speed_mph: f64) -> Self {
        Self {
            start_name: start.to_string(),
            end_name: end.to_string(),
            start,
            end,
            distance_miles,
            waypoints: vec![start, end],
            legal_speed_mph,
        }
    }

    /// Trip duration in hours at the given average speed.
    ///
    /// A speed of zero sizes the run by the legal speed instead.
    pub fn duration_hours(&self, average_speed_mph: f64) -> f64 {
        let speed = if average_speed_mph > 0.0 { average_speed_mph } else { self.legal_speed_mph };
        if speed <= 0.0 {
            return 0.0;
        }
        self.distance_miles / speed
    }

    /// Position after covering `fraction` of the route, walking the waypoints
    pub fn position_at(&self, fraction: f64) -> Coordinates {
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction >= 1.0 {
            return self.waypoints.last().copied().unwrap_or(self.end);
        }
        let segments: Vec<f64> = self
            .waypoints
            .windows(2)
            .map(|pair| pair[0].distance_miles(&pair[1]))
            .collect();
        let total: f64 = segments.iter().sum();

        if total <= 0.0 {
            return self.start.interpolate(&self.end, fraction);
        }

        let mut remaining = fraction * total;
        for (pair, length) in self.waypoints.windows(2).zip(&segments) {
            if remaining <= *length {
                let t = if *length > 0.0 { remaining / length } else { 0.0 };
                return pair[0].interpolate(&pair[1], t);
            }
            remaining -= length;
        }

        self.waypoints.last().copied().unwrap_or(self.end)
    }
}
