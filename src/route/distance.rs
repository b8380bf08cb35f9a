//! Route distance providers

use super::{Coordinates, RouteError};

/// Multiplier applied to great-circle distance to approximate road mileage
pub const ROAD_DISTANCE_FACTOR: f64 = 1.2;

/// Measures the travel distance between two points
pub trait RouteDistanceProvider: Send + Sync {
    /// Travel distance in miles
    fn distance_miles(&self, from: &Coordinates, to: &Coordinates) -> Result<f64, RouteError>;

    /// Points along the route, first and last being the endpoints
    fn waypoints(&self, from: &Coordinates, to: &Coordinates) -> Vec<Coordinates> {
        vec![*from, *to]
    }
}

/// Great-circle distance scaled by the road factor
#[derive(Debug, Clone, Copy)]
pub struct StraightLineRouteProvider {
    factor: f64,
}

impl StraightLineRouteProvider {
    /// Create a provider using the default road factor
    pub fn new() -> Self {
        Self { factor: ROAD_DISTANCE_FACTOR }
    }

    /// Create a provider with a custom road factor
    pub fn with_factor(factor: f64) -> Self {
        Self { factor }
    }
}

impl Default for StraightLineRouteProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteDistanceProvider for StraightLineRouteProvider {
    fn distance_miles(&self, from: &Coordinates, to: &Coordinates) -> Result<f64, RouteError> {
        Ok(from.distance_miles(to) * self.factor)
    }
}

/// Reports a caller-supplied distance regardless of the endpoints
#[derive(Debug, Clone, Copy)]
pub struct FixedDistanceProvider {
    miles: f64,
}

impl FixedDistanceProvider {
    /// Create a provider for a fixed mileage
    pub fn new(miles: f64) -> Self {
        Self { miles }
    }
}

impl RouteDistanceProvider for FixedDistanceProvider {
    fn distance_miles(&self, _from: &Coordinates, _to: &Coordinates) -> Result<f64, RouteError> {
        if !self.miles.is_finite() || self.miles < 0.0 {
            return Err(RouteError::DistanceUnavailable(format!(
                "invalid fixed distance {}",
                self.miles
            )));
        }
        Ok(self.miles)
    }
}

/// Pick the provider matching the configuration
pub fn provider_for(distance_override: Option<f64>) -> Box<dyn RouteDistanceProvider> {
    match distance_override {
        Some(miles) => Box::new(FixedDistanceProvider::new(miles)),
        None => Box::new(StraightLineRouteProvider::new()),
    }
}
