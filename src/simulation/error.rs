//! Error types and handling
//!
//! This module contains error types for the simulation. Injected corruption and
//! accident terminations are regular output and never surface here.

use crate::route::RouteError;
use crate::types::{ConfigError, ConfigValidationError};
use thiserror::Error;

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ConfigurationError(#[from] ConfigValidationError),

    /// Configuration could not be loaded
    #[error("Configuration could not be loaded: {0}")]
    ConfigLoadError(#[from] ConfigError),

    /// A location or the route between them could not be resolved
    #[error("Route resolution failed: {0}")]
    RouteResolutionError(#[from] RouteError),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// CSV output error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Output could not be produced
    #[error("Output error: {0}")]
    OutputError(String),
}

impl SimulationError {
    /// Create an output error
    pub fn output_error(msg: impl Into<String>) -> Self {
        Self::OutputError(msg.into())
    }

    /// Whether the failure happened before any row was generated
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            SimulationError::ConfigurationError(_)
                | SimulationError::ConfigLoadError(_)
                | SimulationError::RouteResolutionError(_)
        )
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::ConfigLoadError(_) => "Configuration",
            SimulationError::RouteResolutionError(_) => "Route Resolution",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
            SimulationError::CsvError(_) => "CSV",
            SimulationError::OutputError(_) => "Output",
        }
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_validation_error() {
        let error: SimulationError = ConfigValidationError::InvalidWheelCount(5).into();
        assert!(matches!(error, SimulationError::ConfigurationError(_)));
        assert_eq!(error.category(), "Configuration");
        assert!(error.is_setup_failure());
        assert!(error.to_string().contains("4, 6, 8, or 10"));
    }

    #[test]
    fn test_route_error_propagates_unmodified() {
        let route_error = RouteError::UnknownLocation("Atlantis".to_string());
        let error: SimulationError = route_error.clone().into();
        match error {
            SimulationError::RouteResolutionError(inner) => assert_eq!(inner, route_error),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: SimulationError = io_error.into();
        assert!(matches!(error, SimulationError::IoError(_)));
        assert_eq!(error.category(), "IO");
        assert!(!error.is_setup_failure());
    }

    #[test]
    fn test_simulation_result_type() {
        fn fails() -> SimulationResult<()> {
            Err(SimulationError::output_error("disk full"))
        }
        let error = fails().unwrap_err();
        assert_eq!(error.category(), "Output");
        assert_eq!(error.to_string(), "Output error: disk full");
    }
}
