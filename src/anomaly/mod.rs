//! Data-quality anomaly injection
//!
//! After a vehicle's interval has been emitted, the [`AnomalyInjector`] rolls
//! once per row and, on a hit, drops, duplicates or mutates the row with one of
//! the [`AnomalyKind`]s. Every row it touches and keeps is flagged.

pub mod injector;

pub use injector::*;

use crate::types::{AnomalyKind, AnomalyMode, ConfigValidationError};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How each corruption picks its kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "kind", rename_all = "snake_case")]
pub enum AnomalySelection {
    /// The whole run uses one kind
    Single(AnomalyKind),
    /// Every corruption draws a kind uniformly
    Mixed,
}

impl AnomalySelection {
    /// Commit to a selection for the run.
    ///
    /// Single mode uses the requested kind or draws one from `rng`. A fixed
    /// kind cannot be combined with mixed mode.
    pub fn resolve<R: Rng + ?Sized>(
        mode: AnomalyMode,
        kind: Option<AnomalyKind>,
        rng: &mut R,
    ) -> Result<Self, ConfigValidationError> {
        match (mode, kind) {
            (AnomalyMode::Single, Some(kind)) => Ok(AnomalySelection::Single(kind)),
            (AnomalyMode::Single, None) => {
                let kind = *AnomalyKind::ALL.choose(rng).unwrap_or(&AnomalyKind::NullValue);
                Ok(AnomalySelection::Single(kind))
            }
            (AnomalyMode::Mixed, None) => Ok(AnomalySelection::Mixed),
            (AnomalyMode::Mixed, Some(kind)) => {
                Err(ConfigValidationError::UnresolvableAnomalyMode { kind, mode })
            }
        }
    }

    /// Kind for one corruption
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> AnomalyKind {
        match self {
            AnomalySelection::Single(kind) => *kind,
            AnomalySelection::Mixed => *AnomalyKind::ALL.choose(rng).unwrap_or(&AnomalyKind::NullValue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_resolve_single_with_fixed_kind() {
        let mut rng = StdRng::seed_from_u64(0);
        let selection =
            AnomalySelection::resolve(AnomalyMode::Single, Some(AnomalyKind::InvalidVin), &mut rng).unwrap();
        assert_eq!(selection, AnomalySelection::Single(AnomalyKind::InvalidVin));
        for _ in 0..20 {
            assert_eq!(selection.pick(&mut rng), AnomalyKind::InvalidVin);
        }
    }

    #[test]
    fn test_resolve_single_draws_once() {
        let mut a = StdRng::seed_from_u64(77);
        let mut b = StdRng::seed_from_u64(77);
        let first = AnomalySelection::resolve(AnomalyMode::Single, None, &mut a).unwrap();
        let second = AnomalySelection::resolve(AnomalyMode::Single, None, &mut b).unwrap();
        assert_eq!(first, second);
        assert!(matches!(first, AnomalySelection::Single(_)));
    }

    #[test]
    fn test_mixed_with_kind_is_unresolvable() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = AnomalySelection::resolve(AnomalyMode::Mixed, Some(AnomalyKind::NullValue), &mut rng);
        assert!(matches!(result, Err(ConfigValidationError::UnresolvableAnomalyMode { .. })));
    }

    #[test]
    fn test_mixed_covers_every_kind() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..2000 {
            seen.insert(AnomalySelection::Mixed.pick(&mut rng));
        }
        assert_eq!(seen.len(), AnomalyKind::ALL.len());
    }
}
