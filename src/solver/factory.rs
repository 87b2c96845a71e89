use crate::domain::{
    solver_service::{Result, SolverError, SolverService},
    value_objects::SolverBackend,
};
#[cfg(feature = "cbc")]
use crate::solver::CoinCbcSolver;
#[cfg(feature = "highs")]
use crate::solver::HighsSolver;
use std::sync::Arc;

/// Factory for creating solver instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create a solver for a specific backend
    pub fn create_from_backend(backend: SolverBackend) -> Result<Arc<dyn SolverService>> {
        match backend {
            SolverBackend::Auto => Self::default_solver(),
            SolverBackend::Highs => Self::highs(),
            SolverBackend::CoinCbc => Self::coin_cbc(),
        }
    }

    /// Get the default solver (HiGHS when compiled in)
    pub fn default_solver() -> Result<Arc<dyn SolverService>> {
        Self::highs().or_else(|_| Self::coin_cbc())
    }

    /// Every backend compiled into this build
    pub fn available() -> Vec<Arc<dyn SolverService>> {
        [Self::highs(), Self::coin_cbc()]
            .into_iter()
            .filter_map(|solver| solver.ok())
            .collect()
    }

    #[cfg(feature = "highs")]
    fn highs() -> Result<Arc<dyn SolverService>> {
        Ok(Arc::new(HighsSolver::new()))
    }

    #[cfg(not(feature = "highs"))]
    fn highs() -> Result<Arc<dyn SolverService>> {
        Err(SolverError::SolverNotAvailable(
            "HiGHS support was not compiled in (feature `highs`)".to_string(),
        ))
    }

    #[cfg(feature = "cbc")]
    fn coin_cbc() -> Result<Arc<dyn SolverService>> {
        Ok(Arc::new(CoinCbcSolver::new()))
    }

    #[cfg(not(feature = "cbc"))]
    fn coin_cbc() -> Result<Arc<dyn SolverService>> {
        Err(SolverError::SolverNotAvailable(
            "COIN-OR CBC support was not compiled in (feature `cbc`)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "highs")]
    #[test]
    fn test_auto_prefers_highs() {
        let solver = SolverFactory::create_from_backend(SolverBackend::Auto).unwrap();
        assert_eq!(solver.name(), "HiGHS");
        assert!(solver.supports_duals());
    }

    #[cfg(not(feature = "cbc"))]
    #[test]
    fn test_missing_backend_is_reported() {
        assert!(matches!(
            SolverFactory::create_from_backend(SolverBackend::CoinCbc),
            Err(SolverError::SolverNotAvailable(_))
        ));
    }

    #[test]
    fn test_available_matches_features() {
        let expected = usize::from(cfg!(feature = "highs")) + usize::from(cfg!(feature = "cbc"));
        assert_eq!(SolverFactory::available().len(), expected);
    }
}
