// Cutting-stock instance data and cutting patterns

use super::solver_service::{Result, SolverError};
use super::value_objects::{Tolerance, VariableHandle};

/// Widths to cut from rolls of a single raw width, with a demand per width.
#[derive(Debug, Clone, PartialEq)]
pub struct CuttingStockInstance {
    widths: Vec<f64>,
    demands: Vec<u32>,
    raw_width: f64,
}

impl CuttingStockInstance {
    pub fn new(widths: Vec<f64>, demands: Vec<u32>, raw_width: f64) -> Result<Self> {
        if widths.is_empty() {
            return Err(SolverError::InvalidProblem(
                "at least one width is required".to_string(),
            ));
        }
        if widths.len() != demands.len() {
            return Err(SolverError::InvalidProblem(format!(
                "{} widths but {} demands",
                widths.len(),
                demands.len()
            )));
        }
        if !raw_width.is_finite() || raw_width <= 0.0 {
            return Err(SolverError::InvalidProblem(format!(
                "raw width must be positive, got {}",
                raw_width
            )));
        }
        for (i, &width) in widths.iter().enumerate() {
            if !width.is_finite() || width <= 0.0 || width > raw_width {
                return Err(SolverError::InvalidProblem(format!(
                    "width {} ({}) must lie in (0, {}]",
                    i, width, raw_width
                )));
            }
        }

        Ok(Self {
            widths,
            demands,
            raw_width,
        })
    }

    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    pub fn demands(&self) -> &[u32] {
        &self.demands
    }

    pub fn raw_width(&self) -> f64 {
        self.raw_width
    }

    pub fn num_widths(&self) -> usize {
        self.widths.len()
    }

    /// The `j`-th trivial pattern cuts as many pieces of width `j` as fit,
    /// counting a piece that overshoots the roll by at most epsilon.
    pub fn trivial_pattern(&self, j: usize, tolerance: Tolerance) -> Vec<u32> {
        let mut quantities = vec![0; self.num_widths()];
        if let Some(&width) = self.widths.get(j) {
            quantities[j] = (self.raw_width / width + tolerance.epsilon()).floor() as u32;
        }
        quantities
    }

    /// Total width consumed by one roll cut with `quantities`.
    pub fn pattern_width(&self, quantities: &[u32]) -> f64 {
        self.widths
            .iter()
            .zip(quantities)
            .map(|(w, &q)| w * q as f64)
            .sum()
    }

    pub fn fits_roll(&self, quantities: &[u32], tolerance: Tolerance) -> bool {
        tolerance.not_above(self.pattern_width(quantities), self.raw_width)
    }

    /// Whether `quantities` fits one roll and never exceeds demand.
    pub fn is_feasible_pattern(&self, quantities: &[u32], tolerance: Tolerance) -> bool {
        quantities.len() == self.num_widths()
            && quantities.iter().zip(&self.demands).all(|(q, d)| q <= d)
            && self.fits_roll(quantities, tolerance)
    }

    /// Rolls of a pattern ever worth using: one roll serves `x_i` units of
    /// width `i`, so `ceil(d_i / x_i)` rolls cover that width alone.
    pub fn pattern_upper_bound(&self, quantities: &[u32]) -> f64 {
        quantities
            .iter()
            .zip(&self.demands)
            .filter(|(q, _)| **q > 0)
            .map(|(&q, &d)| (d as f64 / q as f64).ceil())
            .fold(0.0, f64::max)
    }
}

/// A cutting pattern and the variable counting how many rolls use it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub quantities: Vec<u32>,
    pub variable: VariableHandle,
    pub upper_bound: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper_rolls() -> CuttingStockInstance {
        CuttingStockInstance::new(
            vec![17.0, 21.0, 22.5, 24.0, 29.5],
            vec![150, 96, 48, 108, 227],
            94.0,
        )
        .unwrap()
    }

    #[test]
    fn test_trivial_patterns() {
        let instance = paper_rolls();
        let tol = Tolerance::default();
        let counts: Vec<u32> = (0..5).map(|j| instance.trivial_pattern(j, tol)[j]).collect();
        assert_eq!(counts, vec![5, 4, 4, 3, 3]);
        assert_eq!(instance.trivial_pattern(0, tol)[1], 0);
    }

    #[test]
    fn test_inexact_widths_fill_the_roll() {
        // 0.3 / 0.1 is 2.9999999999999996 and 3 * 0.1 is 0.30000000000000004
        let instance = CuttingStockInstance::new(vec![0.1], vec![10], 0.3).unwrap();
        let tol = Tolerance::default();
        assert_eq!(instance.trivial_pattern(0, tol), vec![3]);
        assert!(instance.fits_roll(&[3], tol));
        assert!(instance.is_feasible_pattern(&[3], tol));
        assert!(!instance.fits_roll(&[4], tol));
    }

    #[test]
    fn test_pattern_upper_bound_takes_largest_requirement() {
        let instance = paper_rolls();
        assert_eq!(instance.pattern_upper_bound(&[5, 0, 0, 0, 0]), 30.0);
        assert_eq!(instance.pattern_upper_bound(&[0, 0, 0, 0, 3]), 76.0);
        assert_eq!(instance.pattern_upper_bound(&[1, 0, 0, 0, 2]), 150.0);
    }

    #[test]
    fn test_pattern_feasibility() {
        let instance = paper_rolls();
        let tol = Tolerance::default();
        assert!(instance.is_feasible_pattern(&[0, 0, 0, 0, 3], tol));
        assert!(!instance.is_feasible_pattern(&[0, 0, 0, 0, 4], tol));
        assert!(!instance.is_feasible_pattern(&[0, 0, 0, 0], tol));
        // within demand but one piece too many for the roll
        assert!(!instance.fits_roll(&[1, 0, 0, 1, 2], tol));
    }

    #[test]
    fn test_rejects_bad_instances() {
        assert!(CuttingStockInstance::new(vec![], vec![], 10.0).is_err());
        assert!(CuttingStockInstance::new(vec![3.0], vec![1, 2], 10.0).is_err());
        assert!(CuttingStockInstance::new(vec![11.0], vec![1], 10.0).is_err());
        assert!(CuttingStockInstance::new(vec![0.0], vec![1], 10.0).is_err());
        assert!(CuttingStockInstance::new(vec![3.0], vec![1], f64::NAN).is_err());
    }
}
