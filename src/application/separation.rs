// (l,S) cut separation for uncapacitated lot sizing
//
// For every horizon end l the inequality
//
//     Σ_{t ≤ l, t ∈ S} prod[t] + Σ_{t ≤ l, t ∉ S} D[t][l]·setup[t] ≥ D[0][l]
//
// is valid for every S ⊆ {0..l}. Picking t ∈ S exactly when prod[t] is the
// smaller of the two terms gives the most violated member for that l.

use crate::domain::{
    lot_sizing::CumulativeDemand,
    solver_service::{Result, SolverError},
    value_objects::Tolerance,
};

/// One summand of an (l,S) inequality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutTerm {
    /// `prod[period]`, for periods in S
    Production { period: usize },
    /// `coefficient · setup[period]`, with `coefficient = D[period][l]`
    Setup { period: usize, coefficient: f64 },
}

impl CutTerm {
    pub fn evaluate(&self, prod: &[f64], setup: &[f64]) -> f64 {
        match *self {
            CutTerm::Production { period } => prod.get(period).copied().unwrap_or(0.0),
            CutTerm::Setup {
                period,
                coefficient,
            } => coefficient * setup.get(period).copied().unwrap_or(0.0),
        }
    }
}

/// A violated (l,S) inequality `Σ terms ≥ rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LsCut {
    /// Last period `l` covered by the inequality
    pub last_period: usize,
    pub terms: Vec<CutTerm>,
    /// `D[0][l]`
    pub rhs: f64,
    /// How far the separating point falls short of `rhs`
    pub violation: f64,
}

impl LsCut {
    pub fn lhs(&self, prod: &[f64], setup: &[f64]) -> f64 {
        self.terms.iter().map(|term| term.evaluate(prod, setup)).sum()
    }

    pub fn is_satisfied_by(&self, prod: &[f64], setup: &[f64], tolerance: Tolerance) -> bool {
        !tolerance.falls_short_of(self.lhs(prod, setup), self.rhs)
    }

    /// The set S: periods whose production enters the cut directly.
    pub fn production_periods(&self) -> impl Iterator<Item = usize> + '_ {
        self.terms.iter().filter_map(|term| match term {
            CutTerm::Production { period } => Some(*period),
            CutTerm::Setup { .. } => None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CutSeparator {
    tolerance: Tolerance,
}

impl CutSeparator {
    pub fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }

    /// Every (l,S) inequality violated by more than epsilon at `(prod, setup)`,
    /// at most one per horizon end `l`, in increasing `l`.
    pub fn separate(
        &self,
        prod: &[f64],
        setup: &[f64],
        demand: &CumulativeDemand,
    ) -> Result<Vec<LsCut>> {
        let periods = demand.periods();
        if prod.len() != periods || setup.len() != periods {
            return Err(SolverError::InvalidProblem(format!(
                "separation point has {} production and {} setup values for {} periods",
                prod.len(),
                setup.len(),
                periods
            )));
        }

        let mut cuts = Vec::new();
        for l in 0..periods {
            let terms: Vec<CutTerm> = (0..=l)
                .map(|t| {
                    let capacity = demand.get(t, l) * setup[t];
                    if self.tolerance.not_above(prod[t], capacity) {
                        CutTerm::Production { period: t }
                    } else {
                        CutTerm::Setup {
                            period: t,
                            coefficient: demand.get(t, l),
                        }
                    }
                })
                .collect();

            let covered: f64 = terms.iter().map(|term| term.evaluate(prod, setup)).sum();
            let required = demand.get(0, l);
            if self.tolerance.falls_short_of(covered, required) {
                cuts.push(LsCut {
                    last_period: l,
                    terms,
                    rhs: required,
                    violation: required - covered,
                });
            }
        }
        Ok(cuts)
    }
}
