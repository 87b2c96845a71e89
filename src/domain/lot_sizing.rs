// Economic lot-sizing instance data

use super::solver_service::{Result, SolverError};

/// `D[s][t]`: total demand of the periods `s..=t`, zero when `s > t`.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeDemand {
    periods: usize,
    table: Vec<f64>,
}

impl CumulativeDemand {
    pub fn new(demands: &[f64]) -> Self {
        let periods = demands.len();
        let mut table = vec![0.0; periods * periods];
        for s in 0..periods {
            let mut running = 0.0;
            for t in s..periods {
                running += demands[t];
                table[s * periods + t] = running;
            }
        }
        Self { periods, table }
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    pub fn get(&self, s: usize, t: usize) -> f64 {
        if s > t || t >= self.periods {
            return 0.0;
        }
        self.table[s * self.periods + t]
    }

    /// Demand from period `s` to the end of the horizon.
    pub fn remaining(&self, s: usize) -> f64 {
        match self.periods {
            0 => 0.0,
            n => self.get(s, n - 1),
        }
    }
}

/// Lot sizing over `T` periods: demand per period, setup cost and unit
/// production cost per period, no holding cost.
#[derive(Debug, Clone, PartialEq)]
pub struct LotSizingInstance {
    demands: Vec<f64>,
    setup_costs: Vec<f64>,
    production_costs: Vec<f64>,
    cumulative: CumulativeDemand,
}

impl LotSizingInstance {
    pub fn new(
        demands: Vec<f64>,
        setup_costs: Vec<f64>,
        production_costs: Vec<f64>,
    ) -> Result<Self> {
        if demands.is_empty() {
            return Err(SolverError::InvalidProblem(
                "at least one period is required".to_string(),
            ));
        }
        if demands.len() != setup_costs.len() || demands.len() != production_costs.len() {
            return Err(SolverError::InvalidProblem(format!(
                "period data lengths differ: {} demands, {} setup costs, {} production costs",
                demands.len(),
                setup_costs.len(),
                production_costs.len()
            )));
        }
        let columns = [
            ("demand", &demands),
            ("setup cost", &setup_costs),
            ("production cost", &production_costs),
        ];
        for (label, values) in columns {
            if let Some((t, v)) = values
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v < 0.0)
            {
                return Err(SolverError::InvalidProblem(format!(
                    "{} of period {} must be finite and non-negative, got {}",
                    label,
                    t + 1,
                    v
                )));
            }
        }

        let cumulative = CumulativeDemand::new(&demands);
        Ok(Self {
            demands,
            setup_costs,
            production_costs,
            cumulative,
        })
    }

    pub fn periods(&self) -> usize {
        self.demands.len()
    }

    pub fn demands(&self) -> &[f64] {
        &self.demands
    }

    pub fn setup_costs(&self) -> &[f64] {
        &self.setup_costs
    }

    pub fn production_costs(&self) -> &[f64] {
        &self.production_costs
    }

    pub fn cumulative(&self) -> &CumulativeDemand {
        &self.cumulative
    }
}
