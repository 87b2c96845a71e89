// Per-pass progress events and the console reporter

use std::fmt;
use std::time::Duration;

/// What happened during one pass of a refinement loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PassEvent {
    /// Pricing found a profitable pattern and it was added to the model.
    ColumnAdded {
        pass: usize,
        elapsed: Duration,
        objective: f64,
        /// `z* - 1`: how much one roll of the pattern is worth above its cost
        reduced_cost: f64,
        /// `(width, pieces)` for every width
        distribution: Vec<(f64, u32)>,
        total_width: f64,
    },
    /// No pattern prices out; the restricted LP is optimal.
    PricingConverged {
        pass: usize,
        elapsed: Duration,
        objective: f64,
        pricing_value: f64,
    },
    /// The column budget ran out before pricing converged.
    ColumnBudgetExhausted {
        passes: usize,
        elapsed: Duration,
        columns: usize,
    },
    /// Separation found violated inequalities and all of them were added.
    CutsAdded {
        pass: usize,
        elapsed: Duration,
        objective: f64,
        added: usize,
        total: usize,
    },
    /// No inequality is violated at the current LP optimum.
    SeparationConverged {
        pass: usize,
        elapsed: Duration,
        objective: f64,
        total: usize,
    },
}

impl PassEvent {
    pub fn pass(&self) -> usize {
        match self {
            PassEvent::ColumnAdded { pass, .. }
            | PassEvent::PricingConverged { pass, .. }
            | PassEvent::CutsAdded { pass, .. }
            | PassEvent::SeparationConverged { pass, .. } => *pass,
            PassEvent::ColumnBudgetExhausted { passes, .. } => *passes,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            PassEvent::ColumnAdded { elapsed, .. }
            | PassEvent::PricingConverged { elapsed, .. }
            | PassEvent::ColumnBudgetExhausted { elapsed, .. }
            | PassEvent::CutsAdded { elapsed, .. }
            | PassEvent::SeparationConverged { elapsed, .. } => *elapsed,
        }
    }

    /// LP objective of the pass, if the event belongs to a solved pass.
    pub fn objective(&self) -> Option<f64> {
        match self {
            PassEvent::ColumnAdded { objective, .. }
            | PassEvent::PricingConverged { objective, .. }
            | PassEvent::CutsAdded { objective, .. }
            | PassEvent::SeparationConverged { objective, .. } => Some(*objective),
            PassEvent::ColumnBudgetExhausted { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PassEvent::PricingConverged { .. }
                | PassEvent::ColumnBudgetExhausted { .. }
                | PassEvent::SeparationConverged { .. }
        )
    }
}

impl fmt::Display for PassEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassEvent::ColumnAdded {
                pass,
                elapsed,
                objective,
                reduced_cost,
                distribution,
                total_width,
            } => {
                writeln!(
                    f,
                    "({:.3} sec) Pass {}: objective {}, new pattern found with reduced cost {}",
                    elapsed.as_secs_f64(),
                    pass,
                    objective,
                    reduced_cost
                )?;
                write!(f, "   Widths distribution: ")?;
                for (width, pieces) in distribution {
                    write!(f, "{}:{}  ", width, pieces)?;
                }
                write!(f, "Total width: {}", total_width)
            }
            PassEvent::PricingConverged {
                pass,
                elapsed,
                objective,
                ..
            } => write!(
                f,
                "({:.3} sec) Pass {}: objective {}, no profitable column found.",
                elapsed.as_secs_f64(),
                pass,
                objective
            ),
            PassEvent::ColumnBudgetExhausted {
                passes,
                elapsed,
                columns,
            } => write!(
                f,
                "({:.3} sec) Column budget exhausted after {} passes with {} patterns; \
                 solving the integer model over the current patterns.",
                elapsed.as_secs_f64(),
                passes,
                columns
            ),
            PassEvent::CutsAdded {
                pass,
                elapsed,
                objective,
                added,
                total,
            } => write!(
                f,
                "Pass {} ({:.3} sec), objective value {}, cuts added: {} (total {})",
                pass,
                elapsed.as_secs_f64(),
                objective,
                added,
                total
            ),
            PassEvent::SeparationConverged {
                pass,
                elapsed,
                objective,
                total,
            } => write!(
                f,
                "Pass {} ({:.3} sec), objective value {}, cuts added: 0 (total {})\n\
                 Optimal integer solution found:",
                pass,
                elapsed.as_secs_f64(),
                objective,
                total
            ),
        }
    }
}

/// Receives one event per pass of a refinement loop.
pub trait PassObserver {
    fn on_pass(&mut self, event: &PassEvent);
}

impl<F> PassObserver for F
where
    F: FnMut(&PassEvent),
{
    fn on_pass(&mut self, event: &PassEvent) {
        self(event)
    }
}

/// Prints every pass to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl PassObserver for ConsoleReporter {
    fn on_pass(&mut self, event: &PassEvent) {
        println!("{}", event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl PassObserver for SilentObserver {
    fn on_pass(&mut self, _event: &PassEvent) {}
}
