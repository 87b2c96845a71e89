// Basis snapshots and their scoped handles

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Snapshot of an LP optimum, taken right after a relaxation solve.
///
/// The dimensions record how large the model was when the snapshot was taken;
/// since the model only grows, a snapshot always describes a prefix of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Basis {
    pub id: u64,
    pub num_columns: usize,
    pub num_rows: usize,
    pub column_values: Vec<f64>,
    pub row_duals: Vec<f64>,
}

impl Basis {
    pub fn fits(&self, num_columns: usize, num_rows: usize) -> bool {
        self.num_columns <= num_columns && self.num_rows <= num_rows
    }

    /// Primal values for a model grown to `num_columns`. Columns added since
    /// the snapshot start at zero, which keeps the old point feasible for
    /// the old rows.
    pub fn column_start(&self, num_columns: usize) -> Vec<f64> {
        let mut values = self.column_values.clone();
        values.resize(num_columns, 0.0);
        values
    }

    /// Row duals for a model grown to `num_rows`, or `None` when the backend
    /// that took the snapshot reported no duals. Rows added since the
    /// snapshot get a zero dual, which keeps the old duals feasible.
    pub fn dual_start(&self, num_rows: usize) -> Option<Vec<f64>> {
        if self.row_duals.len() != self.num_rows {
            return None;
        }
        let mut duals = self.row_duals.clone();
        duals.resize(num_rows, 0.0);
        Some(duals)
    }
}

/// Scoped ownership of a saved [`Basis`].
///
/// A handle is live from `save_basis` until it is dropped. Passing it to
/// `release_basis` drops it explicitly; early returns drop it implicitly.
/// The issuing session keeps a count of live handles.
#[derive(Debug)]
pub struct BasisHandle {
    basis: Basis,
    live: Arc<AtomicUsize>,
}

impl BasisHandle {
    pub(crate) fn acquire(basis: Basis, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self { basis, live }
    }

    pub fn basis(&self) -> &Basis {
        &self.basis
    }
}

impl Drop for BasisHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(basis = self.basis.id, "basis released");
    }
}
