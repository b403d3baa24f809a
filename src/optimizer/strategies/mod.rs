//! Constraint engines
//!
//! Implementations of [`ConstraintSolver`](crate::optimizer::ConstraintSolver):
//! - MILP: `good_lp` with the pure-Rust `microlp` backend

pub mod milp;

pub use milp::*;
