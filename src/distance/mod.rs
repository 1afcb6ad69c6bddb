//! Arc costs.
//!
//! Provides the integer cost type used throughout the crate and a dense,
//! node-indexed cost matrix. One matrix backs each cost class of a
//! [`RoutingModel`](crate::models::RoutingModel).

mod matrix;

pub use matrix::CostMatrix;

/// Integer cost of an arc, a penalty, or a whole solution.
pub type Cost = i64;

/// Sentinel meaning "not allowed" (e.g. a node that cannot be left unvisited).
pub const MAX_COST: Cost = Cost::MAX;
