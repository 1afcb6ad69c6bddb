//! Domain model types for first-solution construction.
//!
//! Provides the routing model (index space, vehicles, costs, disjunctions,
//! pickup–delivery pairs, locks, visit types), the committed assignment with
//! its pending delta, and the solution handed back to callers.

mod assignment;
mod disjunction;
mod error;
mod index;
mod model;
mod route;
mod solution;
mod vehicle;

pub use assignment::{Assignment, Delta, NodeState};
pub use disjunction::{Disjunction, PickupDeliveryPair};
pub use error::ModelError;
pub use index::IndexManager;
pub use model::RoutingModel;
pub use route::Route;
pub use solution::{BuildStats, Solution, Violation, ViolationType};
pub use vehicle::{PickupDeliveryPolicy, Vehicle};
