//! # u-routing-init
//!
//! First-solution construction for vehicle routing. Heuristics propose
//! changes to a successor assignment; every change is checked against
//! pluggable feasibility rules before it is committed.
//!
//! ## Modules
//!
//! - [`models`] — Routing model (index space, vehicles, disjunctions, pairs, locks), assignment, solution
//! - [`distance`] — Integer arc costs and cost matrix
//! - [`filters`] — Feasibility rules (disjunction, capacity, pickup–delivery, active vehicles, visit types)
//! - [`construction`] — Filtered commits, route skeletons, insertion pricing, priority queue
//! - [`constructive`] — Heuristics (global/local cheapest insertion, savings, cheapest addition, Christofides, sweep)
//! - [`evaluation`] — Solution costing and structural checks
//! - [`parameters`] — Serializable heuristic selection and tuning
//! - [`solver`] — [`FirstSolutionBuilder`](solver::FirstSolutionBuilder) entry point

pub mod construction;
pub mod constructive;
pub mod distance;
pub mod evaluation;
pub mod filters;
pub mod models;
pub mod parameters;
pub mod solver;
