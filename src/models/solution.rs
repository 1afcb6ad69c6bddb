//! Solution, build statistics, and violation types.

use serde::Serialize;

use super::Route;
use crate::distance::Cost;

/// Counters kept by the filtered construction core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Commit attempts.
    pub decisions: u64,
    /// Commit attempts rejected by a feasibility rule.
    pub rejects: u64,
}

/// A type of constraint violation found in a finished assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationType {
    /// An index has no successor.
    Unassigned {
        /// The index.
        index: usize,
    },
    /// An index that must be performed is not.
    MandatoryInactive {
        /// The index.
        index: usize,
    },
    /// A vehicle route does not lead from its start to its end.
    BrokenRoute {
        /// The vehicle.
        vehicle: usize,
    },
    /// A disjunction has too many (or, when hard, too few) active members.
    CardinalityViolated {
        /// The disjunction.
        disjunction: usize,
        /// Active members.
        active: usize,
    },
    /// Only one side of a pickup–delivery pair is performed, or both sides
    /// are on different routes or in the wrong order.
    PairViolated {
        /// The pair.
        pair: usize,
    },
    /// Pairs on a route break the vehicle's LIFO/FIFO policy.
    PolicyViolated {
        /// The vehicle.
        vehicle: usize,
    },
}

/// A constraint violation in a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The type of violation.
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }
}

/// A complete first solution.
///
/// Holds the non-empty routes, the indices left unperformed, and the
/// construction counters.
///
/// # Examples
///
/// ```
/// use u_routing_init::models::{BuildStats, Route, Solution};
///
/// let mut sol = Solution::new();
/// sol.add_route(Route::new(0, vec![1, 0], 9));
/// sol.add_unperformed(2);
/// sol.set_penalty_cost(5);
/// assert_eq!(sol.num_routes(), 1);
/// assert_eq!(sol.total_cost(), 14);
/// assert_eq!(sol.stats(), BuildStats::default());
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct Solution {
    routes: Vec<Route>,
    unperformed: Vec<usize>,
    penalty_cost: Cost,
    stats: BuildStats,
}

impl Solution {
    /// Creates an empty solution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route.
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Marks an index as unperformed.
    pub fn add_unperformed(&mut self, index: usize) {
        self.unperformed.push(index);
    }

    /// Sets the penalty paid for unperformed indices.
    pub fn set_penalty_cost(&mut self, cost: Cost) {
        self.penalty_cost = cost;
    }

    /// Sets the construction counters.
    pub fn set_stats(&mut self, stats: BuildStats) {
        self.stats = stats;
    }

    /// Non-empty routes.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Returns the number of routes (vehicles used).
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Indices left unperformed.
    pub fn unperformed(&self) -> &[usize] {
        &self.unperformed
    }

    /// Penalty paid for unperformed indices.
    pub fn penalty_cost(&self) -> Cost {
        self.penalty_cost
    }

    /// Route costs plus penalties.
    pub fn total_cost(&self) -> Cost {
        self.routes
            .iter()
            .fold(self.penalty_cost, |acc, r| acc.saturating_add(r.cost()))
    }

    /// Total number of visits across all routes.
    pub fn num_served(&self) -> usize {
        self.routes.iter().map(Route::len).sum()
    }

    /// Construction counters.
    pub fn stats(&self) -> BuildStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solution_empty() {
        let sol = Solution::new();
        assert_eq!(sol.num_routes(), 0);
        assert!(sol.unperformed().is_empty());
        assert_eq!(sol.total_cost(), 0);
        assert_eq!(sol.num_served(), 0);
    }

    #[test]
    fn test_solution_with_routes() {
        let mut sol = Solution::new();
        sol.add_route(Route::new(0, vec![1], 50));
        sol.add_route(Route::new(1, vec![2, 3], 80));
        sol.add_unperformed(4);
        sol.set_penalty_cost(7);
        sol.set_stats(BuildStats {
            decisions: 10,
            rejects: 2,
        });

        assert_eq!(sol.num_routes(), 2);
        assert_eq!(sol.num_served(), 3);
        assert_eq!(sol.total_cost(), 137);
        assert_eq!(sol.stats().rejects, 2);
    }

    #[test]
    fn test_solution_serializes() {
        let mut sol = Solution::new();
        sol.add_route(Route::new(0, vec![1], 5));
        let json = serde_json::to_value(&sol).expect("serializable");
        assert_eq!(json["routes"][0]["visits"][0], 1);
        assert_eq!(json["stats"]["decisions"], 0);
    }

    #[test]
    fn test_violation() {
        let v = Violation::new(ViolationType::Unassigned { index: 3 });
        assert_eq!(v.kind, ViolationType::Unassigned { index: 3 });
    }
}
