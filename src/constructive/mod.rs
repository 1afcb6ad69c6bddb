//! First-solution heuristics.
//!
//! Every heuristic runs on a [`RoutingBuilder`](crate::construction::RoutingBuilder)
//! and returns `true` once all indices are decided and committed:
//!
//! - [`global_cheapest_insertion`] — Cheapest position over all visits and
//!   routes at once, parallel or sequential, O(n² · m log n)
//! - [`local_cheapest_insertion`] — Cheapest position for one visit at a
//!   time, O(n² · m log n)
//! - [`savings`] — Clarke-Wright savings (1964) with vehicle types,
//!   sequential or parallel, O(n² log n)
//! - [`cheapest_addition`] — Route extension by best-ranked successor,
//!   O(n² log n · m)
//! - [`christofides`] — Christofides tour (1976) sliced into routes, O(n³)
//! - [`sweep`] — Visits swept by polar angle into routes (Gillett & Miller
//!   1974), O(n log n) plus commits

mod cheapest_addition;
mod christofides;
mod global_cheapest;
mod local_cheapest;
mod savings;
mod sweep;

pub use cheapest_addition::{cheapest_addition, SuccessorRanking};
pub use christofides::christofides;
pub use global_cheapest::{global_cheapest_insertion, GlobalCheapestInsertionOptions};
pub use local_cheapest::local_cheapest_insertion;
pub use savings::{savings, Saving, SavingsOptions};
pub use sweep::sweep;

#[cfg(test)]
pub(crate) mod tests {
    use crate::construction::RoutingBuilder;
    use crate::distance::CostMatrix;
    use crate::filters::{DisjunctionRule, FeasibilityRule, PickupDeliveryRule};
    use crate::models::{RoutingModel, Vehicle};

    /// One vehicle from S to E over four visits on a line. S sits on A and
    /// E on D.
    ///
    /// Nodes S=0, A=1, B=2, C=3, D=4, E=5; indices A=0, B=1, C=2, D=3,
    /// start 4, end 5. The cheapest route S → A → B → C → D → E costs 4.
    /// Sweep coordinates put every node on the positive x axis.
    pub(crate) fn line_scenario() -> RoutingModel {
        #[rustfmt::skip]
        let data = vec![
            0, 0, 1, 3, 5, 5,
            0, 0, 1, 3, 5, 5,
            1, 1, 0, 2, 3, 3,
            3, 3, 2, 0, 1, 1,
            5, 5, 3, 1, 0, 0,
            5, 5, 3, 1, 0, 0,
        ];
        let costs = CostMatrix::from_data(6, data).expect("square matrix");
        let mut model = RoutingModel::new(6, vec![Vehicle::new(0).with_end(5)], costs).expect("valid model");
        let along = [0.0, 0.0, 1.0, 3.0, 5.0, 5.0];
        model
            .set_sweep_coordinates(along.iter().map(|&x| (x, 0.0)).collect())
            .expect("one position per node");
        model
    }

    /// Rules every build registers.
    pub(crate) fn standard_rules<'a>() -> Vec<Box<dyn FeasibilityRule + 'a>> {
        vec![Box::new(DisjunctionRule::new()), Box::new(PickupDeliveryRule::new())]
    }

    pub(crate) fn builder_for<'a>(
        model: &'a RoutingModel,
        rules: Vec<Box<dyn FeasibilityRule + 'a>>,
    ) -> RoutingBuilder<'a> {
        RoutingBuilder::new(model, rules)
    }
}
