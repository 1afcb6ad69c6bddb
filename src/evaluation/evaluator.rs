//! Solution evaluator that prices and checks a finished assignment.

use crate::distance::Cost;
use crate::models::{
    Assignment, BuildStats, NodeState, Route, RoutingModel, Solution, Violation,
    ViolationType,
};

/// Computes route and penalty costs of an assignment and checks it against
/// the structural guarantees every successful build gives: each index is
/// on exactly one route or explicitly inactive, routes lead from start to
/// end, disjunction cardinalities hold, and pickup–delivery pairs share a
/// route in the right order.
///
/// Checks walk successor values directly and do not rely on the route
/// cache kept by the assignment.
///
/// # Examples
///
/// ```
/// use u_routing_init::construction::RoutingBuilder;
/// use u_routing_init::distance::CostMatrix;
/// use u_routing_init::evaluation::SolutionEvaluator;
/// use u_routing_init::filters::DisjunctionRule;
/// use u_routing_init::models::{BuildStats, RoutingModel, Vehicle};
///
/// let points = [(0.0, 0.0), (3.0, 4.0)];
/// let model = RoutingModel::new(2, vec![Vehicle::new(0)], CostMatrix::from_points(&points)).unwrap();
/// let mut builder = RoutingBuilder::new(&model, vec![Box::new(DisjunctionRule::new())]);
/// assert!(builder.initialize_routes());
/// builder.insert_between(0, 1, 2);
/// assert!(builder.commit());
///
/// let evaluator = SolutionEvaluator::new(&model);
/// assert!(evaluator.check(builder.assignment()).is_empty());
/// let solution = evaluator.build_solution(builder.assignment(), BuildStats::default());
/// assert_eq!(solution.total_cost(), 10);
/// ```
pub struct SolutionEvaluator<'a> {
    model: &'a RoutingModel,
}

impl<'a> SolutionEvaluator<'a> {
    /// Creates an evaluator for a model.
    pub fn new(model: &'a RoutingModel) -> Self {
        Self { model }
    }

    /// Arc cost of a committed route, fixed cost included.
    pub fn route_cost(&self, assignment: &Assignment, vehicle: usize) -> Cost {
        assignment
            .route(vehicle)
            .windows(2)
            .map(|arc| self.model.arc_cost_for_vehicle(arc[0], arc[1], vehicle))
            .fold(0, Cost::saturating_add)
    }

    /// Penalties of disjunctions with fewer active members than their
    /// cardinality.
    pub fn penalty_cost(&self, assignment: &Assignment) -> Cost {
        self.model
            .disjunctions()
            .iter()
            .filter_map(|d| d.penalty().map(|penalty| (d, penalty)))
            .map(|(d, penalty)| {
                let active = d
                    .indices()
                    .iter()
                    .filter(|&&i| assignment.vehicle_of(i).is_some())
                    .count();
                let missing = d.max_cardinality().saturating_sub(active) as Cost;
                penalty.saturating_mul(missing)
            })
            .fold(0, Cost::saturating_add)
    }

    /// Route costs plus penalties.
    pub fn total_cost(&self, assignment: &Assignment) -> Cost {
        (0..self.model.num_vehicles())
            .map(|v| self.route_cost(assignment, v))
            .fold(self.penalty_cost(assignment), Cost::saturating_add)
    }

    /// Every structural violation in the assignment.
    pub fn check(&self, assignment: &Assignment) -> Vec<Violation> {
        let model = self.model;
        let mut violations = Vec::new();

        for index in 0..model.size() {
            if model.is_start(index) {
                continue;
            }
            match assignment.state(index) {
                NodeState::Unassigned => {
                    violations.push(Violation::new(ViolationType::Unassigned { index }));
                }
                NodeState::Inactive if !model.can_be_inactive(index) => {
                    violations.push(Violation::new(ViolationType::MandatoryInactive { index }));
                }
                _ => {}
            }
        }

        let mut seen = vec![false; model.size()];
        for vehicle in 0..model.num_vehicles() {
            if !self.route_is_well_formed(assignment, vehicle, &mut seen) {
                violations.push(Violation::new(ViolationType::BrokenRoute { vehicle }));
            }
        }

        for (disjunction, d) in model.disjunctions().iter().enumerate() {
            let active = d
                .indices()
                .iter()
                .filter(|&&i| assignment.vehicle_of(i).is_some())
                .count();
            let max = d.max_cardinality();
            if active > max || (d.is_hard() && active != max) {
                violations.push(Violation::new(ViolationType::CardinalityViolated { disjunction, active }));
            }
        }

        for (pair, p) in model.pickup_delivery_pairs().iter().enumerate() {
            let pickups: Vec<(usize, usize)> = p.pickups().iter().filter_map(|&i| placed(assignment, i)).collect();
            let deliveries: Vec<(usize, usize)> =
                p.deliveries().iter().filter_map(|&i| placed(assignment, i)).collect();
            let consistent = match (pickups.as_slice(), deliveries.as_slice()) {
                ([], []) => true,
                ([(pv, pr)], [(dv, dr)]) => pv == dv && pr < dr,
                _ => false,
            };
            if !consistent {
                violations.push(Violation::new(ViolationType::PairViolated { pair }));
            }
        }

        for vehicle in 0..model.num_vehicles() {
            let policy = model.pickup_delivery_policy_of_vehicle(vehicle);
            if !model.follows_pickup_delivery_policy(assignment.route(vehicle), policy) {
                violations.push(Violation::new(ViolationType::PolicyViolated { vehicle }));
            }
        }
        violations
    }

    /// Follows successors from the vehicle's start: the walk must reach its
    /// end without revisiting an index, through indices the assignment
    /// places on this vehicle at increasing ranks.
    fn route_is_well_formed(&self, assignment: &Assignment, vehicle: usize, seen: &mut [bool]) -> bool {
        let model = self.model;
        let end = model.end(vehicle);
        let mut current = model.start(vehicle);
        let mut rank = 0;
        loop {
            if assignment.vehicle_of(current) != Some(vehicle) || assignment.rank(current) != Some(rank) {
                return false;
            }
            if current == end {
                return assignment.route(vehicle).len() == rank + 1;
            }
            if current < seen.len() {
                if seen[current] {
                    return false;
                }
                seen[current] = true;
            }
            match assignment.value(current) {
                Some(next) if next != current && (!model.is_end(next) || next == end) => current = next,
                _ => return false,
            }
            rank += 1;
        }
    }

    /// Turns a finished assignment into a [`Solution`].
    pub fn build_solution(&self, assignment: &Assignment, stats: BuildStats) -> Solution {
        let model = self.model;
        let mut solution = Solution::new();
        for vehicle in 0..model.num_vehicles() {
            let path = assignment.route(vehicle);
            if path.len() <= 2 {
                continue;
            }
            let visits = path[1..path.len() - 1].to_vec();
            solution.add_route(Route::new(vehicle, visits, self.route_cost(assignment, vehicle)));
        }
        for index in 0..model.size() {
            if !model.is_start(index) && assignment.state(index) == NodeState::Inactive {
                solution.add_unperformed(index);
            }
        }
        solution.set_penalty_cost(self.penalty_cost(assignment));
        solution.set_stats(stats);
        solution
    }
}

fn placed(assignment: &Assignment, index: usize) -> Option<(usize, usize)> {
    match assignment.state(index) {
        NodeState::Active { vehicle, rank } => Some((vehicle, rank)),
        _ => None,
    }
}
