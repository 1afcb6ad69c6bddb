//! Pickup–delivery precedence and ordering policy rule.

use std::collections::BTreeSet;

use super::{DeltaView, FeasibilityRule};
use crate::models::NodeState;

/// Keeps every pickup–delivery pair consistent.
///
/// At most one pickup and one delivery of a pair are active; when both are,
/// they share a route and the pickup comes first. A lone active pickup is
/// accepted while some delivery of its pair is still undecided. A delivery
/// is never active without its pickup, so it must be placed after or
/// together with it. Vehicles with a LIFO or FIFO policy also get their
/// deliveries checked against the order of their pickups.
#[derive(Debug, Default)]
pub struct PickupDeliveryRule;

impl PickupDeliveryRule {
    /// Creates the rule.
    pub fn new() -> Self {
        Self
    }

    fn pair_is_consistent(view: &DeltaView<'_>, pair: usize) -> bool {
        let pair = &view.model().pickup_delivery_pairs()[pair];
        let pickups = Side::scan(view, pair.pickups());
        let deliveries = Side::scan(view, pair.deliveries());
        if pickups.active.len() > 1 || deliveries.active.len() > 1 {
            return false;
        }
        match (pickups.active.first(), deliveries.active.first()) {
            (Some(&(pv, pr)), Some(&(dv, dr))) => pv == dv && pr < dr,
            (Some(_), None) => deliveries.undecided,
            (None, Some(_)) => false,
            (None, None) => true,
        }
    }
}

struct Side {
    active: Vec<(usize, usize)>,
    undecided: bool,
}

impl Side {
    fn scan(view: &DeltaView<'_>, indices: &[usize]) -> Self {
        let mut active = Vec::new();
        let mut undecided = false;
        for &index in indices {
            match view.state(index) {
                NodeState::Active { vehicle, rank } => active.push((vehicle, rank)),
                NodeState::Unassigned => undecided = true,
                NodeState::Inactive => {}
            }
        }
        Self { active, undecided }
    }
}

impl FeasibilityRule for PickupDeliveryRule {
    fn name(&self) -> &str {
        "pickup_delivery"
    }

    fn accept(&mut self, view: &DeltaView<'_>) -> bool {
        let model = view.model();
        if model.pickup_delivery_pairs().is_empty() {
            return true;
        }
        let mut pairs = BTreeSet::new();
        let mut collect = |index: usize| {
            pairs.extend(model.pickup_pairs_of(index).iter().copied());
            pairs.extend(model.delivery_pairs_of(index).iter().copied());
        };
        for (_, route) in view.touched_routes() {
            route.iter().for_each(|&i| collect(i));
        }
        for &(index, _) in view.changes() {
            collect(index);
        }
        if !pairs.into_iter().all(|pair| Self::pair_is_consistent(view, pair)) {
            return false;
        }

        view.touched_routes().all(|(vehicle, route)| {
            model.follows_pickup_delivery_policy(route, model.pickup_delivery_policy_of_vehicle(vehicle))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::CostMatrix;
    use crate::filters::tests::{committed, two_vehicle_model};
    use crate::models::{Delta, PickupDeliveryPolicy, RoutingModel, Vehicle};

    fn view_accepts(model: &RoutingModel, routes: &[&[usize]], changes: &[(usize, usize)]) -> bool {
        let assignment = committed(model, routes);
        let mut delta = Delta::new(model.size());
        for &(i, v) in changes {
            delta.set(i, v);
        }
        let view = DeltaView::new(model, &assignment, &delta).expect("well formed");
        PickupDeliveryRule::new().accept(&view)
    }

    #[test]
    fn test_precedence() {
        let mut model = two_vehicle_model();
        model.add_pickup_and_delivery(0, 1).expect("valid");
        // Pickup before delivery.
        assert!(view_accepts(&model, &[&[], &[]], &[(5, 0), (0, 1), (1, 7)]));
        // Delivery before pickup.
        assert!(!view_accepts(&model, &[&[], &[]], &[(5, 1), (1, 0), (0, 7)]));
        // Different vehicles.
        assert!(!view_accepts(&model, &[&[], &[]], &[(5, 0), (0, 7), (6, 1), (1, 8)]));
        // Lone pickup while the delivery is undecided.
        assert!(view_accepts(&model, &[&[], &[]], &[(5, 0), (0, 7)]));
        // Lone pickup with the delivery dropped.
        assert!(!view_accepts(&model, &[&[0], &[]], &[(1, 1)]));
        // Both dropped.
        assert!(view_accepts(&model, &[&[], &[]], &[(0, 0), (1, 1)]));
    }

    #[test]
    fn test_lone_delivery_is_rejected() {
        let mut model = two_vehicle_model();
        model.add_pickup_and_delivery(0, 1).expect("valid");
        // Pickup still undecided: it could never be placed ahead later.
        assert!(!view_accepts(&model, &[&[], &[]], &[(5, 1), (1, 7)]));
        // Pickup dropped.
        assert!(!view_accepts(&model, &[&[], &[]], &[(0, 0), (5, 1), (1, 7)]));
        // Delivery joining the route that already holds its pickup.
        assert!(view_accepts(&model, &[&[0], &[]], &[(0, 1), (1, 7)]));
    }

    #[test]
    fn test_policy_matches_solution_audit() {
        use crate::evaluation::SolutionEvaluator;

        let model = policy_model(PickupDeliveryPolicy::Lifo);
        let evaluator = SolutionEvaluator::new(&model);
        for route in [[0, 2, 3, 1], [0, 2, 1, 3], [2, 0, 1, 3], [2, 0, 3, 1]] {
            let assignment = committed(&model, &[&route]);
            let audit_ok = evaluator.check(&assignment).is_empty();
            let changes: Vec<(usize, usize)> = std::iter::once(4)
                .chain(route)
                .zip(route.into_iter().chain(std::iter::once(5)))
                .collect();
            assert_eq!(view_accepts(&model, &[&[]], &changes), audit_ok, "{route:?}");
        }
    }

    fn policy_model(policy: PickupDeliveryPolicy) -> RoutingModel {
        let points: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, 0.0)).collect();
        let mut model = RoutingModel::new(
            5,
            vec![Vehicle::new(0).with_pickup_delivery_policy(policy)],
            CostMatrix::from_points(&points),
        )
        .expect("valid model");
        // Indices 0..4 visits, 4 start, 5 end.
        model.add_pickup_and_delivery(0, 1).expect("valid");
        model.add_pickup_and_delivery(2, 3).expect("valid");
        model
    }

    #[test]
    fn test_lifo() {
        let model = policy_model(PickupDeliveryPolicy::Lifo);
        let nested = [(4, 0), (0, 2), (2, 3), (3, 1), (1, 5)];
        let crossed = [(4, 0), (0, 2), (2, 1), (1, 3), (3, 5)];
        assert!(view_accepts(&model, &[&[]], &nested));
        assert!(!view_accepts(&model, &[&[]], &crossed));
    }

    #[test]
    fn test_fifo() {
        let model = policy_model(PickupDeliveryPolicy::Fifo);
        let nested = [(4, 0), (0, 2), (2, 3), (3, 1), (1, 5)];
        let crossed = [(4, 0), (0, 2), (2, 1), (1, 3), (3, 5)];
        assert!(!view_accepts(&model, &[&[]], &nested));
        assert!(view_accepts(&model, &[&[]], &crossed));
    }
}
