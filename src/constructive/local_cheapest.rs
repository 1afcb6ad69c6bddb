//! Local cheapest insertion.
//!
//! # Algorithm
//!
//! Visits are taken one at a time in a fixed order and each is placed at
//! its cheapest feasible position on any route:
//!
//! 1. Pickup–delivery pairs, in declaration order. Pickup positions are
//!    tried cheapest first; for each, the delivery positions after the
//!    pickup are tried cheapest first, and the first feasible combination
//!    is kept.
//! 2. Every other visit, farthest from its closest vehicle first.
//!
//! Whatever could not be placed is left unperformed.
//!
//! # Complexity
//!
//! O(n² · m log(n · m)) for n visits and m vehicles; pairs add a factor of
//! the route length for the delivery positions.

use std::cmp::Reverse;

use log::{debug, trace};

use crate::construction::{InsertionPricer, RoutingBuilder};

/// Builds a first solution by local cheapest insertion.
///
/// Returns `false` if the build was stopped or a mandatory visit could not
/// be placed.
///
/// # Examples
///
/// ```
/// use u_routing_init::construction::{InsertionPricer, RoutingBuilder};
/// use u_routing_init::constructive::local_cheapest_insertion;
/// use u_routing_init::distance::CostMatrix;
/// use u_routing_init::filters::DisjunctionRule;
/// use u_routing_init::models::{RoutingModel, Vehicle};
///
/// let points = [(0.0, 0.0), (4.0, 0.0), (0.0, 3.0)];
/// let model = RoutingModel::new(3, vec![Vehicle::new(0)], CostMatrix::from_points(&points)).unwrap();
/// let mut builder = RoutingBuilder::new(&model, vec![Box::new(DisjunctionRule::new())]);
/// let pricer = InsertionPricer::from_model(&model);
///
/// assert!(local_cheapest_insertion(&mut builder, &pricer));
/// assert_eq!(builder.assignment().route(0).len(), 4);
/// ```
pub fn local_cheapest_insertion(builder: &mut RoutingBuilder<'_>, pricer: &InsertionPricer<'_>) -> bool {
    if !builder.initialize_routes() {
        return false;
    }
    let model = builder.model();

    for pair in model.pickup_delivery_pairs() {
        for &pickup in pair.pickups() {
            for &delivery in pair.deliveries() {
                if builder.should_stop() {
                    return false;
                }
                if builder.contains(pickup) || builder.contains(delivery) {
                    continue;
                }
                insert_pair(builder, pricer, pickup, delivery);
            }
        }
    }

    let nodes: Vec<usize> = (0..model.size())
        .filter(|&i| !model.is_start(i) && !builder.contains(i) && !model.is_pickup(i) && !model.is_delivery(i))
        .collect();
    let vehicles: Vec<usize> = (0..model.num_vehicles()).collect();
    let distances = pricer.start_end_distances(&nodes, &vehicles);
    let mut ordered: Vec<(Reverse<i64>, usize)> = nodes
        .iter()
        .filter_map(|&i| distances[i].last().map(|closest| (Reverse(closest.distance), i)))
        .collect();
    ordered.sort_unstable();

    for (_, node) in ordered {
        if builder.should_stop() {
            return false;
        }
        if builder.contains(node) {
            continue;
        }
        for position in pricer.sorted_positions(builder, node) {
            let Some(insert_before) = builder.value(position.insert_after) else {
                continue;
            };
            builder.insert_between(node, position.insert_after, insert_before);
            if builder.commit() {
                trace!(
                    "inserted {node} after {} on vehicle {} at cost {}",
                    position.insert_after,
                    position.vehicle,
                    position.cost
                );
                break;
            }
        }
    }
    if builder.should_stop() {
        return false;
    }

    builder.make_unassigned_nodes_unperformed();
    let committed = builder.commit();
    debug!("local cheapest insertion finished: committed={committed}");
    committed
}

/// Tries pickup positions cheapest first, and for each the delivery
/// positions after it cheapest first, committing the first feasible pair.
fn insert_pair(builder: &mut RoutingBuilder<'_>, pricer: &InsertionPricer<'_>, pickup: usize, delivery: usize) -> bool {
    for pickup_position in pricer.sorted_positions(builder, pickup) {
        let pickup_after = pickup_position.insert_after;
        let Some(pickup_before) = builder.value(pickup_after) else {
            continue;
        };
        let mut delivery_positions = Vec::new();
        pricer.append_evaluated_positions_after(
            builder,
            delivery,
            pickup,
            pickup_before,
            pickup_position.vehicle,
            &mut delivery_positions,
        );
        delivery_positions.sort_unstable();

        for delivery_position in delivery_positions {
            if builder.should_stop() {
                return false;
            }
            let delivery_after = delivery_position.insert_after;
            let delivery_before = if delivery_after == pickup {
                pickup_before
            } else {
                match builder.value(delivery_after) {
                    Some(next) => next,
                    None => continue,
                }
            };
            builder.insert_between(pickup, pickup_after, pickup_before);
            builder.insert_between(delivery, delivery_after, delivery_before);
            if builder.commit() {
                trace!(
                    "inserted pair ({pickup}, {delivery}) on vehicle {}",
                    pickup_position.vehicle
                );
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructive::tests::{builder_for, line_scenario, standard_rules};
    use crate::filters::CapacityRule;
    use crate::models::{NodeState, PickupDeliveryPolicy, RoutingModel, Vehicle};
    use crate::distance::CostMatrix;

    #[test]
    fn test_line_scenario_visits_in_order() {
        let model = line_scenario();
        let mut builder = builder_for(&model, standard_rules());
        let pricer = InsertionPricer::from_model(&model);
        assert!(local_cheapest_insertion(&mut builder, &pricer));
        assert_eq!(builder.assignment().route(0), &[4, 0, 1, 2, 3, 5]);
    }

    #[test]
    fn test_pair_pickup_precedes_delivery() {
        let mut model = line_scenario();
        // Picked up at D, delivered at A.
        model.add_pickup_and_delivery(3, 0).expect("valid");
        let mut builder = builder_for(&model, standard_rules());
        let pricer = InsertionPricer::from_model(&model);
        assert!(local_cheapest_insertion(&mut builder, &pricer));
        let a = builder.assignment();
        assert_eq!(a.route(0).len(), 6);
        assert!(a.rank(3) < a.rank(0));
    }

    #[test]
    fn test_lifo_policy_nests_pairs() {
        // Depot and four visits on a line; vehicle with LIFO loading.
        let points = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)];
        let vehicle = Vehicle::new(0).with_pickup_delivery_policy(PickupDeliveryPolicy::Lifo);
        let mut model = RoutingModel::new(5, vec![vehicle], CostMatrix::from_points(&points)).expect("valid");
        // Indices 0..4 visits. Pairs (0 -> 2) and (1 -> 3).
        model.add_pickup_and_delivery(0, 2).expect("valid");
        model.add_pickup_and_delivery(1, 3).expect("valid");
        let mut builder = builder_for(&model, standard_rules());
        let pricer = InsertionPricer::from_model(&model);
        assert!(local_cheapest_insertion(&mut builder, &pricer));

        let a = builder.assignment();
        let ranks: Vec<usize> = (0..4).map(|i| a.rank(i).expect("performed")).collect();
        // Either disjoint or nested, never crossing.
        let nested = ranks[0] < ranks[1] && ranks[3] < ranks[2];
        let disjoint = ranks[2] < ranks[1] || ranks[3] < ranks[0];
        let inner_first = ranks[1] < ranks[0] && ranks[2] < ranks[3];
        assert!(nested || disjoint || inner_first, "ranks {ranks:?}");
    }

    #[test]
    fn test_unplaceable_optional_visit_is_unperformed() {
        let mut model = line_scenario();
        model.add_disjunction(&[1], Some(100), 1).expect("valid");
        let mut rules = standard_rules();
        rules.push(Box::new(CapacityRule::new(vec![1, 9, 1, 1, 0], vec![5])));
        let mut builder = builder_for(&model, rules);
        let pricer = InsertionPricer::from_model(&model);
        assert!(local_cheapest_insertion(&mut builder, &pricer));
        assert_eq!(builder.assignment().state(1), NodeState::Inactive);
        assert_eq!(builder.assignment().route(0), &[4, 0, 2, 3, 5]);
    }

    #[test]
    fn test_stop_cancels_build() {
        let model = line_scenario();
        let mut builder = builder_for(&model, standard_rules()).with_stop(Box::new(|| true));
        let pricer = InsertionPricer::from_model(&model);
        assert!(!local_cheapest_insertion(&mut builder, &pricer));
    }
}
