//! Path extension by best successor ("cheapest addition").
//!
//! # Algorithm
//!
//! Routes are grown one vehicle at a time from the end of their locked
//! prefix. At each step every free visit is ranked as the next stop and
//! the best one the rules accept is appended. Only when no free visit is
//! accepted does the walk move past the current successor, so a route is
//! closed once nothing more fits on it.
//!
//! A pickup is appended together with one of its deliveries; the route
//! then keeps growing between the two before moving past the delivery.
//! A delivery alone is only considered once one of its pickups is placed.
//!
//! Vehicles with locked prefixes go first (longest first), then higher
//! vehicle indices. Ranking is either an arc evaluator (cheapest first) or
//! a caller-supplied comparator.
//!
//! # Complexity
//!
//! O(n² log n · m) for n visits and m vehicles.

use std::cmp::{Ordering, Reverse};

use log::{debug, trace};

use crate::construction::RoutingBuilder;
use crate::distance::Cost;

/// How candidate successors of an index are ranked.
pub enum SuccessorRanking<'a> {
    /// `cost(from, to)`; cheaper successors first, ties to the lower index.
    Evaluator(Box<dyn Fn(usize, usize) -> Cost + 'a>),
    /// `prefers(from, a, b)` is `true` when `a` should follow `from`
    /// rather than `b`. Must be a strict weak order for every `from`.
    Comparator(Box<dyn Fn(usize, usize, usize) -> bool + 'a>),
}

impl SuccessorRanking<'_> {
    /// Sorts candidate successors of `from`, best first.
    fn sort(&self, from: usize, successors: &mut [usize]) {
        match self {
            SuccessorRanking::Evaluator(cost) => {
                successors.sort_by_cached_key(|&to| (cost(from, to), to));
            }
            SuccessorRanking::Comparator(prefers) => {
                successors.sort_unstable();
                successors.sort_by(|&a, &b| {
                    if prefers(from, a, b) {
                        Ordering::Less
                    } else if prefers(from, b, a) {
                        Ordering::Greater
                    } else {
                        Ordering::Equal
                    }
                });
            }
        }
    }
}

/// Builds a first solution by extending each route with its best-ranked
/// successor.
///
/// Returns `false` if the build was stopped or a mandatory visit was left
/// over.
///
/// # Examples
///
/// ```
/// use u_routing_init::construction::RoutingBuilder;
/// use u_routing_init::constructive::{cheapest_addition, SuccessorRanking};
/// use u_routing_init::distance::CostMatrix;
/// use u_routing_init::filters::DisjunctionRule;
/// use u_routing_init::models::{RoutingModel, Vehicle};
///
/// let points = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)];
/// let model = RoutingModel::new(4, vec![Vehicle::new(0)], CostMatrix::from_points(&points)).unwrap();
/// let mut builder = RoutingBuilder::new(&model, vec![Box::new(DisjunctionRule::new())]);
/// let ranking = SuccessorRanking::Evaluator(Box::new(|from, to| model.arc_cost_for_first_solution(from, to)));
///
/// assert!(cheapest_addition(&mut builder, &ranking));
/// assert_eq!(builder.assignment().route(0), &[3, 0, 1, 2, 4]);
/// ```
pub fn cheapest_addition(builder: &mut RoutingBuilder<'_>, ranking: &SuccessorRanking<'_>) -> bool {
    if !builder.initialize_routes() {
        return false;
    }
    let model = builder.model();
    let mut vehicles: Vec<usize> = (0..model.num_vehicles()).collect();
    vehicles.sort_by_key(|&v| (Reverse(builder.start_chain_length(v)), Reverse(v)));

    for vehicle in vehicles {
        if !extend_route(builder, ranking, vehicle) {
            return false;
        }
    }
    if builder.should_stop() {
        return false;
    }

    builder.make_unassigned_nodes_unperformed();
    let committed = builder.commit();
    let stats = builder.stats();
    debug!(
        "cheapest addition finished: committed={committed}, decisions={}, rejects={}",
        stats.decisions, stats.rejects
    );
    committed
}

/// Grows the free segment of one route. Returns `false` only when stopped.
fn extend_route(builder: &mut RoutingBuilder<'_>, ranking: &SuccessorRanking<'_>, vehicle: usize) -> bool {
    let model = builder.model();
    let end = builder.end_chain_start(vehicle);
    let mut index = builder.start_chain_end(vehicle);

    while !model.is_end(index) && index != end {
        let Some(target) = builder.value(index) else {
            return true;
        };
        let mut successors: Vec<usize> = (0..model.size())
            .filter(|&i| !model.is_start(i) && !builder.contains(i))
            .filter(|&i| {
                !model.is_delivery(i)
                    || model.delivery_pairs_of(i).iter().any(|&pair| {
                        model.pickup_delivery_pairs()[pair]
                            .pickups()
                            .iter()
                            .any(|&p| builder.contains(p))
                    })
            })
            .collect();
        ranking.sort(index, &mut successors);

        let mut next_index = target;
        for next in successors {
            if builder.should_stop() {
                return false;
            }
            if model.is_pickup(next) {
                if let Some(delivery) = append_pair(builder, index, next, target) {
                    trace!("appended pair ({next}, {delivery}) on vehicle {vehicle}");
                    next_index = next;
                    break;
                }
            }
            builder.insert_between(next, index, target);
            if builder.commit() {
                trace!("appended {next} on vehicle {vehicle}");
                next_index = next;
                break;
            }
        }
        index = next_index;
    }
    true
}

/// Tries `index → pickup → delivery → target` for each free delivery of
/// the pickup's pairs.
fn append_pair(builder: &mut RoutingBuilder<'_>, index: usize, pickup: usize, target: usize) -> Option<usize> {
    let model = builder.model();
    for &pair in model.pickup_pairs_of(pickup) {
        for &delivery in model.pickup_delivery_pairs()[pair].deliveries() {
            if builder.contains(delivery) {
                continue;
            }
            builder.insert_between(pickup, index, delivery);
            builder.insert_between(delivery, pickup, target);
            if builder.commit() {
                return Some(delivery);
            }
        }
    }
    None
}
