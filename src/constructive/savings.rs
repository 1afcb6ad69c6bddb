//! Clarke-Wright savings with vehicle types.
//!
//! # Algorithm
//!
//! Vehicles sharing a cost class and start/end nodes form a *type*. For
//! every type and every arc `before → after` between two visits, the
//! saving of joining the route ending at `before` with the route starting
//! at `after` is
//!
//! ```text
//! s(before, after) = c(before, end) + c(start, after) - λ · c(before, after)
//! ```
//!
//! with λ the arc coefficient. Arcs are restricted to each visit's
//! k nearest neighbors, optionally with their reverse arcs added, and
//! sorted by decreasing saving. Two growth strategies consume them:
//!
//! - *sequential*: the best saving between two free visits opens a route,
//!   which is then extended at whichever end has the better remaining
//!   saving until neither can grow; then the next route is opened.
//! - *parallel*: savings are scanned once; each opens a route, extends a
//!   route at its first or last visit, or merges two routes end to front
//!   onto the vehicle with the lower fixed cost.
//!
//! Within a type, new routes go to the available vehicle with the lowest
//! fixed cost whose commit the rules accept. Only vehicles without locked
//! visits take part. An arc from a delivery to one of its own pickups is
//! never a saving.
//!
//! Visits no saving placed are routed last. A delivery whose pickup is
//! placed is appended to the pickup's route; a mandatory pickup goes with
//! one of its deliveries; any other mandatory visit gets a route of its own
//! on a vehicle still available, or else is appended to an existing route.
//! These passes repeat while they place something, so deliveries held back
//! by a LIFO or FIFO order get their turn.
//!
//! # Complexity
//!
//! O(t · n · k log(n · k)) to build and sort the savings for t types, n
//! visits and k neighbors; each saving is then consumed in amortized
//! constant commits.
//!
//! # Reference
//!
//! Clarke, G. & Wright, J.W. (1964). "Scheduling of Vehicles from a Central
//! Depot to a Number of Delivery Points", *Operations Research* 12(4), 568-581.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{debug, trace};

use crate::construction::RoutingBuilder;
use crate::distance::Cost;
use crate::models::RoutingModel;

/// Options of [`savings`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavingsOptions {
    /// Share of visits kept as neighbors of each visit.
    pub neighbors_ratio: f64,
    /// Also consider `after → before` for every neighbor arc.
    pub add_reverse_arcs: bool,
    /// Weight λ of the joining arc; must be positive.
    pub arc_coefficient: f64,
    /// Grow all routes at once instead of one at a time.
    pub is_parallel: bool,
}

impl Default for SavingsOptions {
    fn default() -> Self {
        Self {
            neighbors_ratio: 1.0,
            add_reverse_arcs: false,
            arc_coefficient: 1.0,
            is_parallel: false,
        }
    }
}

/// Benefit of linking `before → after` on a vehicle type.
///
/// Larger savings sort first; ties go to the lower type, then the lower
/// arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Saving {
    /// Saving value.
    pub value: Cost,
    /// Vehicle type.
    pub vehicle_type: usize,
    /// Tail of the arc.
    pub before: usize,
    /// Head of the arc.
    pub after: usize,
}

impl Ord for Saving {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .value
            .cmp(&self.value)
            .then_with(|| self.vehicle_type.cmp(&other.vehicle_type))
            .then_with(|| self.before.cmp(&other.before))
            .then_with(|| self.after.cmp(&other.after))
    }
}

impl PartialOrd for Saving {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Vehicle types and the vehicles of each still free to open a route.
struct VehicleTypes {
    type_of_vehicle: Vec<usize>,
    /// Per type, the representative vehicle used for costs.
    representatives: Vec<usize>,
    available: Vec<BTreeSet<(Cost, usize)>>,
}

impl VehicleTypes {
    fn new(builder: &RoutingBuilder<'_>) -> Self {
        let model = builder.model();
        let mut ids = BTreeMap::new();
        let mut type_of_vehicle = Vec::with_capacity(model.num_vehicles());
        let mut representatives = Vec::new();
        for vehicle in 0..model.num_vehicles() {
            let v = model.vehicle(vehicle);
            let key = (v.cost_class(), v.start_node(), v.end_node());
            let id = *ids.entry(key).or_insert_with(|| {
                representatives.push(vehicle);
                representatives.len() - 1
            });
            type_of_vehicle.push(id);
        }

        let mut available = vec![BTreeSet::new(); representatives.len()];
        for vehicle in 0..model.num_vehicles() {
            let (start, end) = (model.start(vehicle), model.end(vehicle));
            let unlocked = builder.start_chain_end(vehicle) == start
                && builder.end_chain_start(vehicle) == end
                && builder.value(start) == Some(end);
            if unlocked {
                available[type_of_vehicle[vehicle]].insert((model.fixed_cost_of_vehicle(vehicle), vehicle));
            }
        }
        Self {
            type_of_vehicle,
            representatives,
            available,
        }
    }

    fn num_types(&self) -> usize {
        self.representatives.len()
    }
}

/// Computes the sorted savings of every type with a free vehicle.
fn compute_savings(model: &RoutingModel, types: &VehicleTypes, nodes: &[usize], options: &SavingsOptions) -> Vec<Saving> {
    if nodes.len() < 2 {
        return Vec::new();
    }
    let num_neighbors = if options.neighbors_ratio >= 1.0 {
        nodes.len() - 1
    } else {
        ((options.neighbors_ratio * nodes.len() as f64) as usize).clamp(1, nodes.len() - 1)
    };

    let mut savings = Vec::new();
    for (vehicle_type, &vehicle) in types.representatives.iter().enumerate() {
        if types.available[vehicle_type].is_empty() {
            continue;
        }
        let cost_class = model.cost_class_of_vehicle(vehicle);
        let (start, end) = (model.start(vehicle), model.end(vehicle));
        let cost = |from: usize, to: usize| model.arc_cost_for_class(from, to, cost_class);

        let mut arcs = HashSet::new();
        for &before in nodes {
            let mut costed: Vec<(Cost, usize)> = nodes
                .iter()
                .filter(|&&after| after != before && !reverses_pair(model, before, after))
                .map(|&after| (cost(before, after), after))
                .collect();
            if num_neighbors < costed.len() {
                costed.select_nth_unstable(num_neighbors - 1);
                costed.truncate(num_neighbors);
            }
            for (_, after) in costed {
                arcs.insert((before, after));
                if options.add_reverse_arcs && !reverses_pair(model, after, before) {
                    arcs.insert((after, before));
                }
            }
        }

        for (before, after) in arcs {
            let joined = (options.arc_coefficient * cost(before, after) as f64).round() as Cost;
            let value = cost(before, end)
                .saturating_add(cost(start, after))
                .saturating_sub(joined);
            savings.push(Saving {
                value,
                vehicle_type,
                before,
                after,
            });
        }
    }
    savings.sort_unstable();
    savings
}

/// `true` if `before` delivers a pair that `after` picks up.
fn reverses_pair(model: &RoutingModel, before: usize, after: usize) -> bool {
    model
        .delivery_pairs_of(before)
        .iter()
        .any(|pair| model.pickup_pairs_of(after).contains(pair))
}

/// Builds a first solution with the savings heuristic.
///
/// Returns `false` if the build was stopped or a mandatory visit was left
/// unassigned.
///
/// # Examples
///
/// ```
/// use u_routing_init::construction::RoutingBuilder;
/// use u_routing_init::constructive::{savings, SavingsOptions};
/// use u_routing_init::distance::CostMatrix;
/// use u_routing_init::filters::DisjunctionRule;
/// use u_routing_init::models::{RoutingModel, Vehicle};
///
/// let points = [(0.0, 0.0), (10.0, 0.0), (11.0, 0.0), (-10.0, 0.0)];
/// let model = RoutingModel::new(4, vec![Vehicle::new(0)], CostMatrix::from_points(&points)).unwrap();
/// let mut builder = RoutingBuilder::new(&model, vec![Box::new(DisjunctionRule::new())]);
///
/// assert!(savings(&mut builder, &SavingsOptions::default()));
/// assert_eq!(builder.assignment().route(0).len(), 5);
/// ```
pub fn savings(builder: &mut RoutingBuilder<'_>, options: &SavingsOptions) -> bool {
    if !builder.initialize_routes() {
        return false;
    }
    let model = builder.model();
    let mut types = VehicleTypes::new(builder);
    let nodes: Vec<usize> = (0..model.size())
        .filter(|&i| !model.is_start(i) && !builder.contains(i))
        .collect();
    let sorted = compute_savings(model, &types, &nodes, options);
    debug!(
        "computed {} savings over {} vehicle types",
        sorted.len(),
        types.num_types()
    );

    let completed = if options.is_parallel {
        let mut parallel = ParallelSavings::new(builder, &mut types);
        let completed = parallel.run(&sorted);
        debug!("parallel savings applied {} savings", parallel.applied.len());
        completed
    } else {
        sequential_savings(builder, &mut types, &sorted)
    };
    if !completed || !route_leftovers(builder, &mut types, &nodes) || builder.should_stop() {
        return false;
    }

    builder.make_unassigned_nodes_unperformed();
    let committed = builder.commit();
    debug!("savings finished: committed={committed}");
    committed
}

/// Opens a route `before → after` on the cheapest accepting vehicle of the
/// saving's type.
fn start_new_route(builder: &mut RoutingBuilder<'_>, types: &mut VehicleTypes, saving: &Saving) -> Option<usize> {
    let model = builder.model();
    let candidates: Vec<(Cost, usize)> = types.available[saving.vehicle_type].iter().copied().collect();
    for (fixed_cost, vehicle) in candidates {
        let (start, end) = (model.start(vehicle), model.end(vehicle));
        builder.insert_between(saving.before, start, end);
        builder.insert_between(saving.after, saving.before, end);
        if builder.commit() {
            types.available[saving.vehicle_type].remove(&(fixed_cost, vehicle));
            trace!(
                "opened route of vehicle {vehicle} with {} -> {}",
                saving.before,
                saving.after
            );
            return Some(vehicle);
        }
    }
    None
}

/// Places the visits the savings left free, pass after pass while a pass
/// places something.
///
/// Returns `false` only when stopped.
fn route_leftovers(builder: &mut RoutingBuilder<'_>, types: &mut VehicleTypes, nodes: &[usize]) -> bool {
    loop {
        let mut placed = false;
        for &node in nodes {
            if builder.should_stop() {
                return false;
            }
            if builder.contains(node) {
                continue;
            }
            placed |= match leftover_placement(builder, node) {
                Leftover::Skip => false,
                Leftover::OnVehicle(vehicle) => append_chain(builder, vehicle, &[node]),
                Leftover::Chains(chains) => place_chain(builder, types, &chains),
            };
        }
        if !placed {
            return true;
        }
    }
}

/// Where a free visit goes after the savings.
enum Leftover {
    /// Left for the final sweep.
    Skip,
    /// Appended to this vehicle's route.
    OnVehicle(usize),
    /// One of these chains on a new or an existing route.
    Chains(Vec<Vec<usize>>),
}

fn leftover_placement(builder: &RoutingBuilder<'_>, node: usize) -> Leftover {
    let model = builder.model();
    let pairs = model.pickup_delivery_pairs();
    if model.is_delivery(node) {
        let pickup_vehicle = model
            .delivery_pairs_of(node)
            .iter()
            .flat_map(|&pair| pairs[pair].pickups())
            .find_map(|&p| builder.assignment().vehicle_of(p));
        return pickup_vehicle.map_or(Leftover::Skip, Leftover::OnVehicle);
    }
    if model.is_pickup(node) {
        let deliveries: Vec<usize> = model
            .pickup_pairs_of(node)
            .iter()
            .flat_map(|&pair| pairs[pair].deliveries().iter().copied())
            .filter(|&d| !builder.contains(d))
            .collect();
        let needed = !model.can_be_inactive(node) || deliveries.iter().any(|&d| !model.can_be_inactive(d));
        if !needed {
            return Leftover::Skip;
        }
        return Leftover::Chains(deliveries.into_iter().map(|d| vec![node, d]).collect());
    }
    if model.can_be_inactive(node) {
        Leftover::Skip
    } else {
        Leftover::Chains(vec![vec![node]])
    }
}

/// Places the first of `chains` that fits, on a route of its own if
/// possible.
fn place_chain(builder: &mut RoutingBuilder<'_>, types: &mut VehicleTypes, chains: &[Vec<usize>]) -> bool {
    let num_vehicles = builder.model().num_vehicles();
    for chain in chains {
        if open_route_with(builder, types, chain) {
            return true;
        }
        if (0..num_vehicles).any(|vehicle| append_chain(builder, vehicle, chain)) {
            return true;
        }
    }
    false
}

/// Opens a route holding exactly `chain` on any available vehicle.
fn open_route_with(builder: &mut RoutingBuilder<'_>, types: &mut VehicleTypes, chain: &[usize]) -> bool {
    let model = builder.model();
    for vehicle_type in 0..types.num_types() {
        let candidates: Vec<(Cost, usize)> = types.available[vehicle_type].iter().copied().collect();
        for (fixed_cost, vehicle) in candidates {
            let mut prev = model.start(vehicle);
            for &index in chain {
                builder.set_value(prev, index);
                prev = index;
            }
            builder.set_value(prev, model.end(vehicle));
            if builder.commit() {
                types.available[vehicle_type].remove(&(fixed_cost, vehicle));
                trace!("opened leftover route of vehicle {vehicle} with {chain:?}");
                return true;
            }
        }
    }
    false
}

/// Appends `chain` at the end of the free segment of a vehicle's route.
fn append_chain(builder: &mut RoutingBuilder<'_>, vehicle: usize, chain: &[usize]) -> bool {
    let end = builder.end_chain_start(vehicle);
    let route = builder.assignment().route(vehicle);
    let Some(mut prev) = route
        .iter()
        .position(|&i| i == end)
        .and_then(|p| p.checked_sub(1))
        .map(|p| route[p])
    else {
        return false;
    };
    for &index in chain {
        builder.set_value(prev, index);
        prev = index;
    }
    builder.set_value(prev, end);
    if builder.commit() {
        trace!("appended leftover {chain:?} to vehicle {vehicle}");
        true
    } else {
        false
    }
}

/// Savings touching each visit, best first, per type.
struct SavingLists {
    incoming: Vec<Vec<Vec<Saving>>>,
    outgoing: Vec<Vec<Vec<Saving>>>,
}

impl SavingLists {
    fn new(size: usize, num_types: usize, savings: &[Saving]) -> Self {
        let mut incoming = vec![vec![Vec::new(); size]; num_types];
        let mut outgoing = vec![vec![Vec::new(); size]; num_types];
        for saving in savings {
            incoming[saving.vehicle_type][saving.after].push(*saving);
            outgoing[saving.vehicle_type][saving.before].push(*saving);
        }
        Self { incoming, outgoing }
    }
}

/// Next saving at or after `cursor` whose new visit is still free.
fn next_free(builder: &RoutingBuilder<'_>, list: &[Saving], cursor: &mut usize, new_visit: impl Fn(&Saving) -> usize) -> Option<Saving> {
    while let Some(saving) = list.get(*cursor) {
        if !builder.contains(new_visit(saving)) {
            return Some(*saving);
        }
        *cursor += 1;
    }
    None
}

fn sequential_savings(builder: &mut RoutingBuilder<'_>, types: &mut VehicleTypes, savings: &[Saving]) -> bool {
    let model = builder.model();
    let lists = SavingLists::new(model.size(), types.num_types(), savings);

    for saving in savings {
        if builder.should_stop() {
            return false;
        }
        if builder.contains(saving.before) || builder.contains(saving.after) {
            continue;
        }
        let Some(vehicle) = start_new_route(builder, types, saving) else {
            continue;
        };
        let (start, end) = (model.start(vehicle), model.end(vehicle));
        let incoming = &lists.incoming[saving.vehicle_type];
        let outgoing = &lists.outgoing[saving.vehicle_type];
        let (mut first, mut last) = (saving.before, saving.after);
        let (mut in_cursor, mut out_cursor) = (0, 0);

        loop {
            if builder.should_stop() {
                return false;
            }
            let best_in = next_free(builder, &incoming[first], &mut in_cursor, |s| s.before);
            let best_out = next_free(builder, &outgoing[last], &mut out_cursor, |s| s.after);
            let extend_front = match (best_in, best_out) {
                (None, None) => break,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (Some(i), Some(o)) => i.value > o.value,
            };
            if let (true, Some(s)) = (extend_front, best_in) {
                builder.insert_between(s.before, start, first);
                if builder.commit() {
                    first = s.before;
                    in_cursor = 0;
                } else {
                    in_cursor += 1;
                }
            } else if let Some(s) = best_out {
                builder.insert_between(s.after, last, end);
                if builder.commit() {
                    last = s.after;
                    out_cursor = 0;
                } else {
                    out_cursor += 1;
                }
            }
        }
        trace!("closed route of vehicle {vehicle}: {first} .. {last}");
    }
    true
}

struct ParallelSavings<'b, 'a> {
    builder: &'b mut RoutingBuilder<'a>,
    types: &'b mut VehicleTypes,
    first: Vec<usize>,
    last: Vec<usize>,
    vehicle_of_first: Vec<Option<usize>>,
    vehicle_of_last: Vec<Option<usize>>,
    /// Savings whose commit was accepted, in the order applied.
    applied: Vec<Saving>,
}

impl<'b, 'a> ParallelSavings<'b, 'a> {
    fn new(builder: &'b mut RoutingBuilder<'a>, types: &'b mut VehicleTypes) -> Self {
        let model = builder.model();
        let size = model.size();
        let num_vehicles = model.num_vehicles();
        Self {
            builder,
            types,
            first: (0..num_vehicles).map(|v| model.start(v)).collect(),
            last: (0..num_vehicles).map(|v| model.end(v)).collect(),
            vehicle_of_first: vec![None; size],
            vehicle_of_last: vec![None; size],
            applied: Vec::new(),
        }
    }

    fn set_first(&mut self, vehicle: usize, index: usize) {
        if let Some(old) = self.vehicle_of_first.get_mut(self.first[vehicle]) {
            *old = None;
        }
        self.first[vehicle] = index;
        self.vehicle_of_first[index] = Some(vehicle);
    }

    fn set_last(&mut self, vehicle: usize, index: usize) {
        if let Some(old) = self.vehicle_of_last.get_mut(self.last[vehicle]) {
            *old = None;
        }
        self.last[vehicle] = index;
        self.vehicle_of_last[index] = Some(vehicle);
    }

    fn clear_route(&mut self, vehicle: usize) {
        let model = self.builder.model();
        let (first, last) = (self.first[vehicle], self.last[vehicle]);
        if let Some(slot) = self.vehicle_of_first.get_mut(first) {
            *slot = None;
        }
        if let Some(slot) = self.vehicle_of_last.get_mut(last) {
            *slot = None;
        }
        self.first[vehicle] = model.start(vehicle);
        self.last[vehicle] = model.end(vehicle);
    }

    fn run(&mut self, savings: &[Saving]) -> bool {
        let model = self.builder.model();
        let type_of_vehicle = self.types.type_of_vehicle.clone();
        for saving in savings {
            if self.builder.should_stop() {
                return false;
            }
            let (before, after) = (saving.before, saving.after);
            let matches = |v: &usize| type_of_vehicle[*v] == saving.vehicle_type;
            let applied = match (self.builder.contains(before), self.builder.contains(after)) {
                (false, false) => match start_new_route(self.builder, self.types, saving) {
                    Some(vehicle) => {
                        self.set_first(vehicle, before);
                        self.set_last(vehicle, after);
                        true
                    }
                    None => false,
                },
                (true, false) => {
                    let Some(vehicle) = self.vehicle_of_last[before].filter(matches) else {
                        continue;
                    };
                    self.builder.insert_between(after, before, model.end(vehicle));
                    let committed = self.builder.commit();
                    if committed {
                        self.set_last(vehicle, after);
                    }
                    committed
                }
                (false, true) => {
                    let Some(vehicle) = self.vehicle_of_first[after].filter(matches) else {
                        continue;
                    };
                    self.builder.insert_between(before, model.start(vehicle), after);
                    let committed = self.builder.commit();
                    if committed {
                        self.set_first(vehicle, before);
                    }
                    committed
                }
                (true, true) => {
                    let (Some(tail), Some(head)) = (
                        self.vehicle_of_last[before].filter(matches),
                        self.vehicle_of_first[after].filter(matches),
                    ) else {
                        continue;
                    };
                    tail != head && self.merge(saving, tail, head)
                }
            };
            if applied {
                self.applied.push(*saving);
            }
        }
        true
    }

    /// Appends the route of `head` to the route of `tail`, keeping it on
    /// the vehicle with the lower fixed cost and falling back to the other.
    fn merge(&mut self, saving: &Saving, tail: usize, head: usize) -> bool {
        let model = self.builder.model();
        let keep_tail_first = model.fixed_cost_of_vehicle(tail) <= model.fixed_cost_of_vehicle(head);
        let order = if keep_tail_first {
            [(tail, head), (head, tail)]
        } else {
            [(head, tail), (tail, head)]
        };
        for (kept, freed) in order {
            if kept == tail {
                self.builder.set_value(saving.before, saving.after);
                self.builder.set_value(self.last[head], model.end(tail));
                self.builder.set_value(model.start(head), model.end(head));
            } else {
                self.builder.set_value(model.start(head), self.first[tail]);
                self.builder.set_value(saving.before, saving.after);
                self.builder.set_value(model.start(tail), model.end(tail));
            }
            if !self.builder.commit() {
                continue;
            }
            let (first, last) = (self.first[tail], self.last[head]);
            self.clear_route(tail);
            self.clear_route(head);
            self.set_first(kept, first);
            self.set_last(kept, last);
            self.types.available[self.types.type_of_vehicle[freed]]
                .insert((model.fixed_cost_of_vehicle(freed), freed));
            trace!("merged routes of vehicles {tail} and {head} onto {kept}");
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructive::tests::{builder_for, line_scenario, standard_rules};
    use crate::distance::CostMatrix;
    use crate::filters::CapacityRule;
    use crate::models::{PickupDeliveryPolicy, Vehicle};

    /// Two pairs of visits on either side of the depot. Indices 0..4
    /// visits at x = 10, 11, -10, -11; 4/5 starts; 6/7 ends. Vehicle 0
    /// has a fixed cost of 5.
    fn two_sided() -> RoutingModel {
        let points = [(0.0, 0.0), (10.0, 0.0), (11.0, 0.0), (-10.0, 0.0), (-11.0, 0.0)];
        let vehicles = vec![Vehicle::new(0).with_fixed_cost(5), Vehicle::new(0)];
        RoutingModel::new(5, vehicles, CostMatrix::from_points(&points)).expect("valid")
    }

    fn sequential() -> SavingsOptions {
        SavingsOptions::default()
    }

    fn parallel() -> SavingsOptions {
        SavingsOptions {
            is_parallel: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_saving_order() {
        let a = Saving { value: 5, vehicle_type: 0, before: 3, after: 1 };
        let b = Saving { value: 5, vehicle_type: 0, before: 3, after: 2 };
        let c = Saving { value: 7, vehicle_type: 1, before: 9, after: 9 };
        let mut all = vec![b, a, c];
        all.sort();
        assert_eq!(all, vec![c, a, b]);
    }

    #[test]
    fn test_line_scenario_both_strategies() {
        let model = line_scenario();
        for options in [sequential(), parallel()] {
            let mut builder = builder_for(&model, standard_rules());
            assert!(savings(&mut builder, &options));
            assert_eq!(builder.assignment().route(0), &[4, 0, 1, 3, 2, 5], "{options:?}");
        }
    }

    #[test]
    fn test_sequential_prefers_cheaper_vehicle() {
        let model = two_sided();
        let mut builder = builder_for(&model, standard_rules());
        assert!(savings(&mut builder, &sequential()));
        assert_eq!(builder.assignment().route(1), &[5, 0, 1, 2, 3, 7]);
        assert_eq!(builder.assignment().route(0), &[4, 6]);
    }

    #[test]
    fn test_capacity_splits_routes() {
        let model = two_sided();
        for options in [sequential(), parallel()] {
            let mut rules = standard_rules();
            rules.push(Box::new(CapacityRule::from_node_demands(&model, &[0, 1, 1, 1, 1], &[2, 2])));
            let mut builder = builder_for(&model, rules);
            assert!(savings(&mut builder, &options));
            assert_eq!(builder.assignment().route(1), &[5, 0, 1, 7], "{options:?}");
            assert_eq!(builder.assignment().route(0), &[4, 2, 3, 6], "{options:?}");
        }
    }

    #[test]
    fn test_parallel_merges_onto_cheaper_vehicle() {
        let model = two_sided();
        let mut builder = builder_for(&model, standard_rules());
        assert!(savings(&mut builder, &parallel()));
        assert_eq!(builder.assignment().route(1), &[5, 0, 1, 2, 3, 7]);
        assert_eq!(builder.assignment().route(0), &[4, 6]);
    }

    #[test]
    fn test_neighbor_pruning_still_covers_every_visit() {
        let model = two_sided();
        let options = SavingsOptions {
            neighbors_ratio: 0.25,
            add_reverse_arcs: true,
            ..Default::default()
        };
        let mut builder = builder_for(&model, standard_rules());
        assert!(savings(&mut builder, &options));
        let a = builder.assignment();
        assert!((0..4).all(|i| a.vehicle_of(i).is_some()));
    }

    #[test]
    fn test_lone_visit_gets_its_own_route() {
        let points = [(0.0, 0.0), (4.0, 3.0)];
        let model = RoutingModel::new(2, vec![Vehicle::new(0)], CostMatrix::from_points(&points)).expect("valid");
        for options in [sequential(), parallel()] {
            let mut builder = builder_for(&model, standard_rules());
            assert!(savings(&mut builder, &options));
            assert_eq!(builder.assignment().route(0), &[1, 0, 2], "{options:?}");
        }
    }

    #[test]
    fn test_leftovers_join_locked_route() {
        let points = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)];
        let mut model = RoutingModel::new(4, vec![Vehicle::new(0)], CostMatrix::from_points(&points)).expect("valid");
        model.apply_locks(&[3, 2]).expect("valid");
        let mut builder = builder_for(&model, standard_rules());
        assert!(savings(&mut builder, &sequential()));
        assert_eq!(builder.assignment().route(0), &[3, 2, 0, 1, 4]);
    }

    #[test]
    fn test_savings_are_non_negative_on_a_metric() {
        // Manhattan distances on a small grid, depot at the origin.
        let points: [(i64, i64); 7] = [(0, 0), (3, 1), (-2, 4), (5, -3), (-4, -4), (1, 6), (2, 2)];
        let data = points
            .iter()
            .flat_map(|a| points.iter().map(move |b| (a.0 - b.0).abs() + (a.1 - b.1).abs()))
            .collect();
        let costs = CostMatrix::from_data(points.len(), data).expect("valid");
        let model = RoutingModel::new(points.len(), vec![Vehicle::new(0)], costs).expect("valid");
        let mut builder = builder_for(&model, standard_rules());
        assert!(builder.initialize_routes());
        let types = VehicleTypes::new(&builder);
        let nodes: Vec<usize> = (0..6).collect();
        let pruned = SavingsOptions {
            neighbors_ratio: 0.5,
            add_reverse_arcs: true,
            ..Default::default()
        };
        for options in [sequential(), pruned] {
            let savings = compute_savings(&model, &types, &nodes, &options);
            assert!(!savings.is_empty());
            assert!(savings.iter().all(|s| s.value >= 0), "{options:?}");
            assert!(savings.windows(2).all(|w| w[0].value >= w[1].value));
        }
    }

    #[test]
    fn test_parallel_applies_savings_in_non_increasing_order() {
        let model = two_sided();
        let mut builder = builder_for(&model, standard_rules());
        assert!(builder.initialize_routes());
        let mut types = VehicleTypes::new(&builder);
        let nodes: Vec<usize> = (0..4).collect();
        let sorted = compute_savings(&model, &types, &nodes, &parallel());
        let mut growth = ParallelSavings::new(&mut builder, &mut types);
        assert!(growth.run(&sorted));
        let values: Vec<Cost> = growth.applied.iter().map(|s| s.value).collect();
        assert!(values.len() >= 2);
        assert!(values.windows(2).all(|w| w[0] >= w[1]), "{values:?}");
    }

    #[test]
    fn test_no_saving_runs_from_a_delivery_to_its_pickup() {
        let mut model = two_sided();
        model.add_pickup_and_delivery(1, 0).expect("valid");
        let mut builder = builder_for(&model, standard_rules());
        assert!(builder.initialize_routes());
        let types = VehicleTypes::new(&builder);
        let options = SavingsOptions {
            add_reverse_arcs: true,
            ..Default::default()
        };
        let savings = compute_savings(&model, &types, &[0, 1, 2, 3], &options);
        assert!(savings.iter().any(|s| (s.before, s.after) == (1, 0)));
        assert!(!savings.iter().any(|s| (s.before, s.after) == (0, 1)));
    }

    #[test]
    fn test_pairs_are_served_pickup_first() {
        let mut model = two_sided();
        // Deliveries lie closer to the depot than their pickups.
        model.add_pickup_and_delivery(1, 0).expect("valid");
        model.add_pickup_and_delivery(3, 2).expect("valid");
        for options in [sequential(), parallel()] {
            let mut builder = builder_for(&model, standard_rules());
            assert!(savings(&mut builder, &options), "{options:?}");
            let a = builder.assignment();
            for (pickup, delivery) in [(1, 0), (3, 2)] {
                let (Some(pv), Some(dv)) = (a.vehicle_of(pickup), a.vehicle_of(delivery)) else {
                    panic!("pair ({pickup}, {delivery}) unserved with {options:?}");
                };
                assert_eq!(pv, dv);
                assert!(a.rank(pickup) < a.rank(delivery), "{options:?}");
            }
        }
    }

    #[test]
    fn test_leftover_deliveries_follow_their_pickups() {
        // With one neighbor per visit the deliveries only have savings
        // between themselves, which cannot open a route; they are placed
        // after the savings, inner pair first.
        let points: Vec<(f64, f64)> = [0.0, 1.0, 2.0, 3.0, 4.0].iter().map(|&x| (x, 0.0)).collect();
        let vehicle = Vehicle::new(0).with_pickup_delivery_policy(PickupDeliveryPolicy::Lifo);
        let mut model = RoutingModel::new(5, vec![vehicle], CostMatrix::from_points(&points)).expect("valid");
        model.add_pickup_and_delivery(0, 3).expect("valid");
        model.add_pickup_and_delivery(1, 2).expect("valid");
        let options = SavingsOptions {
            neighbors_ratio: 0.25,
            ..Default::default()
        };
        let mut builder = builder_for(&model, standard_rules());
        assert!(savings(&mut builder, &options));
        let a = builder.assignment();
        assert!((0..4).all(|i| a.vehicle_of(i) == Some(0)));
        assert!(model.follows_pickup_delivery_policy(a.route(0), PickupDeliveryPolicy::Lifo));
        assert!(a.rank(0) < a.rank(3) && a.rank(1) < a.rank(2));
    }

    #[test]
    fn test_locked_vehicle_is_skipped() {
        let mut model = two_sided();
        model.apply_locks(&[5, 0]).expect("valid");
        let mut builder = builder_for(&model, standard_rules());
        let types = {
            assert!(builder.initialize_routes());
            VehicleTypes::new(&builder)
        };
        assert_eq!(types.available[0].len(), 1);
        assert!(types.available[0].contains(&(5, 0)));
    }
}
