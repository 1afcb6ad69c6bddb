//! Global cheapest insertion.
//!
//! # Algorithm
//!
//! 1. Optionally seed `ceil(ratio × vehicles)` empty routes with the visits
//!    farthest from their closest vehicle.
//! 2. Insert pickup–delivery pairs from a single queue holding every
//!    `(pickup position, delivery position)` combination and the
//!    "both unperformed" option, cheapest first.
//! 3. Insert the remaining visits, either on all routes at once from one
//!    shared queue, or route by route (sequential), opening each new route
//!    with the nearest remaining visit.
//! 4. Leave whatever is still unassigned unperformed.
//!
//! After each accepted insertion only the entries anchored at the touched
//! positions are re-priced. Entries are popped by `(cost, index, anchor)`,
//! which makes the result independent of hash or heap internals.
//!
//! # Complexity
//!
//! O(n² · m) entries in the worst case for n visits and m vehicles, each
//! queue operation O(log(n² · m)). Neighbor pruning cuts the entry count to
//! O(n · k · m) for k neighbors.

use std::collections::{BTreeSet, HashSet};

use log::{debug, trace};

use crate::construction::{
    insert_seed_node, EntryId, EntryQueue, InsertionPricer, NeighborSets, Prioritized, RoutingBuilder,
    SeedQueue,
};
use crate::distance::{Cost, MAX_COST};

/// Options of [`global_cheapest_insertion`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalCheapestInsertionOptions {
    /// Fill routes one at a time instead of all at once.
    pub is_sequential: bool,
    /// Share of vehicles whose empty route is seeded with a far visit.
    pub farthest_seeds_ratio: f64,
    /// Share of visits kept as insertion neighbors of each visit.
    pub neighbors_ratio: f64,
}

impl Default for GlobalCheapestInsertionOptions {
    fn default() -> Self {
        Self {
            is_sequential: false,
            farthest_seeds_ratio: 0.0,
            neighbors_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PairInsertion {
    vehicle: usize,
    pickup_after: usize,
    delivery_after: usize,
}

#[derive(Debug, Clone, Copy)]
struct PairEntry {
    pickup: usize,
    delivery: usize,
    insertion: Option<PairInsertion>,
    value: Cost,
}

impl Prioritized for PairEntry {
    type Key = (Cost, usize, usize, Option<usize>, Option<usize>);

    fn key(&self) -> Self::Key {
        (
            self.value,
            self.pickup,
            self.delivery,
            self.insertion.map(|i| i.pickup_after),
            self.insertion.map(|i| i.delivery_after),
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeEntry {
    node: usize,
    /// `(insert_after, vehicle)`; `None` leaves the node unperformed.
    insertion: Option<(usize, usize)>,
    value: Cost,
}

impl Prioritized for NodeEntry {
    type Key = (Cost, usize, Option<usize>);

    fn key(&self) -> Self::Key {
        (self.value, self.node, self.insertion.map(|(after, _)| after))
    }
}

struct PairQueue {
    queue: EntryQueue<PairEntry>,
    by_pickup_anchor: Vec<BTreeSet<EntryId>>,
    by_delivery_anchor: Vec<BTreeSet<EntryId>>,
}

impl PairQueue {
    fn new(size: usize) -> Self {
        Self {
            queue: EntryQueue::new(),
            by_pickup_anchor: vec![BTreeSet::new(); size],
            by_delivery_anchor: vec![BTreeSet::new(); size],
        }
    }

    fn add(&mut self, entry: PairEntry) -> EntryId {
        let id = self.queue.insert(entry);
        if let Some(insertion) = entry.insertion {
            self.by_pickup_anchor[insertion.pickup_after].insert(id);
            self.by_delivery_anchor[insertion.delivery_after].insert(id);
        }
        id
    }

    fn delete(&mut self, id: EntryId) {
        if let Some(insertion) = self.queue.get(id).insertion {
            self.by_pickup_anchor[insertion.pickup_after].remove(&id);
            self.by_delivery_anchor[insertion.delivery_after].remove(&id);
        }
        self.queue.remove(id);
    }
}

struct NodeQueue {
    queue: EntryQueue<NodeEntry>,
    by_anchor: Vec<BTreeSet<EntryId>>,
}

impl NodeQueue {
    fn new(size: usize) -> Self {
        Self {
            queue: EntryQueue::new(),
            by_anchor: vec![BTreeSet::new(); size],
        }
    }

    fn add(&mut self, entry: NodeEntry) {
        let id = self.queue.insert(entry);
        if let Some((after, _)) = entry.insertion {
            self.by_anchor[after].insert(id);
        }
    }

    fn delete(&mut self, id: EntryId) {
        if let Some((after, _)) = self.queue.get(id).insertion {
            self.by_anchor[after].remove(&id);
        }
        self.queue.remove(id);
    }
}

struct Inserter<'b, 'a> {
    builder: &'b mut RoutingBuilder<'a>,
    pricer: &'b InsertionPricer<'b>,
    neighbors: NeighborSets,
    options: GlobalCheapestInsertionOptions,
}

/// Builds a first solution by global cheapest insertion.
///
/// Returns `false` if the build was stopped or no feasible completion was
/// found (a mandatory visit could not be inserted).
///
/// # Examples
///
/// ```
/// use u_routing_init::construction::{InsertionPricer, RoutingBuilder};
/// use u_routing_init::constructive::{global_cheapest_insertion, GlobalCheapestInsertionOptions};
/// use u_routing_init::distance::CostMatrix;
/// use u_routing_init::filters::DisjunctionRule;
/// use u_routing_init::models::{RoutingModel, Vehicle};
///
/// let points = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)];
/// let model = RoutingModel::new(4, vec![Vehicle::new(0)], CostMatrix::from_points(&points)).unwrap();
/// let mut builder = RoutingBuilder::new(&model, vec![Box::new(DisjunctionRule::new())]);
/// let pricer = InsertionPricer::from_model(&model);
///
/// assert!(global_cheapest_insertion(&mut builder, &pricer, &GlobalCheapestInsertionOptions::default()));
/// assert_eq!(builder.assignment().route(0).len(), 5);
/// ```
pub fn global_cheapest_insertion(
    builder: &mut RoutingBuilder<'_>,
    pricer: &InsertionPricer<'_>,
    options: &GlobalCheapestInsertionOptions,
) -> bool {
    if !builder.initialize_routes() {
        return false;
    }
    let model = builder.model();
    let neighbors = NeighborSets::compute(model, options.neighbors_ratio);
    let mut inserter = Inserter {
        builder,
        pricer,
        neighbors,
        options: *options,
    };

    inserter.insert_farthest_nodes_as_seeds();
    if inserter.builder.should_stop() {
        return false;
    }
    inserter.insert_pairs();
    if inserter.builder.should_stop() {
        return false;
    }

    let nodes: Vec<usize> = (0..model.size())
        .filter(|&i| {
            !model.is_start(i)
                && !inserter.builder.contains(i)
                && !model.is_pickup(i)
                && !model.is_delivery(i)
        })
        .collect();
    if options.is_sequential {
        inserter.sequential_insert_nodes(&nodes);
    } else {
        let vehicles: Vec<usize> = (0..model.num_vehicles()).collect();
        inserter.insert_nodes_on_routes(&nodes, &vehicles);
    }
    if inserter.builder.should_stop() {
        return false;
    }

    inserter.builder.make_unassigned_nodes_unperformed();
    let committed = inserter.builder.commit();
    let stats = inserter.builder.stats();
    debug!(
        "global cheapest insertion finished: committed={committed}, decisions={}, rejects={}",
        stats.decisions, stats.rejects
    );
    committed
}

impl<'b, 'a> Inserter<'b, 'a> {
    fn insert_farthest_nodes_as_seeds(&mut self) {
        let model = self.builder.model();
        let num_vehicles = model.num_vehicles();
        if self.options.farthest_seeds_ratio <= 0.0 {
            return;
        }
        let num_seeds = ((self.options.farthest_seeds_ratio * num_vehicles as f64).ceil() as usize)
            .min(num_vehicles);
        let nodes: Vec<usize> = (0..model.size())
            .filter(|&i| {
                !model.is_start(i)
                    && !self.builder.contains(i)
                    && !model.is_pickup(i)
                    && !model.is_delivery(i)
            })
            .collect();
        let vehicles: Vec<usize> = (0..num_vehicles).collect();
        let mut is_used: Vec<bool> = vehicles.iter().map(|&v| self.builder.is_vehicle_used(v)).collect();
        let mut distances = self.pricer.start_end_distances(&nodes, &vehicles);
        let mut queue = SeedQueue::new(&mut distances, true);

        let mut seeded = 0;
        while seeded < num_seeds && !queue.is_empty() {
            if insert_seed_node(self.builder, &mut distances, &mut queue, &mut is_used).is_none() {
                break;
            }
            seeded += 1;
        }
        debug!("seeded {seeded} routes with farthest visits");
    }

    /// Indices that may follow `anchor` on routes of the cost class.
    fn candidates(&self, cost_class: usize, anchor: usize, keep: impl Fn(usize) -> bool) -> Vec<usize> {
        let model = self.builder.model();
        match self.neighbors.neighbors_of(cost_class, anchor) {
            Some(set) => set.iter().copied().filter(|&i| keep(i)).collect(),
            None => (0..model.size())
                .filter(|&i| !model.is_start(i) && keep(i))
                .collect(),
        }
    }

    // ---- Pairs ----

    /// Anchors after which the delivery may go once the pickup sits after
    /// `pickup_after`: the pickup itself, then every later free anchor.
    fn delivery_anchors(&self, pickup: usize, pickup_after: usize, vehicle: usize) -> Vec<usize> {
        let model = self.builder.model();
        let stop = self.builder.end_chain_start(vehicle);
        let mut anchors = vec![pickup];
        let mut next = self.builder.value(pickup_after);
        while let Some(anchor) = next {
            if anchor == stop || model.is_end(anchor) {
                break;
            }
            anchors.push(anchor);
            next = self.builder.value(anchor);
        }
        anchors
    }

    fn price_pair(&self, entry: &PairEntry) -> Cost {
        let Some(insertion) = entry.insertion else {
            return entry.value;
        };
        let Some(pickup_before) = self.builder.value(insertion.pickup_after) else {
            return MAX_COST;
        };
        let delivery_before = if insertion.delivery_after == entry.pickup {
            pickup_before
        } else {
            match self.builder.value(insertion.delivery_after) {
                Some(next) => next,
                None => return MAX_COST,
            }
        };
        let vehicle = insertion.vehicle;
        self.pricer
            .insertion_cost(entry.pickup, insertion.pickup_after, pickup_before, vehicle)
            .saturating_add(self.pricer.insertion_cost(
                entry.delivery,
                insertion.delivery_after,
                delivery_before,
                vehicle,
            ))
    }

    fn add_pair_entry(&self, pairs: &mut PairQueue, pickup: usize, delivery: usize, insertion: PairInsertion) {
        let mut entry = PairEntry {
            pickup,
            delivery,
            insertion: Some(insertion),
            value: MAX_COST,
        };
        entry.value = self.price_pair(&entry);
        pairs.add(entry);
    }

    fn initialize_pair_positions(&mut self, pairs: &mut PairQueue) {
        let model = self.builder.model();
        let anchors: Vec<Vec<usize>> = (0..model.num_vehicles())
            .map(|v| self.builder.insertion_anchors(v))
            .collect();
        for pair in model.pickup_delivery_pairs() {
            for &pickup in pair.pickups() {
                if self.builder.contains(pickup) {
                    continue;
                }
                for &delivery in pair.deliveries() {
                    if self.builder.contains(delivery) {
                        continue;
                    }
                    let pickup_penalty = self.pricer.unperformed_value(pickup);
                    let delivery_penalty = self.pricer.unperformed_value(delivery);
                    if pickup_penalty != MAX_COST && delivery_penalty != MAX_COST {
                        pairs.add(PairEntry {
                            pickup,
                            delivery,
                            insertion: None,
                            value: pickup_penalty.saturating_add(delivery_penalty),
                        });
                    }
                    for (vehicle, vehicle_anchors) in anchors.iter().enumerate() {
                        let cost_class = model.cost_class_of_vehicle(vehicle);
                        for &pickup_after in vehicle_anchors {
                            if !self.neighbors.is_neighbor(cost_class, pickup_after, pickup) {
                                continue;
                            }
                            for delivery_after in self.delivery_anchors(pickup, pickup_after, vehicle) {
                                if delivery_after != pickup
                                    && !self.neighbors.is_neighbor(cost_class, delivery_after, delivery)
                                {
                                    continue;
                                }
                                let insertion = PairInsertion {
                                    vehicle,
                                    pickup_after,
                                    delivery_after,
                                };
                                self.add_pair_entry(pairs, pickup, delivery, insertion);
                            }
                        }
                    }
                }
            }
        }
        debug!("initialized {} pair insertion entries", pairs.queue.len());
    }

    fn insert_pairs(&mut self) {
        let model = self.builder.model();
        if model.pickup_delivery_pairs().is_empty() {
            return;
        }
        let mut pairs = PairQueue::new(model.size());
        self.initialize_pair_positions(&mut pairs);

        while let Some(id) = pairs.queue.pop() {
            if self.builder.should_stop() {
                return;
            }
            let entry = *pairs.queue.get(id);
            pairs.delete(id);
            if self.builder.contains(entry.pickup) || self.builder.contains(entry.delivery) {
                continue;
            }
            let Some(insertion) = entry.insertion else {
                self.builder.set_value(entry.pickup, entry.pickup);
                self.builder.set_value(entry.delivery, entry.delivery);
                self.builder.commit();
                continue;
            };
            let Some(pickup_before) = self.builder.value(insertion.pickup_after) else {
                continue;
            };
            let delivery_before = if insertion.delivery_after == entry.pickup {
                pickup_before
            } else {
                match self.builder.value(insertion.delivery_after) {
                    Some(next) => next,
                    None => continue,
                }
            };
            self.builder
                .insert_between(entry.pickup, insertion.pickup_after, pickup_before);
            self.builder
                .insert_between(entry.delivery, insertion.delivery_after, delivery_before);
            if !self.builder.commit() {
                continue;
            }
            trace!(
                "inserted pair ({}, {}) on vehicle {} at cost {}",
                entry.pickup,
                entry.delivery,
                insertion.vehicle,
                entry.value
            );
            let vehicle = insertion.vehicle;
            self.update_pair_positions(&mut pairs, vehicle, insertion.pickup_after);
            self.update_pair_positions(&mut pairs, vehicle, entry.pickup);
            self.update_pair_positions(&mut pairs, vehicle, entry.delivery);
            if insertion.delivery_after != entry.pickup {
                self.update_pair_positions(&mut pairs, vehicle, insertion.delivery_after);
            }
        }
    }

    fn update_pair_positions(&mut self, pairs: &mut PairQueue, vehicle: usize, anchor: usize) {
        self.update_pickup_positions(pairs, vehicle, anchor);
        self.update_delivery_positions(pairs, vehicle, anchor);
    }

    fn update_pickup_positions(&mut self, pairs: &mut PairQueue, vehicle: usize, pickup_after: usize) {
        let model = self.builder.model();
        let cost_class = model.cost_class_of_vehicle(vehicle);
        let mut existing = HashSet::new();
        let ids: Vec<EntryId> = pairs.by_pickup_anchor[pickup_after].iter().copied().collect();
        for id in ids {
            let entry = *pairs.queue.get(id);
            if self.builder.contains(entry.pickup) || self.builder.contains(entry.delivery) {
                pairs.delete(id);
            } else if let Some(insertion) = entry.insertion {
                existing.insert((entry.pickup, entry.delivery, insertion.delivery_after));
            }
        }

        let pickups = self.candidates(cost_class, pickup_after, |i| {
            model.is_pickup(i) && !self.builder.contains(i)
        });
        for pickup in pickups {
            for &pair in model.pickup_pairs_of(pickup) {
                for &delivery in model.pickup_delivery_pairs()[pair].deliveries() {
                    if self.builder.contains(delivery) {
                        continue;
                    }
                    for delivery_after in self.delivery_anchors(pickup, pickup_after, vehicle) {
                        if existing.contains(&(pickup, delivery, delivery_after))
                            || (delivery_after != pickup
                                && !self.neighbors.is_neighbor(cost_class, delivery_after, delivery))
                        {
                            continue;
                        }
                        let insertion = PairInsertion {
                            vehicle,
                            pickup_after,
                            delivery_after,
                        };
                        self.add_pair_entry(pairs, pickup, delivery, insertion);
                    }
                }
            }
        }

        let ids: Vec<EntryId> = pairs.by_pickup_anchor[pickup_after].iter().copied().collect();
        self.reprice_pairs(pairs, &ids);
    }

    fn update_delivery_positions(&mut self, pairs: &mut PairQueue, vehicle: usize, delivery_after: usize) {
        let model = self.builder.model();
        let cost_class = model.cost_class_of_vehicle(vehicle);
        let mut existing = HashSet::new();
        let ids: Vec<EntryId> = pairs.by_delivery_anchor[delivery_after].iter().copied().collect();
        for id in ids {
            let entry = *pairs.queue.get(id);
            if self.builder.contains(entry.pickup) || self.builder.contains(entry.delivery) {
                pairs.delete(id);
            } else if let Some(insertion) = entry.insertion {
                existing.insert((entry.pickup, entry.delivery, insertion.pickup_after));
            }
        }

        let stop = self.builder.end_chain_start(vehicle);
        let deliveries = self.candidates(cost_class, delivery_after, |i| {
            model.is_delivery(i) && !self.builder.contains(i)
        });
        for delivery in deliveries {
            for &pair in model.delivery_pairs_of(delivery) {
                for &pickup in model.pickup_delivery_pairs()[pair].pickups() {
                    if self.builder.contains(pickup) {
                        continue;
                    }
                    let mut pickup_after = self.builder.start_chain_end(vehicle);
                    while pickup_after != delivery_after && pickup_after != stop && !model.is_end(pickup_after) {
                        if !existing.contains(&(pickup, delivery, pickup_after))
                            && self.neighbors.is_neighbor(cost_class, pickup_after, pickup)
                        {
                            let insertion = PairInsertion {
                                vehicle,
                                pickup_after,
                                delivery_after,
                            };
                            self.add_pair_entry(pairs, pickup, delivery, insertion);
                        }
                        match self.builder.value(pickup_after) {
                            Some(next) => pickup_after = next,
                            None => break,
                        }
                    }
                }
            }
        }

        let ids: Vec<EntryId> = pairs.by_delivery_anchor[delivery_after].iter().copied().collect();
        self.reprice_pairs(pairs, &ids);
    }

    fn reprice_pairs(&self, pairs: &mut PairQueue, ids: &[EntryId]) {
        for &id in ids {
            let value = self.price_pair(pairs.queue.get(id));
            pairs.queue.get_mut(id).value = value;
            pairs.queue.push(id);
        }
    }

    // ---- Single visits ----

    fn price_node(&self, node: usize, insert_after: usize, vehicle: usize) -> Cost {
        self.builder
            .value(insert_after)
            .map_or(MAX_COST, |before| {
                self.pricer.insertion_cost(node, insert_after, before, vehicle)
            })
    }

    /// Inserts `nodes` on the routes of `vehicles` from one queue. The
    /// unperformed option is only offered when every route is considered.
    fn insert_nodes_on_routes(&mut self, nodes: &[usize], vehicles: &[usize]) {
        let model = self.builder.model();
        let all_routes = vehicles.len() == model.num_vehicles();
        let mut is_candidate = vec![false; model.size()];
        for &node in nodes {
            is_candidate[node] = true;
        }

        let mut entries = NodeQueue::new(model.size());
        let anchors: Vec<(usize, Vec<usize>)> = vehicles
            .iter()
            .map(|&v| (v, self.builder.insertion_anchors(v)))
            .collect();
        for &node in nodes {
            if self.builder.contains(node) {
                continue;
            }
            let penalty = self.pricer.unperformed_value(node);
            if all_routes && penalty != MAX_COST {
                entries.add(NodeEntry {
                    node,
                    insertion: None,
                    value: penalty,
                });
            }
            for (vehicle, vehicle_anchors) in &anchors {
                let cost_class = model.cost_class_of_vehicle(*vehicle);
                for &anchor in vehicle_anchors {
                    if self.neighbors.is_neighbor(cost_class, anchor, node) {
                        entries.add(NodeEntry {
                            node,
                            insertion: Some((anchor, *vehicle)),
                            value: self.price_node(node, anchor, *vehicle),
                        });
                    }
                }
            }
        }

        while let Some(id) = entries.queue.pop() {
            if self.builder.should_stop() {
                return;
            }
            let entry = *entries.queue.get(id);
            entries.delete(id);
            if self.builder.contains(entry.node) {
                continue;
            }
            let Some((insert_after, vehicle)) = entry.insertion else {
                self.builder.set_value(entry.node, entry.node);
                self.builder.commit();
                continue;
            };
            let Some(insert_before) = self.builder.value(insert_after) else {
                continue;
            };
            self.builder.insert_between(entry.node, insert_after, insert_before);
            if self.builder.commit() {
                trace!(
                    "inserted {} after {insert_after} on vehicle {vehicle} at cost {}",
                    entry.node,
                    entry.value
                );
                self.add_node_positions(&mut entries, &is_candidate, vehicle, entry.node);
                self.update_node_positions(&mut entries, vehicle, insert_after);
            }
        }
    }

    /// Entries for inserting candidates after a freshly inserted anchor.
    fn add_node_positions(&self, entries: &mut NodeQueue, is_candidate: &[bool], vehicle: usize, anchor: usize) {
        let cost_class = self.builder.model().cost_class_of_vehicle(vehicle);
        let nodes = self.candidates(cost_class, anchor, |i| {
            is_candidate[i] && !self.builder.contains(i)
        });
        for node in nodes {
            entries.add(NodeEntry {
                node,
                insertion: Some((anchor, vehicle)),
                value: self.price_node(node, anchor, vehicle),
            });
        }
    }

    /// Drops entries of inserted nodes at an anchor and re-prices the rest.
    fn update_node_positions(&self, entries: &mut NodeQueue, vehicle: usize, anchor: usize) {
        let ids: Vec<EntryId> = entries.by_anchor[anchor].iter().copied().collect();
        for id in ids {
            let node = entries.queue.get(id).node;
            if self.builder.contains(node) {
                entries.delete(id);
            } else {
                entries.queue.get_mut(id).value = self.price_node(node, anchor, vehicle);
                entries.queue.push(id);
            }
        }
    }

    /// Fills used routes first, then opens one route at a time with the
    /// visit nearest to an unused vehicle and fills it.
    fn sequential_insert_nodes(&mut self, nodes: &[usize]) {
        let model = self.builder.model();
        let vehicles: Vec<usize> = (0..model.num_vehicles()).collect();
        let mut is_used: Vec<bool> = vehicles.iter().map(|&v| self.builder.is_vehicle_used(v)).collect();
        let used: Vec<usize> = vehicles.iter().copied().filter(|&v| is_used[v]).collect();
        let unused: Vec<usize> = vehicles.iter().copied().filter(|&v| !is_used[v]).collect();

        if !used.is_empty() {
            self.insert_nodes_on_routes(nodes, &used);
        }
        if self.builder.should_stop() {
            return;
        }

        let remaining: Vec<usize> = nodes
            .iter()
            .copied()
            .filter(|&i| !self.builder.contains(i))
            .collect();
        let mut distances = self.pricer.start_end_distances(&remaining, &unused);
        let mut queue = SeedQueue::new(&mut distances, false);
        while let Some(vehicle) = insert_seed_node(self.builder, &mut distances, &mut queue, &mut is_used) {
            debug!("opened route of vehicle {vehicle}");
            self.insert_nodes_on_routes(nodes, &[vehicle]);
            if self.builder.should_stop() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructive::tests::{builder_for, line_scenario, standard_rules};
    use crate::filters::CapacityRule;
    use crate::models::{NodeState, RoutingModel};

    fn run(model: &RoutingModel, options: GlobalCheapestInsertionOptions) -> (bool, RoutingBuilder<'_>) {
        let mut builder = builder_for(model, standard_rules());
        let pricer = InsertionPricer::from_model(model);
        let ok = global_cheapest_insertion(&mut builder, &pricer, &options);
        (ok, builder)
    }

    #[test]
    fn test_line_scenario_visits_in_order() {
        let model = line_scenario();
        let (ok, builder) = run(&model, GlobalCheapestInsertionOptions::default());
        assert!(ok);
        // S -> A -> B -> C -> D -> E.
        assert_eq!(builder.assignment().route(0), &[4, 0, 1, 2, 3, 5]);
    }

    #[test]
    fn test_optional_visit_over_capacity_is_unperformed() {
        let mut model = line_scenario();
        model.add_disjunction(&[3], Some(3), 1).expect("valid");
        let capacity = CapacityRule::new(vec![1, 1, 1, 10, 0], vec![5]);
        let mut rules = standard_rules();
        rules.push(Box::new(capacity));
        let mut builder = builder_for(&model, rules);
        let pricer = InsertionPricer::from_model(&model);
        assert!(global_cheapest_insertion(
            &mut builder,
            &pricer,
            &GlobalCheapestInsertionOptions::default()
        ));
        assert_eq!(builder.assignment().route(0), &[4, 0, 1, 2, 5]);
        assert_eq!(builder.assignment().state(3), NodeState::Inactive);
    }

    #[test]
    fn test_mandatory_visit_over_capacity_fails() {
        let model = line_scenario();
        let capacity = CapacityRule::new(vec![1, 1, 1, 10, 0], vec![5]);
        let mut rules = standard_rules();
        rules.push(Box::new(capacity));
        let mut builder = builder_for(&model, rules);
        let pricer = InsertionPricer::from_model(&model);
        assert!(!global_cheapest_insertion(
            &mut builder,
            &pricer,
            &GlobalCheapestInsertionOptions::default()
        ));
        assert!(!builder.contains(3));
    }

    #[test]
    fn test_pair_keeps_precedence() {
        let mut model = line_scenario();
        // C must be picked up before A is delivered.
        model.add_pickup_and_delivery(2, 0).expect("valid");
        let (ok, builder) = run(&model, GlobalCheapestInsertionOptions::default());
        assert!(ok);
        let a = builder.assignment();
        let (Some(pickup), Some(delivery)) = (a.rank(2), a.rank(0)) else {
            panic!("pair not performed");
        };
        assert!(pickup < delivery);
        assert_eq!(a.route(0).len(), 6);
    }

    #[test]
    fn test_optional_pair_too_heavy_is_dropped_together() {
        let mut model = line_scenario();
        let p = model.add_disjunction(&[1], Some(50), 1).expect("valid");
        let d = model.add_disjunction(&[2], Some(50), 1).expect("valid");
        model.add_pickup_and_delivery_sets(p, d).expect("valid");
        let capacity = CapacityRule::new(vec![0, 9, -9, 0, 0], vec![5]);
        let mut rules = standard_rules();
        rules.push(Box::new(capacity));
        let mut builder = builder_for(&model, rules);
        let pricer = InsertionPricer::from_model(&model);
        assert!(global_cheapest_insertion(
            &mut builder,
            &pricer,
            &GlobalCheapestInsertionOptions::default()
        ));
        let a = builder.assignment();
        assert_eq!(a.state(1), NodeState::Inactive);
        assert_eq!(a.state(2), NodeState::Inactive);
        assert_eq!(a.route(0), &[4, 0, 3, 5]);
    }

    #[test]
    fn test_sequential_and_seeded_variants_cover_everything() {
        let model = line_scenario();
        for options in [
            GlobalCheapestInsertionOptions {
                is_sequential: true,
                ..Default::default()
            },
            GlobalCheapestInsertionOptions {
                farthest_seeds_ratio: 1.0,
                ..Default::default()
            },
            GlobalCheapestInsertionOptions {
                neighbors_ratio: 0.25,
                ..Default::default()
            },
        ] {
            let (ok, builder) = run(&model, options);
            assert!(ok, "{options:?}");
            assert_eq!(builder.assignment().route(0).len(), 6, "{options:?}");
        }
    }

    #[test]
    fn test_stop_cancels_build() {
        let model = line_scenario();
        let mut builder = builder_for(&model, standard_rules()).with_stop(Box::new(|| true));
        let pricer = InsertionPricer::from_model(&model);
        assert!(!global_cheapest_insertion(
            &mut builder,
            &pricer,
            &GlobalCheapestInsertionOptions::default()
        ));
        assert!(builder.should_stop());
    }
}
