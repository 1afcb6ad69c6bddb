//! The routing model read by every construction heuristic.

use std::collections::{HashSet, VecDeque};

use super::{Disjunction, IndexManager, ModelError, PickupDeliveryPair, PickupDeliveryPolicy, Vehicle};
use crate::distance::{Cost, CostMatrix, MAX_COST};

/// Read-only description of a vehicle routing instance over variable
/// indices.
///
/// Costs are integers with saturating arithmetic; [`MAX_COST`] stands for an
/// infinite cost.
///
/// # Examples
///
/// ```
/// use u_routing_init::distance::CostMatrix;
/// use u_routing_init::models::{RoutingModel, Vehicle};
///
/// let costs = CostMatrix::from_points(&[(0.0, 0.0), (3.0, 4.0), (6.0, 8.0)]);
/// let mut model = RoutingModel::new(3, vec![Vehicle::new(0)], costs).unwrap();
/// let a = model.node_to_index(1).unwrap();
/// let b = model.node_to_index(2).unwrap();
/// model.add_disjunction(&[b], Some(100), 1).unwrap();
///
/// assert_eq!(model.size(), 3);
/// assert_eq!(model.arc_cost_for_vehicle(model.start(0), a, 0), 5);
/// assert_eq!(model.unperformed_penalty(b), 100);
/// ```
#[derive(Debug, Clone)]
pub struct RoutingModel {
    manager: IndexManager,
    vehicles: Vec<Vehicle>,
    costs: Vec<CostMatrix>,
    disjunctions: Vec<Disjunction>,
    index_to_disjunctions: Vec<Vec<usize>>,
    pairs: Vec<PickupDeliveryPair>,
    index_to_pickup_pairs: Vec<Vec<usize>>,
    index_to_delivery_pairs: Vec<Vec<usize>>,
    locked_next: Vec<Option<usize>>,
    locked_prev: Vec<Option<usize>>,
    visit_types: Vec<Option<usize>>,
    incompatible_types: HashSet<(usize, usize)>,
    sweep_coordinates: Option<Vec<(f64, f64)>>,
}

impl RoutingModel {
    /// Creates a model where every vehicle prices arcs with `costs`.
    pub fn new(num_nodes: usize, vehicles: Vec<Vehicle>, costs: CostMatrix) -> Result<Self, ModelError> {
        Self::with_cost_classes(num_nodes, vehicles, vec![costs])
    }

    /// Creates a model with one cost matrix per cost class.
    pub fn with_cost_classes(
        num_nodes: usize,
        vehicles: Vec<Vehicle>,
        costs: Vec<CostMatrix>,
    ) -> Result<Self, ModelError> {
        for (cost_class, matrix) in costs.iter().enumerate() {
            if matrix.size() != num_nodes {
                return Err(ModelError::CostMatrixSize {
                    cost_class,
                    expected: num_nodes,
                    found: matrix.size(),
                });
            }
        }
        for (vehicle, v) in vehicles.iter().enumerate() {
            if v.cost_class() >= costs.len() {
                return Err(ModelError::UnknownCostClass {
                    vehicle,
                    cost_class: v.cost_class(),
                });
            }
        }
        let starts_ends: Vec<(usize, usize)> = vehicles
            .iter()
            .map(|v| (v.start_node(), v.end_node()))
            .collect();
        let manager = IndexManager::new(num_nodes, &starts_ends)?;
        let size = manager.size();
        let num_indices = manager.num_indices();

        Ok(Self {
            manager,
            vehicles,
            costs,
            disjunctions: Vec::new(),
            index_to_disjunctions: vec![Vec::new(); size],
            pairs: Vec::new(),
            index_to_pickup_pairs: vec![Vec::new(); size],
            index_to_delivery_pairs: vec![Vec::new(); size],
            locked_next: vec![None; size],
            locked_prev: vec![None; num_indices],
            visit_types: vec![None; size],
            incompatible_types: HashSet::new(),
            sweep_coordinates: None,
        })
    }

    // ---- Index space ----

    /// Index manager.
    pub fn manager(&self) -> &IndexManager {
        &self.manager
    }

    /// Number of indices owning a successor variable.
    pub fn size(&self) -> usize {
        self.manager.size()
    }

    /// Number of vehicles.
    pub fn num_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    /// Index of a non-depot node.
    pub fn node_to_index(&self, node: usize) -> Option<usize> {
        self.manager.node_to_index(node)
    }

    /// Node behind an index.
    pub fn index_to_node(&self, index: usize) -> usize {
        self.manager.index_to_node(index)
    }

    /// Start index of a vehicle.
    pub fn start(&self, vehicle: usize) -> usize {
        self.manager.start(vehicle)
    }

    /// End index of a vehicle.
    pub fn end(&self, vehicle: usize) -> usize {
        self.manager.end(vehicle)
    }

    /// `true` if `index` is a vehicle start.
    pub fn is_start(&self, index: usize) -> bool {
        index < self.size() && index >= self.size() - self.num_vehicles()
    }

    /// `true` if `index` is a vehicle end.
    pub fn is_end(&self, index: usize) -> bool {
        index >= self.size()
    }

    /// Vehicle owning a start index.
    pub fn vehicle_of_start(&self, index: usize) -> Option<usize> {
        self.is_start(index)
            .then(|| index + self.num_vehicles() - self.size())
    }

    /// Vehicle owning an end index.
    pub fn vehicle_of_end(&self, index: usize) -> Option<usize> {
        self.is_end(index).then(|| index - self.size())
    }

    // ---- Vehicles and costs ----

    /// All vehicles.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// A vehicle.
    pub fn vehicle(&self, vehicle: usize) -> &Vehicle {
        &self.vehicles[vehicle]
    }

    /// Number of cost classes.
    pub fn num_cost_classes(&self) -> usize {
        self.costs.len()
    }

    /// Cost class of a vehicle.
    pub fn cost_class_of_vehicle(&self, vehicle: usize) -> usize {
        self.vehicles[vehicle].cost_class()
    }

    /// `true` if some vehicle uses the cost class.
    pub fn has_vehicle_with_cost_class(&self, cost_class: usize) -> bool {
        self.vehicles.iter().any(|v| v.cost_class() == cost_class)
    }

    /// Fixed cost of a vehicle.
    pub fn fixed_cost_of_vehicle(&self, vehicle: usize) -> Cost {
        self.vehicles[vehicle].fixed_cost()
    }

    /// Pickup–delivery ordering policy of a vehicle.
    pub fn pickup_delivery_policy_of_vehicle(&self, vehicle: usize) -> PickupDeliveryPolicy {
        self.vehicles[vehicle].pickup_delivery_policy()
    }

    /// Arc cost of a cost class, without fixed costs.
    pub fn arc_cost_for_class(&self, from: usize, to: usize, cost_class: usize) -> Cost {
        if from == to {
            return 0;
        }
        self.costs[cost_class].get(self.index_to_node(from), self.index_to_node(to))
    }

    /// Arc cost for a vehicle.
    ///
    /// The vehicle's fixed cost is charged on the arc leaving its start,
    /// unless the arc closes an empty route.
    pub fn arc_cost_for_vehicle(&self, from: usize, to: usize, vehicle: usize) -> Cost {
        if from == to {
            return 0;
        }
        let start = self.start(vehicle);
        if from == start && to == self.end(vehicle) {
            return 0;
        }
        let cost = self.arc_cost_for_class(from, to, self.cost_class_of_vehicle(vehicle));
        if from == start && !self.is_end(to) {
            cost.saturating_add(self.fixed_cost_of_vehicle(vehicle))
        } else {
            cost
        }
    }

    /// Arc cost used by heuristics that ignore vehicles: the first cost class.
    pub fn arc_cost_for_first_solution(&self, from: usize, to: usize) -> Cost {
        self.arc_cost_for_class(from, to, 0)
    }

    // ---- Disjunctions ----

    /// Adds a disjunction over `indices` and returns its id.
    ///
    /// With a penalty, fewer than `max_cardinality` active members cost
    /// `penalty` per missing member. Without one, exactly `max_cardinality`
    /// members must be active.
    pub fn add_disjunction(
        &mut self,
        indices: &[usize],
        penalty: Option<Cost>,
        max_cardinality: usize,
    ) -> Result<usize, ModelError> {
        if indices.is_empty() || max_cardinality == 0 || max_cardinality > indices.len() {
            return Err(ModelError::InvalidDisjunction {
                size: indices.len(),
                max_cardinality,
            });
        }
        for &index in indices {
            self.check_visit_index(index)?;
        }
        let id = self.disjunctions.len();
        for &index in indices {
            self.index_to_disjunctions[index].push(id);
        }
        self.disjunctions.push(Disjunction::new(
            indices.to_vec(),
            penalty.map(|p| p.max(0)),
            max_cardinality,
        ));
        Ok(id)
    }

    /// All disjunctions.
    pub fn disjunctions(&self) -> &[Disjunction] {
        &self.disjunctions
    }

    /// A disjunction.
    pub fn disjunction(&self, disjunction: usize) -> &Disjunction {
        &self.disjunctions[disjunction]
    }

    /// Disjunctions containing an index.
    pub fn disjunctions_of(&self, index: usize) -> &[usize] {
        self.index_to_disjunctions
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `true` if the index may legally be left unperformed.
    pub fn can_be_inactive(&self, index: usize) -> bool {
        self.unperformed_penalty_or_value(0, index) != MAX_COST
    }

    /// Cost of leaving an index unperformed.
    ///
    /// [`MAX_COST`] if the index must be active; the penalty of its
    /// disjunction if it belongs to exactly one; `default` if it belongs to
    /// several.
    pub fn unperformed_penalty_or_value(&self, default: Cost, index: usize) -> Cost {
        let ids = self.disjunctions_of(index);
        if ids.is_empty() {
            return MAX_COST;
        }
        let forced = ids.iter().any(|&d| {
            let disjunction = &self.disjunctions[d];
            disjunction.is_hard() && disjunction.indices().len() <= disjunction.max_cardinality()
        });
        if forced {
            return MAX_COST;
        }
        if ids.len() != 1 {
            return default;
        }
        self.disjunctions[ids[0]].penalty().unwrap_or(0)
    }

    /// Penalty of leaving an index unperformed, 0 when ambiguous.
    pub fn unperformed_penalty(&self, index: usize) -> Cost {
        self.unperformed_penalty_or_value(0, index)
    }

    // ---- Pickup and delivery ----

    /// Adds a pickup–delivery pair over single indices.
    pub fn add_pickup_and_delivery(&mut self, pickup: usize, delivery: usize) -> Result<usize, ModelError> {
        self.add_pair(vec![pickup], vec![delivery])
    }

    /// Adds a pickup–delivery pair whose sides are the members of two
    /// disjunctions.
    pub fn add_pickup_and_delivery_sets(
        &mut self,
        pickup_disjunction: usize,
        delivery_disjunction: usize,
    ) -> Result<usize, ModelError> {
        let pickups = self.disjunction_indices(pickup_disjunction)?;
        let deliveries = self.disjunction_indices(delivery_disjunction)?;
        self.add_pair(pickups, deliveries)
    }

    fn disjunction_indices(&self, disjunction: usize) -> Result<Vec<usize>, ModelError> {
        self.disjunctions
            .get(disjunction)
            .map(|d| d.indices().to_vec())
            .ok_or(ModelError::UnknownDisjunction { disjunction })
    }

    fn add_pair(&mut self, pickups: Vec<usize>, deliveries: Vec<usize>) -> Result<usize, ModelError> {
        for &index in pickups.iter().chain(&deliveries) {
            self.check_visit_index(index)?;
        }
        let id = self.pairs.len();
        for &p in &pickups {
            self.index_to_pickup_pairs[p].push(id);
        }
        for &d in &deliveries {
            self.index_to_delivery_pairs[d].push(id);
        }
        self.pairs.push(PickupDeliveryPair::new(pickups, deliveries));
        Ok(id)
    }

    /// All pickup–delivery pairs.
    pub fn pickup_delivery_pairs(&self) -> &[PickupDeliveryPair] {
        &self.pairs
    }

    /// Pairs in which the index is a pickup.
    pub fn pickup_pairs_of(&self, index: usize) -> &[usize] {
        self.index_to_pickup_pairs
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Pairs in which the index is a delivery.
    pub fn delivery_pairs_of(&self, index: usize) -> &[usize] {
        self.index_to_delivery_pairs
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `true` if the index is a pickup of some pair.
    pub fn is_pickup(&self, index: usize) -> bool {
        !self.pickup_pairs_of(index).is_empty()
    }

    /// `true` if the index is a delivery of some pair.
    pub fn is_delivery(&self, index: usize) -> bool {
        !self.delivery_pairs_of(index).is_empty()
    }

    /// `true` if the deliveries on `route` leave in the order `policy`
    /// demands.
    ///
    /// Every pickup on the route opens its pair, whether or not its delivery
    /// is placed yet; a delivery must close the most recently (LIFO) or the
    /// earliest (FIFO) opened pair. A delivery whose pickup is not on the
    /// route is left to the pair precedence check.
    pub fn follows_pickup_delivery_policy(&self, route: &[usize], policy: PickupDeliveryPolicy) -> bool {
        if policy == PickupDeliveryPolicy::Any {
            return true;
        }
        let on_route: HashSet<usize> = route.iter().copied().collect();
        let mut open: VecDeque<usize> = VecDeque::new();
        for &index in route {
            if let Some(&pair) = self.pickup_pairs_of(index).first() {
                open.push_back(pair);
            } else if let Some(&pair) = self.delivery_pairs_of(index).first() {
                if !self.pairs[pair].pickups().iter().any(|i| on_route.contains(i)) {
                    continue;
                }
                let closed = match policy {
                    PickupDeliveryPolicy::Lifo => open.pop_back(),
                    _ => open.pop_front(),
                };
                if closed != Some(pair) {
                    return false;
                }
            }
        }
        true
    }

    // ---- Locks ----

    /// Fixes the successor of each element of `chain` to the next element.
    ///
    /// A chain must begin at a vehicle start or finish at a vehicle end; it
    /// is applied atomically.
    pub fn apply_locks(&mut self, chain: &[usize]) -> Result<(), ModelError> {
        let first = chain.first().copied().unwrap_or(0);
        if chain.len() < 2 {
            return Err(ModelError::InvalidLock { index: first });
        }
        let last = chain[chain.len() - 1];
        if !self.is_start(first) && !self.is_end(last) {
            return Err(ModelError::InvalidLock { index: first });
        }
        if let (Some(v), Some(w)) = (self.vehicle_of_start(first), self.vehicle_of_end(last)) {
            if v != w {
                return Err(ModelError::InvalidLock { index: last });
            }
        }
        let mut seen = HashSet::new();
        for window in chain.windows(2) {
            let (from, to) = (window[0], window[1]);
            if !seen.insert(from)
                || from >= self.size()
                || to >= self.manager.num_indices()
                || self.is_start(to)
                || self.locked_next[from].is_some()
                || self.locked_prev[to].is_some()
            {
                return Err(ModelError::InvalidLock { index: from });
            }
        }
        for window in chain.windows(2) {
            self.locked_next[window[0]] = Some(window[1]);
            self.locked_prev[window[1]] = Some(window[0]);
        }
        Ok(())
    }

    /// Locked successor of an index.
    pub fn locked_next(&self, index: usize) -> Option<usize> {
        self.locked_next.get(index).copied().flatten()
    }

    /// Locked predecessor of an index.
    pub fn locked_prev(&self, index: usize) -> Option<usize> {
        self.locked_prev.get(index).copied().flatten()
    }

    // ---- Visit types ----

    /// Assigns a visit type to an index.
    pub fn set_visit_type(&mut self, index: usize, visit_type: usize) -> Result<(), ModelError> {
        self.check_visit_index(index)?;
        self.visit_types[index] = Some(visit_type);
        Ok(())
    }

    /// Visit type of an index.
    pub fn visit_type(&self, index: usize) -> Option<usize> {
        self.visit_types.get(index).copied().flatten()
    }

    /// Forbids two visit types on the same route.
    pub fn add_type_incompatibility(&mut self, a: usize, b: usize) {
        self.incompatible_types.insert((a.min(b), a.max(b)));
    }

    /// `true` if the two types cannot share a route.
    pub fn are_types_incompatible(&self, a: usize, b: usize) -> bool {
        self.incompatible_types.contains(&(a.min(b), a.max(b)))
    }

    /// `true` if any type incompatibility was declared.
    pub fn has_type_incompatibilities(&self) -> bool {
        !self.incompatible_types.is_empty()
    }

    // ---- Sweep ----

    /// Sets the planar position of every node, used to order visits by
    /// angle around the depot.
    pub fn set_sweep_coordinates(&mut self, coordinates: Vec<(f64, f64)>) -> Result<(), ModelError> {
        let expected = self.manager.num_nodes();
        if coordinates.len() != expected {
            return Err(ModelError::CoordinatesSize {
                expected,
                found: coordinates.len(),
            });
        }
        if let Some(node) = coordinates.iter().position(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(ModelError::InvalidCoordinate { node });
        }
        self.sweep_coordinates = Some(coordinates);
        Ok(())
    }

    /// Node positions for the sweep, if set.
    pub fn sweep_coordinates(&self) -> Option<&[(f64, f64)]> {
        self.sweep_coordinates.as_deref()
    }

    fn check_visit_index(&self, index: usize) -> Result<(), ModelError> {
        if index >= self.size() {
            return Err(ModelError::IndexOutOfRange { index });
        }
        if self.is_start(index) {
            return Err(ModelError::DepotInDisjunction { index });
        }
        Ok(())
    }
}
