//! Feasibility rules consulted on every commit.
//!
//! A commit hands each rule a [`DeltaView`]: the committed assignment with
//! the pending delta laid over it, and the rebuilt paths of every vehicle
//! the delta touches. A delta that breaks path structure (a cycle, an
//! index on two paths, a path ending at another vehicle's end) never
//! reaches the rules.

mod active_vehicles;
mod capacity;
mod disjunction;
mod pickup_delivery;
mod type_incompatibility;

pub use active_vehicles::ActiveVehiclesRule;
pub use capacity::CapacityRule;
pub use disjunction::DisjunctionRule;
pub use pickup_delivery::PickupDeliveryRule;
pub use type_incompatibility::TypeIncompatibilityRule;

use std::collections::{BTreeSet, HashMap};

use crate::models::{Assignment, Delta, NodeState, RoutingModel};

/// A constraint checked against pending changes.
pub trait FeasibilityRule {
    /// Rule name, used in logs.
    fn name(&self) -> &str;

    /// Returns `true` if the pending changes keep the constraint satisfiable.
    fn accept(&mut self, view: &DeltaView<'_>) -> bool;

    /// Called after every accepted commit with the new assignment.
    fn synchronize(&mut self, _assignment: &Assignment) {}
}

/// The committed assignment as it would be after the pending delta.
pub struct DeltaView<'a> {
    model: &'a RoutingModel,
    assignment: &'a Assignment,
    delta: &'a Delta,
    routes: Vec<(usize, Vec<usize>)>,
    placement: HashMap<usize, (usize, usize)>,
}

impl<'a> DeltaView<'a> {
    /// Lays `delta` over `assignment`. Returns `None` if the result is not a
    /// set of well-formed paths.
    pub(crate) fn new(model: &'a RoutingModel, assignment: &'a Assignment, delta: &'a Delta) -> Option<Self> {
        let mut touched = BTreeSet::new();
        for &(index, _) in delta.entries() {
            if let Some(vehicle) = model.vehicle_of_start(index) {
                touched.insert(vehicle);
            } else if let Some(vehicle) = assignment.vehicle_of(index) {
                touched.insert(vehicle);
            }
        }

        let mut placement = HashMap::new();
        let mut routes = Vec::with_capacity(touched.len());
        for &vehicle in &touched {
            let end = model.end(vehicle);
            let mut current = model.start(vehicle);
            let mut path = vec![current];
            placement.insert(current, (vehicle, 0));
            while current != end {
                let next = delta.get(current).or_else(|| assignment.value(current))?;
                if next == current || model.is_start(next) || (model.is_end(next) && next != end) {
                    return None;
                }
                if placement.contains_key(&next) {
                    return None;
                }
                if let Some(owner) = assignment.vehicle_of(next) {
                    if !touched.contains(&owner) {
                        return None;
                    }
                }
                placement.insert(next, (vehicle, path.len()));
                path.push(next);
                current = next;
            }
            routes.push((vehicle, path));
        }

        // Members leaving a touched route must be made inactive.
        for &vehicle in &touched {
            for &member in assignment.route(vehicle) {
                if !placement.contains_key(&member) && delta.get(member) != Some(member) {
                    return None;
                }
            }
        }
        // Every other pending value must lie on a rebuilt path.
        for &(index, value) in delta.entries() {
            if value != index && !placement.contains_key(&index) {
                return None;
            }
        }

        Some(Self {
            model,
            assignment,
            delta,
            routes,
            placement,
        })
    }

    /// The model.
    pub fn model(&self) -> &'a RoutingModel {
        self.model
    }

    /// The committed assignment.
    pub fn assignment(&self) -> &'a Assignment {
        self.assignment
    }

    /// Pending `(index, successor)` entries.
    pub fn changes(&self) -> &'a [(usize, usize)] {
        self.delta.entries()
    }

    /// Successor of an index after the delta.
    pub fn next(&self, index: usize) -> Option<usize> {
        self.delta.get(index).or_else(|| self.assignment.value(index))
    }

    /// State of an index after the delta.
    pub fn state(&self, index: usize) -> NodeState {
        if let Some(&(vehicle, rank)) = self.placement.get(&index) {
            return NodeState::Active { vehicle, rank };
        }
        if self.delta.get(index) == Some(index) {
            return NodeState::Inactive;
        }
        self.assignment.state(index)
    }

    /// Rebuilt paths of the touched vehicles, start and end included.
    pub fn touched_routes(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        self.routes.iter().map(|(v, path)| (*v, path.as_slice()))
    }

    /// Path of a vehicle after the delta.
    pub fn route(&self, vehicle: usize) -> &[usize] {
        self.routes
            .iter()
            .find(|(v, _)| *v == vehicle)
            .map(|(_, path)| path.as_slice())
            .unwrap_or_else(|| self.assignment.route(vehicle))
    }

    pub(crate) fn into_routes(self) -> Vec<(usize, Vec<usize>)> {
        self.routes
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::distance::CostMatrix;
    use crate::models::Vehicle;

    /// Five visits, two vehicles at node 0. Indices: 0..5 visits,
    /// 5 and 6 starts, 7 and 8 ends.
    pub(crate) fn two_vehicle_model() -> RoutingModel {
        let points: Vec<(f64, f64)> = (0..6).map(|i| (i as f64, 0.0)).collect();
        RoutingModel::new(
            6,
            vec![Vehicle::new(0), Vehicle::new(0)],
            CostMatrix::from_points(&points),
        )
        .expect("valid model")
    }

    pub(crate) fn committed(model: &RoutingModel, routes: &[&[usize]]) -> Assignment {
        let mut assignment = Assignment::new(model.size(), model.num_vehicles());
        let mut delta = Delta::new(model.size());
        for (vehicle, visits) in routes.iter().enumerate() {
            let mut prev = model.start(vehicle);
            for &i in visits.iter() {
                delta.set(prev, i);
                prev = i;
            }
            delta.set(prev, model.end(vehicle));
        }
        let view = DeltaView::new(model, &assignment, &delta).expect("well formed");
        let routes = view.into_routes();
        assignment.apply(&delta, routes);
        assignment
    }

    #[test]
    fn test_view_rebuilds_touched_routes() {
        let model = two_vehicle_model();
        let assignment = committed(&model, &[&[0, 1], &[]]);
        let mut delta = Delta::new(model.size());
        delta.set(0, 2);
        delta.set(2, 1);
        let view = DeltaView::new(&model, &assignment, &delta).expect("well formed");
        assert_eq!(view.route(0), &[5, 0, 2, 1, 7]);
        assert_eq!(view.route(1), &[6, 8]);
        assert_eq!(view.state(2), NodeState::Active { vehicle: 0, rank: 2 });
        assert_eq!(view.state(3), NodeState::Unassigned);
        assert_eq!(view.touched_routes().count(), 1);
    }

    #[test]
    fn test_view_rejects_broken_structure() {
        let model = two_vehicle_model();
        let assignment = committed(&model, &[&[0, 1], &[2]]);

        // Cycle.
        let mut delta = Delta::new(model.size());
        delta.set(1, 0);
        assert!(DeltaView::new(&model, &assignment, &delta).is_none());

        // Node taken from an untouched route.
        let mut delta = Delta::new(model.size());
        delta.set(1, 2);
        assert!(DeltaView::new(&model, &assignment, &delta).is_none());

        // Path ending at the other vehicle's end.
        let mut delta = Delta::new(model.size());
        delta.set(1, 8);
        assert!(DeltaView::new(&model, &assignment, &delta).is_none());

        // Dropped node not made inactive.
        let mut delta = Delta::new(model.size());
        delta.set(5, 1);
        assert!(DeltaView::new(&model, &assignment, &delta).is_none());

        // Dangling value.
        let mut delta = Delta::new(model.size());
        delta.set(3, 4);
        assert!(DeltaView::new(&model, &assignment, &delta).is_none());
    }

    #[test]
    fn test_view_accepts_moves_and_deactivation() {
        let model = two_vehicle_model();
        let assignment = committed(&model, &[&[0, 1], &[2]]);
        let mut delta = Delta::new(model.size());
        delta.set(5, 1);
        delta.set(0, 0);
        delta.set(3, 3);
        let view = DeltaView::new(&model, &assignment, &delta).expect("well formed");
        assert_eq!(view.route(0), &[5, 1, 7]);
        assert_eq!(view.state(0), NodeState::Inactive);
        assert_eq!(view.state(3), NodeState::Inactive);
        assert_eq!(view.state(2), NodeState::Active { vehicle: 1, rank: 1 });
    }
}
