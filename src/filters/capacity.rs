//! Route load rule.

use super::{DeltaView, FeasibilityRule};
use crate::models::RoutingModel;

/// Keeps the cumulative load of every touched route within its vehicle's
/// capacity and non-negative at every stop.
///
/// Demands are per index; a start index's demand is the vehicle's initial
/// load. Deliveries are negative demands.
///
/// # Examples
///
/// ```
/// use u_routing_init::distance::CostMatrix;
/// use u_routing_init::filters::CapacityRule;
/// use u_routing_init::models::{RoutingModel, Vehicle};
///
/// let model = RoutingModel::new(3, vec![Vehicle::new(0)], CostMatrix::new(3)).unwrap();
/// let rule = CapacityRule::from_node_demands(&model, &[0, 4, 5], &[8]);
/// assert_eq!(rule.capacity(0), 8);
/// ```
#[derive(Debug, Clone)]
pub struct CapacityRule {
    name: String,
    demands: Vec<i64>,
    capacities: Vec<i64>,
}

impl CapacityRule {
    /// Creates the rule from per-index demands and per-vehicle capacities.
    pub fn new(demands: Vec<i64>, capacities: Vec<i64>) -> Self {
        Self {
            name: "capacity".to_string(),
            demands,
            capacities,
        }
    }

    /// Creates the rule from per-node demands, mapped onto indices.
    /// Vehicles start empty.
    pub fn from_node_demands(model: &RoutingModel, node_demands: &[i64], capacities: &[i64]) -> Self {
        let demands = (0..model.size())
            .map(|i| {
                if model.is_start(i) {
                    0
                } else {
                    node_demands.get(model.index_to_node(i)).copied().unwrap_or(0)
                }
            })
            .collect();
        Self::new(demands, capacities.to_vec())
    }

    /// Renames the rule, for models carrying several dimensions.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Capacity of a vehicle.
    pub fn capacity(&self, vehicle: usize) -> i64 {
        self.capacities.get(vehicle).copied().unwrap_or(i64::MAX)
    }

    /// Demand of an index.
    pub fn demand(&self, index: usize) -> i64 {
        self.demands.get(index).copied().unwrap_or(0)
    }
}

impl FeasibilityRule for CapacityRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn accept(&mut self, view: &DeltaView<'_>) -> bool {
        view.touched_routes().all(|(vehicle, route)| {
            let capacity = self.capacity(vehicle);
            let mut load: i64 = 0;
            route.iter().all(|&index| {
                load = load.saturating_add(self.demand(index));
                (0..=capacity).contains(&load)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::tests::{committed, two_vehicle_model};
    use crate::models::Delta;

    #[test]
    fn test_capacity_limit() {
        let model = two_vehicle_model();
        let mut rule = CapacityRule::new(vec![3, 4, 6, 1, 1, 0, 0], vec![8, 8]);
        let assignment = committed(&model, &[&[0], &[]]);

        let mut delta = Delta::new(model.size());
        delta.set(0, 1);
        delta.set(1, 7);
        let view = DeltaView::new(&model, &assignment, &delta).expect("well formed");
        assert!(rule.accept(&view));

        let mut delta = Delta::new(model.size());
        delta.set(0, 2);
        delta.set(2, 7);
        let view = DeltaView::new(&model, &assignment, &delta).expect("well formed");
        assert!(!rule.accept(&view));
    }

    #[test]
    fn test_negative_load_rejected() {
        let model = two_vehicle_model();
        // Index 1 delivers what index 0 picks up.
        let mut rule = CapacityRule::new(vec![2, -2, 0, 0, 0, 0, 0], vec![5, 5]);
        let assignment = committed(&model, &[&[], &[]]);

        let mut delta = Delta::new(model.size());
        delta.set(5, 1);
        delta.set(1, 0);
        delta.set(0, 7);
        let view = DeltaView::new(&model, &assignment, &delta).expect("well formed");
        assert!(!rule.accept(&view));

        let mut delta = Delta::new(model.size());
        delta.set(5, 0);
        delta.set(0, 1);
        delta.set(1, 7);
        let view = DeltaView::new(&model, &assignment, &delta).expect("well formed");
        assert!(rule.accept(&view));
    }

    #[test]
    fn test_from_node_demands() {
        let model = two_vehicle_model();
        let rule = CapacityRule::from_node_demands(&model, &[9, 1, 2, 3, 4, 5], &[10, 10]).with_name("weight");
        assert_eq!(rule.name(), "weight");
        assert_eq!(rule.demand(0), 1);
        assert_eq!(rule.demand(4), 5);
        assert_eq!(rule.demand(5), 0);
    }
}
