//! Vehicle with depots, cost class, and pickup–delivery policy.

use serde::{Deserialize, Serialize};

use crate::distance::Cost;

/// Ordering constraint between pickup–delivery pairs sharing a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupDeliveryPolicy {
    /// Any precedence is accepted.
    #[default]
    Any,
    /// Deliveries happen in reverse order of pickups.
    Lifo,
    /// Deliveries happen in the same order as pickups.
    Fifo,
}

/// A vehicle that owns one route in a routing model.
///
/// The vehicle's index in the model is its position in the vehicle list.
///
/// # Examples
///
/// ```
/// use u_routing_init::models::{PickupDeliveryPolicy, Vehicle};
///
/// let v = Vehicle::new(0).with_end(5).with_fixed_cost(100);
/// assert_eq!(v.start_node(), 0);
/// assert_eq!(v.end_node(), 5);
/// assert_eq!(v.fixed_cost(), 100);
/// assert_eq!(v.pickup_delivery_policy(), PickupDeliveryPolicy::Any);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    start_node: usize,
    end_node: usize,
    cost_class: usize,
    fixed_cost: Cost,
    policy: PickupDeliveryPolicy,
}

impl Vehicle {
    /// Creates a vehicle starting and ending at `depot`.
    ///
    /// Default: cost class 0, no fixed cost, no pickup–delivery ordering.
    pub fn new(depot: usize) -> Self {
        Self {
            start_node: depot,
            end_node: depot,
            cost_class: 0,
            fixed_cost: 0,
            policy: PickupDeliveryPolicy::Any,
        }
    }

    /// Sets a different end node.
    pub fn with_end(mut self, end_node: usize) -> Self {
        self.end_node = end_node;
        self
    }

    /// Sets the cost class (index of the cost matrix used to price arcs).
    pub fn with_cost_class(mut self, cost_class: usize) -> Self {
        self.cost_class = cost_class;
        self
    }

    /// Sets the cost charged when the route is not empty.
    pub fn with_fixed_cost(mut self, cost: Cost) -> Self {
        self.fixed_cost = cost;
        self
    }

    /// Sets the pickup–delivery ordering policy.
    pub fn with_pickup_delivery_policy(mut self, policy: PickupDeliveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Node where the route starts.
    pub fn start_node(&self) -> usize {
        self.start_node
    }

    /// Node where the route ends.
    pub fn end_node(&self) -> usize {
        self.end_node
    }

    /// Cost class.
    pub fn cost_class(&self) -> usize {
        self.cost_class
    }

    /// Cost charged when the route visits at least one node.
    pub fn fixed_cost(&self) -> Cost {
        self.fixed_cost
    }

    /// Pickup–delivery ordering policy.
    pub fn pickup_delivery_policy(&self) -> PickupDeliveryPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_new() {
        let v = Vehicle::new(2);
        assert_eq!(v.start_node(), 2);
        assert_eq!(v.end_node(), 2);
        assert_eq!(v.cost_class(), 0);
        assert_eq!(v.fixed_cost(), 0);
        assert_eq!(v.pickup_delivery_policy(), PickupDeliveryPolicy::Any);
    }

    #[test]
    fn test_vehicle_builder() {
        let v = Vehicle::new(1)
            .with_end(3)
            .with_cost_class(2)
            .with_fixed_cost(50)
            .with_pickup_delivery_policy(PickupDeliveryPolicy::Lifo);
        assert_eq!(v.start_node(), 1);
        assert_eq!(v.end_node(), 3);
        assert_eq!(v.cost_class(), 2);
        assert_eq!(v.fixed_cost(), 50);
        assert_eq!(v.pickup_delivery_policy(), PickupDeliveryPolicy::Lifo);
    }
}
