//! Route type.

use serde::Serialize;

use crate::distance::Cost;

/// The ordered visits of one vehicle, as variable indices.
///
/// The vehicle's start and end are not stored in `visits`.
///
/// # Examples
///
/// ```
/// use u_routing_init::models::Route;
///
/// let route = Route::new(0, vec![4, 2], 17);
/// assert_eq!(route.len(), 2);
/// assert_eq!(route.vehicle_id(), 0);
/// assert_eq!(route.cost(), 17);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    vehicle_id: usize,
    visits: Vec<usize>,
    cost: Cost,
}

impl Route {
    /// Creates a route for a vehicle.
    pub fn new(vehicle_id: usize, visits: Vec<usize>, cost: Cost) -> Self {
        Self {
            vehicle_id,
            visits,
            cost,
        }
    }

    /// Returns the vehicle assigned to this route.
    pub fn vehicle_id(&self) -> usize {
        self.vehicle_id
    }

    /// Returns the visited indices in order.
    pub fn visits(&self) -> &[usize] {
        &self.visits
    }

    /// Returns the number of visits (excluding start and end).
    pub fn len(&self) -> usize {
        self.visits.len()
    }

    /// Returns `true` if this route has no visits.
    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Arc cost of the route, fixed cost included.
    pub fn cost(&self) -> Cost {
        self.cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_empty() {
        let r = Route::new(3, Vec::new(), 0);
        assert!(r.is_empty());
        assert_eq!(r.len(), 0);
        assert_eq!(r.vehicle_id(), 3);
    }

    #[test]
    fn test_route_visits() {
        let r = Route::new(1, vec![5, 3], 12);
        assert_eq!(r.visits(), &[5, 3]);
        assert_eq!(r.cost(), 12);
    }
}
