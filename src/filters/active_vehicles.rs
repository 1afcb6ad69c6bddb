//! Limit on the number of vehicles in use.

use super::{DeltaView, FeasibilityRule};
use crate::models::Assignment;

/// Caps the number of routes that visit at least one index.
#[derive(Debug, Clone)]
pub struct ActiveVehiclesRule {
    max_active: usize,
    used: Vec<bool>,
    num_used: usize,
}

impl ActiveVehiclesRule {
    /// Creates the rule for at most `max_active` non-empty routes.
    pub fn new(max_active: usize) -> Self {
        Self {
            max_active,
            used: Vec::new(),
            num_used: 0,
        }
    }

    fn is_used(route: &[usize]) -> bool {
        route.len() > 2
    }
}

impl FeasibilityRule for ActiveVehiclesRule {
    fn name(&self) -> &str {
        "active_vehicles"
    }

    fn accept(&mut self, view: &DeltaView<'_>) -> bool {
        let mut num_used = self.num_used;
        for (vehicle, route) in view.touched_routes() {
            let was_used = self.used.get(vehicle).copied().unwrap_or(false);
            match (was_used, Self::is_used(route)) {
                (false, true) => num_used += 1,
                (true, false) => num_used -= 1,
                _ => {}
            }
        }
        num_used <= self.max_active
    }

    fn synchronize(&mut self, assignment: &Assignment) {
        self.used = (0..assignment.num_vehicles())
            .map(|v| Self::is_used(assignment.route(v)))
            .collect();
        self.num_used = self.used.iter().filter(|&&u| u).count();
    }
}
