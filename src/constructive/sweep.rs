//! Sweep by polar angle.
//!
//! # Algorithm
//!
//! Free visits are sorted by polar angle around the start node of the
//! first vehicle, then by distance to it. Vehicles are filled in turn:
//! each walks the sorted visits and appends every one the rules accept
//! after the last one placed, repeating the walk while it places
//! something. Visits a vehicle rejects are passed on to the next one.
//! Nearby visits tend to share an angle, so routes cover angular sectors.
//!
//! The model must carry sweep coordinates
//! ([`RoutingModel::set_sweep_coordinates`](crate::models::RoutingModel::set_sweep_coordinates)).
//!
//! # Complexity
//!
//! O(n log n) for the angle sort, then O(n) commits per walk.
//!
//! # Reference
//!
//! Gillett, B.E. & Miller, L.R. (1974). "A Heuristic Algorithm for the
//! Vehicle-Dispatch Problem", *Operations Research* 22(2), 340-349.

use log::{debug, trace, warn};

use crate::construction::RoutingBuilder;
use crate::models::RoutingModel;

/// Builds a first solution by sweeping visits in angle order into routes.
///
/// Returns `false` if the model has no sweep coordinates, the build was
/// stopped, or a mandatory visit was left over.
///
/// # Examples
///
/// ```
/// use u_routing_init::construction::RoutingBuilder;
/// use u_routing_init::constructive::sweep;
/// use u_routing_init::distance::CostMatrix;
/// use u_routing_init::filters::DisjunctionRule;
/// use u_routing_init::models::{RoutingModel, Vehicle};
///
/// let points = vec![(0.0, 0.0), (1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];
/// let mut model = RoutingModel::new(5, vec![Vehicle::new(0)], CostMatrix::from_points(&points)).unwrap();
/// model.set_sweep_coordinates(points).unwrap();
/// let mut builder = RoutingBuilder::new(&model, vec![Box::new(DisjunctionRule::new())]);
///
/// assert!(sweep(&mut builder));
/// // -135°, -45°, 45°, 135°.
/// assert_eq!(builder.assignment().route(0), &[4, 2, 3, 0, 1, 5]);
/// ```
pub fn sweep(builder: &mut RoutingBuilder<'_>) -> bool {
    let model = builder.model();
    let Some(order) = angle_order(model) else {
        warn!("sweep needs node coordinates");
        return false;
    };
    if !builder.initialize_routes() {
        return false;
    }
    let order: Vec<usize> = order.into_iter().filter(|&i| !builder.contains(i)).collect();
    debug!("sweeping {} visits over {} vehicles", order.len(), model.num_vehicles());

    for vehicle in 0..model.num_vehicles() {
        let end = builder.end_chain_start(vehicle);
        let mut prev = builder.start_chain_end(vehicle);
        if model.is_end(prev) {
            continue;
        }
        loop {
            let mut placed = false;
            for &next in &order {
                if builder.should_stop() {
                    return false;
                }
                if builder.contains(next) {
                    continue;
                }
                builder.insert_between(next, prev, end);
                if builder.commit() {
                    trace!("swept {next} onto vehicle {vehicle}");
                    prev = next;
                    placed = true;
                }
            }
            if !placed {
                break;
            }
        }
    }
    if builder.should_stop() {
        return false;
    }

    builder.make_unassigned_nodes_unperformed();
    let committed = builder.commit();
    debug!("sweep finished: committed={committed}");
    committed
}

/// Visits sorted by angle around the first vehicle's start, then by
/// distance; `None` without coordinates.
fn angle_order(model: &RoutingModel) -> Option<Vec<usize>> {
    let coordinates = model.sweep_coordinates()?;
    let (dx, dy) = coordinates[model.index_to_node(model.start(0))];
    let mut keyed: Vec<(f64, f64, usize)> = (0..model.size())
        .filter(|&i| !model.is_start(i))
        .map(|i| {
            let (x, y) = coordinates[model.index_to_node(i)];
            let (rx, ry) = (x - dx, y - dy);
            (ry.atan2(rx), rx.hypot(ry), i)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)).then(a.2.cmp(&b.2)));
    Some(keyed.into_iter().map(|(_, _, i)| i).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructive::tests::{builder_for, line_scenario, standard_rules};
    use crate::distance::CostMatrix;
    use crate::filters::CapacityRule;
    use crate::models::Vehicle;

    fn model_at(points: Vec<(f64, f64)>, vehicles: Vec<Vehicle>) -> RoutingModel {
        let mut model =
            RoutingModel::new(points.len(), vehicles, CostMatrix::from_points(&points)).expect("valid");
        model.set_sweep_coordinates(points).expect("valid");
        model
    }

    #[test]
    fn test_angular_ordering() {
        // 0°, 90°, 180°, -90°.
        let points = vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];
        let model = model_at(points, vec![Vehicle::new(0)]);
        let mut builder = builder_for(&model, standard_rules());
        assert!(sweep(&mut builder));
        assert_eq!(builder.assignment().route(0), &[4, 3, 0, 1, 2, 5]);
    }

    #[test]
    fn test_equal_angles_go_nearest_first() {
        let points = vec![(0.0, 0.0), (3.0, 0.0), (1.0, 0.0), (2.0, 0.0)];
        let model = model_at(points, vec![Vehicle::new(0)]);
        assert_eq!(angle_order(&model), Some(vec![1, 2, 0]));
    }

    #[test]
    fn test_clusters_split_by_capacity() {
        // Two clusters: east at 0°, south at -90°.
        let points = vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, -1.0), (0.0, -2.0)];
        let model = model_at(points, vec![Vehicle::new(0), Vehicle::new(0)]);
        let mut rules = standard_rules();
        rules.push(Box::new(CapacityRule::from_node_demands(&model, &[0, 10, 10, 10, 10], &[20, 20])));
        let mut builder = builder_for(&model, rules);
        assert!(sweep(&mut builder));
        assert_eq!(builder.assignment().route(0), &[4, 2, 3, 6]);
        assert_eq!(builder.assignment().route(1), &[5, 0, 1, 7]);
    }

    #[test]
    fn test_delivery_swept_before_its_pickup_waits() {
        let points = vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)];
        let mut model = model_at(points, vec![Vehicle::new(0)]);
        // Angles: index 0 at 0°, 1 at 90°, 2 at 180°.
        model.add_pickup_and_delivery(2, 0).expect("valid");
        let mut builder = builder_for(&model, standard_rules());
        assert!(sweep(&mut builder));
        assert_eq!(builder.assignment().route(0), &[3, 1, 2, 0, 4]);
    }

    #[test]
    fn test_line_scenario() {
        let model = line_scenario();
        let mut builder = builder_for(&model, standard_rules());
        assert!(sweep(&mut builder));
        assert_eq!(builder.assignment().route(0), &[4, 0, 1, 2, 3, 5]);
    }

    #[test]
    fn test_missing_coordinates() {
        let points = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        let model = RoutingModel::new(3, vec![Vehicle::new(0)], CostMatrix::from_points(&points)).expect("valid");
        let mut builder = builder_for(&model, standard_rules());
        assert!(!sweep(&mut builder));
        assert_eq!(builder.stats().decisions, 0);
    }

    #[test]
    fn test_stop_cancels_build() {
        let points = vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        let model = model_at(points, vec![Vehicle::new(0)]);
        let mut builder = builder_for(&model, standard_rules()).with_stop(Box::new(|| true));
        assert!(!sweep(&mut builder));
    }
}
