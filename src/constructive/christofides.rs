//! Christofides tour slicing.
//!
//! # Algorithm
//!
//! For every cost class used by a vehicle, a closed tour through the
//! class's depot and every free visit is built:
//!
//! 1. Minimum spanning tree (Prim).
//! 2. Greedy matching of odd-degree vertices, cheapest pair first.
//! 3. Euler circuit of tree plus matching (Hierholzer).
//! 4. Shortcut of repeated vertices.
//!
//! Each vehicle then walks the tour of its cost class, appending every
//! still-free visit the rules accept after the last one placed. The walk
//! is repeated while it places something, so a delivery met before its
//! pickup is appended on a later pass.
//!
//! The greedy matching replaces the minimum-cost perfect matching of the
//! textbook algorithm, so the 3/2 approximation bound does not hold.
//! Costs are symmetrized by taking the cheaper direction of each arc.
//!
//! # Complexity
//!
//! O(n²) for the tree and O(k² log k) for the matching of k odd vertices,
//! per cost class.
//!
//! # Reference
//!
//! Christofides, N. (1976). "Worst-Case Analysis of a New Heuristic for the
//! Travelling Salesman Problem", Report 388, Graduate School of Industrial
//! Administration, Carnegie Mellon University.

use log::{debug, trace};

use crate::construction::RoutingBuilder;
use crate::distance::{Cost, MAX_COST};

/// Builds a first solution by slicing Christofides tours into routes.
///
/// Returns `false` if the build was stopped or a mandatory visit was left
/// over.
///
/// # Examples
///
/// ```
/// use u_routing_init::construction::RoutingBuilder;
/// use u_routing_init::constructive::christofides;
/// use u_routing_init::distance::CostMatrix;
/// use u_routing_init::filters::DisjunctionRule;
/// use u_routing_init::models::{RoutingModel, Vehicle};
///
/// let points = [(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)];
/// let model = RoutingModel::new(4, vec![Vehicle::new(0)], CostMatrix::from_points(&points)).unwrap();
/// let mut builder = RoutingBuilder::new(&model, vec![Box::new(DisjunctionRule::new())]);
///
/// assert!(christofides(&mut builder));
/// assert_eq!(builder.assignment().route(0), &[3, 0, 1, 2, 4]);
/// ```
pub fn christofides(builder: &mut RoutingBuilder<'_>) -> bool {
    if !builder.initialize_routes() {
        return false;
    }
    let model = builder.model();
    let visits: Vec<usize> = (0..model.size())
        .filter(|&i| !model.is_start(i) && !builder.contains(i))
        .collect();

    let mut tours: Vec<Option<Vec<usize>>> = vec![None; model.num_cost_classes()];
    for vehicle in 0..model.num_vehicles() {
        let cost_class = model.cost_class_of_vehicle(vehicle);
        if tours[cost_class].is_some() {
            continue;
        }
        // Local vertex 0 is the depot, vertex k + 1 is visits[k].
        let depot = model.start(vehicle);
        let index_of = |vertex: usize| if vertex == 0 { depot } else { visits[vertex - 1] };
        let weight = |a: usize, b: usize| {
            let (a, b) = (index_of(a), index_of(b));
            model
                .arc_cost_for_class(a, b, cost_class)
                .min(model.arc_cost_for_class(b, a, cost_class))
        };
        let tour: Vec<usize> = christofides_tour(visits.len() + 1, weight)
            .into_iter()
            .filter(|&vertex| vertex != 0)
            .map(index_of)
            .collect();
        debug!("christofides tour of cost class {cost_class} over {} visits", tour.len());
        tours[cost_class] = Some(tour);
    }

    for vehicle in 0..model.num_vehicles() {
        let Some(tour) = &tours[model.cost_class_of_vehicle(vehicle)] else {
            continue;
        };
        let end = builder.end_chain_start(vehicle);
        let mut prev = builder.start_chain_end(vehicle);
        if model.is_end(prev) {
            continue;
        }
        loop {
            let mut placed = false;
            for &next in tour {
                if builder.should_stop() {
                    return false;
                }
                if builder.contains(next) {
                    continue;
                }
                builder.insert_between(next, prev, end);
                if builder.commit() {
                    trace!("appended {next} on vehicle {vehicle}");
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
    debug!("christofides finished: committed={committed}");
    committed
}

/// Closed tour over vertices `0..n` starting at 0, without the closing
/// return to 0.
fn christofides_tour(n: usize, weight: impl Fn(usize, usize) -> Cost) -> Vec<usize> {
    if n <= 2 {
        return (0..n).collect();
    }
    let mut edges = minimum_spanning_tree(n, &weight);
    let mut degree = vec![0usize; n];
    for &(a, b) in &edges {
        degree[a] += 1;
        degree[b] += 1;
    }
    let odd: Vec<usize> = (0..n).filter(|&v| degree[v] % 2 == 1).collect();
    edges.extend(greedy_matching(&odd, &weight));

    let circuit = euler_circuit(n, &edges);
    let mut seen = vec![false; n];
    circuit
        .into_iter()
        .filter(|&v| !std::mem::replace(&mut seen[v], true))
        .collect()
}

/// Prim's algorithm from vertex 0; edges in the order they join the tree.
fn minimum_spanning_tree(n: usize, weight: &impl Fn(usize, usize) -> Cost) -> Vec<(usize, usize)> {
    let mut in_tree = vec![false; n];
    let mut best = vec![MAX_COST; n];
    let mut parent = vec![0usize; n];
    let mut edges = Vec::with_capacity(n - 1);
    in_tree[0] = true;
    for v in 1..n {
        best[v] = weight(0, v);
    }
    for _ in 1..n {
        let mut next = None;
        for v in 0..n {
            if !in_tree[v] && next.is_none_or(|u: usize| best[v] < best[u]) {
                next = Some(v);
            }
        }
        let Some(u) = next else {
            break;
        };
        in_tree[u] = true;
        edges.push((parent[u], u));
        for v in 0..n {
            if !in_tree[v] {
                let w = weight(u, v);
                if w < best[v] {
                    best[v] = w;
                    parent[v] = u;
                }
            }
        }
    }
    edges
}

/// Matches odd vertices, cheapest pair first.
fn greedy_matching(odd: &[usize], weight: &impl Fn(usize, usize) -> Cost) -> Vec<(usize, usize)> {
    let mut pairs: Vec<(Cost, usize, usize)> = Vec::new();
    for (i, &a) in odd.iter().enumerate() {
        for &b in &odd[i + 1..] {
            pairs.push((weight(a, b), a, b));
        }
    }
    pairs.sort_unstable();

    let mut matched = vec![false; odd.iter().max().map_or(0, |&m| m + 1)];
    let mut matching = Vec::with_capacity(odd.len() / 2);
    for (_, a, b) in pairs {
        if !matched[a] && !matched[b] {
            matched[a] = true;
            matched[b] = true;
            matching.push((a, b));
        }
    }
    matching
}

/// Hierholzer's algorithm from vertex 0 on a connected multigraph with
/// even degrees.
fn euler_circuit(n: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    for (id, &(a, b)) in edges.iter().enumerate() {
        adjacency[a].push((b, id));
        adjacency[b].push((a, id));
    }
    let mut used = vec![false; edges.len()];
    let mut cursor = vec![0usize; n];
    let mut stack = vec![0usize];
    let mut circuit = Vec::with_capacity(edges.len() + 1);

    while let Some(&v) = stack.last() {
        while cursor[v] < adjacency[v].len() && used[adjacency[v][cursor[v]].1] {
            cursor[v] += 1;
        }
        match adjacency[v].get(cursor[v]) {
            Some(&(u, id)) => {
                used[id] = true;
                stack.push(u);
            }
            None => {
                circuit.push(v);
                stack.pop();
            }
        }
    }
    circuit.reverse();
    circuit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructive::tests::{builder_for, line_scenario, standard_rules};
    use crate::filters::CapacityRule;

    fn square(a: usize, b: usize) -> Cost {
        // Corners of a 10 × 10 square in cyclic order.
        let corners = [(0i64, 0i64), (0, 10), (10, 10), (10, 0)];
        let (dx, dy) = (corners[a].0 - corners[b].0, corners[a].1 - corners[b].1);
        ((dx * dx + dy * dy) as f64).sqrt().round() as Cost
    }

    #[test]
    fn test_tour_on_square_follows_perimeter() {
        assert_eq!(christofides_tour(4, square), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_tour_visits_each_vertex_once() {
        let weight = |a: usize, b: usize| ((a as i64 * 7 - b as i64 * 3).abs() % 11) + 1;
        let mut tour = christofides_tour(9, weight);
        assert_eq!(tour[0], 0);
        tour.sort_unstable();
        assert_eq!(tour, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_small_tours() {
        assert_eq!(christofides_tour(1, square), vec![0]);
        assert_eq!(christofides_tour(2, square), vec![0, 1]);
    }

    #[test]
    fn test_line_scenario() {
        let model = line_scenario();
        let mut builder = builder_for(&model, standard_rules());
        assert!(christofides(&mut builder));
        assert_eq!(builder.assignment().route(0), &[4, 0, 3, 2, 1, 5]);
    }

    #[test]
    fn test_rejected_visit_is_left_for_the_sweep() {
        let mut model = line_scenario();
        model.add_disjunction(&[3], Some(3), 1).expect("valid");
        let mut rules = standard_rules();
        rules.push(Box::new(CapacityRule::new(vec![1, 1, 1, 10, 0], vec![5])));
        let mut builder = builder_for(&model, rules);
        assert!(christofides(&mut builder));
        assert_eq!(builder.assignment().route(0), &[4, 0, 2, 1, 5]);
        assert!(builder.assignment().vehicle_of(3).is_none());
    }

    #[test]
    fn test_delivery_ahead_of_its_pickup_in_the_tour() {
        let mut model = line_scenario();
        // Pickup D, delivery A: the tour meets A first.
        model.add_pickup_and_delivery(3, 0).expect("valid");
        let mut builder = builder_for(&model, standard_rules());
        assert!(christofides(&mut builder));
        assert_eq!(builder.assignment().route(0), &[4, 3, 2, 1, 0, 5]);
    }

    #[test]
    fn test_stop_cancels_build() {
        let model = line_scenario();
        let mut builder = builder_for(&model, standard_rules()).with_stop(Box::new(|| true));
        assert!(!christofides(&mut builder));
    }
}
