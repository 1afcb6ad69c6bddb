//! Per-cost-class neighbor sets used to prune insertion positions.

use std::collections::BTreeSet;

use log::debug;

use crate::models::RoutingModel;

/// For each cost class and index, the indices considered worth inserting
/// next to it.
///
/// Each visit keeps its `max(1, ratio × #visits)` cheapest successors;
/// the relation is then made symmetric. Vehicle starts neighbor every
/// index. A ratio of 1 or more disables pruning.
///
/// # Examples
///
/// ```
/// use u_routing_init::construction::NeighborSets;
/// use u_routing_init::distance::CostMatrix;
/// use u_routing_init::models::{RoutingModel, Vehicle};
///
/// let points = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (50.0, 0.0)];
/// let model = RoutingModel::new(4, vec![Vehicle::new(0)], CostMatrix::from_points(&points)).unwrap();
/// let neighbors = NeighborSets::compute(&model, 0.3);
/// assert!(neighbors.is_neighbor(0, 0, 1));
/// assert!(!neighbors.is_neighbor(0, 0, 2));
/// assert!(neighbors.is_neighbor(0, model.start(0), 2));
/// ```
#[derive(Debug, Clone)]
pub struct NeighborSets {
    all: bool,
    sets: Vec<Vec<BTreeSet<usize>>>,
}

impl NeighborSets {
    /// Computes neighbor sets for every cost class some vehicle uses.
    pub fn compute(model: &RoutingModel, ratio: f64) -> Self {
        let size = model.size();
        let visits: Vec<usize> = (0..size).filter(|&i| !model.is_start(i)).collect();
        if ratio >= 1.0 || visits.is_empty() {
            return Self {
                all: true,
                sets: Vec::new(),
            };
        }
        let num_neighbors = ((ratio * visits.len() as f64) as usize).max(1);

        let mut sets = vec![Vec::new(); model.num_cost_classes()];
        for (cost_class, class_sets) in sets.iter_mut().enumerate() {
            if !model.has_vehicle_with_cost_class(cost_class) {
                continue;
            }
            let mut neighbors = vec![BTreeSet::new(); size];
            for &index in &visits {
                let mut costed: Vec<(i64, usize)> = visits
                    .iter()
                    .filter(|&&other| other != index)
                    .map(|&other| (model.arc_cost_for_class(index, other, cost_class), other))
                    .collect();
                if num_neighbors < costed.len() {
                    costed.select_nth_unstable(num_neighbors - 1);
                    costed.truncate(num_neighbors);
                }
                for (_, other) in costed {
                    neighbors[index].insert(other);
                    neighbors[other].insert(index);
                }
            }
            *class_sets = neighbors;
        }
        debug!("computed {num_neighbors} neighbors per visit");
        Self { all: false, sets }
    }

    /// `true` if no pruning is applied.
    pub fn is_all(&self) -> bool {
        self.all
    }

    /// `true` if `index` may be inserted right after `anchor` on routes of
    /// the cost class.
    pub fn is_neighbor(&self, cost_class: usize, anchor: usize, index: usize) -> bool {
        self.all
            || self
                .sets
                .get(cost_class)
                .and_then(|class| class.get(anchor))
                .is_none_or(|set| set.is_empty() || set.contains(&index))
    }

    /// Indices that may be inserted right after `anchor`; `None` when every
    /// index qualifies.
    pub fn neighbors_of(&self, cost_class: usize, anchor: usize) -> Option<&BTreeSet<usize>> {
        if self.all {
            return None;
        }
        self.sets
            .get(cost_class)
            .and_then(|class| class.get(anchor))
            .filter(|set| !set.is_empty())
    }
}
