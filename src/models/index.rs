//! Node ↔ variable index mapping.

use super::ModelError;

/// Maps user nodes to the variable indices the heuristics work on.
///
/// Every non-depot node owns exactly one index, numbered in node order.
/// Each vehicle then gets its own start index and, after those, its own end
/// index. Indices below [`size`](Self::size) own a successor variable;
/// indices at or above it are path-end markers.
///
/// # Examples
///
/// ```
/// use u_routing_init::models::IndexManager;
///
/// // Nodes 0..4, one vehicle starting and ending at node 0.
/// let m = IndexManager::new(4, &[(0, 0)]).unwrap();
/// assert_eq!(m.size(), 4); // 3 visits + 1 start
/// assert_eq!(m.node_to_index(1), Some(0));
/// assert_eq!(m.start(0), 3);
/// assert_eq!(m.end(0), 4);
/// assert_eq!(m.index_to_node(4), 0);
/// ```
#[derive(Debug, Clone)]
pub struct IndexManager {
    num_nodes: usize,
    index_to_node: Vec<usize>,
    node_to_index: Vec<Option<usize>>,
    starts: Vec<usize>,
    ends: Vec<usize>,
    size: usize,
}

impl IndexManager {
    /// Creates the mapping for `num_nodes` nodes and one `(start, end)` node
    /// pair per vehicle.
    pub fn new(num_nodes: usize, starts_ends: &[(usize, usize)]) -> Result<Self, ModelError> {
        if starts_ends.is_empty() {
            return Err(ModelError::NoVehicles);
        }
        let mut is_depot = vec![false; num_nodes];
        for &(start, end) in starts_ends {
            for node in [start, end] {
                if node >= num_nodes {
                    return Err(ModelError::NodeOutOfRange { node, num_nodes });
                }
                is_depot[node] = true;
            }
        }

        let mut index_to_node = Vec::with_capacity(num_nodes + 2 * starts_ends.len());
        let mut node_to_index = vec![None; num_nodes];
        for (node, &depot) in is_depot.iter().enumerate() {
            if !depot {
                node_to_index[node] = Some(index_to_node.len());
                index_to_node.push(node);
            }
        }
        let mut starts = Vec::with_capacity(starts_ends.len());
        for &(start, _) in starts_ends {
            starts.push(index_to_node.len());
            index_to_node.push(start);
        }
        let size = index_to_node.len();
        let mut ends = Vec::with_capacity(starts_ends.len());
        for &(_, end) in starts_ends {
            ends.push(index_to_node.len());
            index_to_node.push(end);
        }

        Ok(Self {
            num_nodes,
            index_to_node,
            node_to_index,
            starts,
            ends,
            size,
        })
    }

    /// Number of indices owning a successor variable.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of indices, path-end markers included.
    pub fn num_indices(&self) -> usize {
        self.index_to_node.len()
    }

    /// Number of user nodes.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of vehicles.
    pub fn num_vehicles(&self) -> usize {
        self.starts.len()
    }

    /// Start index of a vehicle.
    pub fn start(&self, vehicle: usize) -> usize {
        self.starts[vehicle]
    }

    /// End index of a vehicle.
    pub fn end(&self, vehicle: usize) -> usize {
        self.ends[vehicle]
    }

    /// The node an index stands for.
    pub fn index_to_node(&self, index: usize) -> usize {
        self.index_to_node[index]
    }

    /// The index of a non-depot node. Depot nodes have one index per vehicle
    /// and are reached through [`start`](Self::start)/[`end`](Self::end).
    pub fn node_to_index(&self, node: usize) -> Option<usize> {
        self.node_to_index.get(node).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_depot() {
        let m = IndexManager::new(3, &[(0, 0), (0, 0)]).expect("valid");
        assert_eq!(m.size(), 4);
        assert_eq!(m.num_indices(), 6);
        assert_eq!(m.start(0), 2);
        assert_eq!(m.start(1), 3);
        assert_eq!(m.end(0), 4);
        assert_eq!(m.end(1), 5);
        assert_eq!(m.node_to_index(0), None);
        assert_eq!(m.node_to_index(2), Some(1));
        assert_eq!(m.index_to_node(5), 0);
    }

    #[test]
    fn test_distinct_start_end() {
        let m = IndexManager::new(4, &[(0, 3)]).expect("valid");
        assert_eq!(m.size(), 3);
        assert_eq!(m.node_to_index(1), Some(0));
        assert_eq!(m.node_to_index(2), Some(1));
        assert_eq!(m.index_to_node(m.start(0)), 0);
        assert_eq!(m.index_to_node(m.end(0)), 3);
    }

    #[test]
    fn test_invalid() {
        assert_eq!(
            IndexManager::new(3, &[]).unwrap_err(),
            ModelError::NoVehicles
        );
        assert_eq!(
            IndexManager::new(3, &[(0, 5)]).unwrap_err(),
            ModelError::NodeOutOfRange {
                node: 5,
                num_nodes: 3
            }
        );
    }
}
