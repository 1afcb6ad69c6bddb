//! Committed successor assignment and pending deltas.

/// Where an index stands in an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// No successor decided yet.
    Unassigned,
    /// Its own successor: not performed.
    Inactive,
    /// On the route of `vehicle`, at position `rank` (the start has rank 0).
    Active {
        /// Vehicle whose route holds the index.
        vehicle: usize,
        /// Position on that route.
        rank: usize,
    },
}

/// The committed (partial) solution: one optional successor per index.
///
/// Routes are kept alongside the successor values so that vehicle and
/// position lookups stay constant time.
///
/// # Examples
///
/// ```
/// use u_routing_init::models::{Assignment, NodeState};
///
/// let a = Assignment::new(4, 1);
/// assert_eq!(a.value(0), None);
/// assert_eq!(a.state(0), NodeState::Unassigned);
/// assert!(a.route(0).is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    next: Vec<Option<usize>>,
    vehicle_of: Vec<Option<usize>>,
    rank: Vec<usize>,
    routes: Vec<Vec<usize>>,
}

impl Assignment {
    /// Creates an empty assignment for `size` successor variables.
    pub fn new(size: usize, num_vehicles: usize) -> Self {
        Self {
            next: vec![None; size],
            vehicle_of: vec![None; size + num_vehicles],
            rank: vec![0; size + num_vehicles],
            routes: vec![Vec::new(); num_vehicles],
        }
    }

    /// Number of successor variables.
    pub fn size(&self) -> usize {
        self.next.len()
    }

    /// Committed successor of an index.
    pub fn value(&self, index: usize) -> Option<usize> {
        self.next.get(index).copied().flatten()
    }

    /// `true` if the index has a committed successor.
    pub fn contains(&self, index: usize) -> bool {
        self.value(index).is_some()
    }

    /// Vehicle whose route holds the index.
    pub fn vehicle_of(&self, index: usize) -> Option<usize> {
        self.vehicle_of[index]
    }

    /// Position of the index on its route.
    pub fn rank(&self, index: usize) -> Option<usize> {
        self.vehicle_of[index].map(|_| self.rank[index])
    }

    /// State of an index.
    pub fn state(&self, index: usize) -> NodeState {
        if let Some(vehicle) = self.vehicle_of[index] {
            NodeState::Active {
                vehicle,
                rank: self.rank[index],
            }
        } else if self.value(index) == Some(index) {
            NodeState::Inactive
        } else {
            NodeState::Unassigned
        }
    }

    /// Committed route of a vehicle, start and end included. Empty while
    /// the vehicle start has no successor.
    pub fn route(&self, vehicle: usize) -> &[usize] {
        &self.routes[vehicle]
    }

    /// Number of vehicles.
    pub fn num_vehicles(&self) -> usize {
        self.routes.len()
    }

    /// Applies an accepted delta. `routes` are the rebuilt paths of every
    /// vehicle the delta touched.
    pub(crate) fn apply(&mut self, delta: &Delta, routes: Vec<(usize, Vec<usize>)>) {
        for &(index, value) in delta.entries() {
            self.next[index] = Some(value);
        }
        for (vehicle, _) in &routes {
            for &member in &self.routes[*vehicle] {
                self.vehicle_of[member] = None;
            }
        }
        for (vehicle, path) in routes {
            for (rank, &member) in path.iter().enumerate() {
                self.vehicle_of[member] = Some(vehicle);
                self.rank[member] = rank;
            }
            self.routes[vehicle] = path;
        }
    }
}

/// Pending successor changes. Setting the same index twice keeps the last
/// value.
#[derive(Debug, Clone)]
pub struct Delta {
    entries: Vec<(usize, usize)>,
    slot: Vec<Option<usize>>,
}

impl Delta {
    /// Creates an empty delta over `size` successor variables.
    pub fn new(size: usize) -> Self {
        Self {
            entries: Vec::new(),
            slot: vec![None; size],
        }
    }

    /// Records `next(index) = value`.
    pub fn set(&mut self, index: usize, value: usize) {
        match self.slot[index] {
            Some(pos) => self.entries[pos].1 = value,
            None => {
                self.slot[index] = Some(self.entries.len());
                self.entries.push((index, value));
            }
        }
    }

    /// Pending successor of an index.
    pub fn get(&self, index: usize) -> Option<usize> {
        self.slot
            .get(index)
            .copied()
            .flatten()
            .map(|pos| self.entries[pos].1)
    }

    /// Pending `(index, successor)` entries in insertion order.
    pub fn entries(&self) -> &[(usize, usize)] {
        &self.entries
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every pending entry.
    pub fn clear(&mut self) {
        for &(index, _) in &self.entries {
            self.slot[index] = None;
        }
        self.entries.clear();
    }
}
