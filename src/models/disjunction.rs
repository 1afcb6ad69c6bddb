//! Disjunctions and pickup–delivery pairs.

use crate::distance::Cost;

/// A set of alternative indices of which at most (or, without a penalty,
/// exactly) `max_cardinality` are active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disjunction {
    indices: Vec<usize>,
    penalty: Option<Cost>,
    max_cardinality: usize,
}

impl Disjunction {
    pub(crate) fn new(indices: Vec<usize>, penalty: Option<Cost>, max_cardinality: usize) -> Self {
        Self {
            indices,
            penalty,
            max_cardinality,
        }
    }

    /// Member indices.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Penalty charged per missing active member; `None` makes the
    /// disjunction hard.
    pub fn penalty(&self) -> Option<Cost> {
        self.penalty
    }

    /// Maximum number of active members.
    pub fn max_cardinality(&self) -> usize {
        self.max_cardinality
    }

    /// `true` when the disjunction has no penalty.
    pub fn is_hard(&self) -> bool {
        self.penalty.is_none()
    }
}

/// A pickup–delivery pair: one of `pickups` must precede one of
/// `deliveries` on the same route, or neither is performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupDeliveryPair {
    pickups: Vec<usize>,
    deliveries: Vec<usize>,
}

impl PickupDeliveryPair {
    pub(crate) fn new(pickups: Vec<usize>, deliveries: Vec<usize>) -> Self {
        Self {
            pickups,
            deliveries,
        }
    }

    /// Pickup alternatives.
    pub fn pickups(&self) -> &[usize] {
        &self.pickups
    }

    /// Delivery alternatives.
    pub fn deliveries(&self) -> &[usize] {
        &self.deliveries
    }
}
