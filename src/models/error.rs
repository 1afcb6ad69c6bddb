//! Errors raised while assembling a routing model.

use std::fmt::Display;

/// An invalid model definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The model has no vehicle.
    NoVehicles,
    /// A node id is outside `0..num_nodes`.
    NodeOutOfRange {
        /// The offending node.
        node: usize,
        /// Number of nodes in the model.
        num_nodes: usize,
    },
    /// A variable index is outside the range it is allowed in.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
    },
    /// A vehicle refers to a cost class that does not exist.
    UnknownCostClass {
        /// The vehicle.
        vehicle: usize,
        /// The cost class it refers to.
        cost_class: usize,
    },
    /// A cost matrix does not cover every node.
    CostMatrixSize {
        /// The cost class of the matrix.
        cost_class: usize,
        /// Expected matrix size.
        expected: usize,
        /// Actual matrix size.
        found: usize,
    },
    /// A vehicle start or end was put in a disjunction.
    DepotInDisjunction {
        /// The offending index.
        index: usize,
    },
    /// A disjunction is empty or its cardinality does not fit its size.
    InvalidDisjunction {
        /// Number of indices in the disjunction.
        size: usize,
        /// Requested maximum cardinality.
        max_cardinality: usize,
    },
    /// A disjunction id does not exist.
    UnknownDisjunction {
        /// The disjunction id.
        disjunction: usize,
    },
    /// A lock chain is malformed (too short, conflicting, or floating).
    InvalidLock {
        /// Index at which the chain was rejected.
        index: usize,
    },
    /// Sweep coordinates do not cover every node exactly once.
    CoordinatesSize {
        /// Number of nodes in the model.
        expected: usize,
        /// Number of coordinates given.
        found: usize,
    },
    /// A sweep coordinate is not a finite number.
    InvalidCoordinate {
        /// The node it belongs to.
        node: usize,
    },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoVehicles => write!(f, "Model must have at least one vehicle"),
            Self::NodeOutOfRange { node, num_nodes } => {
                write!(f, "Node {node} is out of range (model has {num_nodes} nodes)")
            }
            Self::IndexOutOfRange { index } => write!(f, "Index {index} is out of range"),
            Self::UnknownCostClass {
                vehicle,
                cost_class,
            } => write!(
                f,
                "Vehicle {vehicle} refers to unknown cost class {cost_class}"
            ),
            Self::CostMatrixSize {
                cost_class,
                expected,
                found,
            } => write!(
                f,
                "Cost matrix of class {cost_class} has size {found}, expected {expected}"
            ),
            Self::DepotInDisjunction { index } => {
                write!(f, "Vehicle start/end index {index} cannot be in a disjunction")
            }
            Self::InvalidDisjunction {
                size,
                max_cardinality,
            } => write!(
                f,
                "Disjunction of {size} indices cannot have max cardinality {max_cardinality}"
            ),
            Self::UnknownDisjunction { disjunction } => {
                write!(f, "Disjunction {disjunction} does not exist")
            }
            Self::InvalidLock { index } => write!(f, "Invalid lock chain at index {index}"),
            Self::CoordinatesSize { expected, found } => {
                write!(f, "Got {found} sweep coordinates for {expected} nodes")
            }
            Self::InvalidCoordinate { node } => write!(f, "Sweep coordinate of node {node} is not finite"),
        }
    }
}

impl std::error::Error for ModelError {}
