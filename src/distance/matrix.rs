//! Dense cost matrix.

use super::Cost;

/// A dense n×n integer cost matrix stored in row-major order.
///
/// Rows and columns are *nodes* (locations), not variable indices; the
/// [`IndexManager`](crate::models::IndexManager) translates between the two.
///
/// # Examples
///
/// ```
/// use u_routing_init::distance::CostMatrix;
///
/// let m = CostMatrix::from_points(&[(0.0, 0.0), (3.0, 4.0), (0.0, 8.0)]);
/// assert_eq!(m.get(0, 1), 5);
/// assert_eq!(m.size(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostMatrix {
    data: Vec<Cost>,
    size: usize,
}

impl CostMatrix {
    /// Creates a cost matrix of the given size, initialized to zero.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size * size],
            size,
        }
    }

    /// Computes a matrix of rounded Euclidean distances between points.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let n = points.len();
        let mut m = Self::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = points[i].0 - points[j].0;
                let dy = points[i].1 - points[j].1;
                let d = (dx * dx + dy * dy).sqrt().round() as Cost;
                m.set(i, j, d);
                m.set(j, i, d);
            }
        }
        m
    }

    /// Creates a cost matrix from an explicit n×n grid.
    ///
    /// Returns `None` if the data length doesn't match `size * size` or if
    /// any entry is negative.
    pub fn from_data(size: usize, data: Vec<Cost>) -> Option<Self> {
        if data.len() != size * size || data.iter().any(|&c| c < 0) {
            return None;
        }
        Some(Self { data, size })
    }

    /// Returns the cost of the arc `from -> to`.
    ///
    /// # Panics
    ///
    /// Panics if either node is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> Cost {
        self.data[from * self.size + to]
    }

    /// Sets the cost of the arc `from -> to`.
    pub fn set(&mut self, from: usize, to: usize, cost: Cost) {
        self.data[from * self.size + to] = cost;
    }

    /// Sets both `a -> b` and `b -> a`.
    pub fn set_symmetric(&mut self, a: usize, b: usize, cost: Cost) {
        self.set(a, b, cost);
        self.set(b, a, cost);
    }

    /// Number of nodes covered by this matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if `get(i, j) == get(j, i)` for every pair.
    pub fn is_symmetric(&self) -> bool {
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                if self.get(i, j) != self.get(j, i) {
                    return false;
                }
            }
        }
        true
    }
}
