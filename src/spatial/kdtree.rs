//! Two-dimensional k-d tree over network-node coordinates
//!
//! The tree is stored implicitly in a flat vector: the median of every
//! subrange sits at the middle position and its halves lie on either side.
//! Construction is O(n log n) using median selection, nearest-neighbour
//! queries are O(log n) on average.
//!
//! Equidistant candidates are resolved in favour of the lowest node id, so
//! the answer never depends on input order or tree layout.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{AnalysisError, Result};
use crate::spatial::{NetworkNode, NodeId};

/// A node coordinate stored in the tree
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    coords: [f64; 2],
    id: NodeId,
}

impl IndexedPoint {
    #[inline]
    fn distance_sq(&self, query: [f64; 2]) -> f64 {
        let dx = self.coords[0] - query[0];
        let dy = self.coords[1] - query[1];
        dx * dx + dy * dy
    }
}

/// Nearest node found for a query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub node_id: NodeId,
    pub distance: f64,
}

/// Read-only nearest-neighbour index over network nodes
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    points: Vec<IndexedPoint>,
}

impl SpatialIndex {
    /// Build an index over the coordinates of `nodes`
    pub fn build(nodes: &[NetworkNode]) -> Result<Self> {
        let coords: Vec<(NodeId, f64, f64)> = nodes.iter().map(|n| (n.id, n.x, n.y)).collect();
        Self::from_coordinates(&coords)
    }

    /// Build an index from explicit `(id, x, y)` tuples
    pub fn from_coordinates(coords: &[(NodeId, f64, f64)]) -> Result<Self> {
        if coords.is_empty() {
            return Err(AnalysisError::EmptyIndex);
        }

        let mut seen = HashSet::with_capacity(coords.len());
        let mut points = Vec::with_capacity(coords.len());
        for &(id, x, y) in coords {
            if !x.is_finite() || !y.is_finite() {
                return Err(AnalysisError::InvalidCoordinate {
                    kind: "network node",
                    id,
                    x,
                    y,
                });
            }
            if !seen.insert(id) {
                return Err(AnalysisError::DuplicateId {
                    kind: "network node",
                    id,
                });
            }
            points.push(IndexedPoint { coords: [x, y], id });
        }

        Self::arrange(&mut points, 0);
        log::debug!("Built spatial index over {} nodes", points.len());

        Ok(Self { points })
    }

    /// Partition `points` so that every subrange's median sits at its middle
    fn arrange(points: &mut [IndexedPoint], depth: usize) {
        if points.len() <= 1 {
            return;
        }

        let dim = depth % 2;
        let mid = points.len() / 2;
        points.select_nth_unstable_by(mid, |a, b| Self::axis_order(a, b, dim));

        let (left, rest) = points.split_at_mut(mid);
        Self::arrange(left, depth + 1);
        Self::arrange(&mut rest[1..], depth + 1);
    }

    #[inline]
    fn axis_order(a: &IndexedPoint, b: &IndexedPoint, dim: usize) -> Ordering {
        a.coords[dim]
            .total_cmp(&b.coords[dim])
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Number of indexed nodes
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: construction rejects empty node sets
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Id of the node closest to `(x, y)` by Euclidean distance
    pub fn query_nearest(&self, x: f64, y: f64) -> NodeId {
        self.nearest(x, y).node_id
    }

    /// Closest node to `(x, y)` together with its distance
    pub fn nearest(&self, x: f64, y: f64) -> Neighbor {
        let query = [x, y];
        let first = self.points[self.points.len() / 2];
        let mut best = (first.distance_sq(query), first.id);

        Self::search(&self.points, query, 0, &mut best);

        Neighbor {
            node_id: best.1,
            distance: best.0.sqrt(),
        }
    }

    fn search(points: &[IndexedPoint], query: [f64; 2], depth: usize, best: &mut (f64, NodeId)) {
        if points.is_empty() {
            return;
        }

        let mid = points.len() / 2;
        let pivot = &points[mid];

        let dist_sq = pivot.distance_sq(query);
        if dist_sq < best.0 || (dist_sq == best.0 && pivot.id < best.1) {
            *best = (dist_sq, pivot.id);
        }

        let dim = depth % 2;
        let diff = query[dim] - pivot.coords[dim];
        let (near, far) = if diff < 0.0 {
            (&points[..mid], &points[mid + 1..])
        } else {
            (&points[mid + 1..], &points[..mid])
        };

        Self::search(near, query, depth + 1, best);

        // Equality keeps equidistant nodes across the plane reachable for the tie-break
        if diff * diff <= best.0 {
            Self::search(far, query, depth + 1, best);
        }
    }
}
