//! Planar containment predicates used by the document store backends.

use crate::geometry::{Position, Shape};

/// Whether `p` lies inside `ring` or on its boundary.
///
/// The ring is treated as closed whether or not its last position repeats
/// the first. Coordinates are treated as planar.
pub fn ring_contains(ring: &[Position], p: Position) -> bool {
    if ring.is_empty() {
        return false;
    }
    if ring_boundary_contains(ring, p) {
        return true;
    }

    // Even-odd ray casting towards +lon.
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat > p.lat) != (b.lat > p.lat) {
            let crossing = (b.lon - a.lon) * (p.lat - a.lat) / (b.lat - a.lat) + a.lon;
            if p.lon < crossing {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn ring_boundary_contains(ring: &[Position], p: Position) -> bool {
    let n = ring.len();
    (0..n).any(|i| on_segment(ring[i], ring[(i + 1) % n], p))
}

fn on_segment(a: Position, b: Position, p: Position) -> bool {
    let cross = (b.lon - a.lon) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lon - a.lon);
    cross == 0.0
        && p.lon >= a.lon.min(b.lon)
        && p.lon <= a.lon.max(b.lon)
        && p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
}

/// Whether `p` lies inside the polygon described by `rings` (outer ring
/// first, holes after). Points on a hole's boundary still count as inside.
pub fn polygon_contains(rings: &[Vec<Position>], p: Position) -> bool {
    let Some((outer, holes)) = rings.split_first() else {
        return false;
    };
    ring_contains(outer, p)
        && !holes
            .iter()
            .any(|hole| ring_contains(hole, p) && !ring_boundary_contains(hole, p))
}

impl Shape {
    /// Whether every vertex of this shape lies within `container`.
    ///
    /// Only polygons can contain anything. Edges are not tested against the
    /// container, so for concave containers this is a vertex-level check; for
    /// convex containers such as bounding boxes it is exact.
    pub fn is_within(&self, container: &Shape) -> bool {
        match container {
            Shape::Polygon(rings) => self
                .positions()
                .into_iter()
                .all(|p| polygon_contains(rings, p)),
            Shape::Point(_) | Shape::LineString(_) => false,
        }
    }
}
