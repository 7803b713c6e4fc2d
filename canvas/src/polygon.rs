//! Point-in-polygon containment by ray casting.
//!
//! Edges follow the half-open convention: an edge is crossed only when
//! exactly one endpoint lies strictly below the point's y (`vy > py`), and
//! the crossing must lie strictly to the right of the point. Consequently a
//! point on a left or bottom boundary counts as inside, a point on a right
//! or top boundary as outside, and shared vertices are never counted twice.

#[cfg(test)]
#[path = "polygon_test.rs"]
mod polygon_test;

use crate::camera::{DataRect, Point};

/// Whether `pt` lies inside the polygon described by `vertices`.
///
/// Polygons with fewer than three vertices contain nothing.
#[must_use]
pub fn contains(pt: Point, vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for (i, a) in vertices.iter().enumerate() {
        let b = vertices[j];
        if (a.y > pt.y) != (b.y > pt.y) {
            let cross_x = (b.x - a.x) * (pt.y - a.y) / (b.y - a.y) + a.x;
            if pt.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Axis-aligned bounding box of `vertices`, or `None` for an empty slice.
#[must_use]
pub fn bounding_box(vertices: &[Point]) -> Option<DataRect> {
    let first = *vertices.first()?;
    let rect = vertices.iter().fold(DataRect { min: first, max: first }, |r, v| DataRect {
        min: Point::new(r.min.x.min(v.x), r.min.y.min(v.y)),
        max: Point::new(r.max.x.max(v.x), r.max.y.max(v.y)),
    });
    Some(rect)
}
