use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::types::*;

/// Exact overlap tests. All contact normals point from B into A.
pub struct Narrowphase;

impl NarrowphaseApi for Narrowphase {
    fn overlap_aabb_aabb(a: Rect, b: Rect) -> Option<Contact> {
        Self::aabb_axes(a, b).map(|[first, _]| first)
    }

    fn overlap_circle_circle(a: Circle, b: Circle) -> Option<Contact> {
        let delta = a.center - b.center;
        let dist2 = delta.length_squared();
        let rsum = a.radius + b.radius;
        if dist2 >= rsum * rsum {
            return None;
        }
        if dist2 == 0.0 {
            // Coincident centres; pick -X so the outcome is still deterministic.
            return Some(Contact { normal: Vec2::NEG_X, depth: rsum });
        }
        let dist = dist2.sqrt();
        Some(Contact { normal: delta / dist, depth: rsum - dist })
    }

    fn overlap_circle_aabb(c: Circle, b: Rect) -> Option<Contact> {
        let min = b.min();
        let max = b.max();
        let clamp = |v: f32, lo: f32, hi: f32| v.max(lo).min(hi);
        let closest = Vec2::new(clamp(c.center.x, min.x, max.x), clamp(c.center.y, min.y, max.y));
        let delta = c.center - closest;
        let dist2 = delta.length_squared();

        if dist2 > 0.0 {
            if dist2 >= c.radius * c.radius {
                return None;
            }
            let dist = dist2.sqrt();
            return Some(Contact { normal: delta / dist, depth: c.radius - dist });
        }

        // Centre inside the box: leave through the nearest face, first listed wins ties.
        let faces = [
            (c.center.x - min.x, Vec2::NEG_X),
            (max.x - c.center.x, Vec2::X),
            (c.center.y - min.y, Vec2::NEG_Y),
            (max.y - c.center.y, Vec2::Y),
        ];
        let mut best = faces[0];
        for face in &faces[1..] {
            if face.0 < best.0 {
                best = *face;
            }
        }
        Some(Contact { normal: best.1, depth: best.0 + c.radius })
    }

    fn overlap_point_aabb(p: Vec2, b: Rect) -> bool {
        let min = b.min();
        let max = b.max();
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    fn overlap_point_circle(p: Vec2, c: Circle) -> bool {
        (p - c.center).length_squared() <= c.radius * c.radius
    }
}

impl Narrowphase {
    /// Both separating axes of an AABB pair, preferred one first.
    ///
    /// The preferred axis has the smaller penetration; X wins ties.
    pub fn aabb_axes(a: Rect, b: Rect) -> Option<[Contact; 2]> {
        let (c0, h0) = (a.center(), a.half_extents());
        let (c1, h1) = (b.center(), b.half_extents());
        let d = c1 - c0;
        let ox = (h0.x + h1.x) - d.x.abs();
        let oy = (h0.y + h1.y) - d.y.abs();
        if !(ox > 0.0 && oy > 0.0) {
            return None;
        }

        let nx = if d.x >= 0.0 { -1.0 } else { 1.0 };
        let ny = if d.y >= 0.0 { -1.0 } else { 1.0 };
        let x = Contact { normal: Vec2::new(nx, 0.0), depth: ox };
        let y = Contact { normal: Vec2::new(0.0, ny), depth: oy };
        if ox <= oy { Some([x, y]) } else { Some([y, x]) }
    }

    /// Dispatch on shape kinds.
    pub fn overlap_shapes(a: Shape, b: Shape) -> Option<Contact> {
        match (a, b) {
            (Shape::Rect(ra), Shape::Rect(rb)) => Self::overlap_aabb_aabb(ra, rb),
            (Shape::Circle(ca), Shape::Circle(cb)) => Self::overlap_circle_circle(ca, cb),
            (Shape::Circle(ca), Shape::Rect(rb)) => Self::overlap_circle_aabb(ca, rb),
            (Shape::Rect(ra), Shape::Circle(cb)) => {
                let c = Self::overlap_circle_aabb(cb, ra)?;
                Some(Contact { normal: -c.normal, depth: c.depth })
            }
        }
    }

    /// Shape test against an arbitrary query box.
    pub fn shape_overlaps_rect(s: Shape, r: Rect) -> bool {
        match s {
            Shape::Rect(sr) => sr.intersects(&r),
            Shape::Circle(c) => Self::overlap_circle_aabb(c, r).is_some(),
        }
    }

    pub fn shape_contains_point(s: Shape, p: Vec2) -> bool {
        match s {
            Shape::Rect(r) => Self::overlap_point_aabb(p, r),
            Shape::Circle(c) => Self::overlap_point_circle(p, c),
        }
    }
}
