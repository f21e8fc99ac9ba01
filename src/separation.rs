//! Penetration resolution for collide queries.
//!
//! Contacts come from [`Narrowphase`] with the normal pointing from B into A. A is
//! pushed along `+normal`, B along `-normal`, in proportion to inverse mass.

use glam::Vec2;

use crate::api::Collider;
use crate::body::Body;
use crate::narrowphase::Narrowphase;
use crate::types::*;

/// Sides of A and B that face each other for a contact normal (B into A).
pub fn contact_sides(normal: Vec2) -> (Side, Side) {
    if normal.x.abs() >= normal.y.abs() {
        if normal.x < 0.0 { (Side::Right, Side::Left) } else { (Side::Left, Side::Right) }
    } else if normal.y < 0.0 {
        (Side::Down, Side::Up)
    } else {
        (Side::Up, Side::Down)
    }
}

fn sides_allowed(a: SideSet, b: SideSet, normal: Vec2) -> bool {
    let (sa, sb) = contact_sides(normal);
    a.contains(sa) && b.contains(sb)
}

/// Contact to separate along, honouring both colliders' `allow_collision` masks.
///
/// Box pairs try the shallow axis first and fall back to the other one; `None` means
/// the pair overlaps but no permitted side is involved.
pub fn collide_contact(a: &dyn Collider, b: &dyn Collider) -> Option<Contact> {
    let (allow_a, allow_b) = (a.allow_collision(), b.allow_collision());
    match (a.shape(), b.shape()) {
        (Shape::Rect(ra), Shape::Rect(rb)) => Narrowphase::aabb_axes(ra, rb)?
            .into_iter()
            .find(|c| sides_allowed(allow_a, allow_b, c.normal)),
        (sa, sb) => Narrowphase::overlap_shapes(sa, sb).filter(|c| sides_allowed(allow_a, allow_b, c.normal)),
    }
}

/// Per-axis bounce projected onto the contact normal.
fn bounce_along(bounce: Vec2, normal: Vec2) -> f32 {
    let w = normal.abs();
    let sum = w.x + w.y;
    if sum == 0.0 { 0.0 } else { (bounce.x * w.x + bounce.y * w.y) / sum }
}

/// Reflect the part of `v` heading against `normal`, scaled by `e`.
fn reflect_into(v: &mut Vec2, normal: Vec2, e: f32) {
    let vn = v.dot(normal);
    if vn >= 0.0 {
        return;
    }
    if normal.y == 0.0 {
        v.x = -v.x * e;
    } else if normal.x == 0.0 {
        v.y = -v.y * e;
    } else {
        *v -= normal * vn * (1.0 + e);
    }
}

/// Separate two registered bodies and update their velocities and `touching` flags.
pub fn resolve_bodies(a: &mut Body, b: &mut Body, contact: Contact, rule: RestitutionRule) {
    let (side_a, side_b) = contact_sides(contact.normal);
    a.touching.insert(side_a);
    b.touching.insert(side_b);

    let inv_a = a.inverse_mass();
    let inv_b = b.inverse_mass();
    let total = inv_a + inv_b;
    if total <= 0.0 {
        return;
    }

    let push = contact.normal * contact.depth;
    let e = rule.combine(bounce_along(a.bounce, contact.normal), bounce_along(b.bounce, contact.normal));
    if inv_a > 0.0 {
        a.position += push * (inv_a / total);
        reflect_into(&mut a.velocity, contact.normal, e);
    }
    if inv_b > 0.0 {
        b.position -= push * (inv_b / total);
        reflect_into(&mut b.velocity, -contact.normal, e);
    }
}

/// Push a body fully out of an immovable collider, marking the side as `blocked`.
pub fn resolve_static(a: &mut Body, wall: &dyn Collider, contact: Contact, rule: RestitutionRule) {
    let (side_a, _) = contact_sides(contact.normal);
    a.blocked.insert(side_a);
    if a.is_immovable() {
        return;
    }
    let e = rule.combine(bounce_along(a.bounce, contact.normal), bounce_along(wall.bounce(), contact.normal));
    a.position += contact.normal * contact.depth;
    reflect_into(&mut a.velocity, contact.normal, e);
}
