//! Per-entity kinematic state and the per-tick integration step.
//!
//! Integration order per tick: effective acceleration (own + scaled gravity) →
//! velocity → drag → max-velocity clamp → position → world-bounds clamp.

use glam::Vec2;

use crate::api::Collider;
use crate::types::*;

/// Default speed cap on each axis.
pub const DEFAULT_MAX_VELOCITY: f32 = 10_000.0;

/// Collision footprint of a body within its AABB.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum BodyShape {
    /// The AABB itself.
    #[default]
    Rect,
    /// Circle centred in the AABB.
    Circle { radius: f32 },
}

/// Outcome of integrating one body for one tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Integration {
    Integrated,
    /// Disabled or `moves == false`; state untouched.
    Skipped,
    /// Non-finite state; restored to the last known-good values.
    Faulted,
}

#[derive(Copy, Clone, Debug, Default)]
struct Snapshot {
    position: Vec2,
    velocity: Vec2,
    acceleration: Vec2,
}

impl Snapshot {
    fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.acceleration.is_finite()
    }
}

/// Arcade physics body. Attached to an entity by key; never owns it.
#[derive(Clone, Debug)]
pub struct Body {
    pub(crate) entity: EntityKey,

    /// Top-left corner.
    pub position: Vec2,
    pub size: Vec2,
    pub shape: BodyShape,

    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Deceleration applied on an axis with no acceleration.
    pub drag: Vec2,
    pub gravity_scale: Vec2,
    /// Restitution per axis; not clamped.
    pub bounce: Vec2,
    pub max_velocity: Vec2,
    /// Separation bias between two movable bodies; heavier bodies move less.
    pub mass: f32,

    pub immovable: bool,
    /// If false the body is not integrated but still collides.
    pub moves: bool,
    pub allow_gravity: bool,
    pub collide_world_bounds: bool,
    pub enabled: bool,
    pub allow_collision: SideSet,

    pub(crate) touching: SideSet,
    pub(crate) was_touching: SideSet,
    pub(crate) blocked: SideSet,
    pub(crate) faulted: bool,
    pub(crate) prev_position: Vec2,
    last_good: Snapshot,
}

impl Body {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        let position = Vec2::new(x, y);
        Self {
            entity: 0,
            position,
            size: Vec2::new(width, height),
            shape: BodyShape::Rect,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            drag: Vec2::ZERO,
            gravity_scale: Vec2::ONE,
            bounce: Vec2::ZERO,
            max_velocity: Vec2::splat(DEFAULT_MAX_VELOCITY),
            mass: 1.0,
            immovable: false,
            moves: true,
            allow_gravity: true,
            collide_world_bounds: false,
            enabled: true,
            allow_collision: SideSet::ALL,
            touching: SideSet::NONE,
            was_touching: SideSet::NONE,
            blocked: SideSet::NONE,
            faulted: false,
            prev_position: position,
            last_good: Snapshot { position, velocity: Vec2::ZERO, acceleration: Vec2::ZERO },
        }
    }

    /// Circle of `radius` whose bounding box has its top-left at `(x, y)`.
    pub fn circle(x: f32, y: f32, radius: f32) -> Self {
        let mut body = Self::new(x, y, radius * 2.0, radius * 2.0);
        body.shape = BodyShape::Circle { radius };
        body
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self.last_good.velocity = velocity;
        self
    }

    pub fn with_acceleration(mut self, acceleration: Vec2) -> Self {
        self.acceleration = acceleration;
        self.last_good.acceleration = acceleration;
        self
    }

    pub fn with_drag(mut self, drag: Vec2) -> Self {
        self.drag = drag;
        self
    }

    pub fn with_bounce(mut self, bounce: Vec2) -> Self {
        self.bounce = bounce;
        self
    }

    pub fn with_gravity_scale(mut self, scale: Vec2) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_max_velocity(mut self, max: Vec2) -> Self {
        self.max_velocity = max;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_allow_collision(mut self, sides: SideSet) -> Self {
        self.allow_collision = sides;
        self
    }

    pub fn immovable(mut self) -> Self {
        self.immovable = true;
        self
    }

    pub fn without_gravity(mut self) -> Self {
        self.allow_gravity = false;
        self
    }

    pub fn collide_world_bounds(mut self) -> Self {
        self.collide_world_bounds = true;
        self
    }

    pub fn entity(&self) -> EntityKey {
        self.entity
    }

    pub fn aabb(&self) -> Rect {
        Rect { pos: self.position, size: self.size }
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    /// Movement over the last tick, including any separation applied since.
    pub fn delta(&self) -> Vec2 {
        self.position - self.prev_position
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn touching(&self) -> SideSet {
        self.touching
    }

    pub fn was_touching(&self) -> SideSet {
        self.was_touching
    }

    pub fn blocked(&self) -> SideSet {
        self.blocked
    }

    /// Resting on something: another body, a tile, or the world floor.
    pub fn on_floor(&self) -> bool {
        self.blocked.contains(Side::Down) || self.touching.contains(Side::Down)
    }

    pub fn on_ceiling(&self) -> bool {
        self.blocked.contains(Side::Up) || self.touching.contains(Side::Up)
    }

    pub fn on_wall(&self) -> bool {
        let s = self.blocked.union(self.touching);
        s.contains(Side::Left) || s.contains(Side::Right)
    }

    /// Frozen this tick because its state went non-finite.
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Teleport to `position` and stop all motion.
    pub fn reset(&mut self, position: Vec2) {
        self.position = position;
        self.prev_position = position;
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
        self.touching = SideSet::NONE;
        self.was_touching = SideSet::NONE;
        self.blocked = SideSet::NONE;
        self.faulted = false;
        self.snapshot();
    }

    /// Acceleration actually applied this tick.
    pub fn effective_acceleration(&self, gravity: Vec2) -> Vec2 {
        if self.allow_gravity {
            self.acceleration + gravity * self.gravity_scale
        } else {
            self.acceleration
        }
    }

    pub(crate) fn begin_tick(&mut self) {
        self.was_touching = self.touching;
        self.touching = SideSet::NONE;
        self.blocked = SideSet::NONE;
        self.faulted = false;
        self.prev_position = self.position;
    }

    /// Advance one step. `dt` must already be finite and positive.
    pub(crate) fn integrate(&mut self, dt: f32, gravity: Vec2, bounds: &Rect) -> Integration {
        if !self.enabled {
            return Integration::Skipped;
        }
        if !self.state_is_finite() {
            self.recover();
            return Integration::Faulted;
        }
        if !self.moves {
            self.snapshot();
            return Integration::Skipped;
        }

        let accel = self.effective_acceleration(gravity);
        let mut velocity = self.velocity + accel * dt;
        velocity.x = apply_drag(velocity.x, accel.x, self.drag.x, dt);
        velocity.y = apply_drag(velocity.y, accel.y, self.drag.y, dt);
        let max = self.max_velocity.abs();
        velocity.x = velocity.x.max(-max.x).min(max.x);
        velocity.y = velocity.y.max(-max.y).min(max.y);
        let position = self.position + velocity * dt;

        if !velocity.is_finite() || !position.is_finite() {
            self.recover();
            return Integration::Faulted;
        }
        self.velocity = velocity;
        self.position = position;

        if self.collide_world_bounds {
            self.clamp_to_bounds(bounds);
        }
        self.snapshot();
        Integration::Integrated
    }

    /// Keep the AABB inside `bounds`, reflecting outward velocity by `bounce`.
    pub(crate) fn clamp_to_bounds(&mut self, bounds: &Rect) {
        let min = bounds.min();
        let max = bounds.max() - self.size;

        if self.position.x > max.x {
            self.position.x = max.x;
            if self.velocity.x > 0.0 {
                self.velocity.x = -self.velocity.x * self.bounce.x;
            }
            self.blocked.insert(Side::Right);
        }
        if self.position.x < min.x {
            self.position.x = min.x;
            if self.velocity.x < 0.0 {
                self.velocity.x = -self.velocity.x * self.bounce.x;
            }
            self.blocked.insert(Side::Left);
        }
        if self.position.y > max.y {
            self.position.y = max.y;
            if self.velocity.y > 0.0 {
                self.velocity.y = -self.velocity.y * self.bounce.y;
            }
            self.blocked.insert(Side::Down);
        }
        if self.position.y < min.y {
            self.position.y = min.y;
            if self.velocity.y < 0.0 {
                self.velocity.y = -self.velocity.y * self.bounce.y;
            }
            self.blocked.insert(Side::Up);
        }
    }

    pub(crate) fn state_is_finite(&self) -> bool {
        let radius_ok = match self.shape {
            BodyShape::Rect => true,
            BodyShape::Circle { radius } => radius.is_finite(),
        };
        self.position.is_finite()
            && self.size.is_finite()
            && self.velocity.is_finite()
            && self.acceleration.is_finite()
            && self.bounce.is_finite()
            && radius_ok
    }

    /// May take part in queries: enabled, not frozen, and finite right now. State can
    /// be edited between ticks, so the fault flag alone is not enough.
    pub(crate) fn is_active(&self) -> bool {
        self.enabled && !self.faulted && self.state_is_finite()
    }

    fn snapshot(&mut self) {
        let snap = Snapshot { position: self.position, velocity: self.velocity, acceleration: self.acceleration };
        if snap.is_finite() {
            self.last_good = snap;
        }
    }

    fn recover(&mut self) {
        let good = if self.last_good.is_finite() { self.last_good } else { Snapshot::default() };
        self.position = good.position;
        self.velocity = good.velocity;
        self.acceleration = good.acceleration;
        if !self.size.is_finite() {
            self.size = Vec2::ZERO;
        }
        if !self.bounce.is_finite() {
            self.bounce = Vec2::ZERO;
        }
        if let BodyShape::Circle { radius } = self.shape {
            if !radius.is_finite() {
                self.shape = BodyShape::Circle { radius: self.size.min_element() * 0.5 };
            }
        }
        self.prev_position = self.position;
        self.faulted = true;
    }
}

/// Slow `v` toward zero by `drag * dt` when `accel` is zero. Never crosses zero.
fn apply_drag(v: f32, accel: f32, drag: f32, dt: f32) -> f32 {
    if accel != 0.0 || drag == 0.0 {
        return v;
    }
    let d = drag.abs() * dt;
    if v - d > 0.0 {
        v - d
    } else if v + d < 0.0 {
        v + d
    } else {
        0.0
    }
}

impl Collider for Body {
    fn shape(&self) -> Shape {
        match self.shape {
            BodyShape::Rect => Shape::Rect(self.aabb()),
            BodyShape::Circle { radius } => Shape::Circle(Circle::new(self.center(), radius)),
        }
    }

    fn bounce(&self) -> Vec2 {
        self.bounce
    }

    fn allow_collision(&self) -> SideSet {
        self.allow_collision
    }

    fn is_immovable(&self) -> bool {
        self.immovable
    }

    /// Non-positive or non-finite mass falls back to unit mass.
    fn inverse_mass(&self) -> f32 {
        if self.immovable {
            0.0
        } else if self.mass > 0.0 && self.mass.is_finite() {
            1.0 / self.mass
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::new(0.0, 0.0, 100.0, 100.0)
    }

    #[test]
    fn test_gravity_accumulates_velocity() {
        let mut b = Body::new(0.0, 0.0, 1.0, 1.0).with_gravity_scale(Vec2::new(0.0, 1.0));
        for _ in 0..10 {
            b.begin_tick();
            assert_eq!(b.integrate(0.1, Vec2::new(0.0, 10.0), &bounds()), Integration::Integrated);
        }
        assert!((b.velocity.y - 10.0).abs() < 1e-4);
        assert_eq!(b.velocity.x, 0.0);
        // Stored acceleration is not polluted by gravity.
        assert_eq!(b.acceleration, Vec2::ZERO);
    }

    #[test]
    fn test_gravity_opt_out() {
        let mut b = Body::new(0.0, 0.0, 1.0, 1.0).without_gravity();
        b.integrate(1.0, Vec2::new(0.0, 10.0), &bounds());
        assert_eq!(b.velocity, Vec2::ZERO);
        assert_eq!(b.position, Vec2::ZERO);
    }

    #[test]
    fn test_drag_converges_without_overshoot() {
        let mut b = Body::new(0.0, 0.0, 1.0, 1.0)
            .with_velocity(Vec2::new(7.0, -3.0))
            .with_drag(Vec2::new(2.0, 2.0));
        let mut last = b.velocity;
        for _ in 0..20 {
            b.integrate(0.3, Vec2::ZERO, &bounds());
            assert!(b.velocity.x >= 0.0 && b.velocity.x <= last.x);
            assert!(b.velocity.y <= 0.0 && b.velocity.y >= last.y);
            last = b.velocity;
        }
        assert_eq!(b.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_drag_ignored_while_accelerating() {
        let mut b = Body::new(0.0, 0.0, 1.0, 1.0)
            .with_acceleration(Vec2::new(1.0, 0.0))
            .with_drag(Vec2::new(100.0, 0.0));
        b.integrate(1.0, Vec2::ZERO, &bounds());
        assert_eq!(b.velocity.x, 1.0);
    }

    #[test]
    fn test_max_velocity_clamp() {
        let mut b = Body::new(0.0, 0.0, 1.0, 1.0)
            .with_velocity(Vec2::new(50.0, -50.0))
            .with_max_velocity(Vec2::new(10.0, 20.0));
        b.integrate(0.1, Vec2::ZERO, &bounds());
        assert_eq!(b.velocity, Vec2::new(10.0, -20.0));
        assert_eq!(b.position, Vec2::new(1.0, -2.0));
    }

    #[test]
    fn test_bounds_clamp_reflects_with_bounce() {
        let mut b = Body::new(95.0, 50.0, 10.0, 10.0)
            .with_velocity(Vec2::new(20.0, 0.0))
            .with_bounce(Vec2::new(0.5, 0.0))
            .collide_world_bounds();
        b.integrate(0.5, Vec2::ZERO, &bounds());
        assert_eq!(b.position.x, 90.0);
        assert_eq!(b.velocity.x, -10.0);
        assert!(b.blocked().contains(Side::Right));
    }

    #[test]
    fn test_bounds_clamp_zero_bounce_stops() {
        let mut b = Body::new(0.0, 90.0, 10.0, 10.0)
            .with_velocity(Vec2::new(0.0, 40.0))
            .collide_world_bounds();
        for _ in 0..5 {
            b.begin_tick();
            b.integrate(0.25, Vec2::new(0.0, 50.0), &bounds());
            assert!(bounds().contains_rect(&b.aabb()));
            assert_eq!(b.velocity.y, 0.0);
            assert!(b.on_floor());
        }
    }

    #[test]
    fn test_non_finite_state_is_restored() {
        let mut b = Body::new(5.0, 5.0, 1.0, 1.0).with_velocity(Vec2::new(1.0, 0.0));
        b.integrate(1.0, Vec2::ZERO, &bounds());
        assert_eq!(b.position, Vec2::new(6.0, 5.0));

        b.velocity.x = f32::NAN;
        b.begin_tick();
        assert_eq!(b.integrate(1.0, Vec2::ZERO, &bounds()), Integration::Faulted);
        assert!(b.is_faulted());
        assert_eq!(b.position, Vec2::new(6.0, 5.0));
        assert_eq!(b.velocity, Vec2::new(1.0, 0.0));

        b.begin_tick();
        assert_eq!(b.integrate(1.0, Vec2::ZERO, &bounds()), Integration::Integrated);
        assert!(!b.is_faulted());
        assert_eq!(b.position, Vec2::new(7.0, 5.0));
    }

    #[test]
    fn test_non_finite_bounce_faults_and_resets() {
        let mut b = Body::new(5.0, 5.0, 2.0, 2.0).with_bounce(Vec2::new(f32::NAN, 0.5));
        assert!(!b.is_active());
        assert_eq!(b.integrate(1.0, Vec2::ZERO, &bounds()), Integration::Faulted);
        assert_eq!(b.bounce, Vec2::ZERO);
        b.begin_tick();
        assert!(b.is_active());
    }

    #[test]
    fn test_overflow_during_integration_faults() {
        let mut b = Body::new(f32::MAX, 0.0, 1.0, 1.0)
            .with_velocity(Vec2::new(f32::MAX, 0.0))
            .with_max_velocity(Vec2::splat(f32::MAX));
        assert_eq!(b.integrate(10.0, Vec2::ZERO, &bounds()), Integration::Faulted);
        assert_eq!(b.position, Vec2::new(f32::MAX, 0.0));
    }

    #[test]
    fn test_static_body_is_not_integrated() {
        let mut b = Body::new(0.0, 0.0, 1.0, 1.0).with_velocity(Vec2::new(3.0, 0.0));
        b.moves = false;
        assert_eq!(b.integrate(1.0, Vec2::new(0.0, 10.0), &bounds()), Integration::Skipped);
        assert_eq!(b.position, Vec2::ZERO);
    }

    #[test]
    fn test_integration_is_bit_reproducible() {
        let run = || {
            let mut b = Body::new(1.5, 2.25, 3.0, 3.0)
                .with_velocity(Vec2::new(13.7, -4.1))
                .with_drag(Vec2::new(0.7, 0.0))
                .with_bounce(Vec2::splat(0.8))
                .collide_world_bounds();
            for _ in 0..600 {
                b.begin_tick();
                b.integrate(1.0 / 60.0, Vec2::new(0.0, 9.81), &bounds());
            }
            (b.position.x.to_bits(), b.position.y.to_bits(), b.velocity.x.to_bits(), b.velocity.y.to_bits())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_inverse_mass() {
        assert_eq!(Body::new(0.0, 0.0, 1.0, 1.0).inverse_mass(), 1.0);
        assert_eq!(Body::new(0.0, 0.0, 1.0, 1.0).with_mass(4.0).inverse_mass(), 0.25);
        assert_eq!(Body::new(0.0, 0.0, 1.0, 1.0).with_mass(0.0).inverse_mass(), 1.0);
        assert_eq!(Body::new(0.0, 0.0, 1.0, 1.0).immovable().inverse_mass(), 0.0);
    }

    #[test]
    fn test_circle_shape_centered() {
        let b = Body::circle(10.0, 20.0, 5.0);
        match b.shape() {
            Shape::Circle(c) => {
                assert_eq!(c.center, Vec2::new(15.0, 25.0));
                assert_eq!(c.radius, 5.0);
            }
            other => panic!("expected circle, got {:?}", other),
        }
        assert_eq!(b.aabb(), Rect::new(10.0, 20.0, 10.0, 10.0));
    }
}
