use glam::Vec2;

use crate::body::Body;
use crate::error::PhysicsError;
use crate::tilemap::TileLayer;
use crate::types::*;

/// Public API contract for the arcade physics world.
pub trait PhysicsWorldApi {
    /// Construct a new world, rejecting invalid configuration.
    fn new(cfg: WorldConfig) -> Result<Self, PhysicsError>
    where
        Self: Sized;

    /// Replace the configuration. On error the world is left untouched.
    fn configure(&mut self, cfg: WorldConfig) -> Result<(), PhysicsError>;

    // --- Body lifecycle ----------------------------------------------------

    /// Register a body owned by `entity` and return its handle.
    fn register_body(&mut self, entity: EntityKey, body: Body) -> BodyHandle;

    /// Remove a body, handing it back to the caller.
    fn unregister_body(&mut self, handle: BodyHandle) -> Result<Body, PhysicsError>;

    // --- Simulation --------------------------------------------------------

    /// Integrate every enabled body and rebuild the broad phase.
    fn tick(&mut self, dt: f32) -> TickStats;

    /// Clear the quadtree and reinsert every live body.
    fn rebuild_tree(&mut self);

    // --- Queries -----------------------------------------------------------

    /// Pairs from `set_a` × `set_b` whose shapes overlap. No mutation.
    fn overlap(
        &mut self,
        set_a: &[BodyHandle],
        set_b: &[BodyHandle],
    ) -> Result<Vec<(BodyHandle, BodyHandle)>, PhysicsError>;

    /// Pairs from `set_a` × `set_b` that overlapped and were separated.
    fn collide(
        &mut self,
        set_a: &[BodyHandle],
        set_b: &[BodyHandle],
    ) -> Result<Vec<(BodyHandle, BodyHandle)>, PhysicsError>;

    /// Bodies in `set` overlapping solid tiles of `layer`. No mutation.
    fn overlap_tiles(
        &mut self,
        set: &[BodyHandle],
        layer: &TileLayer,
    ) -> Result<Vec<(BodyHandle, TileCoord)>, PhysicsError>;

    /// Bodies in `set` separated from solid tiles of `layer`.
    fn collide_tiles(
        &mut self,
        set: &[BodyHandle],
        layer: &TileLayer,
    ) -> Result<Vec<(BodyHandle, TileCoord)>, PhysicsError>;

    // --- Per-body flags ----------------------------------------------------

    fn touching(&self, handle: BodyHandle) -> Result<SideSet, PhysicsError>;
    fn was_touching(&self, handle: BodyHandle) -> Result<SideSet, PhysicsError>;
    fn blocked(&self, handle: BodyHandle) -> Result<SideSet, PhysicsError>;
}

/// Narrowphase primitive tests.
pub trait NarrowphaseApi {
    fn overlap_aabb_aabb(a: Rect, b: Rect) -> Option<Contact>;
    fn overlap_circle_circle(a: Circle, b: Circle) -> Option<Contact>;
    /// Normal points from the box into the circle.
    fn overlap_circle_aabb(c: Circle, b: Rect) -> Option<Contact>;
    fn overlap_point_aabb(p: Vec2, b: Rect) -> bool;
    fn overlap_point_circle(p: Vec2, c: Circle) -> bool;
}

/// Anything the separation step can push against: dynamic bodies and static tiles.
pub trait Collider {
    fn shape(&self) -> Shape;
    fn bounce(&self) -> Vec2;
    fn allow_collision(&self) -> SideSet;
    fn is_immovable(&self) -> bool;
    /// Share weight for separation; 0 means never displaced.
    fn inverse_mass(&self) -> f32;

    fn bounds(&self) -> Rect {
        self.shape().bounds()
    }
}
