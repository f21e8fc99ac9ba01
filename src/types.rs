use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;

/// Opaque back-reference to the entity that owns a body (e.g., pack your scene-graph id).
pub type EntityKey = u64;

/// Axis-aligned rectangle, top-left anchored. Covers `[x, x+w) × [y, y+h)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { pos: Vec2::new(x, y), size: Vec2::new(w, h) }
    }

    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { pos: min, size: max - min }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.pos + self.size
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        self.size * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.size.is_finite()
    }

    /// Exact overlap of two half-open boxes. Shared edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Closed-interval overlap; degenerate and edge-touching boxes count.
    /// Used by the broad phase, where a false positive is cheap and a false negative is not.
    pub fn intersects_inclusive(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && self.right() >= other.left()
            && self.top() <= other.bottom()
            && self.bottom() >= other.top()
    }

    /// True if `other` lies entirely within `self`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    /// The four quadrants in NW, NE, SW, SE order. Outer edges match the parent exactly.
    pub fn quadrants(&self) -> [Rect; 4] {
        let (min, max) = (self.min(), self.max());
        let mid = self.center();
        [
            Rect::from_min_max(min, mid),
            Rect::from_min_max(Vec2::new(mid.x, min.y), Vec2::new(max.x, mid.y)),
            Rect::from_min_max(Vec2::new(min.x, mid.y), Vec2::new(mid.x, max.y)),
            Rect::from_min_max(mid, max),
        ]
    }
}

/// Circle given by centre and radius.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub const fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn bounds(&self) -> Rect {
        let r = Vec2::splat(self.radius);
        Rect::from_min_max(self.center - r, self.center + r)
    }
}

/// Collision shape handed to the narrow phase.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    Rect(Rect),
    Circle(Circle),
}

impl Shape {
    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Rect(r) => *r,
            Shape::Circle(c) => c.bounds(),
        }
    }
}

/// One face of an axis-aligned box. Y grows downward, so `Down` is the floor side.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Up,
    Down,
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Up, Side::Down, Side::Left, Side::Right];

    const fn bit(self) -> u8 {
        match self {
            Side::Up => 1,
            Side::Down => 2,
            Side::Left => 4,
            Side::Right => 8,
        }
    }

    pub const fn opposite(self) -> Side {
        match self {
            Side::Up => Side::Down,
            Side::Down => Side::Up,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Fixed-size set over [`Side`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideSet(u8);

impl SideSet {
    pub const NONE: SideSet = SideSet(0);
    pub const ALL: SideSet = SideSet(0b1111);

    pub const fn only(side: Side) -> Self {
        SideSet(side.bit())
    }

    #[inline]
    pub fn contains(self, side: Side) -> bool {
        self.0 & side.bit() != 0
    }

    #[inline]
    pub fn insert(&mut self, side: Side) {
        self.0 |= side.bit();
    }

    #[inline]
    pub fn remove(&mut self, side: Side) {
        self.0 &= !side.bit();
    }

    pub fn with(mut self, side: Side) -> Self {
        self.insert(side);
        self
    }

    pub fn without(mut self, side: Side) -> Self {
        self.remove(side);
        self
    }

    pub fn union(self, other: SideSet) -> Self {
        SideSet(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Side> {
        Side::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl FromIterator<Side> for SideSet {
    fn from_iter<I: IntoIterator<Item = Side>>(iter: I) -> Self {
        let mut set = SideSet::NONE;
        for side in iter {
            set.insert(side);
        }
        set
    }
}

/// Generational handle to a body registered with a [`crate::PhysicsWorld`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyHandle {
    pub index: u32,
    pub generation: u32,
}

/// Column/row address of a tile in a [`crate::TileLayer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileCoord {
    pub col: u32,
    pub row: u32,
}

/// Narrow-phase contact between A and B.
#[derive(Copy, Clone, Debug)]
pub struct Contact {
    /// Separating direction, unit length, pointing from B into A.
    pub normal: Vec2,
    /// Penetration depth (> 0 for a real overlap).
    pub depth: f32,
}

/// What the broad phase does with objects that span more than one child quadrant.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StraddlePolicy {
    /// Insert into every overlapping child. Consumers de-duplicate.
    #[default]
    Duplicate,
    /// Keep the object at the parent node.
    KeepAtParent,
}

/// How the bounce of two bodies combines into one restitution coefficient.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestitutionRule {
    #[default]
    Average,
    Product,
}

impl RestitutionRule {
    pub fn combine(self, a: f32, b: f32) -> f32 {
        match self {
            RestitutionRule::Average => (a + b) * 0.5,
            RestitutionRule::Product => a * b,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadTreeConfig {
    /// Objects a leaf holds before it splits.
    pub max_objects: usize,
    /// Deepest level a node may split to (root is depth 0).
    pub max_depth: u32,
    pub straddle: StraddlePolicy,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self { max_objects: 10, max_depth: 4, straddle: StraddlePolicy::Duplicate }
    }
}

/// World-level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World boundary, also the quadtree root bounds.
    pub bounds: Rect,
    /// Added to every body's acceleration, scaled by its `gravity_scale`.
    pub gravity: Vec2,
    pub quadtree: QuadTreeConfig,
    pub restitution: RestitutionRule,
    /// Enable internal timing instrumentation (adds small overhead when true).
    pub enable_timing: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bounds: Rect::new(0.0, 0.0, 800.0, 600.0),
            gravity: Vec2::ZERO,
            quadtree: QuadTreeConfig::default(),
            restitution: RestitutionRule::Average,
            enable_timing: false,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let b = &self.bounds;
        if !b.is_finite() {
            return Err(PhysicsError::InvalidConfiguration(format!("world bounds are not finite: {:?}", b)));
        }
        if b.size.x <= 0.0 || b.size.y <= 0.0 {
            return Err(PhysicsError::InvalidConfiguration(format!(
                "world bounds must have positive size, got {}x{}",
                b.size.x, b.size.y
            )));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfiguration(format!("gravity is not finite: {}", self.gravity)));
        }
        if self.quadtree.max_objects == 0 {
            return Err(PhysicsError::InvalidConfiguration("quadtree max_objects must be at least 1".into()));
        }
        Ok(())
    }
}

/// Result of one [`crate::PhysicsWorld::tick`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Bodies that went through integration.
    pub integrated: usize,
    /// Bodies frozen this tick because of non-finite state.
    pub faulted: usize,
    /// Entries in the rebuilt tree, duplicates included.
    pub tree_entries: usize,
}

/// Debug/performance counters for the current tree and the last query.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldStats {
    pub bodies: usize,
    pub tree_nodes: usize,
    pub tree_entries: usize,
    pub tree_depth: u32,
    /// Candidates returned by the broad phase in the last query, duplicates included.
    pub candidate_pairs: usize,
    /// Distinct pairs that reached the narrow phase in the last query.
    pub unique_pairs: usize,
    /// Pairs reported by the last query.
    pub reported_pairs: usize,
}

/// Timing breakdown for the last completed operations.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldTiming {
    pub tick_ms: f64,
    pub tick_integrate_ms: f64,
    pub tick_rebuild_ms: f64,

    pub query_ms: f64,
    pub query_narrowphase_ms: f64,
}
