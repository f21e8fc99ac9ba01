use glam::Vec2;

use std::collections::HashSet;
use std::time::Instant;

use crate::api::{Collider, PhysicsWorldApi};
use crate::body::{Body, Integration};
use crate::error::PhysicsError;
use crate::narrowphase::Narrowphase;
use crate::quadtree::QuadTree;
use crate::separation;
use crate::tilemap::TileLayer;
use crate::types::*;

/// Arcade physics world: owns bodies and the per-tick quadtree.
///
/// Per tick: integrate every enabled body, then rebuild the tree from scratch.
/// Queries issued afterwards use the tree as broad phase and resolve candidates in
/// slot order, so results are reproducible for identical inputs.
pub struct PhysicsWorld {
    cfg: WorldConfig,
    tick_counter: u64,

    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,

    tree: QuadTree<BodyHandle>,
    // Set when bodies were added, removed, moved or disabled since the last rebuild.
    tree_dirty: bool,

    last_query: WorldStats,
    last_timing: Option<WorldTiming>,
}

struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// Narrow-phase behaviour of a pair query.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mode {
    Overlap,
    Collide,
}

impl PhysicsWorldApi for PhysicsWorld {
    fn new(cfg: WorldConfig) -> Result<Self, PhysicsError> {
        cfg.validate()?;
        log::debug!(
            "Creating physics world: bounds {:?}, gravity {}, quadtree {:?}",
            cfg.bounds,
            cfg.gravity,
            cfg.quadtree
        );
        Ok(Self {
            tree: QuadTree::new(cfg.bounds, cfg.quadtree),
            cfg,
            tick_counter: 0,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            tree_dirty: false,
            last_query: WorldStats::default(),
            last_timing: None,
        })
    }

    fn configure(&mut self, cfg: WorldConfig) -> Result<(), PhysicsError> {
        cfg.validate()?;
        log::debug!("Reconfiguring physics world: {:?}", cfg);
        if cfg.bounds != self.cfg.bounds || cfg.quadtree != self.cfg.quadtree {
            self.tree.reset(cfg.bounds, cfg.quadtree);
            self.tree_dirty = true;
        }
        self.cfg = cfg;
        Ok(())
    }

    fn register_body(&mut self, entity: EntityKey, mut body: Body) -> BodyHandle {
        body.entity = entity;
        self.live += 1;
        self.tree_dirty = true;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            return BodyHandle { index, generation: slot.generation };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, body: Some(body) });
        BodyHandle { index, generation: 0 }
    }

    fn unregister_body(&mut self, handle: BodyHandle) -> Result<Body, PhysicsError> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        let body = slot.body.take().ok_or(PhysicsError::UnknownBody(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        self.tree_dirty = true;
        Ok(body)
    }

    fn tick(&mut self, dt: f32) -> TickStats {
        if !dt.is_finite() || dt <= 0.0 {
            log::warn!("Ignoring physics tick with invalid dt {}", dt);
            return TickStats::default();
        }
        let t_all = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        self.tick_counter = self.tick_counter.wrapping_add(1);

        let gravity = self.cfg.gravity;
        let bounds = self.cfg.bounds;
        let mut stats = TickStats::default();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(body) = slot.body.as_mut() else { continue };
            body.begin_tick();
            match body.integrate(dt, gravity, &bounds) {
                Integration::Integrated => stats.integrated += 1,
                Integration::Skipped => {}
                Integration::Faulted => {
                    stats.faulted += 1;
                    log::warn!(
                        "Body {} (entity {}) has non-finite state; restored and frozen for tick {}",
                        index,
                        body.entity,
                        self.tick_counter
                    );
                }
            }
        }
        let integrate_ms = t_all.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0);

        let t_rebuild = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        self.rebuild_tree();
        stats.tree_entries = self.tree.len();
        let rebuild_ms = t_rebuild.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0);

        if let Some(t_all) = t_all {
            self.last_timing = Some(WorldTiming {
                tick_ms: t_all.elapsed().as_secs_f64() * 1000.0,
                tick_integrate_ms: integrate_ms,
                tick_rebuild_ms: rebuild_ms,
                ..Default::default()
            });
        }
        stats
    }

    fn rebuild_tree(&mut self) {
        self.tree.clear();
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(body) = slot.body.as_ref() else { continue };
            if !body.is_active() {
                continue;
            }
            let bounds = body.bounds();
            self.tree.insert(bounds, BodyHandle { index: index as u32, generation: slot.generation });
        }
        self.tree_dirty = false;
        log::trace!(
            "Rebuilt quadtree: {} bodies, {} nodes, depth {}",
            self.live,
            self.tree.node_count(),
            self.tree.depth()
        );
    }

    fn overlap(
        &mut self,
        set_a: &[BodyHandle],
        set_b: &[BodyHandle],
    ) -> Result<Vec<(BodyHandle, BodyHandle)>, PhysicsError> {
        self.pairs(set_a, set_b, Mode::Overlap, |_, _| true)
    }

    fn collide(
        &mut self,
        set_a: &[BodyHandle],
        set_b: &[BodyHandle],
    ) -> Result<Vec<(BodyHandle, BodyHandle)>, PhysicsError> {
        self.pairs(set_a, set_b, Mode::Collide, |_, _| true)
    }

    fn overlap_tiles(
        &mut self,
        set: &[BodyHandle],
        layer: &TileLayer,
    ) -> Result<Vec<(BodyHandle, TileCoord)>, PhysicsError> {
        self.tile_pairs(set, layer, Mode::Overlap)
    }

    fn collide_tiles(
        &mut self,
        set: &[BodyHandle],
        layer: &TileLayer,
    ) -> Result<Vec<(BodyHandle, TileCoord)>, PhysicsError> {
        self.tile_pairs(set, layer, Mode::Collide)
    }

    fn touching(&self, handle: BodyHandle) -> Result<SideSet, PhysicsError> {
        Ok(self.body(handle)?.touching())
    }

    fn was_touching(&self, handle: BodyHandle) -> Result<SideSet, PhysicsError> {
        Ok(self.body(handle)?.was_touching())
    }

    fn blocked(&self, handle: BodyHandle) -> Result<SideSet, PhysicsError> {
        Ok(self.body(handle)?.blocked())
    }
}

impl PhysicsWorld {
    pub fn config(&self) -> &WorldConfig {
        &self.cfg
    }

    pub fn set_gravity(&mut self, gravity: Vec2) -> Result<(), PhysicsError> {
        let mut cfg = self.cfg.clone();
        cfg.gravity = gravity;
        self.configure(cfg)
    }

    /// Number of completed ticks.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.body(handle).is_ok()
    }

    pub fn body(&self, handle: BodyHandle) -> Result<&Body, PhysicsError> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.body.as_ref())
            .ok_or(PhysicsError::UnknownBody(handle))
    }

    /// Mutable access; the broad phase is rebuilt before the next query.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut Body, PhysicsError> {
        let body = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.body.as_mut())
            .ok_or(PhysicsError::UnknownBody(handle))?;
        self.tree_dirty = true;
        Ok(body)
    }

    /// Write an entity's position back into its body (e.g., after a teleport).
    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2) -> Result<(), PhysicsError> {
        let body = self.body_mut(handle)?;
        body.position = position;
        body.prev_position = position;
        Ok(())
    }

    /// Live bodies in slot order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.body
                .as_ref()
                .map(|b| (BodyHandle { index: index as u32, generation: slot.generation }, b))
        })
    }

    /// Broad-phase index for the current tick (for debug drawing).
    pub fn tree(&self) -> &QuadTree<BodyHandle> {
        &self.tree
    }

    /// Like [`PhysicsWorldApi::overlap`]; `process` can reject a geometrically
    /// overlapping pair before it is reported.
    pub fn overlap_with<F>(
        &mut self,
        set_a: &[BodyHandle],
        set_b: &[BodyHandle],
        process: F,
    ) -> Result<Vec<(BodyHandle, BodyHandle)>, PhysicsError>
    where
        F: FnMut(&Body, &Body) -> bool,
    {
        self.pairs(set_a, set_b, Mode::Overlap, process)
    }

    /// Like [`PhysicsWorldApi::collide`]; `process` can veto separation of a pair.
    pub fn collide_with<F>(
        &mut self,
        set_a: &[BodyHandle],
        set_b: &[BodyHandle],
        process: F,
    ) -> Result<Vec<(BodyHandle, BodyHandle)>, PhysicsError>
    where
        F: FnMut(&Body, &Body) -> bool,
    {
        self.pairs(set_a, set_b, Mode::Collide, process)
    }

    // --- Spatial queries ---------------------------------------------------

    /// Bodies whose shape overlaps `rect`, in slot order.
    pub fn query_rect(&mut self, rect: Rect) -> Vec<BodyHandle> {
        self.query(rect, |s| Narrowphase::shape_overlaps_rect(s, rect))
    }

    /// Bodies whose shape contains `p`, in slot order.
    pub fn query_point(&mut self, p: Vec2) -> Vec<BodyHandle> {
        self.query(Rect { pos: p, size: Vec2::ZERO }, |s| Narrowphase::shape_contains_point(s, p))
    }

    /// Bodies whose shape overlaps `circle`, in slot order.
    pub fn query_circle(&mut self, circle: Circle) -> Vec<BodyHandle> {
        self.query(circle.bounds(), |s| Narrowphase::overlap_shapes(s, Shape::Circle(circle)).is_some())
    }

    /// Debug/perf stats for the current tree and the last pair query.
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            bodies: self.live,
            tree_nodes: self.tree.node_count(),
            tree_entries: self.tree.len(),
            tree_depth: self.tree.depth(),
            ..self.last_query
        }
    }

    /// Timing breakdown for the last tick/query, if `enable_timing` is set.
    pub fn timing(&self) -> Option<WorldTiming> {
        self.last_timing
    }

    // --- Internals ---------------------------------------------------------

    fn validate_handles(&self, set: &[BodyHandle]) -> Result<(), PhysicsError> {
        set.iter().try_for_each(|h| self.body(*h).map(|_| ()))
    }

    fn ensure_tree(&mut self) {
        if self.tree_dirty {
            self.rebuild_tree();
        }
    }

    /// Body that may take part in queries this tick.
    fn active(&self, handle: BodyHandle) -> Option<&Body> {
        self.body(handle).ok().filter(|b| b.is_active())
    }

    fn query<F>(&mut self, area: Rect, mut hit: F) -> Vec<BodyHandle>
    where
        F: FnMut(Shape) -> bool,
    {
        self.ensure_tree();
        let mut out = self.tree.retrieve(&area);
        out.sort_unstable();
        out.dedup();
        out.retain(|h| self.active(*h).is_some_and(|b| hit(b.shape())));
        out
    }

    fn pairs<F>(
        &mut self,
        set_a: &[BodyHandle],
        set_b: &[BodyHandle],
        mode: Mode,
        mut process: F,
    ) -> Result<Vec<(BodyHandle, BodyHandle)>, PhysicsError>
    where
        F: FnMut(&Body, &Body) -> bool,
    {
        // Reject misuse before touching anything.
        self.validate_handles(set_a)?;
        self.validate_handles(set_b)?;
        self.ensure_tree();

        let t_all = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
        let mut narrow_ms = 0.0;
        let rule = self.cfg.restitution;
        let members_b: HashSet<u32> = set_b.iter().map(|h| h.index).collect();
        let mut seen_pairs: HashSet<(u32, u32)> = HashSet::new();
        let mut candidates: Vec<BodyHandle> = Vec::new();
        let mut out = Vec::new();
        let mut stats = WorldStats::default();

        for &ha in set_a {
            let Some(area) = self.active(ha).map(|b| b.bounds()) else { continue };
            candidates.clear();
            self.tree.retrieve_into(&area, &mut candidates);
            stats.candidate_pairs += candidates.len();
            candidates.retain(|hb| hb.index != ha.index && members_b.contains(&hb.index));
            candidates.sort_unstable();
            candidates.dedup();

            for &hb in &candidates {
                let key = if ha.index < hb.index { (ha.index, hb.index) } else { (hb.index, ha.index) };
                if !seen_pairs.insert(key) {
                    continue;
                }
                stats.unique_pairs += 1;

                let t_np = if self.cfg.enable_timing { Some(Instant::now()) } else { None };
                let Some((a, b)) = pair_mut(&mut self.slots, ha.index, hb.index) else { continue };
                if !b.is_active() {
                    continue;
                }
                let hit = match mode {
                    Mode::Overlap => {
                        Narrowphase::overlap_shapes(a.shape(), b.shape()).is_some() && process(&*a, &*b)
                    }
                    Mode::Collide => match separation::collide_contact(&*a, &*b) {
                        Some(contact) if process(&*a, &*b) => {
                            separation::resolve_bodies(a, b, contact, rule);
                            true
                        }
                        _ => false,
                    },
                };
                if let Some(t_np) = t_np {
                    narrow_ms += t_np.elapsed().as_secs_f64() * 1000.0;
                }
                if hit {
                    out.push((ha, hb));
                }
            }
        }

        if mode == Mode::Collide && !out.is_empty() {
            self.tree_dirty = true;
        }
        stats.reported_pairs = out.len();
        self.last_query = stats;
        if let Some(t_all) = t_all {
            let timing = self.last_timing.get_or_insert_with(WorldTiming::default);
            timing.query_ms = t_all.elapsed().as_secs_f64() * 1000.0;
            timing.query_narrowphase_ms = narrow_ms;
        }
        Ok(out)
    }

    fn tile_pairs(
        &mut self,
        set: &[BodyHandle],
        layer: &TileLayer,
        mode: Mode,
    ) -> Result<Vec<(BodyHandle, TileCoord)>, PhysicsError> {
        self.validate_handles(set)?;
        let rule = self.cfg.restitution;
        let mut out = Vec::new();

        for &h in set {
            let Some(body) = self.slots[h.index as usize].body.as_mut() else { continue };
            if !body.is_active() {
                continue;
            }
            for coord in layer.tiles_in_rect(&body.bounds()) {
                let Some(tile) = layer.static_body(coord) else { continue };
                let hit = match mode {
                    Mode::Overlap => Narrowphase::overlap_shapes(body.shape(), tile.shape()).is_some(),
                    // Re-tested per tile: earlier tiles may already have pushed the body clear.
                    Mode::Collide => match separation::collide_contact(&*body, &tile) {
                        Some(contact) => {
                            separation::resolve_static(body, &tile, contact, rule);
                            true
                        }
                        None => false,
                    },
                };
                if hit {
                    out.push((h, coord));
                }
            }
        }

        if mode == Mode::Collide && !out.is_empty() {
            self.tree_dirty = true;
        }
        Ok(out)
    }
}

/// Two distinct live bodies borrowed mutably at once.
fn pair_mut(slots: &mut [Slot], i: u32, j: u32) -> Option<(&mut Body, &mut Body)> {
    let (i, j) = (i as usize, j as usize);
    if i == j || i.max(j) >= slots.len() {
        return None;
    }
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    let (left, right) = slots.split_at_mut(hi);
    let first = left[lo].body.as_mut()?;
    let second = right[0].body.as_mut()?;
    Some(if i < j { (first, second) } else { (second, first) })
}
