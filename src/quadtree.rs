//! Rebuildable quadtree over axis-aligned boxes.
//!
//! The tree is a broad phase: `retrieve` returns every payload stored in a node whose
//! bounds touch the query, so results may contain false positives and, under
//! [`StraddlePolicy::Duplicate`], the same payload more than once. It never misses a
//! payload whose box truly intersects the query.
//!
//! No incremental update: callers `clear` and reinsert everything each tick.

use crate::types::{QuadTreeConfig, Rect, StraddlePolicy};

pub struct QuadTree<T> {
    root: Node<T>,
    cfg: QuadTreeConfig,
}

struct Node<T> {
    bounds: Rect,
    depth: u32,
    objects: Vec<(Rect, T)>,
    // NW, NE, SW, SE
    children: Option<Box<[Node<T>; 4]>>,
}

impl<T: Copy> QuadTree<T> {
    pub fn new(bounds: Rect, cfg: QuadTreeConfig) -> Self {
        Self { root: Node::leaf(bounds, 0), cfg }
    }

    pub fn bounds(&self) -> Rect {
        self.root.bounds
    }

    pub fn config(&self) -> &QuadTreeConfig {
        &self.cfg
    }

    /// Drop every node and object, leaving a single empty root.
    pub fn clear(&mut self) {
        self.root = Node::leaf(self.root.bounds, 0);
    }

    /// Clear and adopt new root bounds and limits.
    pub fn reset(&mut self, bounds: Rect, cfg: QuadTreeConfig) {
        self.cfg = cfg;
        self.root = Node::leaf(bounds, 0);
    }

    /// Insert `payload` with box `aabb`.
    ///
    /// Boxes not fully inside the root bounds stay at the root so queries reaching
    /// past the world edge still see them.
    pub fn insert(&mut self, aabb: Rect, payload: T) {
        if !self.root.bounds.contains_rect(&aabb) {
            self.root.objects.push((aabb, payload));
            return;
        }
        self.root.insert(aabb, payload, &self.cfg);
    }

    /// Candidate payloads for `aabb`, in depth-first NW, NE, SW, SE order.
    pub fn retrieve(&self, aabb: &Rect) -> Vec<T> {
        let mut out = Vec::new();
        self.retrieve_into(aabb, &mut out);
        out
    }

    /// Like [`QuadTree::retrieve`] but appends to `out`.
    pub fn retrieve_into(&self, aabb: &Rect, out: &mut Vec<T>) {
        self.root.retrieve(aabb, out);
    }

    /// Stored entries, duplicates included.
    pub fn len(&self) -> usize {
        self.root.count_objects()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node_count(&self) -> usize {
        self.root.count_nodes()
    }

    /// Depth of the deepest node in the tree (0 for a lone root).
    pub fn depth(&self) -> u32 {
        self.root.deepest()
    }
}

impl<T: Copy> Node<T> {
    fn leaf(bounds: Rect, depth: u32) -> Self {
        Self { bounds, depth, objects: Vec::new(), children: None }
    }

    fn insert(&mut self, aabb: Rect, payload: T, cfg: &QuadTreeConfig) {
        if let Some(children) = self.children.as_mut() {
            match cfg.straddle {
                StraddlePolicy::Duplicate => {
                    let mut stored = false;
                    for child in children.iter_mut() {
                        if child.bounds.intersects_inclusive(&aabb) {
                            child.insert(aabb, payload, cfg);
                            stored = true;
                        }
                    }
                    if !stored {
                        self.objects.push((aabb, payload));
                    }
                }
                StraddlePolicy::KeepAtParent => {
                    match children.iter_mut().find(|c| c.bounds.contains_rect(&aabb)) {
                        Some(child) => child.insert(aabb, payload, cfg),
                        None => self.objects.push((aabb, payload)),
                    }
                }
            }
            return;
        }

        if self.objects.len() + 1 > cfg.max_objects && self.depth < cfg.max_depth {
            self.split();
            for (r, p) in std::mem::take(&mut self.objects) {
                self.insert(r, p, cfg);
            }
            self.insert(aabb, payload, cfg);
            return;
        }
        self.objects.push((aabb, payload));
    }

    fn split(&mut self) {
        let depth = self.depth + 1;
        let [nw, ne, sw, se] = self.bounds.quadrants();
        self.children = Some(Box::new([
            Node::leaf(nw, depth),
            Node::leaf(ne, depth),
            Node::leaf(sw, depth),
            Node::leaf(se, depth),
        ]));
    }

    fn retrieve(&self, aabb: &Rect, out: &mut Vec<T>) {
        out.extend(self.objects.iter().map(|(_, p)| *p));
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                if child.bounds.intersects_inclusive(aabb) {
                    child.retrieve(aabb, out);
                }
            }
        }
    }

    fn count_objects(&self) -> usize {
        let below = self.children.as_ref().map_or(0, |c| c.iter().map(Node::count_objects).sum());
        self.objects.len() + below
    }

    fn count_nodes(&self) -> usize {
        1 + self.children.as_ref().map_or(0, |c| c.iter().map(Node::count_nodes).sum())
    }

    fn deepest(&self) -> u32 {
        self.children
            .as_ref()
            .map_or(self.depth, |c| c.iter().map(Node::deepest).max().unwrap_or(self.depth))
    }
}
