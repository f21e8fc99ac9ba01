//! Static tile layers.
//!
//! A solid tile only exposes the faces that border a non-solid neighbour (or the edge
//! of the layer). Bodies sliding across a row of tiles therefore never catch on the
//! seams between them.

use glam::Vec2;

use crate::api::Collider;
use crate::error::PhysicsError;
use crate::types::*;

/// An immovable box that blocks bodies on its `faces`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StaticBody {
    pub rect: Rect,
    pub faces: SideSet,
    pub bounce: Vec2,
}

impl Collider for StaticBody {
    fn shape(&self) -> Shape {
        Shape::Rect(self.rect)
    }

    fn bounce(&self) -> Vec2 {
        self.bounce
    }

    fn allow_collision(&self) -> SideSet {
        self.faces
    }

    fn is_immovable(&self) -> bool {
        true
    }

    fn inverse_mass(&self) -> f32 {
        0.0
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct Tile {
    solid: bool,
    faces: SideSet,
    bounce: Vec2,
}

/// Uniform grid of tiles anchored at `origin`.
#[derive(Clone, Debug)]
pub struct TileLayer {
    origin: Vec2,
    tile_size: Vec2,
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
}

impl TileLayer {
    pub fn new(origin: Vec2, tile_size: Vec2, columns: u32, rows: u32) -> Result<Self, PhysicsError> {
        if !origin.is_finite() || !tile_size.is_finite() || tile_size.x <= 0.0 || tile_size.y <= 0.0 {
            return Err(PhysicsError::InvalidConfiguration(format!(
                "tile layer needs finite origin and positive tile size, got origin {} size {}",
                origin, tile_size
            )));
        }
        if columns == 0 || rows == 0 {
            return Err(PhysicsError::InvalidConfiguration(format!(
                "tile layer must have at least one tile, got {}x{}",
                columns, rows
            )));
        }
        let count = columns as usize * rows as usize;
        Ok(Self { origin, tile_size, columns, rows, tiles: vec![Tile::default(); count] })
    }

    /// Build from text rows where `#` marks a solid tile and anything else is empty.
    pub fn from_rows(origin: Vec2, tile_size: Vec2, rows: &[&str]) -> Result<Self, PhysicsError> {
        let columns = rows.first().map_or(0, |r| r.chars().count());
        if rows.iter().any(|r| r.chars().count() != columns) {
            return Err(PhysicsError::InvalidConfiguration("tile rows have different lengths".into()));
        }
        let mut layer = Self::new(origin, tile_size, columns as u32, rows.len() as u32)?;
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                layer.tiles[row * columns + col].solid = ch == '#';
            }
        }
        layer.recalculate_faces();
        Ok(layer)
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    pub fn bounds(&self) -> Rect {
        Rect { pos: self.origin, size: self.tile_size * Vec2::new(self.columns as f32, self.rows as f32) }
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        (coord.col < self.columns && coord.row < self.rows)
            .then(|| coord.row as usize * self.columns as usize + coord.col as usize)
    }

    pub fn is_solid(&self, coord: TileCoord) -> bool {
        self.index(coord).is_some_and(|i| self.tiles[i].solid)
    }

    /// Set one tile; returns false if `coord` is outside the layer.
    pub fn set_solid(&mut self, coord: TileCoord, solid: bool) -> bool {
        let Some(i) = self.index(coord) else {
            return false;
        };
        self.tiles[i].solid = solid;
        self.refresh_around(coord);
        true
    }

    /// Set every tile in a `width × height` block; out-of-range tiles are ignored.
    pub fn fill_rect(&mut self, col: u32, row: u32, width: u32, height: u32, solid: bool) {
        for r in row..row.saturating_add(height).min(self.rows) {
            for c in col..col.saturating_add(width).min(self.columns) {
                let i = r as usize * self.columns as usize + c as usize;
                self.tiles[i].solid = solid;
            }
        }
        self.recalculate_faces();
    }

    pub fn set_bounce(&mut self, coord: TileCoord, bounce: Vec2) -> bool {
        let Some(i) = self.index(coord) else {
            return false;
        };
        self.tiles[i].bounce = bounce;
        true
    }

    /// Exposed faces of a solid tile; empty for empty or out-of-range tiles.
    pub fn faces(&self, coord: TileCoord) -> SideSet {
        self.index(coord).map_or(SideSet::NONE, |i| self.tiles[i].faces)
    }

    pub fn tile_rect(&self, coord: TileCoord) -> Rect {
        let pos = self.origin + self.tile_size * Vec2::new(coord.col as f32, coord.row as f32);
        Rect { pos, size: self.tile_size }
    }

    pub fn static_body(&self, coord: TileCoord) -> Option<StaticBody> {
        let tile = self.tiles[self.index(coord)?];
        tile.solid.then(|| StaticBody { rect: self.tile_rect(coord), faces: tile.faces, bounce: tile.bounce })
    }

    /// Solid tiles whose box overlaps `rect`, row-major.
    pub fn tiles_in_rect(&self, rect: &Rect) -> Vec<TileCoord> {
        let mut out = Vec::new();
        if !rect.is_finite() {
            return out;
        }
        let lo = (rect.min() - self.origin) / self.tile_size;
        let hi = (rect.max() - self.origin) / self.tile_size;
        let c0 = lo.x.floor().max(0.0) as i64;
        let r0 = lo.y.floor().max(0.0) as i64;
        let c1 = (hi.x.ceil() as i64).min(self.columns as i64);
        let r1 = (hi.y.ceil() as i64).min(self.rows as i64);
        for row in r0..r1 {
            for col in c0..c1 {
                let coord = TileCoord { col: col as u32, row: row as u32 };
                if self.is_solid(coord) && self.tile_rect(coord).intersects(rect) {
                    out.push(coord);
                }
            }
        }
        out
    }

    /// Recompute exposed faces of every tile.
    pub fn recalculate_faces(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.columns {
                self.update_faces(TileCoord { col, row });
            }
        }
    }

    fn refresh_around(&mut self, coord: TileCoord) {
        self.update_faces(coord);
        for side in Side::ALL {
            if let Some(n) = self.neighbour(coord, side) {
                self.update_faces(n);
            }
        }
    }

    fn neighbour(&self, coord: TileCoord, side: Side) -> Option<TileCoord> {
        let (col, row) = (coord.col as i64, coord.row as i64);
        let (col, row) = match side {
            Side::Up => (col, row - 1),
            Side::Down => (col, row + 1),
            Side::Left => (col - 1, row),
            Side::Right => (col + 1, row),
        };
        if col < 0 || row < 0 || col >= self.columns as i64 || row >= self.rows as i64 {
            return None;
        }
        Some(TileCoord { col: col as u32, row: row as u32 })
    }

    fn update_faces(&mut self, coord: TileCoord) {
        let Some(i) = self.index(coord) else {
            return;
        };
        let faces = if self.tiles[i].solid {
            Side::ALL
                .into_iter()
                .filter(|s| !self.neighbour(coord, *s).is_some_and(|n| self.is_solid(n)))
                .collect()
        } else {
            SideSet::NONE
        };
        self.tiles[i].faces = faces;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> TileLayer {
        TileLayer::from_rows(
            Vec2::ZERO,
            Vec2::splat(10.0),
            &[
                "......", //
                "......", //
                "..##..", //
                "######", //
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        assert!(TileLayer::new(Vec2::ZERO, Vec2::new(0.0, 1.0), 4, 4).is_err());
        assert!(TileLayer::new(Vec2::ZERO, Vec2::ONE, 0, 4).is_err());
        assert!(TileLayer::from_rows(Vec2::ZERO, Vec2::ONE, &["##", "#"]).is_err());
        assert!(TileLayer::from_rows(Vec2::ZERO, Vec2::ONE, &[]).is_err());
    }

    #[test]
    fn test_faces_hide_interior_seams() {
        let l = layer();
        let floor_mid = TileCoord { col: 4, row: 3 };
        assert_eq!(l.faces(floor_mid), SideSet::only(Side::Up).with(Side::Down));
        let under_block = TileCoord { col: 2, row: 3 };
        assert_eq!(l.faces(under_block), SideSet::only(Side::Down));
        let block_left = TileCoord { col: 2, row: 2 };
        assert_eq!(l.faces(block_left), SideSet::ALL.without(Side::Right).without(Side::Down));
        let edge = TileCoord { col: 0, row: 3 };
        assert!(l.faces(edge).contains(Side::Left));
        assert_eq!(l.faces(TileCoord { col: 0, row: 0 }), SideSet::NONE);
    }

    #[test]
    fn test_set_solid_updates_neighbours() {
        let mut l = layer();
        let c = TileCoord { col: 5, row: 2 };
        assert!(l.set_solid(c, true));
        assert!(!l.faces(TileCoord { col: 5, row: 3 }).contains(Side::Up));
        assert!(l.set_solid(c, false));
        assert!(l.faces(TileCoord { col: 5, row: 3 }).contains(Side::Up));
        assert!(!l.set_solid(TileCoord { col: 99, row: 0 }, true));
    }

    #[test]
    fn test_tiles_in_rect_row_major() {
        let l = layer();
        let found = l.tiles_in_rect(&Rect::new(15.0, 25.0, 10.0, 10.0));
        assert_eq!(
            found,
            vec![
                TileCoord { col: 2, row: 2 },
                TileCoord { col: 1, row: 3 },
                TileCoord { col: 2, row: 3 },
            ]
        );
        // Touching a tile edge is not overlap.
        assert!(l.tiles_in_rect(&Rect::new(0.0, 20.0, 10.0, 10.0)).is_empty());
        // Outside the layer entirely.
        assert!(l.tiles_in_rect(&Rect::new(-50.0, -50.0, 10.0, 10.0)).is_empty());
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut l = TileLayer::new(Vec2::ZERO, Vec2::ONE, 4, 4).unwrap();
        l.fill_rect(2, 2, 10, 10, true);
        assert!(l.is_solid(TileCoord { col: 3, row: 3 }));
        assert!(!l.is_solid(TileCoord { col: 1, row: 3 }));
        assert_eq!(l.faces(TileCoord { col: 2, row: 2 }), SideSet::only(Side::Up).with(Side::Left));
    }

    #[test]
    fn test_static_body_only_for_solid() {
        let mut l = layer();
        l.set_bounce(TileCoord { col: 0, row: 3 }, Vec2::splat(0.5));
        let s = l.static_body(TileCoord { col: 0, row: 3 }).unwrap();
        assert_eq!(s.rect, Rect::new(0.0, 30.0, 10.0, 10.0));
        assert_eq!(s.bounce, Vec2::splat(0.5));
        assert!(s.is_immovable());
        assert!(l.static_body(TileCoord { col: 0, row: 0 }).is_none());
    }
}
