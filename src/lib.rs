//! arcade-bonk: arcade-style 2D physics (AABB/circle bodies, quadtree broad phase,
//! minimum-penetration separation, static tile layers)

pub mod types;
pub mod error;
pub mod api;
pub mod body;
pub mod quadtree;
pub mod narrowphase;
pub mod separation;
pub mod tilemap;
pub mod motion;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::PhysicsError;
pub use crate::body::{Body, BodyShape, DEFAULT_MAX_VELOCITY};
pub use crate::quadtree::QuadTree;
pub use crate::narrowphase::Narrowphase;
pub use crate::tilemap::{StaticBody, TileLayer};
pub use crate::world::PhysicsWorld;
