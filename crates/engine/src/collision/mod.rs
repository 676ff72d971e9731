//! Collision queries against static level geometry and entity colliders.
//!
//! Shapes are axis-aligned boxes and spheres. Queries are pure functions of the
//! current world; nothing here mutates entities.

mod shapes;
mod world;

pub use shapes::{Collider, ColliderShape, CollisionLayer, HitInfo, LayerMask};
pub use world::{Collidable, CollisionQuery, CollisionWorld, QueryFilter, StaticBody, WorldQuery};
