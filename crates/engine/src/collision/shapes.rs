use std::ops::BitOr;

use glam::Vec3;

use crate::app::EntityId;

const PARALLEL_EPSILON: f32 = 1.0e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionLayer {
    World,
    Actor,
    Pickup,
}

impl CollisionLayer {
    pub const fn mask(self) -> LayerMask {
        match self {
            CollisionLayer::World => LayerMask::WORLD,
            CollisionLayer::Actor => LayerMask::ACTOR,
            CollisionLayer::Pickup => LayerMask::PICKUP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerMask(u8);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const WORLD: Self = Self(1 << 0);
    pub const ACTOR: Self = Self(1 << 1);
    pub const PICKUP: Self = Self(1 << 2);
    pub const ALL: Self = Self(0b111);

    pub const fn contains(self, layer: CollisionLayer) -> bool {
        self.0 & layer.mask().0 != 0
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Aabb { half_extents: Vec3 },
    Sphere { radius: f32 },
}

impl ColliderShape {
    /// Distance from the shape's center to its surface along a unit axis.
    pub fn support(&self, normal: Vec3) -> f32 {
        match self {
            ColliderShape::Aabb { half_extents } => normal.abs().dot(*half_extents),
            ColliderShape::Sphere { radius } => *radius,
        }
    }

    pub fn bounding_half_extents(&self) -> Vec3 {
        match self {
            ColliderShape::Aabb { half_extents } => *half_extents,
            ColliderShape::Sphere { radius } => Vec3::splat(*radius),
        }
    }
}

/// Shape attached to a pose. Colliders never rotate; boxes stay axis-aligned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub shape: ColliderShape,
    pub offset: Vec3,
    pub layer: CollisionLayer,
}

impl Collider {
    pub fn aabb(half_extents: Vec3, layer: CollisionLayer) -> Self {
        Self {
            shape: ColliderShape::Aabb { half_extents },
            offset: Vec3::ZERO,
            layer,
        }
    }

    pub fn sphere(radius: f32, layer: CollisionLayer) -> Self {
        Self {
            shape: ColliderShape::Sphere { radius },
            offset: Vec3::ZERO,
            layer,
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn center(&self, position: Vec3) -> Vec3 {
        position + self.offset
    }
}

/// Result of any collision query. A miss is a value, never an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitInfo {
    pub hit: bool,
    pub point: Vec3,
    /// Points away from the surface that was hit, toward the querying shape.
    pub normal: Vec3,
    pub penetration: f32,
    pub entity: Option<EntityId>,
}

impl HitInfo {
    pub const fn miss() -> Self {
        Self {
            hit: false,
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
            penetration: 0.0,
            entity: None,
        }
    }
}

impl Default for HitInfo {
    fn default() -> Self {
        Self::miss()
    }
}

fn axis_unit(axis: usize) -> Vec3 {
    match axis {
        0 => Vec3::X,
        1 => Vec3::Y,
        _ => Vec3::Z,
    }
}

fn sign_or_positive(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

fn min_axis(values: Vec3) -> usize {
    if values.x <= values.y && values.x <= values.z {
        0
    } else if values.y <= values.z {
        1
    } else {
        2
    }
}

/// Ray against an axis-aligned box. `direction` must be unit length.
/// A ray starting inside reports `t = 0` and the nearest face normal.
pub(crate) fn ray_vs_aabb(
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    center: Vec3,
    half_extents: Vec3,
) -> Option<(f32, Vec3)> {
    let local = origin - center;
    if local.abs().cmple(half_extents).all() {
        let gap = half_extents - local.abs();
        let axis = min_axis(gap);
        return Some((0.0, axis_unit(axis) * sign_or_positive(local[axis])));
    }

    let lo = center - half_extents;
    let hi = center + half_extents;
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < PARALLEL_EPSILON {
            if o < lo[axis] || o > hi[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (lo[axis] - o) * inv;
        let mut t1 = (hi[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        if t0 > t_enter {
            t_enter = t0;
            normal = axis_unit(axis) * -d.signum();
        }
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_enter < 0.0 || t_enter > max_distance {
        return None;
    }
    Some((t_enter, normal))
}

pub(crate) fn ray_vs_sphere(
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    center: Vec3,
    radius: f32,
) -> Option<(f32, Vec3)> {
    let m = origin - center;
    let c = m.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some((0.0, m.try_normalize().unwrap_or(Vec3::Y)));
    }
    let b = m.dot(direction);
    if b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()).max(0.0);
    if t > max_distance {
        return None;
    }
    let normal = (origin + direction * t - center)
        .try_normalize()
        .unwrap_or(Vec3::Y);
    Some((t, normal))
}

pub(crate) fn ray_vs_shape(
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    shape: &ColliderShape,
    center: Vec3,
) -> Option<(f32, Vec3)> {
    match shape {
        ColliderShape::Aabb { half_extents } => {
            ray_vs_aabb(origin, direction, max_distance, center, *half_extents)
        }
        ColliderShape::Sphere { radius } => {
            ray_vs_sphere(origin, direction, max_distance, center, *radius)
        }
    }
}

/// Sweeps a box by casting a ray against the target grown by the box's half extents.
/// Spheres are grown into boxes, which is conservative near their corners.
///
/// Returns `(t, normal, depth)`. `depth` is non-zero only when the box starts
/// inside the target, and is how far it must move along `normal` to get out.
pub(crate) fn box_sweep_vs_shape(
    origin: Vec3,
    half_extents: Vec3,
    direction: Vec3,
    max_distance: f32,
    shape: &ColliderShape,
    center: Vec3,
) -> Option<(f32, Vec3, f32)> {
    let expanded = shape.bounding_half_extents() + half_extents;
    let local = origin - center;
    if local.abs().cmplt(expanded).all() {
        let gap = expanded - local.abs();
        let axis = min_axis(gap);
        return Some((0.0, axis_unit(axis) * sign_or_positive(local[axis]), gap[axis]));
    }
    ray_vs_aabb(origin, direction, max_distance, center, expanded).map(|(t, n)| (t, n, 0.0))
}

/// Overlap between a probe shape and a target shape.
/// Returns the normal pointing from the target toward the probe and the penetration depth.
pub(crate) fn overlap_shapes(
    probe: &ColliderShape,
    probe_center: Vec3,
    target: &ColliderShape,
    target_center: Vec3,
) -> Option<(Vec3, f32)> {
    match (probe, target) {
        (
            ColliderShape::Aabb { half_extents: a },
            ColliderShape::Aabb { half_extents: b },
        ) => aabb_vs_aabb(probe_center, *a, target_center, *b),
        (ColliderShape::Sphere { radius: a }, ColliderShape::Sphere { radius: b }) => {
            sphere_vs_sphere(probe_center, *a, target_center, *b)
        }
        (ColliderShape::Aabb { half_extents }, ColliderShape::Sphere { radius }) => {
            sphere_vs_aabb(target_center, *radius, probe_center, *half_extents)
                .map(|(normal, depth)| (-normal, depth))
        }
        (ColliderShape::Sphere { radius }, ColliderShape::Aabb { half_extents }) => {
            sphere_vs_aabb(probe_center, *radius, target_center, *half_extents)
        }
    }
}

fn aabb_vs_aabb(
    probe_center: Vec3,
    probe_half: Vec3,
    target_center: Vec3,
    target_half: Vec3,
) -> Option<(Vec3, f32)> {
    let delta = probe_center - target_center;
    let overlap = probe_half + target_half - delta.abs();
    if overlap.cmple(Vec3::ZERO).any() {
        return None;
    }
    let axis = min_axis(overlap);
    Some((axis_unit(axis) * sign_or_positive(delta[axis]), overlap[axis]))
}

fn sphere_vs_sphere(
    probe_center: Vec3,
    probe_radius: f32,
    target_center: Vec3,
    target_radius: f32,
) -> Option<(Vec3, f32)> {
    let delta = probe_center - target_center;
    let distance = delta.length();
    let depth = probe_radius + target_radius - distance;
    if depth <= 0.0 {
        return None;
    }
    Some((delta.try_normalize().unwrap_or(Vec3::Y), depth))
}

/// Normal points from the box toward the sphere.
fn sphere_vs_aabb(
    sphere_center: Vec3,
    radius: f32,
    box_center: Vec3,
    half_extents: Vec3,
) -> Option<(Vec3, f32)> {
    let closest = sphere_center.clamp(box_center - half_extents, box_center + half_extents);
    let delta = sphere_center - closest;
    let distance = delta.length();
    if distance > PARALLEL_EPSILON {
        if distance >= radius {
            return None;
        }
        return Some((delta / distance, radius - distance));
    }

    // Center inside the box: leave through the nearest face.
    let local = sphere_center - box_center;
    let gap = half_extents - local.abs();
    let axis = min_axis(gap);
    Some((
        axis_unit(axis) * sign_or_positive(local[axis]),
        radius + gap[axis],
    ))
}
