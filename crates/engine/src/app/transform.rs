use glam::{Quat, Vec3};

/// Pose of anything placed in the world.
///
/// Axis convention: +Y is up and an identity rotation faces +Z with +X to the
/// right, so `yaw` turns clockwise when seen from above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn from_position_yaw(position: Vec3, yaw_radians: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw_radians),
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Rotates to face `target`. A target at the current position leaves the rotation unchanged.
    pub fn look_at(&mut self, target: Vec3) {
        if let Some(rotation) = look_rotation(target - self.position) {
            self.rotation = rotation;
        }
    }
}

/// Rotation whose forward axis points along `direction`, with no roll.
pub fn look_rotation(direction: Vec3) -> Option<Quat> {
    let direction = direction.try_normalize()?;
    let yaw = direction.x.atan2(direction.z);
    let pitch = -direction.y.clamp(-1.0, 1.0).asin();
    Some(Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch))
}
