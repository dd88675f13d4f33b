// ECS components for the museum scene
// Drawables are spawned once from the scene file; only statues change afterwards

use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};

/// Placement of a drawable in world space
#[derive(Component, Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    /// Rotation about +Y in radians
    pub yaw: f32,
    pub scale: Vec3,
}

impl Transform {
    pub fn from_position_scale(position: Vec3, scale: Vec3) -> Self {
        Self { position, yaw: 0.0, scale }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, Quat::from_rotation_y(self.yaw), self.position)
    }
}

/// Uniform slot the renderer keeps for this entity
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drawable {
    pub slot: usize,
}

/// Turns the entity about +Y, driven by the shared animation clock
#[derive(Component, Debug, Clone, Copy)]
pub struct Spin {
    /// Radians per second
    pub speed: f32,
}
