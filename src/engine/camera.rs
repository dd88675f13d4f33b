// First-person walkthrough camera
//
// Camera model:
//   - Eye position in world space; y is eye height (R/F adjust it)
//   - Yaw/pitch/roll orientation; roll is carried but never driven
//   - Pointer drag (while Look is held) and arrow keys both rotate, additively
//   - WASD walks on the ground plane relative to yaw
//   - Every tentative position is probed against the walkability map and
//     fully rolled back when rejected

use std::time::Instant;

use glam::{Mat3, Mat4, Vec3};

use super::input::{Action, InputSnapshot};
use super::navigation::{CollisionProber, WalkabilityMap};
use super::walk::{AnimationState, WalkParams};
use crate::scene::CameraConfig;

// ============================================================================
// STATE
// ============================================================================

/// Position and orientation, owned by the walkthrough and mutated once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    /// (yaw, pitch, roll) in radians.
    pub orientation: Vec3,
}

impl CameraState {
    pub fn at(position: Vec3) -> Self {
        Self { position, orientation: Vec3::ZERO }
    }

    pub fn yaw(&self) -> f32 { self.orientation.x }
    pub fn pitch(&self) -> f32 { self.orientation.y }
    pub fn roll(&self) -> f32 { self.orientation.z }

    /// Yaw about +Y, then pitch about the local right axis, then roll about forward.
    pub fn rotation(&self) -> Mat3 {
        Mat3::from_rotation_y(self.yaw())
            * Mat3::from_rotation_x(self.pitch())
            * Mat3::from_rotation_z(self.roll())
    }

    /// Inverse of rotation-then-translation. `bob` lifts the eye without
    /// touching the stored position.
    pub fn view_matrix(&self, bob: f32) -> Mat4 {
        let eye = self.position + Vec3::Y * bob;
        Mat4::from_mat3(self.rotation().transpose()) * Mat4::from_translation(-eye)
    }
}

// ============================================================================
// VIEWPORT + CLOCK
// ============================================================================

/// Current drawable size in physical pixels. May be degenerate while minimised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height with both sides clamped to at least one pixel.
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Longest step one frame may integrate. A hitch (window drag, breakpoint)
/// would otherwise carry the camera through walls thinner than one step.
pub const MAX_FRAME_DT: f32 = 0.1;

/// Monotonic frame timer. The first tick has no previous timestamp and reports zero.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { last: None }
    }

    pub fn tick(&mut self, now: Instant) -> f32 {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f32().min(MAX_FRAME_DT),
            None => 0.0,
        };
        self.last = Some(now);
        dt
    }
}

// ============================================================================
// NAVIGATION CONTROLLER
// ============================================================================

/// What happened to the camera this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Any horizontal movement key was held.
    pub walking: bool,
    /// The tentative position failed the probe and was rolled back.
    pub rejected: bool,
}

pub struct NavigationController {
    /// World units per second.
    pub move_speed: f32,
    pub sprint_multiplier: f32,
    /// Radians per second for keys; pointer drag uses it too.
    pub rotation_speed: f32,
    /// Pointer pixels per `rotation_speed` radians.
    pub mouse_resolution: f32,

    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub flip_y: bool,

    pub walk: WalkParams,
}

impl NavigationController {
    pub fn new(config: &CameraConfig, walk: WalkParams) -> Self {
        Self {
            move_speed: config.move_speed,
            sprint_multiplier: config.sprint_multiplier,
            rotation_speed: config.rotation_speed_degrees.to_radians(),
            mouse_resolution: config.mouse_resolution.max(1.0),
            fov: config.fov_degrees.to_radians(),
            near: config.near,
            far: config.far,
            flip_y: config.flip_y,
            walk,
        }
    }

    /// Integrate one frame of input. Call once per frame before publishing uniforms.
    pub fn update(
        &self,
        camera: &mut CameraState,
        anim: &mut AnimationState,
        input: &InputSnapshot,
        dt: f32,
        map: &WalkabilityMap,
        prober: &CollisionProber,
    ) -> MoveOutcome {
        let previous = camera.position;

        self.rotate(camera, input, dt);

        // Walking stays on the ground plane: only yaw steers it.
        let ground = Mat3::from_rotation_y(camera.yaw());
        let right = ground * Vec3::X;
        let back = ground * Vec3::Z;

        let mut speed = self.move_speed * dt;
        if input.is_held(Action::Sprint) {
            speed *= self.sprint_multiplier;
        }

        let mut step = Vec3::ZERO;
        if input.is_held(Action::MoveLeft) { step -= right; }
        if input.is_held(Action::MoveRight) { step += right; }
        if input.is_held(Action::MoveBack) { step += back; }
        if input.is_held(Action::MoveForward) { step -= back; }
        if input.is_held(Action::MoveDown) { step -= Vec3::Y; }
        if input.is_held(Action::MoveUp) { step += Vec3::Y; }

        let walking = [
            Action::MoveForward,
            Action::MoveBack,
            Action::MoveLeft,
            Action::MoveRight,
        ]
        .into_iter()
        .any(|a| input.is_held(a));

        camera.position += step * speed;
        anim.advance(dt, walking, &self.walk);

        let probe = prober.probe(map, camera.position.x, camera.position.z);
        let rejected = !probe.walkable;
        if rejected {
            log::trace!("move rejected at pixel ({}, {})", probe.last.pixel.x, probe.last.pixel.y);
            camera.position = previous;
        }

        if camera.position.x != previous.x || camera.position.z != previous.z {
            log::debug!(
                "camera at ({:.3}, {:.3}, {:.3})",
                camera.position.x, camera.position.y, camera.position.z
            );
        }

        MoveOutcome { walking, rejected }
    }

    fn rotate(&self, camera: &mut CameraState, input: &InputSnapshot, dt: f32) {
        if input.is_held(Action::Look) {
            let scale = self.rotation_speed / self.mouse_resolution;
            camera.orientation.x += input.pointer_delta.0 * scale;
            camera.orientation.y += input.pointer_delta.1 * scale;
        }

        let turn = self.rotation_speed * dt;
        if input.is_held(Action::RotateLeft) { camera.orientation.x += turn; }
        if input.is_held(Action::RotateRight) { camera.orientation.x -= turn; }
        if input.is_held(Action::RotateUp) { camera.orientation.y += turn; }
        if input.is_held(Action::RotateDown) { camera.orientation.y -= turn; }
    }

    /// Perspective projection for the current viewport, Y-flipped when configured.
    pub fn projection_matrix(&self, viewport: Viewport) -> Mat4 {
        let mut proj = Mat4::perspective_rh(self.fov, viewport.aspect(), self.near, self.far);
        if self.flip_y {
            proj.y_axis.y *= -1.0;
        }
        proj
    }
}
