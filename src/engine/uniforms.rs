// Per-frame uniform payloads handed to the renderer.
//
// Layouts follow uniform-buffer rules: every matrix starts on a 16-byte
// boundary and the struct size rounds up to 16. The shaders bind exactly
// these bytes, so field order is part of the contract.

use glam::{Mat4, Vec3};

// ============================================================================
// WIRE STRUCTS
// ============================================================================

/// Scene geometry: one per drawable.
///   @binding(0) model, view, proj: mat4x4<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EntityUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
}

/// Overlay card quad: matrices plus the painting's texture slot.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CardUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub texture_id: i32,
    _padding: [i32; 3], // Round struct up to 16 bytes
}

/// Where the card quad sits when hidden: far off to the side of the ortho volume.
const CARD_HIDDEN_OFFSET: Vec3 = Vec3::new(200.0, 1.0, 1.0);

/// Card orthographic half-width in card units; height follows the aspect.
const CARD_ORTHO_HALF: f32 = 2.0;

// ============================================================================
// FRAME BUNDLE
// ============================================================================

/// Destination of one uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformTarget {
    Drawable(usize),
    Card,
}

/// Renderer side of the boundary: copy these bytes into the target's uniform slot.
pub trait UniformSink {
    fn upload(&mut self, target: UniformTarget, bytes: &[u8]);
}

/// Everything uploaded in one frame. Built fresh and dropped after upload.
#[derive(Debug, Clone)]
pub struct FrameUniforms {
    pub drawables: Vec<(usize, EntityUniforms)>,
    pub card: CardUniforms,
}

impl FrameUniforms {
    pub fn upload_to(&self, sink: &mut dyn UniformSink) {
        for (slot, uniforms) in &self.drawables {
            sink.upload(UniformTarget::Drawable(*slot), bytemuck::bytes_of(uniforms));
        }
        sink.upload(UniformTarget::Card, bytemuck::bytes_of(&self.card));
    }
}

/// Inputs for one publish pass.
pub struct FrameInputs<'a> {
    pub view: Mat4,
    pub proj: Mat4,
    /// (drawable slot, model matrix), already ordered by slot.
    pub models: &'a [(usize, Mat4)],
    pub card_visible: bool,
    pub card_texture: usize,
    pub aspect: f32,
}

/// Package matrices into wire structs. No decisions beyond picking the card placement.
pub fn publish(inputs: &FrameInputs<'_>) -> FrameUniforms {
    let view = inputs.view.to_cols_array_2d();
    let proj = inputs.proj.to_cols_array_2d();

    let drawables = inputs
        .models
        .iter()
        .map(|(slot, model)| {
            (
                *slot,
                EntityUniforms {
                    model: model.to_cols_array_2d(),
                    view,
                    proj,
                },
            )
        })
        .collect();

    let card = CardUniforms {
        model: card_model(inputs.card_visible).to_cols_array_2d(),
        view: Mat4::IDENTITY.to_cols_array_2d(),
        proj: card_projection(inputs.aspect).to_cols_array_2d(),
        texture_id: inputs.card_texture as i32,
        _padding: [0; 3],
    };

    FrameUniforms { drawables, card }
}

pub fn card_model(visible: bool) -> Mat4 {
    if visible {
        Mat4::IDENTITY
    } else {
        Mat4::from_translation(CARD_HIDDEN_OFFSET)
    }
}

pub fn card_projection(aspect: f32) -> Mat4 {
    let half_h = CARD_ORTHO_HALF / aspect;
    Mat4::orthographic_rh(-CARD_ORTHO_HALF, CARD_ORTHO_HALF, -half_h, half_h, -0.1, 12.0)
}
