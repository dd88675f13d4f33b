// Procedural meshes for the museum stand-ins.
//
// Walls, plinths and statues are all unit boxes scaled by their model matrix;
// the overlay card is a flat quad in card space. Asset meshes are out of scope.

use glam::Vec3;

// ============================================================================
// GPU VERTEX
// ============================================================================

/// GPU-ready vertex with position and normal.
///   @location(0) position: vec3<f32>
///   @location(1) normal:   vec3<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal:   [f32; 3],
}

impl GpuVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

// ============================================================================
// RENDER MESH
// ============================================================================

/// Triangulated mesh ready for upload.
/// Upload vertex_bytes() to a VERTEX buffer, index_bytes() to an INDEX buffer.
pub struct RenderMesh {
    pub vertices: Vec<GpuVertex>,
    pub indices:  Vec<u32>,
}

impl RenderMesh {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> usize  { self.indices.len() }

    fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        let base = self.vertices.len() as u32;
        for c in corners {
            self.vertices.push(GpuVertex {
                position: c.to_array(),
                normal:   normal.to_array(),
            });
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Unit box centred on the origin, flat normals, CCW faces seen from outside.
pub fn unit_box() -> RenderMesh {
    let mut mesh = RenderMesh { vertices: Vec::new(), indices: Vec::new() };

    // (normal, in-plane u, in-plane v) with u x v = normal
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    for (n, u, v) in faces {
        let c = n * 0.5;
        let (u, v) = (u * 0.5, v * 0.5);
        mesh.push_quad([c - u - v, c + u - v, c + u + v, c - u + v], n);
    }
    mesh
}

/// Overlay card quad in card space, facing +Z at depth -1.
pub fn card_quad() -> RenderMesh {
    let mut mesh = RenderMesh { vertices: Vec::new(), indices: Vec::new() };
    let (hw, hh, z) = (1.6, 1.0, -1.0);
    mesh.push_quad(
        [
            Vec3::new(-hw, -hh, z),
            Vec3::new(hw, -hh, z),
            Vec3::new(hw, hh, z),
            Vec3::new(-hw, hh, z),
        ],
        Vec3::Z,
    );
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_faces_wind_outward() {
        let mesh = unit_box();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.index_count(), 36);

        for tri in mesh.indices.chunks(3) {
            let a = Vec3::from_array(mesh.vertices[tri[0] as usize].position);
            let b = Vec3::from_array(mesh.vertices[tri[1] as usize].position);
            let c = Vec3::from_array(mesh.vertices[tri[2] as usize].position);
            let n = Vec3::from_array(mesh.vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }

    #[test]
    fn byte_views_cover_all_data() {
        let mesh = card_quad();
        assert_eq!(mesh.vertex_bytes().len(), 4 * 24);
        assert_eq!(mesh.index_bytes().len(), 6 * 4);
    }
}
