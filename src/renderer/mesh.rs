use std::mem::offset_of;

use bytemuck::{Pod, Zeroable, cast_slice};
use lib_gpu::{
    Buffer, BufferInitDescriptor, BufferUsages, Device, DeviceExt, IndexFormat, RenderPass,
    VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode,
};
use lib_math::{Vec2, Vec3, vec2};

use crate::scene::{CRATE_HALF_EXTENTS, CUBE_HALF_EXTENT, FLOOR_EXTENT, MeshKind};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Direction of increasing `u`; `w` is the sign that turns
    /// `cross(normal, tangent)` into the direction of increasing `v`.
    pub tangent: [f32; 4],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

#[derive(Debug)]
pub struct GpuMesh {
    vertex_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,
}

pub const VERTEX_BUFFER_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: size_of::<MeshVertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &[
        VertexAttribute {
            format: VertexFormat::Float32x3,
            offset: offset_of!(MeshVertex, position) as u64,
            shader_location: 0,
        },
        VertexAttribute {
            format: VertexFormat::Float32x3,
            offset: offset_of!(MeshVertex, normal) as u64,
            shader_location: 1,
        },
        VertexAttribute {
            format: VertexFormat::Float32x4,
            offset: offset_of!(MeshVertex, tangent) as u64,
            shader_location: 2,
        },
        VertexAttribute {
            format: VertexFormat::Float32x2,
            offset: offset_of!(MeshVertex, uv) as u64,
            shader_location: 3,
        },
    ],
};

impl MeshData {
    pub fn for_kind(kind: MeshKind) -> Self {
        match kind {
            MeshKind::Cube => Self::cuboid(Vec3::splat(CUBE_HALF_EXTENT)),
            MeshKind::Crate => Self::cuboid(CRATE_HALF_EXTENTS),
            MeshKind::Floor => Self::floor(FLOOR_EXTENT),
        }
    }

    /// An axis-aligned box around the origin with the texture stretched
    /// once over every face.
    pub fn cuboid(half_extents: Vec3) -> Self {
        // (u axis, v axis), with u x v pointing out of the face.
        const FACES: [(Vec3, Vec3); 6] = [
            (Vec3::NEG_Z, Vec3::Y),
            (Vec3::Z, Vec3::Y),
            (Vec3::X, Vec3::NEG_Z),
            (Vec3::X, Vec3::Z),
            (Vec3::X, Vec3::Y),
            (Vec3::NEG_X, Vec3::Y),
        ];

        let mut mesh = Self::default();

        for (u, v) in FACES {
            let normal = u.cross(v);
            let center = normal * half_extents.dot(normal.abs());
            let u_extent = u * half_extents.dot(u.abs());
            let v_extent = v * half_extents.dot(v.abs());

            mesh.push_quad(center, u_extent, v_extent, Vec2::ONE);
        }

        mesh
    }

    /// A square facing +Y at height 0, with the texture repeated once per
    /// unit.
    pub fn floor(half_extent: f32) -> Self {
        let mut mesh = Self::default();

        mesh.push_quad(
            Vec3::ZERO,
            Vec3::X * half_extent,
            Vec3::NEG_Z * half_extent,
            Vec2::splat(half_extent * 2.0),
        );

        mesh
    }

    /// Pushes a quad spanning `center ± u_extent ± v_extent`, front facing
    /// toward `u_extent x v_extent`, counter-clockwise.
    fn push_quad(&mut self, center: Vec3, u_extent: Vec3, v_extent: Vec3, uv_scale: Vec2) {
        let base = self.vertices.len() as u16;

        let normal = u_extent.cross(v_extent).normalize();
        let tangent = u_extent.normalize();
        // Texture v grows downward, against the quad's v axis.
        let bitangent = -v_extent.normalize();
        let handedness = normal.cross(tangent).dot(bitangent).signum();

        for corner in [vec2(-1.0, -1.0), vec2(1.0, -1.0), vec2(1.0, 1.0), vec2(-1.0, 1.0)] {
            let position = center + u_extent * corner.x + v_extent * corner.y;
            let uv = vec2(corner.x + 1.0, 1.0 - corner.y) * 0.5 * uv_scale;

            self.vertices.push(MeshVertex {
                position: position.to_array(),
                normal: normal.to_array(),
                tangent: tangent.extend(handedness).to_array(),
                uv: uv.to_array(),
            });
        }

        self.indices
            .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

impl GpuMesh {
    pub fn new(label: &str, data: &MeshData, device: &Device) -> Self {
        let vertex_buf = device.create_buffer_init(&BufferInitDescriptor {
            label: Some(&format!("{label} vertex buffer")),
            contents: cast_slice(&data.vertices),
            usage: BufferUsages::VERTEX,
        });

        let index_buf = device.create_buffer_init(&BufferInitDescriptor {
            label: Some(&format!("{label} index buffer")),
            contents: cast_slice(&data.indices),
            usage: BufferUsages::INDEX,
        });

        Self {
            vertex_buf,
            index_buf,
            index_count: data.indices.len() as u32,
        }
    }

    pub fn draw(&self, pass: &mut RenderPass<'_>, instance_count: u32) {
        pass.set_vertex_buffer(0, self.vertex_buf.slice(..));
        pass.set_index_buffer(self.index_buf.slice(..), IndexFormat::Uint16);
        pass.draw_indexed(0..self.index_count, 0, 0..instance_count);
    }
}
