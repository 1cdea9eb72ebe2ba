//! Vertex format and the builders that produce the per-draw vertex streams.
//!
//! Each [`ShaderVariant`](crate::ShaderVariant) consumes its own stream:
//!
//! - faces: a triangle list
//! - wireframe: a line list, three edges per face
//! - lines: a line list
//! - point markers: a triangle list, exactly six vertices per marker
//!
//! # Vertex Layout
//!
//! The [`Vertex`] struct uses the following GPU layout (40 bytes per vertex):
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | color     | Float32x4 | 24     | 2               |
//!
//! # Point Markers
//!
//! A marker is a diamond-shaped quad made from two triangles that share the
//! horizontal diagonal. The vertex stage recovers each corner's role from
//! `vertex_index % 6`, so markers must start at a multiple of six:
//!
//! | Index in marker | Corner   | Local position |
//! |-----------------|----------|----------------|
//! | 0, 4            | `+right` | `( 1,  0)`     |
//! | 1, 3            | `-right` | `(-1,  0)`     |
//! | 2               | `+up`    | `( 0,  1)`     |
//! | 5               | `-up`    | `( 0, -1)`     |

use std::fmt;

use glam::{Vec3, Vec4};

/// Vertices per point marker.
pub const VERTICES_PER_POINT: usize = 6;

/// A vertex as the host uploads it.
///
/// `color` is straight RGBA; the vertex stage premultiplies it.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in model space.
    pub position: [f32; 3],
    /// Surface normal. Should be close to unit length for the face shading to be defined.
    pub normal: [f32; 3],
    /// RGBA in [0, 1], alpha not premultiplied.
    pub color: [f32; 4],
}

impl Vertex {
    /// The wgpu vertex buffer layout descriptor for this vertex type.
    ///
    /// - **Array stride**: 40 bytes per vertex
    /// - **Step mode**: Per-vertex
    /// - **Attributes**: position (loc 0), normal (loc 1), color (loc 2)
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // color
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };

    pub fn new(position: impl Into<Vec3>, normal: impl Into<Vec3>, color: impl Into<Vec4>) -> Self {
        Self {
            position: position.into().to_array(),
            normal: normal.into().to_array(),
            color: color.into().to_array(),
        }
    }
}

/// Errors raised while building a vertex stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerticesError {
    /// A point marker would start at an index that is not a multiple of six.
    MisalignedPoint {
        /// Length of the stream at the time of the push.
        len: usize,
    },
}

impl fmt::Display for VerticesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerticesError::MisalignedPoint { len } => write!(
                f,
                "point marker would start at vertex {}, which is not a multiple of {}",
                len, VERTICES_PER_POINT
            ),
        }
    }
}

impl std::error::Error for VerticesError {}

/// A growable vertex stream for one draw call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vertices {
    vertices: Vec<Vertex>,
}

impl Vertices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one triangle. All three corners share `normal` and `color`.
    pub fn push_triangle(&mut self, corners: [Vec3; 3], normal: Vec3, color: Vec4) {
        for corner in corners {
            self.vertices.push(Vertex::new(corner, normal, color));
        }
    }

    /// Appends one line segment.
    pub fn push_line(&mut self, a: Vec3, b: Vec3, color: Vec4) {
        self.vertices.push(Vertex::new(a, Vec3::ZERO, color));
        self.vertices.push(Vertex::new(b, Vec3::ZERO, color));
    }

    /// Appends a point marker centred on `center`.
    ///
    /// `right` and `up` are the half-diagonals of the marker quad; their length
    /// sets the marker size. The disc drawn by the circles variant is inscribed
    /// in the resulting diamond.
    pub fn push_point(
        &mut self,
        center: Vec3,
        right: Vec3,
        up: Vec3,
        color: Vec4,
    ) -> Result<(), VerticesError> {
        let len = self.vertices.len();
        if len % VERTICES_PER_POINT != 0 {
            return Err(VerticesError::MisalignedPoint { len });
        }

        let normal = right.cross(up).normalize_or_zero();
        let corners = [
            center + right,
            center - right,
            center + up,
            center - right,
            center + right,
            center - up,
        ];
        for corner in corners {
            self.vertices.push(Vertex::new(corner, normal, color));
        }

        Ok(())
    }

    /// Converts a triangle-list stream into the line list of its edges.
    ///
    /// Trailing vertices that do not form a full triangle are ignored.
    pub fn wireframe(&self) -> Vertices {
        let mut edges = Vec::with_capacity(self.vertices.len() * 2);
        for tri in self.vertices.chunks_exact(3) {
            for (a, b) in [(0, 1), (1, 2), (2, 0)] {
                edges.push(tri[a]);
                edges.push(tri[b]);
            }
        }
        Vertices { vertices: edges }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn as_slice(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }
}

impl From<Vec<Vertex>> for Vertices {
    fn from(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }
}

impl AsRef<[Vertex]> for Vertices {
    fn as_ref(&self) -> &[Vertex] {
        &self.vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_binding() {
        assert_eq!(std::mem::size_of::<Vertex>(), 40);
        assert_eq!(Vertex::LAYOUT.array_stride, 40);
        assert_eq!(std::mem::offset_of!(Vertex, normal), 12);
        assert_eq!(std::mem::offset_of!(Vertex, color), 24);

        let locations: Vec<u32> = Vertex::LAYOUT
            .attributes
            .iter()
            .map(|a| a.shader_location)
            .collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }

    #[test]
    fn point_marker_corner_roles() {
        let mut points = Vertices::new();
        points
            .push_point(Vec3::ZERO, Vec3::X, Vec3::Y, Vec4::ONE)
            .unwrap();

        let positions: Vec<[f32; 3]> = points.as_slice().iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![
                [1.0, 0.0, 0.0],
                [-1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [-1.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, -1.0, 0.0],
            ]
        );
        assert_eq!(points.as_slice()[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn point_after_partial_marker_is_rejected() {
        let mut points = Vertices::new();
        points.push_line(Vec3::ZERO, Vec3::X, Vec4::ONE);

        let err = points
            .push_point(Vec3::ZERO, Vec3::X, Vec3::Y, Vec4::ONE)
            .unwrap_err();
        assert_eq!(err, VerticesError::MisalignedPoint { len: 2 });
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn consecutive_points_stay_aligned() {
        let mut points = Vertices::new();
        for i in 0..3 {
            points
                .push_point(Vec3::splat(i as f32), Vec3::X, Vec3::Y, Vec4::ONE)
                .unwrap();
        }
        assert_eq!(points.len(), 3 * VERTICES_PER_POINT);
    }

    #[test]
    fn wireframe_emits_three_edges_per_triangle() {
        let mut faces = Vertices::new();
        faces.push_triangle([Vec3::ZERO, Vec3::X, Vec3::Y], Vec3::Z, Vec4::ONE);

        let edges = faces.wireframe();
        assert_eq!(edges.len(), 6);

        let p = |i: usize| edges.as_slice()[i].position;
        assert_eq!((p(0), p(1)), ([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]));
        assert_eq!((p(2), p(3)), ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]));
        assert_eq!((p(4), p(5)), ([0.0, 1.0, 0.0], [0.0, 0.0, 0.0]));
    }
}
