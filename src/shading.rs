//! CPU rendition of the transform stage and the shading variants.
//!
//! Every function here mirrors one entry point in `shader.wgsl` operation for
//! operation, so the viewer's output can be reproduced and tested without a GPU.
//!
//! # Pipeline
//!
//! 1. [`transform_vertex`] turns one [`Vertex`] into an [`InterpolatedRecord`].
//! 2. The rasterizer interpolates records across a primitive
//!    ([`InterpolatedRecord::interpolate`] models that step).
//! 3. One [`ShaderVariant`], fixed per draw call, turns each record into a
//!    premultiplied RGBA color.

use std::fmt;
use std::str::FromStr;

use glam::{Vec2, Vec3, Vec4};

use crate::uniforms::Uniforms;
use crate::vertices::Vertex;

/// Light direction used by the face variant, in camera space, pointing into the screen.
pub const LIGHT_DIRECTION: Vec3 = Vec3::new(0.0, 0.0, -1.0);

/// Radius of the point-marker disc, in local quad units.
pub const CIRCLE_RADIUS: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Output of the transform stage and input of every shading variant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InterpolatedRecord {
    /// Clip-space position.
    pub clip_position: Vec4,
    /// Transformed normal. Not renormalized.
    pub normal: Vec3,
    /// Premultiplied RGBA.
    pub color: Vec4,
    /// Position within a point-marker quad, in [-1, 1]².
    pub local_position: Vec2,
}

impl InterpolatedRecord {
    /// Linearly interpolates three records with barycentric `weights`.
    ///
    /// The weights are used as given; they are expected to sum to one.
    pub fn interpolate(corners: [&InterpolatedRecord; 3], weights: Vec3) -> InterpolatedRecord {
        let [a, b, c] = corners;
        InterpolatedRecord {
            clip_position: a.clip_position * weights.x
                + b.clip_position * weights.y
                + c.clip_position * weights.z,
            normal: a.normal * weights.x + b.normal * weights.y + c.normal * weights.z,
            color: a.color * weights.x + b.color * weights.y + c.color * weights.z,
            local_position: a.local_position * weights.x
                + b.local_position * weights.y
                + c.local_position * weights.z,
        }
    }
}

/// Runs the transform stage for one vertex.
///
/// Pure and infallible: a degenerate matrix yields degenerate output.
pub fn transform_vertex(
    uniforms: &Uniforms,
    vertex: &Vertex,
    vertex_index: u32,
) -> InterpolatedRecord {
    let position = Vec3::from(vertex.position);
    let normal = Vec3::from(vertex.normal);
    let color = Vec4::from(vertex.color);

    let clip_position = uniforms.transform() * position.extend(1.0);
    let normal = (uniforms.transform_normals() * normal.extend(0.0)).truncate();
    let color = (color.truncate() * color.w).extend(color.w);

    InterpolatedRecord {
        clip_position,
        normal,
        color,
        local_position: local_position(vertex_index),
    }
}

/// Corner role of a vertex inside its point-marker quad.
pub fn local_position(vertex_index: u32) -> Vec2 {
    match vertex_index % 6 {
        0 | 4 => Vec2::new(1.0, 0.0),
        1 | 3 => Vec2::new(-1.0, 0.0),
        2 => Vec2::new(0.0, 1.0),
        5 => Vec2::new(0.0, -1.0),
        // `% 6` never lands here; the shader leaves the zeroed default.
        _ => Vec2::ZERO,
    }
}

/// `0` if `x < edge`, `1` otherwise. Equality passes.
pub fn step(edge: f32, x: f32) -> f32 {
    if x < edge { 0.0 } else { 1.0 }
}

/// The four rendering intents of the viewer, selected once per draw call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderVariant {
    /// Solid faces with a single, linear-in-angle light falloff.
    Model,
    /// Wireframe drawn in the inverse of the face color.
    Mesh,
    /// Line segments, color passed through.
    Lines,
    /// Point markers masked to a disc.
    Circles,
}

impl ShaderVariant {
    pub const ALL: [ShaderVariant; 4] = [
        ShaderVariant::Model,
        ShaderVariant::Mesh,
        ShaderVariant::Lines,
        ShaderVariant::Circles,
    ];

    /// Entry point of the transform stage in `shader.wgsl`.
    pub const VERTEX_ENTRY_POINT: &'static str = "vs_main";

    pub fn name(self) -> &'static str {
        match self {
            ShaderVariant::Model => "model",
            ShaderVariant::Mesh => "mesh",
            ShaderVariant::Lines => "lines",
            ShaderVariant::Circles => "circles",
        }
    }

    /// Fragment entry point in `shader.wgsl`.
    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderVariant::Model => "frag_model",
            ShaderVariant::Mesh => "frag_mesh",
            ShaderVariant::Lines => "frag_lines",
            ShaderVariant::Circles => "frag_circles",
        }
    }

    /// Primitive topology of the stream this variant is drawn with.
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            ShaderVariant::Model | ShaderVariant::Circles => wgpu::PrimitiveTopology::TriangleList,
            ShaderVariant::Mesh | ShaderVariant::Lines => wgpu::PrimitiveTopology::LineList,
        }
    }

    /// Shades one interpolated record. The result is premultiplied.
    pub fn shade(self, record: &InterpolatedRecord) -> Vec4 {
        match self {
            ShaderVariant::Model => shade_model(record),
            ShaderVariant::Mesh => shade_mesh(record),
            ShaderVariant::Lines => record.color,
            ShaderVariant::Circles => shade_circles(record),
        }
    }
}

// Linear in angle rather than the cosine law. That is the intended look.
fn shade_model(record: &InterpolatedRecord) -> Vec4 {
    let angle = LIGHT_DIRECTION.dot(-record.normal).acos();
    let f_angle = angle / std::f32::consts::FRAC_PI_2;
    let f_normal = (1.0 - f_angle).max(0.0);

    (record.color.truncate() * f_normal).extend(record.color.w)
}

fn shade_mesh(record: &InterpolatedRecord) -> Vec4 {
    (Vec3::ONE - record.color.truncate()).extend(record.color.w)
}

fn shade_circles(record: &InterpolatedRecord) -> Vec4 {
    let d = record.local_position.length();
    record
        .color
        .truncate()
        .extend(record.color.w * step(d, CIRCLE_RADIUS))
}

impl fmt::Display for ShaderVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names none of the four variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVariantError(String);

impl fmt::Display for ParseVariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown shading variant '{}' (expected model, mesh, lines or circles)",
            self.0
        )
    }
}

impl std::error::Error for ParseVariantError {}

impl FromStr for ShaderVariant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShaderVariant::ALL
            .into_iter()
            .find(|variant| variant.name() == s)
            .ok_or_else(|| ParseVariantError(s.to_string()))
    }
}
