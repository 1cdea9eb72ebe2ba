//! Sequential dispatch of the pipeline on the CPU.
//!
//! The GPU runs one invocation per vertex and one per covered pixel with no
//! ordering between them. Since every invocation is a pure function of its own
//! inputs, looping over them in order gives the same numbers.

use glam::Vec4;

use crate::shading::{InterpolatedRecord, ShaderVariant, transform_vertex};
use crate::uniforms::Uniforms;
use crate::vertices::Vertex;

/// Runs the transform stage over a whole stream. Vertex indices are stream positions.
pub fn run_vertex_stage(uniforms: &Uniforms, vertices: &[Vertex]) -> Vec<InterpolatedRecord> {
    vertices
        .iter()
        .enumerate()
        .map(|(index, vertex)| transform_vertex(uniforms, vertex, index as u32))
        .collect()
}

/// Shades a set of already-interpolated fragments with one variant.
pub fn run_fragment_stage(variant: ShaderVariant, fragments: &[InterpolatedRecord]) -> Vec<Vec4> {
    fragments.iter().map(|record| variant.shade(record)).collect()
}

/// Premultiplied "over": `src + dst * (1 - src.a)`.
///
/// This is the blend the renderer configures (`src=ONE, dst=ONE_MINUS_SRC_ALPHA`).
pub fn composite(src: Vec4, dst: Vec4) -> Vec4 {
    src + dst * (1.0 - src.w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::CIRCLE_RADIUS;
    use crate::vertices::Vertices;
    use glam::{Mat4, Vec2, Vec3};

    #[test]
    fn end_to_end_identity_face() {
        let vertex = Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0, 0.5]);
        let records = run_vertex_stage(&Uniforms::identity(), &[vertex]);

        let record = records[0];
        assert_eq!(record.clip_position, Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(record.normal, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(record.color, Vec4::new(0.5, 0.0, 0.0, 0.5));
        assert_eq!(record.local_position, Vec2::new(1.0, 0.0));

        let colors = run_fragment_stage(ShaderVariant::Model, &records);
        assert_eq!(colors, vec![Vec4::new(0.5, 0.0, 0.0, 0.5)]);
    }

    #[test]
    fn vertex_stage_numbers_by_stream_position() {
        let mut points = Vertices::new();
        points
            .push_point(Vec3::ZERO, Vec3::X, Vec3::Y, Vec4::ONE)
            .unwrap();
        points
            .push_point(Vec3::ONE, Vec3::X, Vec3::Y, Vec4::ONE)
            .unwrap();

        let records = run_vertex_stage(&Uniforms::identity(), points.as_slice());
        assert_eq!(records.len(), 12);

        // Corner roles agree with the positions the builder emitted, for both markers.
        for (record, vertex) in records.iter().zip(points.as_slice()) {
            let offset = Vec3::from(vertex.position) - record.clip_position.truncate();
            assert_eq!(offset, Vec3::ZERO);
        }
        for marker in records.chunks_exact(6) {
            for (record, vertex) in marker.iter().zip(points.as_slice()) {
                assert_eq!(record.local_position.x, vertex.position[0]);
                assert_eq!(record.local_position.y, vertex.position[1]);
            }
        }
    }

    #[test]
    fn point_marker_draws_inscribed_disc() {
        let mut points = Vertices::new();
        points
            .push_point(Vec3::ZERO, Vec3::X, Vec3::Y, Vec4::new(0.0, 1.0, 0.0, 1.0))
            .unwrap();
        let records = run_vertex_stage(&Uniforms::identity(), points.as_slice());

        // First triangle: +right, -right, +up.
        let tri = [&records[0], &records[1], &records[2]];
        let center = InterpolatedRecord::interpolate(tri, Vec3::new(0.5, 0.5, 0.0));
        let near_apex = InterpolatedRecord::interpolate(tri, Vec3::new(0.05, 0.05, 0.9));

        let shaded = run_fragment_stage(ShaderVariant::Circles, &[center, near_apex]);
        assert_eq!(shaded[0].w, 1.0);
        assert_eq!(shaded[1].w, 0.0);
        assert!(near_apex.local_position.length() > CIRCLE_RADIUS);
    }

    #[test]
    fn wireframe_inverts_premultiplied_color() {
        let mut faces = Vertices::new();
        faces.push_triangle(
            [Vec3::ZERO, Vec3::X, Vec3::Y],
            Vec3::Z,
            Vec4::new(0.4, 0.6, 0.8, 0.5),
        );
        let edges = faces.wireframe();

        let records = run_vertex_stage(&Uniforms::from_transform(Mat4::IDENTITY), edges.as_slice());
        for color in run_fragment_stage(ShaderVariant::Mesh, &records) {
            assert!(color.abs_diff_eq(Vec4::new(0.8, 0.7, 0.6, 0.5), 1e-6), "{color}");
        }
    }

    #[test]
    fn composite_is_premultiplied_over() {
        let background = Vec4::new(1.0, 1.0, 1.0, 1.0);

        let opaque = Vec4::new(0.2, 0.3, 0.4, 1.0);
        assert_eq!(composite(opaque, background), opaque);

        let transparent = Vec4::new(0.7, 0.7, 0.7, 0.0);
        let masked = composite(transparent * Vec4::new(0.0, 0.0, 0.0, 1.0), background);
        assert_eq!(masked, background);

        let half = Vec4::new(0.5, 0.0, 0.0, 0.5);
        assert_eq!(composite(half, background), Vec4::new(1.0, 0.5, 0.5, 1.0));
    }
}
