//! # Vista
//!
//! **The shading pipeline of a small 3D model viewer.**
//!
//! One vertex stage and four fragment variants turn model faces, wireframe
//! edges, line segments and point markers into premultiplied pixels:
//!
//! | Variant   | Primitive        | Output                                   |
//! |-----------|------------------|------------------------------------------|
//! | `model`   | triangle list    | color dimmed linearly with light angle   |
//! | `mesh`    | line list        | inverted color                           |
//! | `lines`   | line list        | color as is                              |
//! | `circles` | 6-vertex markers | color, alpha masked to an inscribed disc |
//!
//! The GPU version lives in `shader.wgsl` ([`SHADER_SOURCE`]). The same math is
//! available on the CPU through [`transform_vertex`] and [`ShaderVariant::shade`],
//! which is what the tests check the contract against.
//!
//! ## Quick Start
//!
//! ```
//! use vista::*;
//!
//! let model = Model::cube();
//! let uniforms = OrbitCamera::new().uniforms(4.0 / 3.0);
//!
//! let records = run_vertex_stage(&uniforms, model.faces().as_slice());
//! let colors = run_fragment_stage(ShaderVariant::Model, &records);
//! assert_eq!(colors.len(), 36);
//! ```
//!
//! Colors leave the pipeline premultiplied; composite them with
//! `src=ONE, dst=ONE_MINUS_SRC_ALPHA` ([`premultiplied_blend`]).

mod camera;
mod config;
mod geometry;
mod gpu;
pub mod logging;
mod reference;
mod renderer;
mod shading;
mod uniforms;
mod vertices;

/// WGSL source of the vertex stage and the four fragment variants.
pub const SHADER_SOURCE: &str = include_str!("shader.wgsl");

pub use camera::OrbitCamera;
pub use config::{DrawConfig, ViewerConfig};
pub use geometry::{GeometryError, Model, Triangle};
pub use gpu::{GpuContext, InitError, SurfaceAction};
pub use logging::{LoggingConfig, init_logging};
pub use reference::{composite, run_fragment_stage, run_vertex_stage};
pub use renderer::{DrawError, Renderer, premultiplied_blend};
pub use shading::{
    CIRCLE_RADIUS, InterpolatedRecord, LIGHT_DIRECTION, ParseVariantError, ShaderVariant,
    local_position, step, transform_vertex,
};
pub use uniforms::Uniforms;
pub use vertices::{VERTICES_PER_POINT, Vertex, Vertices, VerticesError};

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_wgsl_parses() {
        naga::front::wgsl::parse_str(SHADER_SOURCE).expect("shader.wgsl failed to parse");
    }

    #[test]
    fn shader_validates() {
        let module = naga::front::wgsl::parse_str(SHADER_SOURCE).unwrap();
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .expect("shader.wgsl failed validation");
    }

    #[test]
    fn shader_exposes_every_entry_point() {
        let module = naga::front::wgsl::parse_str(SHADER_SOURCE).unwrap();
        let stage_of = |name: &str| {
            module
                .entry_points
                .iter()
                .find(|ep| ep.name == name)
                .map(|ep| ep.stage)
        };

        assert_eq!(
            stage_of(ShaderVariant::VERTEX_ENTRY_POINT),
            Some(naga::ShaderStage::Vertex)
        );
        for variant in ShaderVariant::ALL {
            assert_eq!(
                stage_of(variant.entry_point()),
                Some(naga::ShaderStage::Fragment),
                "{variant}"
            );
        }
        assert_eq!(module.entry_points.len(), 1 + ShaderVariant::ALL.len());
    }

    #[test]
    fn shader_uniform_block_matches_host() {
        let module = naga::front::wgsl::parse_str(SHADER_SOURCE).unwrap();
        let (_, global) = module
            .global_variables
            .iter()
            .find(|(_, var)| var.name.as_deref() == Some("uniforms"))
            .expect("no uniform block");

        let binding = global.binding.as_ref().expect("uniform block is unbound");
        assert_eq!((binding.group, binding.binding), (0, 0));

        match &module.types[global.ty].inner {
            naga::TypeInner::Struct { members, span } => {
                assert_eq!(*span as u64, Uniforms::SIZE);
                let offsets: Vec<u32> = members.iter().map(|m| m.offset).collect();
                assert_eq!(offsets, vec![0, 64]);
            }
            other => panic!("uniform block is not a struct: {other:?}"),
        }
    }
}
