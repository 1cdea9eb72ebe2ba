//! Host side of the shading pipeline: buffers, pipelines and the frame loop.
//!
//! The renderer owns one uniform buffer, one vertex buffer per stream and one
//! render pipeline per [`ShaderVariant`]. All four pipelines share the shader
//! module, the vertex layout and the bind group; they differ in fragment entry
//! point, topology and depth test.
//!
//! # Blending
//!
//! The shading variants output premultiplied color, so every pipeline blends
//! with `src=ONE, dst=ONE_MINUS_SRC_ALPHA`. The standard alpha blend would
//! multiply by alpha a second time.
//!
//! # Frame
//!
//! ```ignore
//! renderer.update_stream(&gpu, ShaderVariant::Model, faces.as_slice());
//! renderer.draw(&gpu, &camera.uniforms(gpu.aspect()), &DrawConfig::default())?;
//! ```

use std::fmt;

use wgpu::util::DeviceExt as _;

use crate::config::DrawConfig;
use crate::gpu::GpuContext;
use crate::shading::ShaderVariant;
use crate::uniforms::Uniforms;
use crate::vertices::Vertex;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Blend state for premultiplied-alpha output.
pub fn premultiplied_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// Depth test for a variant. Overlays pass on equal depth so they sit on top of faces.
fn depth_compare(variant: ShaderVariant) -> wgpu::CompareFunction {
    match variant {
        ShaderVariant::Model => wgpu::CompareFunction::Less,
        ShaderVariant::Mesh | ShaderVariant::Lines | ShaderVariant::Circles => {
            wgpu::CompareFunction::LessEqual
        }
    }
}

/// The frame could not be drawn.
#[derive(Debug)]
pub struct DrawError(pub wgpu::SurfaceError);

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to acquire surface texture: {}", self.0)
    }
}

impl std::error::Error for DrawError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// A vertex buffer and the number of vertices in it.
struct Stream {
    buffer: Option<wgpu::Buffer>,
    len: u32,
}

impl Stream {
    fn empty() -> Self {
        Self {
            buffer: None,
            len: 0,
        }
    }
}

/// One pipeline and one stream per variant, indexed by [`ShaderVariant`].
struct PerVariant<T>([T; 4]);

impl<T> PerVariant<T> {
    fn new(mut f: impl FnMut(ShaderVariant) -> T) -> Self {
        Self(ShaderVariant::ALL.map(&mut f))
    }

    fn get(&self, variant: ShaderVariant) -> &T {
        &self.0[variant as usize]
    }

    fn get_mut(&mut self, variant: ShaderVariant) -> &mut T {
        &mut self.0[variant as usize]
    }
}

/// Draws the four streams with their shading variants.
pub struct Renderer {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipelines: PerVariant<wgpu::RenderPipeline>,
    streams: PerVariant<Stream>,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    clear_color: wgpu::Color,
}

impl Renderer {
    /// Creates the shader module, the four pipelines and the uniform binding.
    ///
    /// `clear_color` is expected premultiplied.
    pub fn new(gpu: &GpuContext, clear_color: wgpu::Color) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Vista Shader"),
            source: wgpu::ShaderSource::Wgsl(crate::SHADER_SOURCE.into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniforms"),
            contents: bytemuck::cast_slice(&[Uniforms::identity()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniforms Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(Uniforms::SIZE),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniforms Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Vista Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipelines = PerVariant::new(|variant| {
            log::debug!(
                "creating '{}' pipeline ({}, {:?})",
                variant,
                variant.entry_point(),
                variant.topology()
            );
            create_pipeline(gpu, &pipeline_layout, &shader, variant)
        });

        let depth_view = create_depth_view(gpu);

        Self {
            uniform_buffer,
            bind_group,
            pipelines,
            streams: PerVariant::new(|_| Stream::empty()),
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
            clear_color,
        }
    }

    /// Replaces the vertex stream drawn by `variant`.
    ///
    /// An empty slice clears the stream; the variant is then skipped.
    pub fn update_stream(&mut self, gpu: &GpuContext, variant: ShaderVariant, vertices: &[Vertex]) {
        let stream = self.streams.get_mut(variant);

        if vertices.is_empty() {
            *stream = Stream::empty();
            return;
        }

        let buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(variant.name()),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        log::trace!("uploaded {} vertices for '{}'", vertices.len(), variant);
        *stream = Stream {
            buffer: Some(buffer),
            len: vertices.len() as u32,
        };
    }

    /// Recreates the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// Uploads `uniforms` and draws every enabled, non-empty stream.
    pub fn draw(
        &mut self,
        gpu: &GpuContext,
        uniforms: &Uniforms,
        config: &DrawConfig,
    ) -> Result<(), DrawError> {
        self.ensure_depth_size(gpu);

        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));

        let output = gpu.surface.get_current_texture().map_err(DrawError)?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Vista Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Vista Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.bind_group, &[]);

            for variant in config.variants() {
                let stream = self.streams.get(variant);
                let Some(buffer) = &stream.buffer else {
                    continue;
                };

                render_pass.set_pipeline(self.pipelines.get(variant));
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..stream.len, 0..1);
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_pipeline(
    gpu: &GpuContext,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    variant: ShaderVariant,
) -> wgpu::RenderPipeline {
    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(variant.name()),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(ShaderVariant::VERTEX_ENTRY_POINT),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(variant.entry_point()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(premultiplied_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: variant.topology(),
                // Imported faces come with either winding.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: depth_compare(variant),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
}

fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::composite;
    use glam::Vec4;

    #[test]
    fn blend_is_premultiplied_over() {
        let blend = premultiplied_blend();
        for component in [blend.color, blend.alpha] {
            assert_eq!(component.src_factor, wgpu::BlendFactor::One);
            assert_eq!(component.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
            assert_eq!(component.operation, wgpu::BlendOperation::Add);
        }
        assert_ne!(blend, wgpu::BlendState::ALPHA_BLENDING);

        // Same operator the CPU composite applies.
        let src = Vec4::new(0.25, 0.0, 0.0, 0.5);
        let dst = Vec4::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(composite(src, dst), Vec4::new(0.25, 0.0, 0.5, 1.0));
    }

    #[test]
    fn overlays_win_depth_ties() {
        assert_eq!(
            depth_compare(ShaderVariant::Model),
            wgpu::CompareFunction::Less
        );
        for variant in [
            ShaderVariant::Mesh,
            ShaderVariant::Lines,
            ShaderVariant::Circles,
        ] {
            assert_eq!(depth_compare(variant), wgpu::CompareFunction::LessEqual);
        }
    }

    #[test]
    fn per_variant_indexes_by_discriminant() {
        let names = PerVariant::new(|variant| variant.name());
        for variant in ShaderVariant::ALL {
            assert_eq!(*names.get(variant), variant.name());
        }
    }
}
