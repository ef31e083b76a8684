//! The single material shared by every tile slot

use super::template::*;
use crate::backend::traits::*;
use crate::backend::types::*;
use crate::batch::store::GeometryStore;
use crate::batch::texture_array::TextureArrayStore;
use crate::batch::BatchResult;
use glam::Mat4;

/// Material drawing all slots: array texture sampled by a flat slot varying,
/// per-slot transforms from a storage buffer
///
/// Debug color mode swaps the fragment stage for the per-vertex debug color
/// stream; everything else (bindings, inputs, transforms) stays identical, so
/// toggling it only rebuilds the pipeline.
pub struct SharedMaterial {
    layout: BindGroupLayoutHandle,
    bind_group: BindGroupHandle,
    pipeline: RenderPipelineHandle,
    camera_buffer: BufferHandle,
    target_format: TextureFormat,
    debug_colors: bool,
    transparent: bool,
}

impl SharedMaterial {
    pub fn new<B: GraphicsBackend>(
        backend: &mut B,
        store: &GeometryStore,
        textures: &TextureArrayStore,
        target_format: TextureFormat,
        transparent: bool,
    ) -> BatchResult<Self> {
        let camera_buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("Tile Camera Buffer".into()),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        })?;

        let layout = backend.create_bind_group_layout(&[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStageFlags::VERTEX,
                ty: BindingType::UniformBuffer,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStageFlags::VERTEX,
                ty: BindingType::StorageBuffer { read_only: true },
            },
            BindGroupLayoutEntry {
                binding: 2,
                visibility: ShaderStageFlags::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    dimension: TextureViewDimension::D2Array,
                },
            },
            BindGroupLayoutEntry {
                binding: 3,
                visibility: ShaderStageFlags::FRAGMENT,
                ty: BindingType::Sampler { comparison: false },
            },
        ])?;

        let bind_group = backend.create_bind_group(
            layout,
            &[
                (
                    0,
                    BindGroupEntry::Buffer {
                        buffer: camera_buffer,
                        offset: 0,
                        size: None,
                    },
                ),
                (
                    1,
                    BindGroupEntry::Buffer {
                        buffer: store.transform_buffer(),
                        offset: 0,
                        size: None,
                    },
                ),
                (2, BindGroupEntry::Texture(textures.view())),
                (3, BindGroupEntry::Sampler(textures.sampler())),
            ],
        )?;

        let pipeline =
            Self::build_pipeline(backend, layout, target_format, false, transparent)?;

        Ok(Self {
            layout,
            bind_group,
            pipeline,
            camera_buffer,
            target_format,
            debug_colors: false,
            transparent,
        })
    }

    /// Slot extension merged onto the base template
    fn slot_extension(debug_colors: bool) -> ShadingTemplate {
        let fragment = if debug_colors {
            "color = in.color;"
        } else {
            "color = textureSample(tile_textures, tile_sampler, in.uv, i32(in.slot));"
        };

        ShadingTemplate {
            declarations: Vec::new(),
            bindings: vec![
                BindingDecl::Texture2dArray {
                    group: 0,
                    binding: 2,
                    name: "tile_textures".to_string(),
                },
                BindingDecl::Sampler {
                    group: 0,
                    binding: 3,
                    name: "tile_sampler".to_string(),
                },
            ],
            vertex_inputs: vec![
                VertexInputDecl {
                    name: "slot_id".to_string(),
                    location: 3,
                    ty: WgslType::U32,
                },
                VertexInputDecl {
                    name: "color".to_string(),
                    location: 4,
                    ty: WgslType::Vec4F,
                },
            ],
            varyings: vec![
                VaryingDecl {
                    name: "slot".to_string(),
                    location: 2,
                    ty: WgslType::U32,
                    interpolation: Interpolation::Flat,
                },
                VaryingDecl {
                    name: "color".to_string(),
                    location: 3,
                    ty: WgslType::Vec4F,
                    interpolation: Interpolation::Perspective,
                },
            ],
            vertex_stage: vec![
                "let model = slot_transforms[input.slot_id];".to_string(),
                "out.clip_position = camera.view_proj * model * vec4<f32>(input.position, 1.0);"
                    .to_string(),
                "out.slot = input.slot_id;".to_string(),
                "out.color = input.color;".to_string(),
            ],
            fragment_stage: vec![fragment.to_string()],
        }
    }

    fn build_pipeline<B: GraphicsBackend>(
        backend: &mut B,
        layout: BindGroupLayoutHandle,
        target_format: TextureFormat,
        debug_colors: bool,
        transparent: bool,
    ) -> BatchResult<RenderPipelineHandle> {
        let mut template = ShadingTemplate::tile_base();
        template
            .merge(Self::slot_extension(debug_colors))
            .map_err(BackendError::PipelineCreationFailed)?;

        let pipeline = backend.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Tile Pipeline".into()),
            shader: template.to_wgsl(),
            vertex_layouts: vec![
                TileVertex::layout(),
                slot_id_stream_layout(),
                debug_color_stream_layout(),
            ],
            bind_group_layouts: vec![layout],
            primitive_topology: PrimitiveTopology::TriangleList,
            front_face: FrontFace::Ccw,
            // Tiles are viewed from both sides while streaming in
            cull_mode: CullMode::None,
            depth_stencil: Some(DepthStencilState {
                format: TextureFormat::Depth32Float,
                depth_write_enabled: !transparent,
                depth_compare: CompareFunction::LessEqual,
            }),
            color_targets: vec![ColorTargetState {
                format: target_format,
                blend: transparent.then(BlendState::alpha_blending),
                write_mask: ColorWrites::ALL,
            }],
        })?;

        Ok(pipeline)
    }

    /// Switch between textured and debug color shading
    pub fn set_debug_colors<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        enabled: bool,
    ) -> BatchResult<()> {
        if self.debug_colors == enabled {
            return Ok(());
        }
        self.pipeline = Self::build_pipeline(
            backend,
            self.layout,
            self.target_format,
            enabled,
            self.transparent,
        )?;
        self.debug_colors = enabled;
        Ok(())
    }

    pub fn debug_colors(&self) -> bool {
        self.debug_colors
    }

    pub fn transparent(&self) -> bool {
        self.transparent
    }

    pub fn update_camera<B: GraphicsBackend>(&self, backend: &mut B, view_proj: Mat4) {
        let uniform = CameraUniform { view_proj };
        backend.write_buffer(self.camera_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Bind pipeline, resources and the shared geometry streams
    pub fn encode_bind<B: GraphicsBackend>(&self, backend: &mut B, store: &GeometryStore) {
        backend.set_render_pipeline(self.pipeline);
        backend.set_bind_group(0, self.bind_group);
        backend.set_vertex_buffer(0, store.vertex_buffer(), 0);
        backend.set_vertex_buffer(1, store.slot_id_buffer(), 0);
        backend.set_vertex_buffer(2, store.color_buffer(), 0);
        backend.set_index_buffer(store.index_buffer(), 0, IndexFormat::Uint32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composed(debug: bool) -> String {
        let mut template = ShadingTemplate::tile_base();
        template.merge(SharedMaterial::slot_extension(debug)).unwrap();
        template.to_wgsl()
    }

    #[test]
    fn textured_mode_samples_the_array_by_slot() {
        let wgsl = composed(false);
        assert!(wgsl.contains("var tile_textures: texture_2d_array<f32>;"));
        assert!(wgsl.contains("@interpolate(flat) slot: u32"));
        assert!(wgsl.contains(
            "color = textureSample(tile_textures, tile_sampler, in.uv, i32(in.slot));"
        ));
    }

    #[test]
    fn debug_mode_uses_the_color_varying() {
        let wgsl = composed(true);
        assert!(wgsl.contains("color = in.color;"));
        assert!(!wgsl.contains("textureSample"));
        // Bindings and inputs are identical in both modes
        assert!(wgsl.contains("var tile_textures: texture_2d_array<f32>;"));
        assert!(wgsl.contains("@location(4) color: vec4<f32>"));
    }

    #[test]
    fn transforms_drive_the_clip_position() {
        let wgsl = composed(false);
        assert!(wgsl.contains("let model = slot_transforms[input.slot_id];"));
        let base = wgsl
            .find("out.clip_position = camera.view_proj * vec4<f32>(input.position, 1.0);")
            .unwrap();
        let slotted = wgsl
            .find("out.clip_position = camera.view_proj * model * vec4<f32>(input.position, 1.0);")
            .unwrap();
        // The slotted assignment runs later and wins
        assert!(slotted > base);
    }
}
