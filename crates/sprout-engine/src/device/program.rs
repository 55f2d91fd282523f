use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::backend::{
    attribute_location, ShaderProgram, UniformValue, UNIFORM_DIMENSIONS, UNIFORM_ROTATION,
    UNIFORM_TRANSLATION,
};
use crate::buffers::Rotation;
use crate::error::RenderError;

use super::texture;

/// Uniform block shared by both sprite stages. Matches `SpriteUniforms` in WGSL.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct SpriteUniforms {
    pub rot: [f32; 4],
    pub trans: [f32; 2],
    pub dim: [f32; 2],
}

impl Default for SpriteUniforms {
    fn default() -> Self {
        Self {
            rot: Rotation::IDENTITY.to_array(),
            trans: [0.0; 2],
            dim: [1.0; 2],
        }
    }
}

impl SpriteUniforms {
    /// Writes `value` into the field named `name`, checking its type.
    pub(crate) fn set(&mut self, name: &str, value: UniformValue) -> Result<(), RenderError> {
        match (name, value) {
            (UNIFORM_ROTATION, UniformValue::Vec4(v)) => self.rot = v,
            (UNIFORM_TRANSLATION, UniformValue::Vec2(v)) => self.trans = v,
            (UNIFORM_DIMENSIONS, UniformValue::Vec2(v)) => self.dim = v,
            (UNIFORM_ROTATION, _) => return Err(type_error(name, "vec4")),
            (UNIFORM_TRANSLATION | UNIFORM_DIMENSIONS, _) => return Err(type_error(name, "vec2")),
            _ => return Err(RenderError::UnknownUniform(name.to_string())),
        }
        Ok(())
    }
}

fn type_error(name: &str, expected: &'static str) -> RenderError {
    RenderError::UniformType {
        name: name.to_string(),
        expected,
    }
}

/// Render pipeline and uniform bindings of one compiled program.
#[derive(Debug)]
pub(crate) struct ProgramResource {
    pub id: u64,
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
}

/// A compiled sprite program.
///
/// Uniform writes are kept on the CPU and reach the GPU on `use_program`.
#[derive(Debug)]
pub struct WgpuProgram {
    pub(crate) gpu: Arc<ProgramResource>,
    queue: wgpu::Queue,
    uniforms: SpriteUniforms,
    dirty: bool,
}

impl WgpuProgram {
    pub(crate) fn new(gpu: ProgramResource, queue: wgpu::Queue) -> Self {
        Self {
            gpu: Arc::new(gpu),
            queue,
            uniforms: SpriteUniforms::default(),
            dirty: true,
        }
    }

    pub fn id(&self) -> u64 {
        self.gpu.id
    }
}

impl ShaderProgram for WgpuProgram {
    fn use_program(&mut self) {
        if !self.dirty {
            return;
        }
        self.queue
            .write_buffer(&self.gpu.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
        self.dirty = false;
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), RenderError> {
        self.uniforms.set(name, value)?;
        self.dirty = true;
        Ok(())
    }

    fn bind_attribute(&mut self, name: &str) -> Result<u32, RenderError> {
        attribute_location(name).ok_or_else(|| RenderError::UnknownAttribute(name.to_string()))
    }
}

/// Bind group layout for the uniform block (group 0).
pub(crate) fn uniform_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("sprout uniform bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(
                    std::mem::size_of::<SpriteUniforms>() as u64
                ),
            },
            count: None,
        }],
    })
}

/// Vertex buffer layouts, one buffer per attribute, slot == location.
pub(crate) fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 3] {
    const POSITION: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
    const TEX_COORD: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];
    const ROTATION_GROUP: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x4];

    let layout = |stride: usize, attributes: &'static [wgpu::VertexAttribute]| {
        wgpu::VertexBufferLayout {
            array_stride: stride as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    };
    [
        layout(std::mem::size_of::<[f32; 2]>(), &POSITION),
        layout(std::mem::size_of::<[f32; 2]>(), &TEX_COORD),
        layout(std::mem::size_of::<Rotation>(), &ROTATION_GROUP),
    ]
}

/// Layouts shared by every sprite program: uniforms in group 0, texture and
/// sampler in group 1.
#[derive(Debug)]
pub(crate) struct SpriteLayouts {
    pub uniform: wgpu::BindGroupLayout,
    pub texture: wgpu::BindGroupLayout,
    pub pipeline: wgpu::PipelineLayout,
}

impl SpriteLayouts {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let uniform = uniform_bind_group_layout(device);
        let texture = texture::texture_bind_group_layout(device);
        let pipeline = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprout sprite pipeline layout"),
            bind_group_layouts: &[&uniform, &texture],
            immediate_size: 0,
        });
        Self {
            uniform,
            texture,
            pipeline,
        }
    }
}

/// Compiles both stages, links the sprite pipeline and creates its uniform
/// buffer.
///
/// WGSL and pipeline errors come back as [`RenderError::Shader`] instead of
/// reaching wgpu's uncaptured error handler.
pub(crate) fn build(
    device: &wgpu::Device,
    layouts: &SpriteLayouts,
    format: wgpu::TextureFormat,
    id: u64,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<ProgramResource, RenderError> {
    check_entry_point("vertex", vertex_src, "vs_main")?;
    check_entry_point("fragment", fragment_src, "fs_main")?;

    let vertex = validated(device, "vertex", || {
        shader_module(device, "sprout sprite vertex", vertex_src)
    })?;
    let fragment = validated(device, "fragment", || {
        shader_module(device, "sprout sprite fragment", fragment_src)
    })?;
    let pipeline = validated(device, "pipeline", || {
        render_pipeline(device, layouts, format, &vertex, &fragment)
    })?;

    let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("sprout sprite ubo"),
        size: std::mem::size_of::<SpriteUniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("sprout sprite uniform bind group"),
        layout: &layouts.uniform,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });

    Ok(ProgramResource {
        id,
        pipeline,
        uniform_buffer,
        uniform_bind_group,
    })
}

/// Runs `f` inside a validation error scope and reports what it captured.
fn validated<T>(
    device: &wgpu::Device,
    stage: &'static str,
    f: impl FnOnce() -> T,
) -> Result<T, RenderError> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let out = f();
    match pollster::block_on(scope.pop()) {
        None => Ok(out),
        Some(err) => {
            log::debug!("wgpu rejected sprite {stage}: {err}");
            Err(RenderError::Shader {
                stage,
                message: err.to_string(),
            })
        }
    }
}

fn shader_module(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

fn render_pipeline(
    device: &wgpu::Device,
    layouts: &SpriteLayouts,
    format: wgpu::TextureFormat,
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    let buffers = vertex_layouts();
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("sprout sprite pipeline"),
        layout: Some(&layouts.pipeline),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// Rejects sources that cannot provide the entry point the pipeline needs.
///
/// Everything else is checked by wgpu in [`build`].
pub(crate) fn check_entry_point(
    stage: &'static str,
    source: &str,
    entry_point: &str,
) -> Result<(), RenderError> {
    if source.trim().is_empty() {
        return Err(RenderError::Shader {
            stage,
            message: "empty source".to_string(),
        });
    }
    if !source.contains(&format!("fn {entry_point}")) {
        return Err(RenderError::Shader {
            stage,
            message: format!("missing entry point `{entry_point}`"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_is_32_bytes() {
        assert_eq!(std::mem::size_of::<SpriteUniforms>(), 32);
    }

    #[test]
    fn uniforms_check_name_and_type() {
        let mut u = SpriteUniforms::default();
        u.set("trans", UniformValue::Vec2([0.5, 0.25])).unwrap();
        assert_eq!(u.trans, [0.5, 0.25]);

        assert!(matches!(
            u.set("rot", UniformValue::Vec2([0.0, 0.0])),
            Err(RenderError::UniformType { expected: "vec4", .. })
        ));
        assert!(matches!(
            u.set("scale", UniformValue::Float(1.0)),
            Err(RenderError::UnknownUniform(_))
        ));
    }

    #[test]
    fn builtin_shaders_have_their_entry_points() {
        check_entry_point("vertex", crate::device::SPRITE_VERTEX_WGSL, "vs_main").unwrap();
        check_entry_point("fragment", crate::device::SPRITE_FRAGMENT_WGSL, "fs_main").unwrap();
    }

    #[test]
    fn missing_entry_point_is_a_shader_error() {
        let err = check_entry_point("fragment", "fn main() {}", "fs_main").unwrap_err();
        assert!(matches!(err, RenderError::Shader { stage: "fragment", .. }));
    }

    // ── pipeline build (needs an adapter) ─────────────────────────────────

    const TARGET: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Windowless device, or `None` on machines without any adapter.
    fn test_device() -> Option<wgpu::Device> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
                .ok()?;
        let (device, _queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()?;
        Some(device)
    }

    #[test]
    fn builtin_shaders_build_a_pipeline() {
        let Some(device) = test_device() else {
            eprintln!("no adapter, skipping");
            return;
        };
        let layouts = SpriteLayouts::new(&device);
        let vertex = crate::device::SPRITE_VERTEX_WGSL;
        let fragment = crate::device::SPRITE_FRAGMENT_WGSL;
        let program = build(&device, &layouts, TARGET, 7, vertex, fragment).unwrap();
        assert_eq!(program.id, 7);
    }

    #[test]
    fn malformed_wgsl_is_a_shader_error() {
        let Some(device) = test_device() else {
            eprintln!("no adapter, skipping");
            return;
        };
        let layouts = SpriteLayouts::new(&device);
        let broken = "@vertex fn vs_main( -> @builtin(position) vec4<f32> {";
        let fragment = crate::device::SPRITE_FRAGMENT_WGSL;

        let err = build(&device, &layouts, TARGET, 1, broken, fragment).unwrap_err();
        assert!(matches!(err, RenderError::Shader { stage: "vertex", .. }));
    }

    #[test]
    fn mistyped_wgsl_is_a_shader_error() {
        let Some(device) = test_device() else {
            eprintln!("no adapter, skipping");
            return;
        };
        let layouts = SpriteLayouts::new(&device);
        let vertex = crate::device::SPRITE_VERTEX_WGSL;
        let mistyped = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1u; }";

        let err = build(&device, &layouts, TARGET, 1, vertex, mistyped).unwrap_err();
        assert!(matches!(err, RenderError::Shader { stage: "fragment", .. }));
    }
}
