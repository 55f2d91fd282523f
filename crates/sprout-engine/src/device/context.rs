use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::backend::{AttributeSlots, GraphicsDevice, Surface, Texture, VertexArrays};
use crate::buffers::Rotation;
use crate::coords::{ColorRgba, Viewport};
use crate::error::RenderError;
use crate::window::{WindowConfig, WinitWindow};

use super::program::{self, ProgramResource, SpriteLayouts};
use super::texture::{self, WgpuTexture};
use super::{
    Gpu, GpuInit, SurfaceErrorAction, WgpuProgram, SPRITE_FRAGMENT_WGSL, SPRITE_VERTEX_WGSL,
};

/// Per-object vertex buffers, one per attribute.
#[derive(Debug)]
pub struct WgpuBuffers(Arc<VertexBuffers>);

#[derive(Debug)]
struct VertexBuffers {
    positions: wgpu::Buffer,
    tex_coords: wgpu::Buffer,
    rotation_groups: wgpu::Buffer,
    slots: AttributeSlots,
}

/// A draw recorded between `clear` and `present`.
struct DrawCall {
    program: Arc<ProgramResource>,
    buffers: Arc<VertexBuffers>,
    texture: WgpuTexture,
    vertex_count: u32,
}

/// Window + wgpu device, driven from the render thread.
///
/// Draws are recorded as they are issued and replayed into a single render
/// pass when the frame is presented.
pub struct WgpuContext {
    window: WinitWindow,
    gpu: Gpu,
    layouts: SpriteLayouts,
    sampler: wgpu::Sampler,
    clear_color: wgpu::Color,
    draws: Vec<DrawCall>,
    next_program: u64,
    resized: Option<Viewport>,
    destroyed: bool,
}

impl WgpuContext {
    /// Opens the window and initializes the GPU. Fatal on failure.
    pub fn open(window: WindowConfig, init: GpuInit) -> Result<Self> {
        let window = WinitWindow::open(window)?;
        let viewport = window.viewport();
        anyhow::ensure!(
            viewport.is_valid(),
            "window has no drawable area ({}x{})",
            viewport.width,
            viewport.height
        );
        let handle = window
            .window()
            .cloned()
            .context("window closed during initialization")?;
        let gpu = pollster::block_on(Gpu::new(handle, init)).context("GPU initialization failed")?;

        let layouts = SpriteLayouts::new(gpu.device());
        let sampler = texture::create_sampler(gpu.device());

        Ok(Self {
            window,
            gpu,
            layouts,
            sampler,
            clear_color: wgpu::Color::BLACK,
            draws: Vec::new(),
            next_program: 1,
            resized: None,
            destroyed: false,
        })
    }

    fn apply_resize(&mut self) {
        if let Some(size) = self.window.take_resize() {
            log::debug!("surface resized to {}x{}", size.width, size.height);
            self.gpu.resize(size);
            self.resized = Some(self.window.viewport());
        }
    }

    fn render_frame(&mut self) -> Result<(), RenderError> {
        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                let message = err.to_string();
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => Err(RenderError::ContextLost(message)),
                    action => {
                        log::warn!("skipping frame: {message} ({action:?})");
                        Ok(())
                    }
                };
            }
        };

        {
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprout sprite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for draw in &self.draws {
                let slots = draw.buffers.slots;
                rpass.set_pipeline(&draw.program.pipeline);
                rpass.set_bind_group(0, &draw.program.uniform_bind_group, &[]);
                rpass.set_bind_group(1, &draw.texture.0.bind_group, &[]);
                rpass.set_vertex_buffer(slots.position, draw.buffers.positions.slice(..));
                rpass.set_vertex_buffer(slots.tex_coord, draw.buffers.tex_coords.slice(..));
                let groups = draw.buffers.rotation_groups.slice(..);
                rpass.set_vertex_buffer(slots.rotation_group, groups);
                rpass.draw(0..draw.vertex_count, 0..1);
            }
        }

        self.gpu.submit(frame);
        Ok(())
    }
}

impl GraphicsDevice for WgpuContext {
    type Buffers = WgpuBuffers;
    type Texture = WgpuTexture;
    type Program = WgpuProgram;

    fn viewport(&self) -> Viewport {
        self.window.viewport()
    }

    fn default_shader_sources(&self) -> (&'static str, &'static str) {
        (SPRITE_VERTEX_WGSL, SPRITE_FRAGMENT_WGSL)
    }

    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<WgpuProgram, RenderError> {
        let id = self.next_program;
        let resource = program::build(
            self.gpu.device(),
            &self.layouts,
            self.gpu.surface_format(),
            id,
            vertex_src,
            fragment_src,
        )?;
        self.next_program += 1;
        log::debug!("compiled sprite program {id}");

        Ok(WgpuProgram::new(resource, self.gpu.queue().clone()))
    }

    fn load_texture(&mut self, path: &Path) -> Result<Texture<WgpuTexture>, RenderError> {
        let handle = texture::load(
            self.gpu.device(),
            self.gpu.queue(),
            &self.layouts.texture,
            &self.sampler,
            path,
        )?;
        let (width, height) = handle.size();
        Ok(Texture {
            handle,
            width,
            height,
        })
    }

    fn create_buffers(
        &mut self,
        capacity: u32,
        slots: AttributeSlots,
    ) -> Result<WgpuBuffers, RenderError> {
        let device = self.gpu.device();
        let buffer = |label: &str, stride: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: (capacity.max(1) as usize * stride) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        Ok(WgpuBuffers(Arc::new(VertexBuffers {
            positions: buffer("sprout positions", std::mem::size_of::<[f32; 2]>()),
            tex_coords: buffer("sprout tex coords", std::mem::size_of::<[f32; 2]>()),
            rotation_groups: buffer("sprout rotation groups", std::mem::size_of::<Rotation>()),
            slots,
        })))
    }

    fn upload(&mut self, buffers: &WgpuBuffers, arrays: VertexArrays<'_>) {
        let queue = self.gpu.queue();
        queue.write_buffer(&buffers.0.positions, 0, bytemuck::cast_slice(arrays.positions));
        queue.write_buffer(&buffers.0.tex_coords, 0, bytemuck::cast_slice(arrays.tex_coords));
        queue.write_buffer(
            &buffers.0.rotation_groups,
            0,
            bytemuck::cast_slice(arrays.rotation_groups),
        );
    }

    fn release_buffers(&mut self, buffers: WgpuBuffers) {
        if let Ok(buffers) = Arc::try_unwrap(buffers.0) {
            buffers.positions.destroy();
            buffers.tex_coords.destroy();
            buffers.rotation_groups.destroy();
        }
    }

    fn draw_triangles(
        &mut self,
        buffers: &WgpuBuffers,
        program: &WgpuProgram,
        texture: &WgpuTexture,
        vertex_count: u32,
    ) {
        self.draws.push(DrawCall {
            program: Arc::clone(&program.gpu),
            buffers: Arc::clone(&buffers.0),
            texture: texture.clone(),
            vertex_count,
        });
    }
}

impl Surface for WgpuContext {
    fn clear(&mut self, color: ColorRgba) {
        self.clear_color = wgpu::Color {
            r: f64::from(color.r),
            g: f64::from(color.g),
            b: f64::from(color.b),
            a: f64::from(color.a),
        };
        self.draws.clear();
    }

    fn present(&mut self) -> Result<(), RenderError> {
        if self.destroyed {
            return Ok(());
        }

        let result = self.render_frame();
        self.draws.clear();

        self.window.poll();
        self.apply_resize();
        result
    }

    fn should_close(&self) -> bool {
        self.destroyed || self.window.close_requested()
    }

    fn take_resize(&mut self) -> Option<Viewport> {
        self.resized.take()
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.draws.clear();
        self.window.close();
        self.destroyed = true;
        log::info!("graphics context destroyed");
    }
}
