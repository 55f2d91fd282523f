//! Headless backend.
//!
//! Implements [`GraphicsDevice`] and [`Surface`] without a GPU. Every call is
//! recorded into a shared [`HeadlessProbe`] so tests (and tools) can observe
//! what the render thread did after the context has moved into a driver.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use super::{
    attribute_location, AttributeSlots, GraphicsDevice, ShaderProgram, Surface, Texture,
    UniformValue, VertexArrays, UNIFORM_DIMENSIONS, UNIFORM_ROTATION, UNIFORM_TRANSLATION,
};
use crate::buffers::Rotation;
use crate::coords::{ColorRgba, Viewport};
use crate::error::RenderError;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum HeadlessCall {
    CompileProgram { program: u64 },
    UseProgram { program: u64 },
    SetUniform { program: u64, name: String, value: UniformValue },
    LoadTexture { path: PathBuf },
    CreateBuffers { buffers: u64, capacity: u32 },
    Upload { buffers: u64 },
    ReleaseBuffers { buffers: u64 },
    Draw { buffers: u64, texture: u64, vertex_count: u32 },
    Clear,
    Present,
    Destroy,
}

/// Contents of the most recent upload to one set of buffers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadSnapshot {
    pub positions: Vec<[f32; 2]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub rotation_groups: Vec<Rotation>,
}

/// Headless context configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Reported surface size.
    pub viewport: Viewport,
    /// Size reported for every loaded texture.
    pub texture_size: (u32, u32),
    /// Report `should_close` after this many presentations.
    pub close_after_presents: Option<u64>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(800.0, 600.0),
            texture_size: (16, 16),
            close_after_presents: None,
        }
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    calls: Mutex<Vec<HeadlessCall>>,
    uploads: Mutex<HashMap<u64, UploadSnapshot>>,
    presents: AtomicU64,
    close: AtomicBool,
    resize: Mutex<Option<Viewport>>,
}

/// Shared view into a [`HeadlessContext`].
#[derive(Debug, Clone, Default)]
pub struct HeadlessProbe(Arc<ProbeState>);

impl HeadlessProbe {
    /// Snapshot of every call recorded so far, in order.
    pub fn calls(&self) -> Vec<HeadlessCall> {
        self.0.calls.lock().clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&HeadlessCall) -> bool) -> usize {
        self.0.calls.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn presents(&self) -> u64 {
        self.0.presents.load(Ordering::Acquire)
    }

    /// Makes the surface report a close request.
    pub fn request_close(&self) {
        self.0.close.store(true, Ordering::Release);
    }

    /// Makes the surface report a new size on the next `take_resize`.
    pub fn request_resize(&self, viewport: Viewport) {
        *self.0.resize.lock() = Some(viewport);
    }

    pub fn last_upload(&self, buffers: u64) -> Option<UploadSnapshot> {
        self.0.uploads.lock().get(&buffers).cloned()
    }

    fn record(&self, call: HeadlessCall) {
        self.0.calls.lock().push(call);
    }
}

/// Recording graphics context.
#[derive(Debug)]
pub struct HeadlessContext {
    config: HeadlessConfig,
    probe: HeadlessProbe,
    next_id: u64,
    failing_textures: HashSet<PathBuf>,
}

impl HeadlessContext {
    pub fn new(config: HeadlessConfig) -> Self {
        Self {
            config,
            probe: HeadlessProbe::default(),
            next_id: 1,
            failing_textures: HashSet::new(),
        }
    }

    pub fn probe(&self) -> HeadlessProbe {
        self.probe.clone()
    }

    /// Makes loading `path` fail as if the file were missing.
    pub fn fail_texture(&mut self, path: impl Into<PathBuf>) {
        self.failing_textures.insert(path.into());
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

/// Buffers handle; only tracks identity and size.
#[derive(Debug)]
pub struct HeadlessBuffers {
    pub id: u64,
    pub capacity: u32,
    pub slots: AttributeSlots,
}

/// Program that validates uniform names and types.
#[derive(Debug)]
pub struct HeadlessProgram {
    id: u64,
    probe: HeadlessProbe,
    uniforms: HashMap<&'static str, UniformValue>,
}

impl HeadlessProgram {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Last value stored for a uniform.
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }
}

impl ShaderProgram for HeadlessProgram {
    fn use_program(&mut self) {
        self.probe.record(HeadlessCall::UseProgram { program: self.id });
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), RenderError> {
        let (key, expected) = match name {
            UNIFORM_ROTATION => (UNIFORM_ROTATION, "vec4"),
            UNIFORM_TRANSLATION => (UNIFORM_TRANSLATION, "vec2"),
            UNIFORM_DIMENSIONS => (UNIFORM_DIMENSIONS, "vec2"),
            _ => return Err(RenderError::UnknownUniform(name.to_string())),
        };
        if value.kind() != expected {
            return Err(RenderError::UniformType {
                name: name.to_string(),
                expected,
            });
        }

        self.uniforms.insert(key, value);
        self.probe.record(HeadlessCall::SetUniform {
            program: self.id,
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn bind_attribute(&mut self, name: &str) -> Result<u32, RenderError> {
        attribute_location(name).ok_or_else(|| RenderError::UnknownAttribute(name.to_string()))
    }
}

impl GraphicsDevice for HeadlessContext {
    type Buffers = HeadlessBuffers;
    type Texture = u64;
    type Program = HeadlessProgram;

    fn viewport(&self) -> Viewport {
        self.config.viewport
    }

    fn default_shader_sources(&self) -> (&'static str, &'static str) {
        ("headless vertex", "headless fragment")
    }

    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<HeadlessProgram, RenderError> {
        for (stage, src) in [("vertex", vertex_src), ("fragment", fragment_src)] {
            if src.trim().is_empty() {
                return Err(RenderError::Shader {
                    stage,
                    message: "empty source".to_string(),
                });
            }
        }

        let id = self.next_id();
        self.probe.record(HeadlessCall::CompileProgram { program: id });
        Ok(HeadlessProgram {
            id,
            probe: self.probe.clone(),
            uniforms: HashMap::new(),
        })
    }

    fn load_texture(&mut self, path: &Path) -> Result<Texture<u64>, RenderError> {
        self.probe.record(HeadlessCall::LoadTexture {
            path: path.to_path_buf(),
        });
        if self.failing_textures.contains(path) {
            return Err(RenderError::Texture {
                path: path.to_path_buf(),
                message: "not found".to_string(),
            });
        }

        let (width, height) = self.config.texture_size;
        Ok(Texture {
            handle: self.next_id(),
            width,
            height,
        })
    }

    fn create_buffers(
        &mut self,
        capacity: u32,
        slots: AttributeSlots,
    ) -> Result<HeadlessBuffers, RenderError> {
        let id = self.next_id();
        self.probe.record(HeadlessCall::CreateBuffers {
            buffers: id,
            capacity,
        });
        Ok(HeadlessBuffers {
            id,
            capacity,
            slots,
        })
    }

    fn upload(&mut self, buffers: &HeadlessBuffers, arrays: VertexArrays<'_>) {
        self.probe.0.uploads.lock().insert(
            buffers.id,
            UploadSnapshot {
                positions: arrays.positions.to_vec(),
                tex_coords: arrays.tex_coords.to_vec(),
                rotation_groups: arrays.rotation_groups.to_vec(),
            },
        );
        self.probe.record(HeadlessCall::Upload {
            buffers: buffers.id,
        });
    }

    fn release_buffers(&mut self, buffers: HeadlessBuffers) {
        self.probe.record(HeadlessCall::ReleaseBuffers {
            buffers: buffers.id,
        });
    }

    fn draw_triangles(
        &mut self,
        buffers: &HeadlessBuffers,
        _program: &HeadlessProgram,
        texture: &u64,
        vertex_count: u32,
    ) {
        self.probe.record(HeadlessCall::Draw {
            buffers: buffers.id,
            texture: *texture,
            vertex_count,
        });
    }
}

impl Surface for HeadlessContext {
    fn clear(&mut self, _color: ColorRgba) {
        self.probe.record(HeadlessCall::Clear);
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.probe.record(HeadlessCall::Present);
        let presents = self.probe.0.presents.fetch_add(1, Ordering::AcqRel) + 1;
        if self.config.close_after_presents.is_some_and(|n| presents >= n) {
            self.probe.request_close();
        }
        Ok(())
    }

    fn should_close(&self) -> bool {
        self.probe.0.close.load(Ordering::Acquire)
    }

    fn take_resize(&mut self) -> Option<Viewport> {
        let viewport = self.probe.0.resize.lock().take()?;
        self.config.viewport = viewport;
        Some(viewport)
    }

    fn destroy(&mut self) {
        self.probe.record(HeadlessCall::Destroy);
    }
}
