//! Error types.
//!
//! Every [`RenderError`] raised while the render thread executes a job is
//! fatal: the frame driver stops, tears down, and hands the error back to the
//! entry point. Producers only ever see [`SubmitError`].

use std::path::PathBuf;

use crate::object::ObjectId;

/// Failures inside the render thread.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(
        "render object {id} overflow: {used} used + {requested} requested exceeds capacity {capacity}"
    )]
    CapacityExceeded {
        id: ObjectId,
        used: u32,
        requested: u32,
        capacity: u32,
    },

    #[error("vertex buffers already allocated (capacity {capacity})")]
    AlreadyAllocated { capacity: u32 },

    #[error("render object {id}: index {index} is not a sprite below vertex {used}")]
    InvalidIndex { id: ObjectId, index: u32, used: u32 },

    #[error("vertex range {start}..={end} is outside capacity {capacity}")]
    InvalidRange { start: u32, end: u32, capacity: u32 },

    #[error("{what}: expected {expected} entries, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("unknown render object {0}")]
    UnknownObject(ObjectId),

    #[error("render object {0} already exists")]
    DuplicateObject(ObjectId),

    #[error("texture {path:?}: {message}")]
    Texture { path: PathBuf, message: String },

    #[error("{stage} shader: {message}")]
    Shader { stage: &'static str, message: String },

    #[error("unknown uniform {0:?}")]
    UnknownUniform(String),

    #[error("uniform {name:?} expects a {expected}")]
    UniformType { name: String, expected: &'static str },

    #[error("unknown vertex attribute {0:?}")]
    UnknownAttribute(String),

    #[error("graphics context lost: {0}")]
    ContextLost(String),
}

/// Failure to hand a job to, or hear back from, the render thread.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum SubmitError {
    #[error("render thread has shut down")]
    Disconnected,
}
