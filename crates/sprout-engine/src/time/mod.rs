//! Frame timing.
//!
//! One `FramePacer` per render loop: ask `is_due` while idle, call `mark`
//! on every presentation, natural or forced.

mod frame_pacer;

pub use frame_pacer::{FramePacer, FrameTime};
