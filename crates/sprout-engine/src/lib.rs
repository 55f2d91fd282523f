//! Sprout engine crate.
//!
//! A 2D sprite engine whose graphics context lives on a single render
//! thread. Worker threads mutate sprites through a [`queue::CommandQueue`];
//! the [`driver::FrameDriver`] executes those jobs one at a time and
//! interleaves them with frame presentation under a frame budget.

pub mod assets;
pub mod backend;
pub mod buffers;
pub mod coords;
pub mod device;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod object;
pub mod queue;
pub mod time;
pub mod window;

pub use error::{RenderError, SubmitError};
