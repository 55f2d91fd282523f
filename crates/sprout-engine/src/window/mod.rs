//! Platform window.
//!
//! Owns the `winit` event loop and window. Events are pumped explicitly from
//! the render thread instead of handing control to `run_app`, so input
//! polling happens as part of each presentation.

mod config;
mod platform;

pub use config::WindowConfig;
pub use platform::WinitWindow;
