//! Render-thread main loop.
//!
//! The [`FrameDriver`] owns the graphics context and the [`World`](crate::object::World),
//! drains the job queue one job at a time, and presents whenever the frame
//! budget has elapsed or too many jobs ran back to back.

mod config;
mod frame_driver;

pub use config::{IdleStrategy, SchedulerConfig};
pub use frame_driver::{DriverStats, FrameDriver, Step};
