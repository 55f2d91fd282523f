use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result};

use sprout_engine::assets::ASSET_ROOT_ENV;
use sprout_engine::coords::Vec2;
use sprout_engine::device::{GpuInit, WgpuContext};
use sprout_engine::driver::{FrameDriver, SchedulerConfig};
use sprout_engine::logging::{init_logging, LoggingConfig};
use sprout_engine::object::ObjectDesc;
use sprout_engine::queue::{job_queue, CommandQueue};
use sprout_engine::window::WindowConfig;
use sprout_engine::SubmitError;

const SPRITE_SHEET: &str = "sprites/test.png";

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let context = WgpuContext::open(WindowConfig::new("sprout", 800, 600), GpuInit::default())
        .context("failed to open graphics context")?;

    let (queue, jobs) = job_queue();
    let worker = thread::Builder::new()
        .name("sprout-worker".to_string())
        .spawn(move || populate(&queue))
        .context("failed to spawn worker thread")?;

    // The render thread is this one: winit wants its event loop on main.
    let result = FrameDriver::new(context, jobs, SchedulerConfig::default()).run();

    match worker.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!("worker stopped early: {e}"),
        Err(_) => log::error!("worker thread panicked"),
    }

    let stats = result.context("render thread failed")?;
    log::info!(
        "bye: {} jobs, {} frames",
        stats.jobs_executed,
        stats.frames_presented
    );
    Ok(())
}

/// Builds the scene: one 12-vertex batch holding two 100px squares.
fn populate(queue: &CommandQueue) -> Result<(), SubmitError> {
    let sheet = queue.create_object(ObjectDesc::new(12, sprite_sheet()))?;

    let left = sheet
        .append_square(Vec2::new(400.0, 400.0), 100.0, Vec2::zero(), 16.0)
        .wait()?;
    let right = sheet
        .append_square(Vec2::new(600.0, 400.0), 100.0, Vec2::zero(), 16.0)
        .wait()?;
    log::info!("sprites at {left} and {right}");

    // Tilt the right square around its own center.
    let first = right.first_vertex();
    sheet.set_group_rotation(
        Vec2::new(650.0, 450.0),
        std::f32::consts::FRAC_PI_4,
        first,
        first + 5,
    )?;
    sheet.flush().wait()
}

fn sprite_sheet() -> PathBuf {
    if std::env::var_os(ASSET_ROOT_ENV).is_some() {
        PathBuf::from(SPRITE_SHEET)
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(SPRITE_SHEET)
    }
}
