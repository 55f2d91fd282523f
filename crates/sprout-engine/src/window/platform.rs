use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::coords::Viewport;

use super::WindowConfig;

/// A window whose events are pumped on demand.
///
/// Must be created and used on the main thread on most platforms.
pub struct WinitWindow {
    event_loop: EventLoop<()>,
    state: WindowState,
}

struct WindowState {
    config: WindowConfig,
    window: Option<Arc<Window>>,
    create_error: Option<anyhow::Error>,
    close_requested: bool,
    pending_resize: Option<PhysicalSize<u32>>,
}

impl WinitWindow {
    /// Creates the event loop and opens the window.
    pub fn open(config: WindowConfig) -> Result<Self> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut this = Self {
            event_loop,
            state: WindowState {
                config,
                window: None,
                create_error: None,
                close_requested: false,
                pending_resize: None,
            },
        };

        // Windows can only be created from inside the event loop.
        while this.state.window.is_none() {
            if let PumpStatus::Exit(code) = this
                .event_loop
                .pump_app_events(Some(Duration::from_millis(10)), &mut this.state)
            {
                anyhow::bail!("event loop exited with code {code} before the window opened");
            }
            if let Some(err) = this.state.create_error.take() {
                return Err(err);
            }
        }

        Ok(this)
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.state.window.as_ref()
    }

    /// Surface size in logical pixels.
    pub fn viewport(&self) -> Viewport {
        match &self.state.window {
            Some(w) => {
                let size: LogicalSize<f32> = w.inner_size().to_logical(w.scale_factor());
                Viewport::new(size.width, size.height)
            }
            None => Viewport::new(
                self.state.config.width as f32,
                self.state.config.height as f32,
            ),
        }
    }

    /// Processes pending platform events without blocking.
    pub fn poll(&mut self) {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.state);
        if let PumpStatus::Exit(code) = status {
            log::debug!("event loop exited with code {code}");
            self.state.close_requested = true;
        }
    }

    pub fn close_requested(&self) -> bool {
        self.state.close_requested
    }

    /// Last size reported since the previous call, if the window was resized.
    pub fn take_resize(&mut self) -> Option<PhysicalSize<u32>> {
        self.state.pending_resize.take()
    }

    /// Hides the window. The platform window goes away once every handle
    /// (including the GPU surface's) is dropped.
    pub fn close(&mut self) {
        if let Some(window) = self.state.window.take() {
            window.set_visible(false);
        }
        self.state.close_requested = true;
    }
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(self.config.width),
                f64::from(self.config.height),
            ))
            .with_resizable(self.config.resizable);

        match event_loop.create_window(attrs) {
            Ok(window) => {
                log::info!(
                    "opened window \"{}\" ({}x{})",
                    self.config.title,
                    self.config.width,
                    self.config.height
                );
                self.window = Some(Arc::new(window));
            }
            Err(e) => {
                self.create_error = Some(anyhow::Error::new(e).context("failed to create window"));
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                self.pending_resize = Some(size);
            }
            _ => {}
        }
    }
}
