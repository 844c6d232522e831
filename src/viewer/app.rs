//! Window, GPU and event handling for the interactive viewer

use std::path::{Path, PathBuf};
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::convert::OctomapConverter;
use crate::core::error::Error;
use crate::core::input::InputState;
use crate::core::types::Result;
use crate::render::{GpuContext, RenderLoop, Renderer};

use super::config::ViewerConfig;
use super::controller::ViewportController;
use super::remote::{apply_action, ControlBridge, ControlThread};

/// Keyboard shortcuts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shortcut {
    ToggleShading,
    ToggleProjection,
    ClearRegion,
    Export,
    Quit,
}

impl Shortcut {
    fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyS => Some(Self::ToggleShading),
            KeyCode::KeyP => Some(Self::ToggleProjection),
            KeyCode::KeyR => Some(Self::ClearRegion),
            KeyCode::KeyE => Some(Self::Export),
            KeyCode::Escape => Some(Self::Quit),
            _ => None,
        }
    }
}

fn log_failure(what: &str, e: &Error) {
    if e.is_warning() {
        log::warn!("{}: {}", what, e);
    } else {
        log::error!("{}: {}", what, e);
    }
}

fn status_title(base: &str, message: Option<&str>) -> String {
    match message {
        Some(message) => format!("{} - {}", base, message),
        None => base.to_string(),
    }
}

/// Title after a load attempt: the file name on success, the error otherwise
fn load_title(base: &str, path: &Path, result: &Result<()>) -> String {
    match result {
        Ok(()) => {
            let name = path.file_name().map(|n| n.to_string_lossy());
            status_title(base, name.as_deref())
        }
        Err(e) => status_title(base, Some(&e.to_string())),
    }
}

/// The interactive viewer application
pub struct ViewerApp {
    config: ViewerConfig,
    initial_file: Option<PathBuf>,
    converter: OctomapConverter,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    renderer: Option<Renderer>,
    controller: ViewportController,
    input: InputState,
    render_loop: RenderLoop,
    bridge: ControlBridge,
    control: Option<ControlThread>,
    fatal: Option<Error>,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig, initial_file: Option<PathBuf>) -> Self {
        let controller = ViewportController::new(&config.camera, config.window.width, config.window.height);
        Self {
            converter: OctomapConverter::new(&config.converter),
            input: InputState::with_double_click_interval(config.double_click_interval()),
            controller,
            initial_file,
            window: None,
            gpu: None,
            renderer: None,
            render_loop: RenderLoop::new(),
            bridge: ControlBridge::new(),
            control: None,
            fatal: None,
            config,
        }
    }

    /// Error that ended the event loop, if any
    pub fn take_error(&mut self) -> Option<Error> {
        self.fatal.take()
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.window.width, self.config.window.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|e| Error::Window(e.to_string()))?,
        );

        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;
        let renderer = Renderer::new(&gpu, self.config.background_rgb(), self.config.exposure);
        let (width, height) = gpu.size();
        self.controller.resize(width, height);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.renderer = Some(renderer);

        if self.config.control.enabled {
            match ControlThread::spawn(&self.bridge, self.config.control.port) {
                Ok(control) => self.control = Some(control),
                Err(e) => log::error!("Remote control disabled: {}", e),
            }
        }

        if let Some(path) = self.initial_file.take() {
            self.load(&path);
        }

        self.bridge.publish(&self.controller);
        self.render_loop.start();
        self.request_redraw();
        Ok(())
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    /// Show a user-facing message in the title bar
    fn set_status(&self, message: Option<&str>) {
        if let Some(window) = &self.window {
            window.set_title(&status_title(&self.config.window.title, message));
        }
    }

    /// Log an operation outcome and surface failures in the title bar
    fn report(&self, what: &str, result: Result<()>) {
        match result {
            Ok(()) => self.set_status(None),
            Err(e) => {
                log_failure(what, &e);
                self.set_status(Some(&e.to_string()));
            }
        }
    }

    fn load(&mut self, path: &Path) {
        log::info!("Loading {}", path.display());
        let result = self.controller.load_file(path, &self.converter);
        if let Err(e) = &result {
            log_failure("Load failed", e);
        }
        if let Some(window) = &self.window {
            window.set_title(&load_title(&self.config.window.title, path, &result));
        }
    }

    fn shortcut(&mut self, shortcut: Shortcut, event_loop: &ActiveEventLoop) {
        log::debug!("Shortcut: {:?}", shortcut);
        match shortcut {
            Shortcut::ToggleShading => {
                let result = self.controller.set_shading(!self.controller.shading());
                self.report("Shading", result);
            }
            Shortcut::ToggleProjection => {
                let mode = self.controller.toggle_projection();
                log::info!("Projection: {}", mode);
            }
            Shortcut::ClearRegion => self.controller.clear_region(),
            Shortcut::Export => {
                let result = self.controller.export(&self.config.export_dir).map(|_| ());
                self.report("Export", result);
            }
            Shortcut::Quit => {
                self.shutdown();
                event_loop.exit();
            }
        }
    }

    fn apply_remote_actions(&mut self) {
        for action in self.bridge.drain() {
            let result = apply_action(&mut self.controller, action, &self.converter, &self.config.export_dir);
            self.report("Remote command", result);
        }
    }

    fn frame(&mut self) {
        if self.render_loop.tick().is_none() {
            return;
        }

        if let Some((x, y)) = self.input.take_double_click() {
            if self.controller.focus_at(x, y).is_none() {
                log::debug!("Double click at ({}, {}) hit nothing", x, y);
            }
        }
        self.controller.tick(&self.input);
        self.input.end_frame();

        if let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) {
            renderer.sync(gpu, self.controller.scene());
            if let Err(e) = renderer.render(gpu, self.controller.rig().active()) {
                log::error!("Render failed: {}", e);
            }
        }

        self.bridge.publish(&self.controller);
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(width, height);
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(gpu);
            }
        }
        self.controller.resize(width, height);
    }

    /// Stop rendering, release GPU resources and stop the control server
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.render_loop.stop();
        if let Some(mut renderer) = self.renderer.take() {
            renderer.destroy();
        }
        self.gpu = None;
        if let Some(mut control) = self.control.take() {
            control.stop();
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("Failed to start viewer: {}", e);
            self.fatal = Some(e);
            self.shutdown();
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        self.input.process_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::DroppedFile(path) => self.load(&path),
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key: PhysicalKey::Code(key),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                },
                ..
            } => {
                if let Some(shortcut) = Shortcut::from_key(key) {
                    self.shortcut(shortcut, event_loop);
                }
            }
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.apply_remote_actions();
        if self.render_loop.is_running() {
            self.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
        log::info!("Viewer closed");
    }
}

impl Drop for ViewerApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}
