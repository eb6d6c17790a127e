//! Application Framework
//!
//! [`App`] opens the window, sets up the renderer and drives the
//! [`Viewer`] from winit events:
//!
//! ```rust,ignore
//! use people::{App, ViewerConfig};
//!
//! App::new(ViewerConfig::preset("people")?).run()?;
//! ```
//!
//! The character is loaded before the first frame. A configured room loads
//! in the background and appears once it is ready.

pub mod input;
pub mod viewer;

pub use self::input::Input;
pub use self::viewer::Viewer;

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::ViewerConfig;
use crate::errors::Result;
use crate::renderer::{RenderSettings, Renderer};
use crate::utils::time::Clock;

/// Viewer application builder.
pub struct App {
    config: ViewerConfig,
}

impl App {
    #[must_use]
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }

    /// Overrides the window title from the config.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.window.title = title.into();
        self
    }

    /// Runs until the window is closed or startup fails.
    ///
    /// Blocks the calling thread; the event loop takes it over.
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("people-assets")
            .enable_all()
            .build()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut runner = AppRunner::new(self.config, runtime);
        event_loop.run_app(&mut runner)?;
        Ok(())
    }
}

/// winit handler. Everything is created lazily on the first `resumed`.
struct AppRunner {
    config: ViewerConfig,
    runtime: tokio::runtime::Runtime,

    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    viewer: Option<Viewer>,

    input: Input,
    clock: Clock,
}

impl AppRunner {
    fn new(config: ViewerConfig, runtime: tokio::runtime::Runtime) -> Self {
        Self {
            config,
            runtime,
            window: None,
            renderer: None,
            viewer: None,
            input: Input::new(),
            clock: Clock::new(),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let cfg = &self.config.window;
        let window_attributes = Window::default_attributes()
            .with_title(cfg.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(cfg.width, cfg.height));

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        self.window = Some(window.clone());

        log::info!("Initializing Renderer Backend...");
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));
        let settings = RenderSettings::from(&self.config.render);
        let renderer = pollster::block_on(Renderer::new(window, &settings, width, height))?;
        self.renderer = Some(renderer);
        self.input.handle_resize(width, height);

        let mut viewer = Viewer::new(self.config.clone(), width, height);
        viewer.spawn_room(self.runtime.handle());
        self.runtime.block_on(viewer.attach_character())?;
        self.viewer = Some(viewer);

        // The first delta should not include load time
        self.clock = Clock::new();
        Ok(())
    }

    fn frame(&mut self) {
        let dt = self.clock.get_delta();

        let (Some(renderer), Some(viewer)) = (&mut self.renderer, &mut self.viewer) else {
            return;
        };

        viewer.tick(dt, &self.input);
        self.input.end_frame();
        renderer.render(&viewer.scene);
    }
}

impl ApplicationHandler for AppRunner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.init(event_loop) {
            log::error!("Fatal startup error: {e}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window closed after {} frames", self.clock.frame_count);
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                let (width, height) = (physical_size.width, physical_size.height);
                self.input.handle_resize(width, height);
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(width, height);
                }
                if let Some(viewer) = &mut self.viewer {
                    viewer.on_resize(width, height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.handle_cursor_move(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => {
                self.input.handle_cursor_left();
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.handle_mouse_input(state, button);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.input.handle_mouse_wheel(delta);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.viewer.is_some()
            && let Some(window) = &self.window
        {
            window.request_redraw();
        }
    }
}
