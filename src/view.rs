use log::info;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::renderer::Renderer;

/// Owns the window and the renderer drawing into it.
pub struct View {
    config: ViewConfig,

    // Declared before `window` so the Vulkan objects are dropped first.
    renderer: Option<Renderer>,
    window: Option<Window>,
}

impl View {
    pub fn new(config: ViewConfig) -> Self {
        info!("View created");

        Self {
            config,
            renderer: None,
            window: None,
        }
    }

    /// Creates the fixed-size window, centred on the primary monitor when there is one, and
    /// initializes Vulkan against it.
    pub fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewError> {
        let size = PhysicalSize::new(self.config.width, self.config.height);

        let mut attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(size)
            .with_resizable(false);

        if let Some(monitor) = event_loop.primary_monitor() {
            let position = centered_position(monitor.position(), monitor.size(), size);
            attributes = attributes.with_position(position);
        }

        let window = event_loop.create_window(attributes)?;
        let renderer = Renderer::new(&window, &self.config)?;

        self.window = Some(window);
        self.renderer = Some(renderer);

        info!("Vulkan Window Created");
        Ok(())
    }

    pub fn draw_frame(&mut self) -> Result<(), ViewError> {
        self.renderer
            .as_mut()
            .ok_or(ViewError::NotInitialized)?
            .draw_frame()
    }

    /// Tears down the renderer, then the window.
    pub fn destroy_window(&mut self) {
        self.renderer = None;
        self.window = None;
    }

    pub fn is_created(&self) -> bool {
        self.window.is_some()
    }

    pub fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    pub fn window_width(&self) -> u32 {
        self.config.width
    }

    pub fn window_height(&self) -> u32 {
        self.config.height
    }
}

/// Top-left corner that centres a `window` sized rectangle on a monitor.
pub fn centered_position(
    monitor_position: PhysicalPosition<i32>,
    monitor_size: PhysicalSize<u32>,
    window: PhysicalSize<u32>,
) -> PhysicalPosition<i32> {
    let x = (i64::from(monitor_size.width) - i64::from(window.width)) / 2;
    let y = (i64::from(monitor_size.height) - i64::from(window.height)) / 2;

    PhysicalPosition::new(monitor_position.x + x as i32, monitor_position.y + y as i32)
}
