use log::{debug, error, info, trace, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{CursorGrabMode, WindowId};

use crate::input::{InputState, KeyAction};
use crate::keys::{Key, button_from_winit, key_from_winit};
use crate::model::Model;
use crate::view::View;

/// Pixels per scroll line when the platform reports scrolling in pixels.
const PIXELS_PER_LINE: f64 = 20.0;

/// Drives the application: feeds window events into the input state and asks the view for a
/// frame every time the event queue runs dry.
pub struct Controller {
    // Field order is drop order: the view (and every Vulkan object) goes before the model.
    view: View,
    _model: Model,
    input: InputState,
    close_requested: bool,
    cursor_captured: bool,
    error: Option<anyhow::Error>,
}

impl Controller {
    pub fn new(model: Model, view: View) -> Self {
        info!("Controller created");

        Self {
            view,
            _model: model,
            input: InputState::new(),
            close_requested: false,
            cursor_captured: false,
            error: None,
        }
    }

    /// Runs the event loop until the window is closed or escape is pressed. Returns the first
    /// error raised by the view, if any.
    pub fn run_loop(mut self, event_loop: EventLoop<()>) -> anyhow::Result<()> {
        event_loop.run_app(&mut self)?;

        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: impl Into<anyhow::Error>) {
        let e = e.into();
        error!("{:#}", e);

        if self.error.is_none() {
            self.error = Some(e);
        }
        self.shutdown(event_loop);
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.view.destroy_window();
        event_loop.exit();
    }

    fn should_close(&self) -> bool {
        self.close_requested || self.input.is_key_pressed(Key::Escape)
    }

    fn on_key(&mut self, event: &KeyEvent) {
        let Some(key) = key_from_winit(event.physical_key) else {
            return;
        };

        let action = key_action(event.state, event.repeat);
        self.input.key_callback(key, action);

        if !self.input.is_key_repeating(key) {
            debug!("{key:?} {action:?}");
        }
    }

    /// Input is only taken while the window has focus. Mouse capture follows the Tab toggle, and
    /// is released while unfocused.
    fn on_focus(&mut self, focused: bool) {
        if !focused {
            self.input.release_all();
        }
        self.input.set_keyboard_enabled(focused);
        debug!("Window focus {}", if focused { "gained" } else { "lost" });
    }

    /// Whether the cursor should currently be held at the window centre.
    fn wants_capture(&self) -> bool {
        !self.input.is_mouse_enabled() && self.input.is_keyboard_enabled()
    }

    /// Tab flips mouse capture. Refreshes the mouse delta, and while the mouse is disabled keeps
    /// the cursor hidden and pinned to the centre of the window.
    fn update_input(&mut self) {
        // Odd number of Tab presses: captured.
        let enabled = !self.input.is_key_toggled(Key::Tab);
        if enabled != self.input.is_mouse_enabled() {
            self.input.set_mouse_enabled(enabled);
            info!("Mouse {}", if enabled { "released" } else { "captured" });
        }

        let (width, height) = (self.view.window_width(), self.view.window_height());
        self.input.mouse_update(width, height);

        trace!(
            "Cursor ({}, {}), delta ({:.2}, {:.2}), scroll {}",
            self.input.mouse_x(),
            self.input.mouse_y(),
            self.input.delta_x(),
            self.input.delta_y(),
            self.input.delta_scroll()
        );

        let Some(window) = self.view.window() else {
            return;
        };

        let capture = self.wants_capture();

        if capture != self.cursor_captured {
            let grab = if capture {
                CursorGrabMode::Confined
            } else {
                CursorGrabMode::None
            };

            if let Err(e) = window.set_cursor_grab(grab) {
                warn!("Unable to change cursor grab mode: {}", e);
            }
            window.set_cursor_visible(!capture);
            self.cursor_captured = capture;
        }

        if capture {
            let centre = PhysicalPosition::new(f64::from(width) * 0.5, f64::from(height) * 0.5);

            if let Err(e) = window.set_cursor_position(centre) {
                warn!("Unable to recentre cursor: {}", e);
            }
        }
    }
}

fn key_action(state: ElementState, repeat: bool) -> KeyAction {
    match (state, repeat) {
        (ElementState::Pressed, false) => KeyAction::Press,
        (ElementState::Pressed, true) => KeyAction::Repeat,
        (ElementState::Released, _) => KeyAction::Release,
    }
}

impl ApplicationHandler for Controller {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.view.is_created() {
            return;
        }

        if let Err(e) = self.view.create_window(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                self.close_requested = true;
            }

            WindowEvent::Focused(focused) => self.on_focus(focused),

            WindowEvent::KeyboardInput { event, .. } => self.on_key(&event),

            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = button_from_winit(button) {
                    self.input.mouse_callback(button, key_action(state, false));
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.input.set_cursor_position(position.x, position.y);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => f64::from(y),
                    MouseScrollDelta::PixelDelta(position) => position.y / PIXELS_PER_LINE,
                };
                self.input.add_scroll(lines);
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.view.is_created() {
            return;
        }

        if self.should_close() {
            self.shutdown(event_loop);
            return;
        }

        self.update_input();

        if let Err(e) = self.view.draw_frame() {
            self.fail(event_loop, e);
            return;
        }

        self.input.end_frame();
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.view.destroy_window();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;

    #[test]
    fn maps_element_state_to_action() {
        assert_eq!(key_action(ElementState::Pressed, false), KeyAction::Press);
        assert_eq!(key_action(ElementState::Pressed, true), KeyAction::Repeat);
        assert_eq!(key_action(ElementState::Released, false), KeyAction::Release);
        assert_eq!(key_action(ElementState::Released, true), KeyAction::Release);
    }

    #[test]
    fn escape_requests_close() {
        let mut controller = Controller::new(Model::new(), View::new(ViewConfig::default()));
        assert!(!controller.should_close());

        controller.input.key_callback(Key::Escape, KeyAction::Press);
        assert!(controller.should_close());

        controller.input.key_callback(Key::Escape, KeyAction::Release);
        assert!(!controller.should_close());

        controller.close_requested = true;
        assert!(controller.should_close());
    }

    #[test]
    fn tab_toggles_mouse_capture() {
        let mut controller = Controller::new(Model::new(), View::new(ViewConfig::default()));

        controller.input.key_callback(Key::Tab, KeyAction::Press);
        controller.update_input();
        assert!(!controller.input.is_mouse_enabled());
        assert!(controller.wants_capture());

        // Releasing and holding do not undo the capture.
        controller.input.key_callback(Key::Tab, KeyAction::Release);
        controller.input.end_frame();
        controller.update_input();
        assert!(!controller.input.is_mouse_enabled());

        controller.input.key_callback(Key::Tab, KeyAction::Press);
        controller.update_input();
        assert!(controller.input.is_mouse_enabled());
        assert!(!controller.wants_capture());
    }

    #[test]
    fn losing_focus_ignores_keys_and_releases_capture() {
        let mut controller = Controller::new(Model::new(), View::new(ViewConfig::default()));
        controller.input.key_callback(Key::Tab, KeyAction::Press);
        controller.update_input();

        controller.on_focus(false);
        assert!(!controller.wants_capture());

        controller.input.key_callback(Key::Escape, KeyAction::Press);
        assert!(!controller.should_close());

        controller.on_focus(true);
        assert!(controller.wants_capture());
        controller.input.key_callback(Key::Escape, KeyAction::Press);
        assert!(controller.should_close());
    }
}
