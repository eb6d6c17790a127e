use glam::Vec2;
use rustc_hash::FxHashSet;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Mouse state accumulated between two frames.
#[derive(Default, Debug, Clone)]
pub struct Input {
    /// Cursor position inside the window, in pixels
    pub cursor_position: Vec2,
    /// Cursor movement since the last frame
    pub cursor_delta: Vec2,
    /// Wheel movement since the last frame, in lines
    pub scroll_delta: Vec2,
    pub screen_size: Vec2,
    pub mouse_buttons: FxHashSet<MouseButton>,
    has_cursor: bool,
}

impl Input {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears per-frame deltas.
    pub fn end_frame(&mut self) {
        self.cursor_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    pub fn handle_resize(&mut self, width: u32, height: u32) {
        self.screen_size = Vec2::new(width as f32, height as f32);
    }

    pub fn handle_cursor_move(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        // The first event only establishes the position
        if self.has_cursor {
            self.cursor_delta += new_pos - self.cursor_position;
        }
        self.cursor_position = new_pos;
        self.has_cursor = true;
    }

    pub fn handle_cursor_left(&mut self) {
        self.has_cursor = false;
    }

    pub fn handle_mouse_input(&mut self, state: ElementState, button: MouseButton) {
        match state {
            ElementState::Pressed => {
                self.mouse_buttons.insert(button);
            }
            ElementState::Released => {
                self.mouse_buttons.remove(&button);
            }
        }
    }

    pub fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        match delta {
            MouseScrollDelta::LineDelta(x, y) => {
                self.scroll_delta += Vec2::new(x, y);
            }
            MouseScrollDelta::PixelDelta(pos) => {
                // Trackpads report pixels; roughly ten pixels per line
                self.scroll_delta += Vec2::new(pos.x as f32, pos.y as f32) * 0.1;
            }
        }
    }

    #[must_use]
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }
}
