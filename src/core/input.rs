//! Input state tracking

use std::collections::HashSet;
use std::time::{Duration, Instant};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Default maximum time between the two clicks of a double click
pub const DEFAULT_DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(400);

/// Maximum cursor travel between the two clicks of a double click, in pixels
const DOUBLE_CLICK_SLOP: f32 = 4.0;

/// Tracks keyboard and mouse input state
pub struct InputState {
    /// Currently pressed keys
    keys_pressed: HashSet<KeyCode>,
    /// Keys pressed this frame
    keys_just_pressed: HashSet<KeyCode>,
    /// Cursor movement since last frame
    mouse_delta: (f32, f32),
    /// Current cursor position in physical pixels
    mouse_position: (f32, f32),
    /// Whether a cursor position has been seen yet
    has_position: bool,
    /// Currently pressed mouse buttons
    mouse_buttons: HashSet<MouseButton>,
    /// Scroll since last frame, in lines (positive = away from user)
    scroll_delta: f32,
    /// Last left click, used for double-click detection
    last_click: Option<(Instant, (f32, f32))>,
    /// Position of a double click that has not been consumed yet
    double_click: Option<(f32, f32)>,
    double_click_interval: Duration,
}

impl InputState {
    /// Create new input state
    pub fn new() -> Self {
        Self::with_double_click_interval(DEFAULT_DOUBLE_CLICK_INTERVAL)
    }

    /// Create input state with a custom double-click interval
    pub fn with_double_click_interval(interval: Duration) -> Self {
        Self {
            keys_pressed: HashSet::new(),
            keys_just_pressed: HashSet::new(),
            mouse_delta: (0.0, 0.0),
            mouse_position: (0.0, 0.0),
            has_position: false,
            mouse_buttons: HashSet::new(),
            scroll_delta: 0.0,
            last_click: None,
            double_click: None,
            double_click_interval: interval,
        }
    }

    /// Process a window event
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key: PhysicalKey::Code(key_code),
                    state,
                    repeat,
                    ..
                },
                ..
            } => {
                match state {
                    ElementState::Pressed => {
                        if !*repeat && !self.keys_pressed.contains(key_code) {
                            self.keys_just_pressed.insert(*key_code);
                        }
                        self.keys_pressed.insert(*key_code);
                    }
                    ElementState::Released => {
                        self.keys_pressed.remove(key_code);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = (position.x as f32, position.y as f32);
                if self.has_position {
                    self.mouse_delta.0 += new_pos.0 - self.mouse_position.0;
                    self.mouse_delta.1 += new_pos.1 - self.mouse_position.1;
                }
                self.mouse_position = new_pos;
                self.has_position = true;
            }
            WindowEvent::CursorLeft { .. } => {
                self.has_position = false;
                self.mouse_buttons.clear();
            }
            WindowEvent::MouseInput { state, button, .. } => {
                match state {
                    ElementState::Pressed => {
                        self.mouse_buttons.insert(*button);
                        if *button == MouseButton::Left {
                            self.register_click(Instant::now());
                        }
                    }
                    ElementState::Released => {
                        self.mouse_buttons.remove(button);
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y as f32) / 120.0,
                };
            }
            WindowEvent::Focused(false) => {
                self.keys_pressed.clear();
                self.mouse_buttons.clear();
            }
            _ => {}
        }
    }

    fn register_click(&mut self, now: Instant) {
        let position = self.mouse_position;
        match self.last_click {
            Some((at, prev))
                if now.duration_since(at) <= self.double_click_interval
                    && (position.0 - prev.0).abs() <= DOUBLE_CLICK_SLOP
                    && (position.1 - prev.1).abs() <= DOUBLE_CLICK_SLOP =>
            {
                self.double_click = Some(position);
                self.last_click = None;
            }
            _ => {
                self.last_click = Some((now, position));
            }
        }
    }

    /// Call at end of frame to reset per-frame state
    pub fn end_frame(&mut self) {
        self.keys_just_pressed.clear();
        self.mouse_delta = (0.0, 0.0);
        self.scroll_delta = 0.0;
    }

    /// Check if key is currently pressed
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if key was just pressed this frame
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.keys_just_pressed.contains(&key)
    }

    /// Get cursor movement since last frame
    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    /// Get current cursor position
    pub fn mouse_position(&self) -> (f32, f32) {
        self.mouse_position
    }

    /// Check if mouse button is pressed
    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    /// Scroll since last frame
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// Take the position of a pending double click, if any
    pub fn take_double_click(&mut self) -> Option<(f32, f32)> {
        self.double_click.take()
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press() {
        let mut input = InputState::new();

        assert!(!input.is_key_pressed(KeyCode::KeyS));

        // Simulate key press event would be tested with actual WindowEvent
        input.keys_pressed.insert(KeyCode::KeyS);
        input.keys_just_pressed.insert(KeyCode::KeyS);

        assert!(input.is_key_pressed(KeyCode::KeyS));
        assert!(input.is_key_just_pressed(KeyCode::KeyS));

        input.end_frame();

        assert!(input.is_key_pressed(KeyCode::KeyS));
        assert!(!input.is_key_just_pressed(KeyCode::KeyS));
    }

    #[test]
    fn test_double_click_detection() {
        let mut input = InputState::new();
        input.mouse_position = (100.0, 50.0);

        let t0 = Instant::now();
        input.register_click(t0);
        assert!(input.take_double_click().is_none());

        input.register_click(t0 + Duration::from_millis(150));
        assert_eq!(input.take_double_click(), Some((100.0, 50.0)));
        // Consumed
        assert!(input.take_double_click().is_none());
    }

    #[test]
    fn test_slow_clicks_are_not_double() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.register_click(t0);
        input.register_click(t0 + Duration::from_secs(2));
        assert!(input.take_double_click().is_none());
    }

    #[test]
    fn test_distant_clicks_are_not_double() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.register_click(t0);
        input.mouse_position = (40.0, 0.0);
        input.register_click(t0 + Duration::from_millis(100));
        assert!(input.take_double_click().is_none());
    }
}
