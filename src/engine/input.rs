// Input state tracking for keyboard and mouse
// Abstracts winit events into a per-frame snapshot of named actions

use std::collections::HashSet;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Everything the walkthrough reacts to. Bindings live in `Action::from_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    Sprint,
    RotateLeft,
    RotateRight,
    RotateUp,
    RotateDown,
    Inspect,
    ToggleMusic,
    /// Pointer drag only rotates the camera while this is held.
    Look,
}

impl Action {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        let action = match key {
            KeyCode::KeyW => Action::MoveForward,
            KeyCode::KeyS => Action::MoveBack,
            KeyCode::KeyA => Action::MoveLeft,
            KeyCode::KeyD => Action::MoveRight,
            KeyCode::KeyR => Action::MoveUp,
            KeyCode::KeyF => Action::MoveDown,
            KeyCode::ShiftLeft | KeyCode::ShiftRight => Action::Sprint,
            KeyCode::ArrowLeft => Action::RotateLeft,
            KeyCode::ArrowRight => Action::RotateRight,
            KeyCode::ArrowUp => Action::RotateUp,
            KeyCode::ArrowDown => Action::RotateDown,
            KeyCode::Space => Action::Inspect,
            KeyCode::KeyM => Action::ToggleMusic,
            _ => return None,
        };
        Some(action)
    }

    pub fn from_mouse(button: MouseButton) -> Option<Self> {
        match button {
            MouseButton::Left => Some(Action::Look),
            _ => None,
        }
    }
}

/// Value copy of the input that one simulation frame consumes.
/// Holds no handle back into the window or event loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    /// Pointer movement since the previous snapshot, in pixels.
    pub pointer_delta: (f32, f32),
    held: HashSet<Action>,
}

impl InputSnapshot {
    pub fn new(pointer_delta: (f32, f32), held: impl IntoIterator<Item = Action>) -> Self {
        Self {
            pointer_delta,
            held: held.into_iter().collect(),
        }
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }
}

pub struct InputState {
    // Keyboard
    keys_held: HashSet<KeyCode>,
    buttons_held: HashSet<MouseButton>,

    // Mouse
    pub mouse_position: (f32, f32),
    mouse_prev_position: Option<(f32, f32)>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys_held: HashSet::new(),
            buttons_held: HashSet::new(),
            mouse_position: (0.0, 0.0),
            mouse_prev_position: None,
        }
    }

    /// Feed a winit WindowEvent into the input state.
    /// Call this once per event before the game's own event handling.
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => { self.keys_held.insert(key); }
                        ElementState::Released => { self.keys_held.remove(&key); }
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => { self.buttons_held.insert(*button); }
                ElementState::Released => { self.buttons_held.remove(button); }
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = (position.x as f32, position.y as f32);
            }
            WindowEvent::Focused(false) => {
                // Releases are not delivered to an unfocused window.
                self.keys_held.clear();
                self.buttons_held.clear();
            }
            _ => {}
        }
    }

    /// Take this frame's snapshot. The pointer delta is measured from the
    /// previous call; the first call reports zero.
    pub fn snapshot(&mut self) -> InputSnapshot {
        let prev = self.mouse_prev_position.unwrap_or(self.mouse_position);
        let delta = (
            self.mouse_position.0 - prev.0,
            self.mouse_position.1 - prev.1,
        );
        self.mouse_prev_position = Some(self.mouse_position);

        let held = self
            .keys_held
            .iter()
            .filter_map(|&k| Action::from_key(k))
            .chain(self.buttons_held.iter().filter_map(|&b| Action::from_mouse(b)));

        InputSnapshot::new(delta, held)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_maps_keys_to_actions() {
        let mut input = InputState::new();
        input.keys_held.insert(KeyCode::KeyW);
        input.keys_held.insert(KeyCode::ShiftLeft);
        input.keys_held.insert(KeyCode::KeyZ);
        input.buttons_held.insert(MouseButton::Left);

        let snap = input.snapshot();
        assert!(snap.is_held(Action::MoveForward));
        assert!(snap.is_held(Action::Sprint));
        assert!(snap.is_held(Action::Look));
        assert!(!snap.is_held(Action::Inspect));
    }

    #[test]
    fn pointer_delta_is_relative_to_previous_snapshot() {
        let mut input = InputState::new();
        input.mouse_position = (100.0, 50.0);
        assert_eq!(input.snapshot().pointer_delta, (0.0, 0.0));

        input.mouse_position = (130.0, 40.0);
        assert_eq!(input.snapshot().pointer_delta, (30.0, -10.0));
        assert_eq!(input.snapshot().pointer_delta, (0.0, 0.0));
    }
}
