use crate::event::InputEvent;
use gamma_common::MouseButton;
use glam::DVec2;
use std::collections::BTreeSet;

/// Current and previous-tick input state.
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    keys: BTreeSet<String>,
    prev_keys: BTreeSet<String>,
    buttons: BTreeSet<MouseButton>,
    prev_buttons: BTreeSet<MouseButton>,
    pointer: DVec2,
    clicked: Option<String>,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one host event to the current state.
    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                self.keys.insert(key);
            }
            InputEvent::KeyUp(key) => {
                self.keys.remove(&key);
            }
            InputEvent::ButtonDown(button) => {
                self.buttons.insert(button);
            }
            InputEvent::ButtonUp(button) => {
                self.buttons.remove(&button);
            }
            InputEvent::FocusLost => {
                tracing::debug!("focus lost, releasing all input");
                self.keys.clear();
                self.buttons.clear();
            }
        }
    }

    pub fn is_key_down(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn key_released(&self, key: &str) -> bool {
        !self.keys.contains(key) && self.prev_keys.contains(key)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn button_released(&self, button: MouseButton) -> bool {
        !self.buttons.contains(&button) && self.prev_buttons.contains(&button)
    }

    /// Pointer position in world coordinates.
    pub fn pointer(&self) -> DVec2 {
        self.pointer
    }

    pub fn set_pointer(&mut self, world: DVec2) {
        self.pointer = world;
    }

    /// Instance id hit by a click since the last rotation.
    pub fn clicked(&self) -> Option<&str> {
        self.clicked.as_deref()
    }

    pub fn set_clicked(&mut self, id: Option<String>) {
        self.clicked = id;
    }

    /// End-of-tick bookkeeping: current state becomes history and the click
    /// target is consumed.
    pub fn rotate(&mut self) {
        self.prev_keys.clone_from(&self.keys);
        self.prev_buttons.clone_from(&self.buttons);
        self.clicked = None;
    }
}
