use gamma_common::MouseButton;

/// A raw input event as produced by the host window.
///
/// Pointer motion and clicks are not here: mapping them to world space needs
/// the camera, so the session handles those directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Key down, by DOM-style key name (`"w"`, `"ArrowUp"`, `" "`).
    KeyDown(String),
    KeyUp(String),
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    /// Window lost focus; everything counts as released.
    FocusLost,
}

impl InputEvent {
    pub fn key_down(key: impl Into<String>) -> Self {
        Self::KeyDown(key.into())
    }

    pub fn key_up(key: impl Into<String>) -> Self {
        Self::KeyUp(key.into())
    }
}
