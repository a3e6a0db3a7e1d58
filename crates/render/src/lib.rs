//! Rendering adapter: turns a running session into a renderer-agnostic
//! frame description.
//!
//! # Invariants
//! - Building a frame never mutates the session.
//! - Drawables follow scene layer order, then instance order.
//! - Invisible instances and instances on unknown layers are not drawn.

mod frame;
mod renderer;

pub use frame::{CameraTransform, Drawable, Paint, PopupView, RenderFrame, bar_label};
pub use renderer::{DebugTextRenderer, Renderer};
