//! Scene kernel: runtime instances, behaviors, the event interpreter, the
//! camera, audio bookkeeping and save state.
//!
//! A [`Session`] owns everything mutable. The host feeds input, calls
//! [`Session::tick`] once per frame with the elapsed seconds, and reads the
//! instance list and camera back for drawing.
//!
//! Tick order: behaviors, bar sync, animations, the event pass, deferred
//! load / scene change / spawns and destroys, camera, input history.
//!
//! # Invariants
//! - The instance list is stable during the event pass; spawns and destroys
//!   become visible on the next tick.
//! - Templates are never mutated; every instance owns its own copy.
//! - A `scene_start` condition holds once per event per scene activation.
//! - While a popup is open no gameplay state advances.
//! - Missing object references make conditions false and skip actions;
//!   they are never errors.

pub mod actions;
pub mod audio;
pub mod behaviors;
pub mod camera;
mod conditions;
pub mod instance;
pub mod save;
pub mod session;
pub mod store;


pub use actions::substitute_globals;
pub use audio::{AudioBackend, Mixer, NullAudio, PlaybackId};
pub use camera::{Camera, CameraBounds, CameraLerp, CameraState, MIN_ZOOM};
pub use instance::{AnimationState, BehaviorState, RuntimeInstance};
pub use save::{SaveError, SaveState};
pub use session::{Popup, Session, SessionConfig, SessionError, TickOutcome};
pub use store::InstanceStore;
