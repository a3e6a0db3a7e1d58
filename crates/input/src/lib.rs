//! Input tracking: the host feeds raw key and pointer events, conditions read
//! the current and previous tick's state.
//!
//! # Invariants
//! - "Released" means held last tick and not held now; history rotates
//!   exactly once per tick, after the event pass.
//! - The pointer is stored in world coordinates, mapped at event time.
//! - A click target lives for exactly one tick.

pub mod event;
pub mod tracker;

pub use event::InputEvent;
pub use tracker::InputTracker;
