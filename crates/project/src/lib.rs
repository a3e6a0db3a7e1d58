//! Project description model: settings, scenes, layers, object templates,
//! behaviors and the event tree.
//!
//! Everything here is plain data loaded from a JSON document with camelCase
//! fields and snake_case type tags.
//!
//! # Invariants
//! - Templates are immutable once a session starts; the kernel clones them.
//! - Condition and action vocabularies are closed enums.
//! - Object references are string ids and may dangle; consumers resolve
//!   them at use time.

pub mod behavior;
pub mod event;
pub mod lint;
pub mod object;
pub mod project;
pub mod scene;

pub use behavior::{Behavior, BehaviorKind, ControlScheme};
pub use event::{
    Action, ActionKind, Condition, ConditionKind, ObjectProperty, PositionType, SettableProperty,
    ZoomOp,
};
pub use lint::{ProjectIssue, lint};
pub use object::{
    Animation, BarData, BarSource, BarValueSource, GameObject, ObjectKind, SpriteData, TextAlign,
    TextBaseline, TextData,
};
pub use project::{GameSettings, Orientation, Project, ProjectAssets, SoundAsset};
pub use scene::{EventTreeNode, GameEvent, Layer, Scene};

/// Errors from reading or writing a project document.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
