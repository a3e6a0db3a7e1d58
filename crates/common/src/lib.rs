//! Shared types for the gamma runtime.
//!
//! # Invariants
//! - Geometry is 2D, y grows downward, rotations are in degrees.
//! - Dynamic values never fail to compare; mismatched kinds compare false.

pub mod types;
pub mod value;

pub use types::{MouseButton, Point, Rect, Size};
pub use value::{ArithmeticOp, CompareOp, Value, VariableMap};
