//! Core traits and their implementations for dense types.

pub mod traits;
pub mod wrappers;

pub use traits::*;
