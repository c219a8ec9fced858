//! CLI command implementations.

pub mod common;
pub mod devices;
pub mod play;
pub mod render;
