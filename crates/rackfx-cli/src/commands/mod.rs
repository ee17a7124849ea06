//! CLI command implementations.

pub mod common;
pub mod create;
pub mod effects;
pub mod inspect;
pub mod render;
