//! Regression model declarations.
//!
//! Models are plain `ModelSpec` values so the runner, the exporters and the
//! manifest can all stay generic over the battery.

pub mod registry;

pub use registry::*;
