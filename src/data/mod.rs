//! Survey data layer: variable catalogue, interval midpoints, head
//! extraction, and the synthetic extract generator.

pub mod heads;
pub mod midpoint;
pub mod synth;
pub mod variables;

pub use heads::{extract_heads, merge_heads};
pub use synth::{SyntheticExtract, generate};
pub use variables::VarSpec;
