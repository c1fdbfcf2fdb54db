//! Settings read from the environment plus the hub's fixed rules
//! (reputation awards, level thresholds, report threshold, cache keys).

mod constants;
mod settings;

pub use constants::*;
pub use settings::{AiProvider, AiSettings, Config};
