//! Argument parsing for the `community-hub` binary.

pub mod args;

pub use args::{Cli, Commands};
