//! Entry points behind each `community-hub` subcommand.

pub mod jobs;
pub mod migrate;
pub mod serve;
