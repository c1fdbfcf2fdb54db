//! Community Hub - community discovery and engagement API
//!
//! Users join interest-based communities, post, schedule events and RSVP,
//! earn reputation points that unlock levels and buy badges, and report
//! content. A report threshold escalates targets to community moderators.
//! A hosted language model powers chat, recommendations and moderation.
//!
//! # Architecture Layers
//!
//! - **cli** / **commands**: `serve`, `migrate` and `jobs`
//! - **config**: environment settings and constants
//! - **domain**: entities and pure rules (levels, threshold, roles)
//! - **services**: use cases behind mockable traits
//! - **infra**: Postgres repositories, Redis, language model clients, job queue
//! - **jobs**: background job handlers
//! - **api**: HTTP handlers, middleware and routes
//! - **types**: pagination and response helpers
//! - **errors**: centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! community-hub serve --port 3000
//! community-hub migrate status
//! community-hub jobs work
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Actor, ReputationLevel, User, UserRole};
pub use errors::{AppError, AppResult};
pub use infra::Cache;
