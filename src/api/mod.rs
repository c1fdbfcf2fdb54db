//! HTTP surface of the hub.
//!
//! Handlers stay thin: they extract the caller, validate the body and hand
//! off to a service from [`AppState`]. Authentication and the three rate
//! limit tiers live in `middleware`; `routes` wires everything under `/api`.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
