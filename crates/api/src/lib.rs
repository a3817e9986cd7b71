//! Character Studio API server library.
//!
//! Exposes the building blocks (config, state, error handling, auth, routes,
//! background training) so integration tests and the binary entrypoint can
//! both access them.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
