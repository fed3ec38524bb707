//! Polling service: published questions, their choices, and vote tallies.
//!
//! The library exposes every layer so the binary and the integration tests
//! assemble the same application.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod poll;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;
