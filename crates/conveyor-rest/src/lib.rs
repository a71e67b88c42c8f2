//! # Conveyor REST
//!
//! REST API layer using Axum for Conveyor.
//! Provides HTTP endpoints for job submission, inspection, metrics and health checks.

pub mod controllers;
pub mod middleware;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
