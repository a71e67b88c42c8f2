//! # Conveyor Server Library
//!
//! Wiring for the Conveyor server binary: logging setup, the application
//! lifecycle and startup output.

pub mod app;
pub mod startup;
pub mod telemetry;

pub use app::Application;
