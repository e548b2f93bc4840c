#![deny(missing_docs)]

//! Core library for the policy QA server.

/// HTTP routing and REST handlers.
pub mod api;
/// Bearer-token access gate.
pub mod auth;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Request and answer counters.
pub mod metrics;
/// Document fetch, extraction, and answer resolution pipeline.
pub mod processing;
