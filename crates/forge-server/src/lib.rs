//! HTTP surface and telemetry setup for the meshforge repository engine.
//!
//! The binary (`src/main.rs`) is a thin CLI wrapper around [`http::router`];
//! this library split lets integration tests drive the router in-process.

pub mod http;
pub mod telemetry;
