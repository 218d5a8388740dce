//! Device identity and session gating for the doorstep delivery apps.
//!
//! The library half (fingerprinting, device tracking, route guard, remote
//! adapters) is what front ends embed; the server half owns the device
//! store and verifies bearer sessions.

pub mod client;
pub mod common;
pub mod config;
pub mod database;
pub mod extractors;
pub mod fingerprint;
pub mod guard;
pub mod logging;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod session;
pub mod state;
pub mod tracking;
