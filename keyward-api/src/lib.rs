//! # Keyward API Library
//!
//! HTTP façade over the Keyward core. Exposes the router and configuration
//! so integration tests can drive the same application the binary serves.

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
