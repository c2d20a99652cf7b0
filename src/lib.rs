// ABOUTME: Library root for dirigent - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod broker;
pub mod config;
pub mod director;
pub mod error;
pub mod exec;
pub mod params;
pub mod registry;
pub mod template;
pub mod types;
