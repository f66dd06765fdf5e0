//! fiscal-server: HTTP front for the fiscal projection engine.

pub mod env_config;
pub mod server;
