//! Library side of `agentctl`
//!
//! Configuration loading, the per-command agent wiring and the status
//! report live here so they can be tested without the binary.

pub mod commands;
pub mod config;
pub mod status;

pub use commands::{parse_functions, resolution_json, template_store, Session};
pub use config::{AppConfig, ConfigLoader};
pub use status::{ServerStatus, StatusReport};
