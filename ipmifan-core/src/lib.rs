//! ipmifan Core Library
//!
//! Shared types, configuration schema and error handling for the IPMI fan
//! governor. This crate is used by both the hardware layer and the daemon.

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{default_config_path, ConfigFormat, FileConfig, GeneralConfig};
pub use error::*;
pub use types::*;
