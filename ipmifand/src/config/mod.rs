//! Configuration management module
//!
//! Loads the configuration file once at startup and merges command-line
//! overrides into it.

mod runtime_config;

pub(crate) use runtime_config::RuntimeConfig;
