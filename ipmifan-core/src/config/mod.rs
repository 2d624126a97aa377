//! Configuration types for the IPMI fan governor
//!
//! The configuration file is read once at startup. It is deserialized into the
//! raw [`FileConfig`] schema, then validated into immutable
//! [`HostProfile`](crate::HostProfile) values that the daemon works with.
//!
//! Both YAML (the historical format) and TOML are accepted; the format is
//! picked from the file extension with [`ConfigFormat::from_path`].

mod file_config;
mod hosts;
mod paths;

pub use file_config::{ConfigFormat, FileConfig, GeneralConfig, DEFAULT_INTERVAL_SECS};
pub use hosts::{CredentialsEntry, HostEntry};
pub use paths::{default_config_path, CONFIG_FILE_NAME};
