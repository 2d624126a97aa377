//! Default path resolution for the configuration file
//!
//! Uses XDG Base Directory specification when available, with a system-wide fallback.

use std::path::PathBuf;

/// Name of the configuration file inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "fan_control.yaml";

/// Returns the default path for the configuration file.
///
/// Uses XDG config directory if available:
/// - Linux: `~/.config/ipmifan/fan_control.yaml`
/// - Fallback: `/etc/ipmifan/fan_control.yaml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("ipmifan")
        .join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path_is_yaml() {
        let path = default_config_path();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("yaml"));
        assert!(path.ends_with("ipmifan/fan_control.yaml"));
    }
}
