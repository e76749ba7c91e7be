use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Driver configuration, loaded from venus.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenusConfig {
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Renderer socket path
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
    /// Command ring capacity in bytes (power of two)
    #[serde(default = "default_ring_size")]
    pub ring_size: usize,
    /// Extensions to request during negotiation (empty = all known)
    #[serde(default)]
    pub request_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default log filter, overridden by the VN_LOG environment variable
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for VenusConfig {
    fn default() -> Self {
        Self {
            renderer: RendererConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            ring_size: default_ring_size(),
            request_extensions: Vec::new(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl VenusConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {}", path, e)))?;
        let config: VenusConfig =
            toml::from_str(&content).map_err(|e| CoreError::Config(e.to_string()))?;
        if !config.renderer.ring_size.is_power_of_two() {
            return Err(CoreError::Config(format!(
                "ring_size {} is not a power of two",
                config.renderer.ring_size
            )));
        }
        Ok(config)
    }

    /// Load configuration from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: &str) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

/// Default config file search order: `/etc/venus/venus.toml`, then
/// `./venus.toml`.
pub fn default_config_path() -> String {
    let system_path = "/etc/venus/venus.toml";
    if std::path::Path::new(system_path).exists() {
        return system_path.to_string();
    }
    "venus.toml".to_string()
}

fn default_socket_path() -> String {
    "/run/venus/renderer.sock".to_string()
}

fn default_ring_size() -> usize {
    1 << 16
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_all_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = VenusConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.renderer.socket_path, "/run/venus/renderer.sock");
        assert_eq!(config.renderer.ring_size, 1 << 16);
        assert!(config.renderer.request_extensions.is_empty());
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[renderer]\nsocket_path = \"/tmp/vn.sock\"\nring_size = 4096\n\
             request_extensions = [\"VK_KHR_timeline_semaphore\"]\n"
        )
        .unwrap();

        let config = VenusConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.renderer.socket_path, "/tmp/vn.sock");
        assert_eq!(config.renderer.ring_size, 4096);
        assert_eq!(
            config.renderer.request_extensions,
            vec!["VK_KHR_timeline_semaphore"]
        );
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn non_power_of_two_ring_size_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[renderer]\nring_size = 1000\n").unwrap();

        assert!(matches!(
            VenusConfig::load(file.path().to_str().unwrap()),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = VenusConfig::load_or_default("/nonexistent/venus.toml");
        assert_eq!(config.renderer.ring_size, 1 << 16);
    }
}
