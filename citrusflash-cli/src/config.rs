//! Configuration file support for citrusflash.
//!
//! Configuration is loaded from multiple sources with the following priority (highest first):
//! 1. Command-line arguments
//! 2. Environment variables (CITRUSFLASH_*)
//! 3. Local config file (./citrusflash.toml)
//! 4. Global config file (~/.config/citrusflash/config.toml)
//!
//! A file given with `--config` replaces both files.

use {
    citrusflash::TargetFamily,
    directories::ProjectDirs,
    log::{debug, warn},
    serde::{Deserialize, Serialize},
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Name of the local configuration file.
pub const LOCAL_CONFIG_FILE: &str = "citrusflash.toml";

/// Connection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Preferred serial port (e.g., "/dev/ttyUSB0" or "COM3").
    pub port: Option<String>,
    /// Default baud rate.
    pub baud: Option<u32>,
    /// Acknowledgement timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Transfer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Default target loader.
    pub target: Option<TargetFamily>,
    /// Retransmissions allowed per frame.
    pub retries: Option<u32>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection configuration.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Transfer configuration.
    #[serde(default)]
    pub transfer: TransferConfig,
}

impl Config {
    /// Load configuration from the global and local files.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global_config) = Self::load_from_file(&global_path) {
                debug!("Loaded global config from {}", global_path.display());
                config.merge(global_config);
            }
        }

        if let Some(local_config) = Self::load_from_file(Path::new(LOCAL_CONFIG_FILE)) {
            debug!("Loaded local config from {LOCAL_CONFIG_FILE}");
            config.merge(local_config);
        }

        config
    }

    /// Load configuration from a specific file path (--config flag).
    pub fn load_from_path(path: &Path) -> Self {
        if let Some(config) = Self::load_from_file(path) {
            debug!("Loaded config from {}", path.display());
            config
        } else {
            warn!(
                "Could not load config from {}, using defaults",
                path.display()
            );
            Self::default()
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)
                .map_err(|e| warn!("Failed to parse config file {}: {e}", path.display()))
                .ok(),
            Err(e) => {
                warn!("Failed to read config file {}: {e}", path.display());
                None
            },
        }
    }

    /// Parse a configuration document.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Get the global configuration directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "citrusflash").map(|dirs| {
            dirs.config_dir()
                .to_path_buf()
        })
    }

    /// Get the global configuration file path.
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Merge another config into this one; values set in `other` win.
    fn merge(&mut self, other: Self) {
        let Self {
            connection,
            transfer,
        } = other;

        if connection
            .port
            .is_some()
        {
            self.connection
                .port = connection.port;
        }
        if connection
            .baud
            .is_some()
        {
            self.connection
                .baud = connection.baud;
        }
        if connection
            .timeout_secs
            .is_some()
        {
            self.connection
                .timeout_secs = connection.timeout_secs;
        }

        if transfer
            .target
            .is_some()
        {
            self.transfer
                .target = transfer.target;
        }
        if transfer
            .retries
            .is_some()
        {
            self.transfer
                .retries = transfer.retries;
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::fs, tempfile::tempdir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.connection.port.is_none());
        assert!(config.connection.baud.is_none());
        assert!(config.connection.timeout_secs.is_none());
        assert!(config.transfer.target.is_none());
        assert!(config.transfer.retries.is_none());
    }

    #[test]
    fn test_parse_full_document() {
        let config = Config::parse(
            r#"
[connection]
port = "/dev/ttyUSB0"
baud = 576000
timeout_secs = 3

[transfer]
target = "cinnamon"
retries = 4
"#,
        )
        .unwrap();

        assert_eq!(config.connection.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.connection.baud, Some(576_000));
        assert_eq!(config.connection.timeout_secs, Some(3));
        assert_eq!(config.transfer.target, Some(TargetFamily::Cinnamon));
        assert_eq!(config.transfer.retries, Some(4));
    }

    #[test]
    fn test_parse_partial_document() {
        let config = Config::parse("[transfer]\ntarget = \"cboot\"\n").unwrap();
        assert_eq!(config.transfer.target, Some(TargetFamily::CBoot));
        assert!(config.connection.port.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_target() {
        assert!(Config::parse("[transfer]\ntarget = \"ws63\"\n").is_err());
    }

    #[test]
    fn test_merge_overrides_only_set_values() {
        let mut base = Config::default();
        base.connection.port = Some("/dev/ttyS0".to_string());
        base.connection.baud = Some(230_400);
        base.transfer.retries = Some(10);

        let mut other = Config::default();
        other.connection.port = Some("/dev/ttyUSB1".to_string());
        other.transfer.target = Some(TargetFamily::Citrus);

        base.merge(other);

        assert_eq!(base.connection.port.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(base.connection.baud, Some(230_400));
        assert_eq!(base.transfer.target, Some(TargetFamily::Citrus));
        assert_eq!(base.transfer.retries, Some(10));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempdir().unwrap();
        let path = dir
            .path()
            .join("custom.toml");
        fs::write(&path, "[connection]\nbaud = 921600\n").unwrap();

        let config = Config::load_from_path(&path);
        assert_eq!(config.connection.baud, Some(921_600));
    }

    #[test]
    fn test_load_from_path_invalid_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir
            .path()
            .join("broken.toml");
        fs::write(&path, "invalid toml [[[").unwrap();

        let config = Config::load_from_path(&path);
        assert!(config.connection.baud.is_none());
    }

    #[test]
    fn test_load_from_missing_path() {
        let config = Config::load_from_path(Path::new("/nonexistent/citrusflash.toml"));
        assert!(config.transfer.target.is_none());
    }

    #[test]
    fn test_global_config_path_file_name() {
        if let Some(path) = Config::global_config_path() {
            assert!(path.ends_with("config.toml"));
        }
    }
}
