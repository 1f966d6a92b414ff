//! Core configuration structures and loading logic

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file
    Io(std::io::Error),
    /// TOML parsing error
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// TCP port bound on the loopback interface (default 3456)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3456
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// yt-dlp invocation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct YtdlpConfig {
    /// Path to the yt-dlp executable; a bare name is resolved via PATH
    #[serde(default = "default_ytdlp_bin")]
    pub bin: PathBuf,
}

fn default_ytdlp_bin() -> PathBuf {
    PathBuf::from("yt-dlp")
}

impl Default for YtdlpConfig {
    fn default() -> Self {
        Self {
            bin: default_ytdlp_bin(),
        }
    }
}

/// Download destination configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DownloadsConfig {
    /// Destination directory (falls back to the user's Downloads directory if None)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self { dir: None }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ytdlp: YtdlpConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Parses the config.toml file and handles missing optional fields with defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Overrides the following values if environment variables are set:
    /// - SERVER_PORT -> server.port
    /// - YTDLP_BIN -> ytdlp.bin
    /// - DOWNLOADS_DIR -> downloads.dir
    pub fn apply_env_overrides(&mut self) {
        // SERVER_PORT
        if let Ok(val) = env::var("SERVER_PORT") {
            if let Ok(port) = val.parse::<u16>() {
                self.server.port = port;
            }
        }

        // YTDLP_BIN
        if let Ok(val) = env::var("YTDLP_BIN") {
            if !val.is_empty() {
                self.ytdlp.bin = PathBuf::from(val);
            }
        }

        // DOWNLOADS_DIR
        if let Ok(val) = env::var("DOWNLOADS_DIR") {
            if !val.is_empty() {
                self.downloads.dir = Some(PathBuf::from(val));
            }
        }
    }

    /// Load configuration from file and apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration if the file exists, otherwise start from defaults
    ///
    /// Environment overrides apply either way. The daemon runs usefully with
    /// no config file at all, so only an unreadable or malformed file is an
    /// error here.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = if path.as_ref().exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests don't interfere with each other
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to clear all config-related env vars
    fn clear_env_vars() {
        env::remove_var("SERVER_PORT");
        env::remove_var("YTDLP_BIN");
        env::remove_var("DOWNLOADS_DIR");
    }

    // Property: configuration parsing and environment override.
    //
    // *For any* valid TOML configuration string and set of environment variable
    // overrides, the loaded configuration parses all sections (server, ytdlp,
    // downloads) and applies SERVER_PORT, YTDLP_BIN and DOWNLOADS_DIR on top.

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_config_parses_all_sections(
            port in 1u16..=u16::MAX,
            bin in "[a-zA-Z0-9_./-]{1,40}",
            dir in proptest::option::of("[a-zA-Z0-9_./-]{1,40}"),
        ) {
            let toml_str = format!(
                r#"
[server]
port = {}

[ytdlp]
bin = "{}"

[downloads]
{}
"#,
                port,
                bin,
                dir.as_ref().map(|d| format!("dir = \"{}\"", d)).unwrap_or_default()
            );

            let config = Config::parse_toml(&toml_str).expect("Valid TOML should parse");

            prop_assert_eq!(config.server.port, port);
            prop_assert_eq!(config.ytdlp.bin, PathBuf::from(bin));
            prop_assert_eq!(config.downloads.dir, dir.map(PathBuf::from));
        }

        #[test]
        fn prop_env_overrides_server_port(
            initial_port in 1u16..=u16::MAX,
            override_port in 1u16..=u16::MAX,
        ) {
            let _guard = ENV_MUTEX.lock().unwrap();
            clear_env_vars();

            let toml_str = format!(
                r#"
[server]
port = {}
"#,
                initial_port
            );

            let mut config = Config::parse_toml(&toml_str).expect("Valid TOML");

            env::set_var("SERVER_PORT", override_port.to_string());
            config.apply_env_overrides();
            clear_env_vars();

            prop_assert_eq!(config.server.port, override_port);
        }

        #[test]
        fn prop_env_overrides_ytdlp_bin(
            initial_bin in "[a-zA-Z0-9_./-]{1,40}",
            override_bin in "[a-zA-Z0-9_./-]{1,40}",
        ) {
            let _guard = ENV_MUTEX.lock().unwrap();
            clear_env_vars();

            let toml_str = format!(
                r#"
[ytdlp]
bin = "{}"
"#,
                initial_bin
            );

            let mut config = Config::parse_toml(&toml_str).expect("Valid TOML");

            env::set_var("YTDLP_BIN", &override_bin);
            config.apply_env_overrides();
            clear_env_vars();

            prop_assert_eq!(config.ytdlp.bin, PathBuf::from(override_bin));
        }

        #[test]
        fn prop_env_overrides_downloads_dir(
            initial_dir in proptest::option::of("[a-zA-Z0-9_./-]{1,40}"),
            override_dir in "[a-zA-Z0-9_./-]{1,40}",
        ) {
            let _guard = ENV_MUTEX.lock().unwrap();
            clear_env_vars();

            let toml_str = format!(
                r#"
[downloads]
{}
"#,
                initial_dir.as_ref().map(|d| format!("dir = \"{}\"", d)).unwrap_or_default()
            );

            let mut config = Config::parse_toml(&toml_str).expect("Valid TOML");

            env::set_var("DOWNLOADS_DIR", &override_dir);
            config.apply_env_overrides();
            clear_env_vars();

            prop_assert_eq!(config.downloads.dir, Some(PathBuf::from(override_dir)));
        }
    }

    // Test that missing sections use defaults
    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse_toml("").expect("Empty TOML should parse");

        assert_eq!(config.server.port, 3456);
        assert_eq!(config.ytdlp.bin, PathBuf::from("yt-dlp"));
        assert_eq!(config.downloads.dir, None);
    }

    // Test partial config with some sections missing
    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let toml_str = r#"
[server]
port = 9000
"#;
        let config = Config::parse_toml(toml_str).expect("Partial TOML should parse");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.ytdlp.bin, PathBuf::from("yt-dlp")); // default
        assert_eq!(config.downloads.dir, None); // default
    }

    #[test]
    fn test_invalid_port_env_value_is_ignored() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env_vars();

        let mut config = Config::default();
        env::set_var("SERVER_PORT", "not-a-port");
        config.apply_env_overrides();
        clear_env_vars();

        assert_eq!(config.server.port, 3456);
    }

    #[test]
    fn test_empty_bin_env_value_is_ignored() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env_vars();

        let mut config = Config::default();
        env::set_var("YTDLP_BIN", "");
        config.apply_env_overrides();
        clear_env_vars();

        assert_eq!(config.ytdlp.bin, PathBuf::from("yt-dlp"));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env_vars();

        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("missing.toml"))
            .expect("Missing file should fall back to defaults");

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_reads_existing_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env_vars();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 4000\n").unwrap();

        let config = Config::load_or_default(&path).expect("File should load");
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_load_or_default_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport=").unwrap();

        let result = Config::load_or_default(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from_file(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
