use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;
use crate::protocol::NetworkSystem;
use crate::shell::Tool;

pub const DEFAULT_CONFIG_FILE: &str = "netassist.yaml";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings as read from the YAML file; every key is optional.
#[derive(Deserialize, Default, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    timeout_secs: Option<u64>,
    log_file: Option<PathBuf>,
    default_source_system: Option<NetworkSystem>,
    default_target_system: Option<NetworkSystem>,
    default_tool: Option<Tool>,
}

/// Command line values that take precedence over the file.
#[derive(Default, Debug, Clone)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub log_file: Option<PathBuf>,
    pub default_source_system: NetworkSystem,
    pub default_target_system: NetworkSystem,
    pub default_tool: Tool,
}

impl Default for Config {
    fn default() -> Self {
        Self::from(FileConfig::default())
    }
}

impl From<FileConfig> for Config {
    fn from(value: FileConfig) -> Self {
        Self {
            api_url: value.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout: Duration::from_secs(value.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            log_file: value.log_file,
            default_source_system: value.default_source_system.unwrap_or(NetworkSystem::Cisco),
            default_target_system: value.default_target_system.unwrap_or(NetworkSystem::Arista),
            default_tool: value.default_tool.unwrap_or_default(),
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        let file: FileConfig = serde_yaml::from_str(text)?;
        Ok(Self::from(file))
    }

    /// Loads `path`, or `netassist.yaml` from the working directory when no
    /// path is given and that file exists, then applies `overrides`.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, Error> {
        Self::load_in(Path::new(""), path, overrides)
    }

    /// Like [`Config::load`], with the default file looked up in `dir`.
    fn load_in(dir: &Path, path: Option<&Path>, overrides: Overrides) -> Result<Self, Error> {
        let default_path = dir.join(DEFAULT_CONFIG_FILE);
        let path = match path {
            Some(path) => Some(path),
            None if default_path.is_file() => Some(default_path.as_path()),
            None => None,
        };
        let mut config = match path {
            Some(path) => Self::from_yaml(&fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply(overrides);
        Ok(config)
    }

    fn apply(&mut self, overrides: Overrides) {
        if let Some(api_url) = overrides.api_url {
            self.api_url = api_url;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if overrides.log_file.is_some() {
            self.log_file = overrides.log_file;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use super::{Config, Overrides, DEFAULT_API_URL, DEFAULT_CONFIG_FILE};
    use crate::error::Error;
    use crate::protocol::NetworkSystem;
    use crate::shell::Tool;

    #[test]
    fn empty_document_gives_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.default_source_system, NetworkSystem::Cisco);
        assert_eq!(config.default_target_system, NetworkSystem::Arista);
        assert_eq!(config.default_tool, Tool::Classifier);
    }

    #[test]
    fn reads_every_key() {
        let config = Config::from_yaml(
            "api_url: http://noc.example.com:8080/api
timeout_secs: 5
log_file: /tmp/netassist.log
default_source_system: Arista
default_target_system: Cisco
default_tool: config-generator
",
        )
        .unwrap();
        assert_eq!(config.api_url, "http://noc.example.com:8080/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/netassist.log")));
        assert_eq!(config.default_source_system, NetworkSystem::Arista);
        assert_eq!(config.default_target_system, NetworkSystem::Cisco);
        assert_eq!(config.default_tool, Tool::ConfigGenerator);
    }

    #[test]
    fn rejects_unknown_keys_and_systems() {
        assert!(matches!(
            Config::from_yaml("api_ur1: http://localhost"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_yaml("default_source_system: Juniper"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noc.yaml");
        fs::write(&path, "api_url: http://file:5000\ntimeout_secs: 9\n").unwrap();

        let config = Config::load(
            Some(path.as_path()),
            Overrides {
                api_url: Some("http://flag:5000".to_string()),
                timeout_secs: None,
                log_file: Some(PathBuf::from("netassist.log")),
            },
        )
        .unwrap();
        assert_eq!(config.api_url, "http://flag:5000");
        assert_eq!(config.timeout, Duration::from_secs(9));
        assert_eq!(config.log_file, Some(PathBuf::from("netassist.log")));
    }

    #[test]
    fn falls_back_to_file_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_in(dir.path(), None, Overrides::default()).unwrap();
        assert_eq!(config, Config::default());

        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "api_url: http://lab:5000\ndefault_tool: translator\n",
        )
        .unwrap();
        let config = Config::load_in(dir.path(), None, Overrides::default()).unwrap();
        assert_eq!(config.api_url, "http://lab:5000");
        assert_eq!(config.default_tool, Tool::Translator);

        // an explicit path wins over the file in the directory
        let other = dir.path().join("other.yaml");
        fs::write(&other, "timeout_secs: 3\n").unwrap();
        let config = Config::load_in(dir.path(), Some(other.as_path()), Overrides::default()).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = Config::load(
            Some(Path::new("/nonexistent/netassist.yaml")),
            Overrides::default(),
        );
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
