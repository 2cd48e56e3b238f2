//! Settings from an optional TOML file, overridden by command-line flags.

use crate::backend::local::default_presets_file;
use crate::cli::Cli;
use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_NOTICE_MS: u64 = 3000;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
    notice_duration_ms: Option<u64>,
    log_file: Option<PathBuf>,
    local: LocalSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocalSection {
    root: Option<PathBuf>,
    include_ignored: bool,
    presets_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSettings {
    pub root: PathBuf,
    pub include_ignored: bool,
    pub presets_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub request_timeout: Duration,
    pub notice_duration: Duration,
    pub log_file: Option<PathBuf>,
    /// Set when the tree should be served in-process instead of over HTTP.
    pub local: Option<LocalSettings>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("promptpick").join("config.toml"))
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Settings, ConfigError> {
        let file = match &cli.config {
            Some(path) => read_config(path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => read_config(&path)?,
                _ => FileConfig::default(),
            },
        };
        Ok(Settings::merge(file, cli))
    }

    fn merge(file: FileConfig, cli: &Cli) -> Settings {
        let local_root = cli.local.clone().or(if cli.server.is_some() {
            None
        } else {
            file.local.root
        });
        let local = local_root.map(|root| LocalSettings {
            include_ignored: cli.include_ignored || file.local.include_ignored,
            presets_file: file
                .local
                .presets_file
                .unwrap_or_else(|| default_presets_file(&root)),
            root,
        });

        Settings {
            server_url: cli
                .server
                .clone()
                .or(file.server_url)
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            request_timeout: Duration::from_secs(
                file.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            notice_duration: Duration::from_millis(
                file.notice_duration_ms.unwrap_or(DEFAULT_NOTICE_MS),
            ),
            log_file: cli.log_file.clone().or(file.log_file),
            local,
        }
    }
}

fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
    debug!(path = %path.display(), "reading config");
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let settings = Settings::merge(FileConfig::default(), &Cli::default());
        assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.notice_duration, Duration::from_millis(3000));
        assert!(settings.local.is_none());
    }

    #[test]
    fn file_values_are_read_and_flags_win() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
server_url = "http://files:9000"
request_timeout_secs = 5
log_file = "/tmp/from-file.log"

[local]
root = "/srv/repo"
presets_file = "/srv/presets.json"
"#,
        );
        let cli = Cli {
            config: Some(path),
            log_file: Some(PathBuf::from("/tmp/cli.log")),
            ..Cli::default()
        };
        let settings = Settings::load(&cli).unwrap();
        assert_eq!(settings.server_url, "http://files:9000");
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.log_file, Some(PathBuf::from("/tmp/cli.log")));
        let local = settings.local.unwrap();
        assert_eq!(local.root, PathBuf::from("/srv/repo"));
        assert_eq!(local.presets_file, PathBuf::from("/srv/presets.json"));
    }

    #[test]
    fn server_flag_overrides_local_root_from_file() {
        let file = FileConfig {
            local: LocalSection {
                root: Some(PathBuf::from("/srv/repo")),
                ..LocalSection::default()
            },
            ..FileConfig::default()
        };
        let cli = Cli {
            server: Some("http://remote".into()),
            ..Cli::default()
        };
        let settings = Settings::merge(file, &cli);
        assert!(settings.local.is_none());
        assert_eq!(settings.server_url, "http://remote");
    }

    #[test]
    fn local_flag_uses_default_presets_file() {
        let cli = Cli {
            local: Some(PathBuf::from("/work")),
            include_ignored: true,
            ..Cli::default()
        };
        let local = Settings::merge(FileConfig::default(), &cli).local.unwrap();
        assert_eq!(local.presets_file, default_presets_file(Path::new("/work")));
        assert!(local.include_ignored);
    }

    #[test]
    fn broken_files_are_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "server_url = [");
        let cli = Cli {
            config: Some(path),
            ..Cli::default()
        };
        assert!(matches!(Settings::load(&cli), Err(ConfigError::Parse { .. })));

        let missing = Cli {
            config: Some(dir.path().join("nope.toml")),
            ..Cli::default()
        };
        assert!(matches!(Settings::load(&missing), Err(ConfigError::Read { .. })));
    }
}
