//! Configuration for the pin archiver.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (DISCORD_TOKEN, PINARCHIVER_DB, PINARCHIVER_API_BASE)
//! 2. Config file (~/.pinarchiver/config.yaml)
//! 3. Defaults (~/.pinarchiver/pinarchiver.db)

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Discord bot token
    pub token: Option<String>,

    /// Path to the SQLite settings database
    pub database_path: Option<String>,

    /// Override for the Discord API base URL
    pub api_base: Option<String>,
}

/// Resolved settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Discord bot token
    pub token: String,

    /// Path to the SQLite settings database
    pub database_path: PathBuf,

    /// Discord API base URL override, if any
    pub api_base: Option<String>,
}

/// Directory holding the config file and default database (~/.pinarchiver)
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home.join(".pinarchiver"))
}

/// Load and parse a config file if it exists
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Merge env overrides, file values, and defaults into resolved settings
fn resolve(
    file: ConfigFile,
    token_env: Option<String>,
    db_env: Option<String>,
    api_env: Option<String>,
    base_dir: &Path,
) -> Result<Settings> {
    let token = token_env.or(file.token).context(
        "No Discord token configured. Set DISCORD_TOKEN or add `token` to the config file.",
    )?;

    let database_path = db_env
        .map(PathBuf::from)
        .or_else(|| file.database_path.map(PathBuf::from))
        .unwrap_or_else(|| base_dir.join("pinarchiver.db"));

    let api_base = api_env.or(file.api_base);

    Ok(Settings {
        token,
        database_path,
        api_base,
    })
}

impl Settings {
    /// Load settings from all sources
    pub fn load() -> Result<Self> {
        let dir = config_dir()?;
        let file = load_config_file(&dir.join("config.yaml"))?;

        resolve(
            file,
            env::var("DISCORD_TOKEN").ok(),
            env::var("PINARCHIVER_DB").ok(),
            env::var("PINARCHIVER_API_BASE").ok(),
            &dir,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
token: "abc123"
database_path: /data/pins.db
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.token, Some("abc123".to_string()));
        assert_eq!(config.database_path, Some("/data/pins.db".to_string()));
        assert_eq!(config.api_base, None);
    }

    #[test]
    fn test_missing_config_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let config = load_config_file(&temp.path().join("missing.yaml")).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let file = ConfigFile {
            token: Some("from-file".to_string()),
            database_path: Some("/file/pins.db".to_string()),
            api_base: None,
        };

        let settings = resolve(
            file,
            Some("from-env".to_string()),
            None,
            None,
            Path::new("/base"),
        )
        .unwrap();

        assert_eq!(settings.token, "from-env");
        assert_eq!(settings.database_path, PathBuf::from("/file/pins.db"));
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = resolve(
            ConfigFile::default(),
            Some("tok".to_string()),
            None,
            None,
            Path::new("/base"),
        )
        .unwrap();

        assert_eq!(settings.database_path, PathBuf::from("/base/pinarchiver.db"));
        assert!(settings.api_base.is_none());
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let result = resolve(ConfigFile::default(), None, None, None, Path::new("/base"));
        assert!(result.is_err());
    }
}
