//! Configuration for bookshelf paths and logging.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (BOOKSHELF_HOME, BOOKSHELF_DATABASE, BOOKSHELF_LOG)
//! 2. Config file (.bookshelf/config.yaml)
//! 3. Defaults (~/.bookshelf, ~/.bookshelf/library.db, "info")
//!
//! Config file discovery:
//! - Searches current directory and parents for .bookshelf/config.yaml
//! - Paths in config file are relative to the .bookshelf/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Default database file name inside the home directory
const DEFAULT_DATABASE: &str = "library.db";

/// Default tracing filter
const DEFAULT_LOG_FILTER: &str = "info";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub log: Option<LogConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .bookshelf/)
    pub home: Option<String>,
    /// SQLite database file (relative to .bookshelf/)
    pub database: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. "bookshelf=debug"
    pub filter: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// Catalog database file
    pub database: PathBuf,
    /// Default log filter when RUST_LOG is unset
    pub log_filter: String,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".bookshelf").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Merge environment, config file and defaults
fn resolve(
    config: Option<(&Path, ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
    default_home: PathBuf,
) -> ResolvedConfig {
    let (config_file, file) = match config {
        Some((path, file)) => (Some(path.to_path_buf()), Some(file)),
        None => (None, None),
    };

    // Paths in the file are relative to the .bookshelf/ directory
    let base_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let paths = file.as_ref().map(|f| f.paths.clone()).unwrap_or_default();

    let home = env("BOOKSHELF_HOME")
        .map(PathBuf::from)
        .or_else(|| paths.home.as_deref().map(|p| resolve_path(&base_dir, p)))
        .unwrap_or(default_home);

    let database = env("BOOKSHELF_DATABASE")
        .map(PathBuf::from)
        .or_else(|| paths.database.as_deref().map(|p| resolve_path(&base_dir, p)))
        .unwrap_or_else(|| home.join(DEFAULT_DATABASE));

    let log_filter = env("BOOKSHELF_LOG")
        .or_else(|| file.and_then(|f| f.log).and_then(|l| l.filter))
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    ResolvedConfig {
        home,
        database,
        log_filter,
        config_file,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".bookshelf");

    let config = match find_config_file() {
        Some(path) => {
            let file = load_config_file(&path)?;
            Some((path, file))
        }
        None => None,
    };

    Ok(resolve(
        config.as_ref().map(|(path, file)| (path.as_path(), file.clone())),
        |key| std::env::var(key).ok(),
        default_home,
    ))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Get the catalog database path
pub fn database_path() -> Result<PathBuf> {
    Ok(config()?.database.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(None, env_from(&[]), PathBuf::from("/home/u/.bookshelf"));

        assert_eq!(config.home, PathBuf::from("/home/u/.bookshelf"));
        assert_eq!(config.database, PathBuf::from("/home/u/.bookshelf/library.db"));
        assert_eq!(config.log_filter, "info");
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = resolve(
            None,
            env_from(&[
                ("BOOKSHELF_HOME", "/srv/shelf"),
                ("BOOKSHELF_LOG", "bookshelf=debug"),
            ]),
            PathBuf::from("/home/u/.bookshelf"),
        );

        assert_eq!(config.home, PathBuf::from("/srv/shelf"));
        assert_eq!(config.database, PathBuf::from("/srv/shelf/library.db"));
        assert_eq!(config.log_filter, "bookshelf=debug");
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".bookshelf");
        std::fs::create_dir_all(&dir).unwrap();

        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./state
  database: ./state/catalog.db
log:
  filter: warn
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        assert_eq!(parsed.version, "1.0");
        assert_eq!(parsed.paths.home, Some("./state".to_string()));

        let config = resolve(
            Some((config_path.as_path(), parsed)),
            env_from(&[]),
            PathBuf::from("/unused"),
        );
        assert_eq!(config.home, dir.join("./state"));
        assert_eq!(config.database, dir.join("./state/catalog.db"));
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_env_beats_file() {
        let parsed: ConfigFile = serde_yaml::from_str(
            "version: \"1.0\"\npaths:\n  database: /from/file.db\n",
        )
        .unwrap();

        let config = resolve(
            Some((Path::new("/p/.bookshelf/config.yaml"), parsed)),
            env_from(&[("BOOKSHELF_DATABASE", "/from/env.db")]),
            PathBuf::from("/home/u/.bookshelf"),
        );

        assert_eq!(config.database, PathBuf::from("/from/env.db"));
        assert_eq!(config.home, PathBuf::from("/home/u/.bookshelf"));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project/.bookshelf");

        assert_eq!(
            resolve_path(&base, "library.db"),
            PathBuf::from("/home/user/project/.bookshelf/library.db")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path.db"),
            PathBuf::from("/absolute/path.db")
        );
    }
}
