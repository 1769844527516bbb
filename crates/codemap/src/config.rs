//! Configuration file support for codemap.
//!
//! Project-local data lives in a `.codemap/` directory:
//! - `.codemap/config.toml` - Configuration file
//! - `.codemap/logs/` - Log files written by `index --watch`
//!
//! Config discovery searches for `.codemap/config.toml` starting from the
//! current directory and walking up to parent directories.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use codemap_index::{IndexerConfig, ScoreConfig, WatcherConfig};
use serde::{Deserialize, Serialize};

/// The codemap data directory name.
pub const CODEMAP_DIR: &str = ".codemap";
/// The config file name within the codemap directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Written by `codemap init`.
pub const DEFAULT_CONFIG: &str = r#"# codemap configuration
# Relative paths are resolved against this .codemap/ directory

[project]
root = ".."  # Parent directory (the actual project root)

[index]
use_gitignore = true  # Also reads .codemapignore
ignore_patterns = ["build", "node_modules"]

[scoring]
depth_decay = 0.8
ignore_tokens = []

[watch]
debounce_ms = 300
"#;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Project settings.
    pub project: ProjectConfig,
    /// Directory indexing settings.
    pub index: IndexSection,
    /// Token scoring settings.
    pub scoring: ScoringSection,
    /// Watch mode settings.
    pub watch: WatchSection,
}

/// Project configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Root directory of the project.
    pub root: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexSection {
    /// Respect `.gitignore` and `.codemapignore`.
    pub use_gitignore: bool,
    /// Extra gitignore-style patterns to skip.
    pub ignore_patterns: Vec<String>,
}

impl Default for IndexSection {
    fn default() -> Self {
        let defaults = IndexerConfig::default();
        Self {
            use_gitignore: defaults.use_gitignore,
            ignore_patterns: defaults.ignore_patterns,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringSection {
    /// Score multiplier per directory level.
    pub depth_decay: f64,
    /// Identifiers excluded from scoring.
    pub ignore_tokens: Vec<String>,
}

impl Default for ScoringSection {
    fn default() -> Self {
        let defaults = ScoreConfig::default();
        Self {
            depth_decay: defaults.depth_decay,
            ignore_tokens: defaults.ignore_tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchSection {
    /// Debounce window for file events in milliseconds.
    pub debounce_ms: u64,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Find and load configuration from current or parent directories.
    pub fn find_and_load() -> Result<Option<(Self, PathBuf)>> {
        let current = std::env::current_dir()?;
        Self::find_and_load_from(&current)
    }

    /// Find and load configuration starting from a specific directory.
    ///
    /// Looks for `.codemap/config.toml` in the directory and its parents and
    /// returns the config with its `.codemap` directory.
    pub fn find_and_load_from(start: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start.to_path_buf();

        loop {
            let codemap_dir = dir.join(CODEMAP_DIR);
            let config_path = codemap_dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::from_file(&config_path)?;
                return Ok(Some((config, codemap_dir)));
            }

            if !dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Resolve the project root relative to the .codemap directory.
    pub fn resolve_root(&self, codemap_dir: Option<&Path>) -> PathBuf {
        match codemap_dir {
            Some(dir) if !self.project.root.is_absolute() => dir.join(&self.project.root),
            _ => self.project.root.clone(),
        }
    }

    pub fn indexer_config(&self) -> IndexerConfig {
        IndexerConfig {
            use_gitignore: self.index.use_gitignore,
            ignore_patterns: self.index.ignore_patterns.clone(),
        }
    }

    pub fn score_config(&self) -> ScoreConfig {
        ScoreConfig {
            depth_decay: self.scoring.depth_decay,
            ignore_tokens: self.scoring.ignore_tokens.clone(),
        }
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        let mut ignore_patterns = WatcherConfig::default().ignore_patterns;
        for pattern in &self.index.ignore_patterns {
            if !ignore_patterns.contains(pattern) {
                ignore_patterns.push(pattern.clone());
            }
        }

        WatcherConfig {
            debounce_duration: Duration::from_millis(self.watch.debounce_ms),
            use_gitignore: self.index.use_gitignore,
            ignore_patterns,
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigValidationError {}

impl Config {
    /// Validate the configuration.
    ///
    /// Returns a list of validation errors if any are found.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        let decay = self.scoring.depth_decay;
        if !(decay > 0.0 && decay <= 1.0) {
            errors.push(ConfigValidationError {
                field: "scoring.depth_decay".to_string(),
                message: format!("Invalid depth decay {decay}. Expected a value in (0, 1]."),
            });
        }

        if self.watch.debounce_ms == 0 {
            errors.push(ConfigValidationError {
                field: "watch.debounce_ms".to_string(),
                message: "Debounce must be at least 1ms.".to_string(),
            });
        }

        if self
            .index
            .ignore_patterns
            .iter()
            .any(|p| p.trim().is_empty())
        {
            errors.push(ConfigValidationError {
                field: "index.ignore_patterns".to_string(),
                message: "Ignore patterns cannot be empty.".to_string(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.project.root, PathBuf::from("."));
        assert!(config.index.use_gitignore);
        assert_eq!(config.scoring.depth_decay, 0.8);
        assert!(config.scoring.ignore_tokens.is_empty());
        assert_eq!(config.watch.debounce_ms, 300);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_default_config_file_matches_defaults() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        let defaults = Config::default();
        assert_eq!(config.project.root, PathBuf::from(".."));
        assert_eq!(config.index.ignore_patterns, defaults.index.ignore_patterns);
        assert_eq!(config.scoring.depth_decay, defaults.scoring.depth_decay);
        assert_eq!(config.watch.debounce_ms, defaults.watch.debounce_ms);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
[scoring]
ignore_tokens = ["main"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.scoring.ignore_tokens, vec!["main"]);
        // Defaults should still apply
        assert_eq!(config.scoring.depth_decay, 0.8);
        assert_eq!(config.watch.debounce_ms, 300);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[project]
root = "/home/user/myproject"

[index]
use_gitignore = false
ignore_patterns = ["third_party"]

[scoring]
depth_decay = 0.5
ignore_tokens = ["main", "init"]

[watch]
debounce_ms = 1000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.project.root, PathBuf::from("/home/user/myproject"));
        assert!(!config.index.use_gitignore);
        assert_eq!(config.index.ignore_patterns, vec!["third_party"]);
        assert_eq!(config.scoring.depth_decay, 0.5);
        assert_eq!(config.watch.debounce_ms, 1000);

        let watcher = config.watcher_config();
        assert_eq!(watcher.debounce_duration, Duration::from_millis(1000));
        assert!(watcher.ignore_patterns.contains(&"third_party".to_string()));
        assert!(watcher.ignore_patterns.contains(&".codemap".to_string()));

        let score = config.score_config();
        assert_eq!(score.ignore_tokens, vec!["main", "init"]);
    }

    #[test]
    fn test_resolve_root() {
        let config = Config::default();
        let codemap_dir = PathBuf::from("/project/.codemap");
        assert_eq!(
            config.resolve_root(Some(&codemap_dir)),
            PathBuf::from("/project/.codemap/.")
        );
        assert_eq!(config.resolve_root(None), PathBuf::from("."));

        let mut absolute = Config::default();
        absolute.project.root = PathBuf::from("/src");
        assert_eq!(absolute.resolve_root(Some(&codemap_dir)), PathBuf::from("/src"));
    }

    #[test]
    fn test_find_and_load_from_parent() {
        let dir = tempdir().expect("Failed to create temp dir");
        let codemap_dir = dir.path().join(CODEMAP_DIR);
        std::fs::create_dir_all(&codemap_dir).unwrap();
        std::fs::write(codemap_dir.join(CONFIG_FILE), DEFAULT_CONFIG).unwrap();

        let nested = dir.path().join("src/lib");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, found) = Config::find_and_load_from(&nested)
            .unwrap()
            .expect("Should find config");
        assert_eq!(found, codemap_dir);
        assert_eq!(config.project.root, PathBuf::from(".."));
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[watch]\ndebounce_ms = \"soon\"\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_validate_invalid_values() {
        let mut config = Config::default();
        config.scoring.depth_decay = 0.0;
        config.watch.debounce_ms = 0;
        config.index.ignore_patterns.push("  ".to_string());

        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "scoring.depth_decay"));
        assert!(errors.iter().any(|e| e.field == "watch.debounce_ms"));
        assert!(errors.iter().any(|e| e.field == "index.ignore_patterns"));
    }
}
