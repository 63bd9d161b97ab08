//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/kabu/config.toml` (user config, or `$KABU_CONFIG_DIR/config.toml`)
//! 2. `./kabu.toml` (project-local)
//! 3. `MCP_*` environment variables (see [`crate::env`])

use std::path::{Path, PathBuf};

use crate::{ConfigError, KabuConfig, Result};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "kabu.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for platform directory resolution.
const APP_NAME: &str = "kabu";

/// Environment variable to override the config directory.
pub const CONFIG_DIR_ENV: &str = "KABU_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: KabuConfig,
    /// Sources that were checked, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Problems that did not stop loading (malformed layers, bad env values).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths of the sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }

    /// Apply `MCP_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        let warnings = crate::env::apply_env_overrides(&mut self.config);
        self.warnings.extend(warnings);
    }
}

/// Load configuration by discovering and merging all file layers.
///
/// Never fails: unreadable or malformed layers are skipped and reported in
/// [`LoadedConfig::warnings`].
pub fn load_config(project_dir: Option<&Path>) -> LoadedConfig {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `KABU_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> LoadedConfig {
    let mut config = KabuConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    if let Some(path) = config_path_in(config_dir) {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    LoadedConfig {
        config,
        sources,
        warnings,
    }
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<KabuConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    KabuConfig::from_toml(&contents)
}

/// Save configuration to a file, creating parent directories.
pub fn save_config(config: &KabuConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_toml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })
}

/// Path of the user config file.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// User config directory: `KABU_CONFIG_DIR`, else the platform default
/// (`~/.config/kabu` on Linux, `~/Library/Application Support/kabu` on macOS).
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// User config file inside an explicit directory, or the default location.
pub fn config_path_in(config_dir: Option<&Path>) -> Option<PathBuf> {
    match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    }
}

/// Merge one file into `config`. A malformed file becomes a warning.
fn load_layer(config: &mut KabuConfig, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    let loaded = match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            true
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            false
        }
    };
    ConfigSource {
        path: path.to_path_buf(),
        loaded,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_xdg_config_path_shape() {
        if std::env::var(CONFIG_DIR_ENV).is_err()
            && let Some(p) = xdg_config_path()
        {
            assert!(p.ends_with("kabu/config.toml"));
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/kabu/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_no_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path()));
        assert_eq!(loaded.config, KabuConfig::default());
        assert!(loaded.loaded_from().is_empty());
        assert_eq!(loaded.sources.len(), 2);
        assert_eq!(
            Some(loaded.sources[0].path.clone()),
            config_path_in(Some(user.path()))
        );
    }

    #[test]
    fn test_project_overrides_user() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            user.path().join("config.toml"),
            "[worker]\ninterpreter = \"python3.11\"\n\n[retry]\nmax_attempts = 5\n",
        )
        .unwrap();
        fs::write(
            project.path().join("kabu.toml"),
            "[worker]\ninterpreter = \"./venv/bin/python\"\n",
        )
        .unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path()));
        assert_eq!(
            loaded.config.worker_or_default().interpreter,
            PathBuf::from("./venv/bin/python")
        );
        assert_eq!(loaded.config.retry_or_default().max_attempts, 5);
        assert_eq!(loaded.loaded_from().len(), 2);
    }

    #[test]
    fn test_malformed_layer_is_skipped_with_warning() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(user.path().join("config.toml"), "[retry]\nmax_attempts = 2\n").unwrap();
        fs::write(project.path().join("kabu.toml"), "[worker\nbroken").unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path()));
        assert_eq!(loaded.config.retry_or_default().max_attempts, 2);
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("kabu.toml"));
    }

    #[test]
    fn test_unreadable_layers_still_load_defaults() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(user.path().join("config.toml"), "retry = 3").unwrap();
        fs::write(project.path().join("kabu.toml"), "[worker\nbroken").unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path()));
        assert_eq!(loaded.config, KabuConfig::default());
        assert!(loaded.loaded_from().is_empty());
        assert_eq!(loaded.warnings.len(), 2);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = KabuConfig::with_defaults();
        save_config(&config, &path).unwrap();
        assert_eq!(load_config_file(&path).unwrap(), config);
    }

    #[test]
    fn test_config_path_in_explicit_dir() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            config_path_in(Some(dir.path())),
            Some(dir.path().join("config.toml"))
        );
    }
}
