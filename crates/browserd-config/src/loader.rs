//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::{browserd_home, Config};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "BROWSERD_CONFIG";
/// Environment variable overriding `daemon.state_dir`.
pub const STATE_DIR_ENV: &str = "BROWSERD_STATE_DIR";
/// Environment variable overriding `browser.executable`.
pub const BROWSER_ENV: &str = "BROWSERD_BROWSER";

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"));

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&expanded)?;
        Self::expand_paths(&mut config);
        Ok(config)
    }

    /// Resolve, load and validate the effective configuration.
    ///
    /// A missing default config file yields the defaults; a missing file
    /// named explicitly through `BROWSERD_CONFIG` is an error.
    pub fn load_effective() -> Result<Config, ConfigError> {
        Self::load_effective_with(|key| std::env::var(key).ok())
    }

    /// Same as [`ConfigLoader::load_effective`] with an injectable
    /// environment lookup.
    pub fn load_effective_with<F>(env: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match env(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&Self::expand_path(&path)))?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load(&path)?
                } else {
                    Config::default()
                }
            }
        };

        Self::apply_overrides(&mut config, env);
        config.validate()?;
        Ok(config)
    }

    /// Default config file location.
    pub fn default_path() -> PathBuf {
        browserd_home().join("config.toml")
    }

    /// Apply `BROWSERD_*` environment overrides.
    pub fn apply_overrides<F>(config: &mut Config, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = env(STATE_DIR_ENV).filter(|v| !v.is_empty()) {
            config.daemon.state_dir = PathBuf::from(Self::expand_path(&dir));
        }
        if let Some(exe) = env(BROWSER_ENV).filter(|v| !v.is_empty()) {
            config.browser.executable = Some(PathBuf::from(Self::expand_path(&exe)));
        }
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();

        for cap in ENV_VAR_RE.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    fn expand_paths(config: &mut Config) {
        let expand = |p: &Path| PathBuf::from(Self::expand_path(&p.to_string_lossy()));

        config.daemon.state_dir = expand(&config.daemon.state_dir);
        config.logging.dir = expand(&config.logging.dir);
        if let Some(exe) = config.browser.executable.as_deref() {
            config.browser.executable = Some(expand(exe));
        }
    }

    /// Expand shell-style paths (e.g., `~/.browserd`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}
