//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/famtree/famtree.toml`
//! 3. Environment variables: `FAMTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Unified configuration for famtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Roster file (`.json` or `.toml`)
    pub members_file: PathBuf,
    /// Refuse to build rosters with duplicate ids, self-links or parent cycles
    pub strict: bool,
    /// Show birth/death dates and age in tree labels
    pub show_dates: bool,
    /// chrono format string for dates in labels
    pub date_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            members_file: default_members_file(),
            strict: true,
            show_dates: true,
            date_format: "%Y-%m-%d".into(),
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub members_file: Option<PathBuf>,
    pub strict: Option<bool>,
    pub show_dates: Option<bool>,
    pub date_format: Option<String>,
}

/// Default roster location (`<data dir>/famtree/members.json`).
fn default_members_file() -> PathBuf {
    ProjectDirs::from("", "", "famtree")
        .map(|dirs| dirs.data_dir().join("members.json"))
        .unwrap_or_else(|| PathBuf::from("members.json"))
}

/// Get the XDG config directory for famtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "famtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("famtree.toml"))
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input as is.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.members_file.to_string_lossy().as_ref());
        self.members_file = PathBuf::from(expanded);
    }

    /// Scalar options: file value wins if present, otherwise keep self.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            members_file: overlay
                .members_file
                .clone()
                .unwrap_or_else(|| self.members_file.clone()),
            strict: overlay.strict.unwrap_or(self.strict),
            show_dates: overlay.show_dates.unwrap_or(self.show_dates),
            date_format: overlay
                .date_format
                .clone()
                .unwrap_or_else(|| self.date_format.clone()),
        }
    }

    /// Load settings with layered precedence from the global config file.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings using `config_file` in place of the global config.
    ///
    /// A missing file is skipped; a malformed one is an error.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = config_file {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current, env_source())?;
        current.expand_paths();
        Ok(current)
    }

    /// Apply FAMTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("members_file") {
            settings.members_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_bool("strict") {
            settings.strict = val;
        }
        if let Ok(val) = config.get_bool("show_dates") {
            settings.show_dates = val;
        }
        if let Ok(val) = config.get_string("date_format") {
            settings.date_format = val;
        }
        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# famtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/famtree/famtree.toml
#   Env:    FAMTREE_* environment variables (e.g. FAMTREE_MEMBERS_FILE)

# Roster file; .toml selects TOML, anything else is JSON
# members_file = "~/genealogy/members.json"

# Reject rosters with duplicate ids, self-spouses or parent cycles
# strict = true

# Show dates and age in tree labels
# show_dates = true
# date_format = "%Y-%m-%d"
"#
        .to_string()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("FAMTREE")
        .prefix_separator("_")
        .separator("__")
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
