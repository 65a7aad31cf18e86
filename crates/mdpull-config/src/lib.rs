//! Configuration for mdpull.
//!
//! Parses `mdpull.toml` with serde. Without an explicit path the file is
//! searched for in the current directory and its parents; when none is
//! found, defaults apply.
//!
//! CLI flags override file values via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `fetch.user_agent`
//! - `fetch.token`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdpull.toml";

/// Default highlight theme.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// CLI settings that override configuration file values.
///
/// Only `Some` values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub user_agent: Option<String>,
    pub token: Option<String>,
    pub placeholder: Option<String>,
    pub theme: Option<String>,
    pub highlight_enabled: Option<bool>,
    pub extract_title: Option<bool>,
    pub raw_html: Option<bool>,
    pub strip_front_matter: Option<bool>,
    pub drop_title: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Outbound request settings.
    pub fetch: FetchConfig,
    /// Presentation settings.
    pub render: RenderConfig,
    /// Code highlighting settings.
    pub highlight: HighlightConfig,
    /// Built-in transforms applied before parsing.
    pub transform: TransformConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// `[fetch]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// `User-Agent` header value.
    pub user_agent: String,
    /// `Accept` header value.
    pub accept: String,
    /// Bearer token for private sources.
    pub token: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("mdpull/", env!("CARGO_PKG_VERSION")).to_owned(),
            accept: "text/markdown, text/plain, */*".to_owned(),
            token: None,
        }
    }
}

/// `[render]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Text shown while a document is loading.
    pub placeholder: String,
    /// GitHub-flavored extensions (tables, task lists, alerts).
    pub gfm: bool,
    /// Take the document title from the first H1.
    pub extract_title: bool,
    /// Pass HTML embedded in documents through unescaped.
    pub raw_html: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            placeholder: "Loading...".to_owned(),
            gfm: true,
            extract_title: false,
            raw_html: false,
        }
    }
}

/// `[highlight]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Syntax highlighting; when off, code renders as plain blocks.
    pub enabled: bool,
    /// Theme name.
    pub theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            theme: DEFAULT_THEME.to_owned(),
        }
    }
}

/// `[transform]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Remove a leading YAML front matter block.
    pub strip_front_matter: bool,
    /// Remove a leading `# Title` line.
    pub drop_title: bool,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`fetch.token`").
        field: String,
        /// Error message (e.g., "${`GITHUB_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `mdpull.toml` in the current directory and parents.
    ///
    /// CLI settings are applied after loading, then the result is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing or
    /// expansion fails, or the final values are invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(user_agent) = &settings.user_agent {
            self.fetch.user_agent.clone_from(user_agent);
        }
        if let Some(token) = &settings.token {
            self.fetch.token = Some(token.clone());
        }
        if let Some(placeholder) = &settings.placeholder {
            self.render.placeholder.clone_from(placeholder);
        }
        if let Some(theme) = &settings.theme {
            self.highlight.theme.clone_from(theme);
        }
        if let Some(enabled) = settings.highlight_enabled {
            self.highlight.enabled = enabled;
        }
        if let Some(extract_title) = settings.extract_title {
            self.render.extract_title = extract_title;
        }
        if let Some(raw_html) = settings.raw_html {
            self.render.raw_html = raw_html;
        }
        if let Some(strip) = settings.strip_front_matter {
            self.transform.strip_front_matter = strip;
        }
        if let Some(drop_title) = settings.drop_title {
            self.transform.drop_title = drop_title;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.fetch.user_agent, "fetch.user_agent")?;
        require_non_empty(&self.fetch.accept, "fetch.accept")?;
        require_non_empty(&self.render.placeholder, "render.placeholder")?;
        if self.highlight.enabled {
            require_non_empty(&self.highlight.theme, "highlight.theme")?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.fetch.user_agent = expand::expand_env(&self.fetch.user_agent, "fetch.user_agent")?;
        self.fetch.token = expand::expand_env_opt(self.fetch.token.as_deref(), "fetch.token")?
            .filter(|token| !token.is_empty());
        Ok(())
    }
}
