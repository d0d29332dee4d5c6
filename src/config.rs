//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by the user's file; the file only needs the keys it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "SpaceTraveling"
//! locale = "pt-BR"          # "pt-BR" or "en-US"; dates and labels
//! banner_placeholder = "https://source.unsplash.com/random/1200x300?Technology"
//! logo = "/images/logo.svg"
//!
//! [content]
//! endpoint = "https://03-ignite.cdn.prismic.io/api/v2"
//! # access_token = "..."   # or --access-token / PRISMIC_ACCESS_TOKEN
//! # repository = "03-ignite" # derived from endpoint when omitted
//! home_page_size = 1        # posts on the first home page
//! static_paths_size = 2     # post pages prebuilt by `build`
//! timeout_secs = 10
//!
//! [revalidate]
//! seconds = 28800           # 8 hours
//!
//! [preview]
//! provider_cookie = "io.prismic.preview"
//! session_cookie = "spacetraveling.preview"
//!
//! [comments]
//! # repo = "owner/blog-comments"  # utterances; omit to disable
//! issue_term = "pathname"
//! theme = "github-dark"
//!
//! [server]
//! bind = "127.0.0.1:3000"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::dates::Locale;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Presentation: title, locale, fallback images.
    pub site: SiteSection,
    /// Content API connection and page sizes.
    pub content: ContentConfig,
    /// Incremental regeneration cadence.
    pub revalidate: RevalidateConfig,
    /// Cookie names for preview mode.
    pub preview: PreviewConfig,
    /// Third-party comment widget.
    pub comments: CommentsConfig,
    /// HTTP server settings for `serve`.
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    pub title: String,
    pub locale: Locale,
    /// Used when a post has no banner image.
    pub banner_placeholder: String,
    pub logo: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "SpaceTraveling".to_string(),
            locale: Locale::PtBr,
            banner_placeholder: "https://source.unsplash.com/random/1200x300?Technology"
                .to_string(),
            logo: "/images/logo.svg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// API root, e.g. `https://<repo>.cdn.prismic.io/api/v2`.
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Explicit repository name; derived from `endpoint` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    pub home_page_size: u32,
    pub static_paths_size: u32,
    pub timeout_secs: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://03-ignite.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            repository: None,
            home_page_size: 1,
            static_paths_size: 2,
            timeout_secs: 10,
        }
    }
}

impl ContentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevalidateConfig {
    /// Seconds after which a generated page is regenerated in the background.
    pub seconds: u64,
}

impl Default for RevalidateConfig {
    fn default() -> Self {
        Self { seconds: 60 * 60 * 8 }
    }
}

impl RevalidateConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Cookie written by the content provider's toolbar (read-only for us).
    pub provider_cookie: String,
    /// Cookie holding the ref this site is currently rendering.
    pub session_cookie: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            provider_cookie: "io.prismic.preview".to_string(),
            session_cookie: "spacetraveling.preview".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommentsConfig {
    /// GitHub repository backing utterances; `None` disables comments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    pub issue_term: String,
    pub theme: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            repo: None,
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Content repository name, e.g. `03-ignite`.
///
/// Derived once at startup from the API endpoint and handed to whoever needs
/// it; the provider keys its preview cookie by `<name>.prismic.io`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    /// Extract the repository from `https://<name>[.cdn].prismic.io/...`.
    pub fn from_endpoint(endpoint: &str) -> Option<Self> {
        let url = reqwest::Url::parse(endpoint).ok()?;
        let host = url.host_str()?;
        let name = host.strip_suffix(".prismic.io")?;
        let name = name.strip_suffix(".cdn").unwrap_or(name);
        Self::new(name)
    }

    pub fn new(name: &str) -> Option<Self> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        valid.then(|| Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of this repository's entry in the provider's preview cookie.
    pub fn cookie_key(&self) -> String {
        format!("{}.prismic.io", self.0)
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if reqwest::Url::parse(&self.content.endpoint).is_err() {
            return Err(ConfigError::Validation(format!(
                "content.endpoint is not a valid URL: {}",
                self.content.endpoint
            )));
        }
        self.repository()?;
        for (key, value) in [
            ("content.home_page_size", self.content.home_page_size),
            ("content.static_paths_size", self.content.static_paths_size),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!("{key} must be 1-100")));
            }
        }
        if self.content.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "content.timeout_secs must be non-zero".into(),
            ));
        }
        if self.revalidate.seconds == 0 {
            return Err(ConfigError::Validation(
                "revalidate.seconds must be non-zero".into(),
            ));
        }
        if self.preview.provider_cookie.is_empty() || self.preview.session_cookie.is_empty() {
            return Err(ConfigError::Validation(
                "preview cookie names must not be empty".into(),
            ));
        }
        if let Some(repo) = &self.comments.repo
            && repo.split('/').filter(|p| !p.is_empty()).count() != 2
        {
            return Err(ConfigError::Validation(
                "comments.repo must look like owner/name".into(),
            ));
        }
        Ok(())
    }

    /// Resolve the repository name: explicit setting first, then the endpoint.
    pub fn repository(&self) -> Result<RepositoryName, ConfigError> {
        let resolved = match &self.content.repository {
            Some(name) => RepositoryName::new(name),
            None => RepositoryName::from_endpoint(&self.content.endpoint),
        };
        resolved.ok_or_else(|| {
            ConfigError::Validation(format!(
                "cannot determine content repository from {}; set content.repository",
                self.content.endpoint
            ))
        })
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when it
/// doesn't exist.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# SpaceTraveling Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site presentation
# ---------------------------------------------------------------------------
[site]
title = "SpaceTraveling"

# Dates and interface labels are always rendered in this locale.
# Supported: "pt-BR", "en-US".
locale = "pt-BR"

# Banner shown on posts that have no banner image.
banner_placeholder = "https://source.unsplash.com/random/1200x300?Technology"

logo = "/images/logo.svg"

# ---------------------------------------------------------------------------
# Content API
# ---------------------------------------------------------------------------
[content]
endpoint = "https://03-ignite.cdn.prismic.io/api/v2"

# Private repositories need a token. Prefer --access-token or the
# PRISMIC_ACCESS_TOKEN environment variable over committing it here.
# access_token = ""

# Repository name used to find this site's entry in the preview cookie.
# Derived from `endpoint` when omitted.
# repository = "03-ignite"

# Posts on the first home page; more are fetched with "load more".
home_page_size = 1

# Post pages generated ahead of time by `build`. Others are generated on
# first request by `serve`.
static_paths_size = 2

# Request timeout for content API calls, in seconds.
timeout_secs = 10

# ---------------------------------------------------------------------------
# Incremental regeneration
# ---------------------------------------------------------------------------
[revalidate]
# Pages older than this are served once more and regenerated in the background.
seconds = 28800

# ---------------------------------------------------------------------------
# Preview mode
# ---------------------------------------------------------------------------
[preview]
# Written by the provider's preview toolbar; read only.
provider_cookie = "io.prismic.preview"
# Written by /api/preview, cleared by /api/exit-preview.
session_cookie = "spacetraveling.preview"

# ---------------------------------------------------------------------------
# Comments (utterances)
# ---------------------------------------------------------------------------
[comments]
# GitHub repository that stores comment issues. Omit to disable comments.
# repo = "owner/blog-comments"
issue_term = "pathname"
theme = "github-dark"

# ---------------------------------------------------------------------------
# HTTP server (serve)
# ---------------------------------------------------------------------------
[server]
bind = "127.0.0.1:3000"
"##
}
