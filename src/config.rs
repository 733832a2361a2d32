//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The configuration
//! is the single source of blog-wide presentation settings: title, author,
//! avatar, social links, favicon, theme, and date style. It is loaded once,
//! never mutated, and passed explicitly to every stage that needs it.
//!
//! ## Config File Location
//!
//! ```text
//! content/
//! ├── config.toml              # Site config (required: title)
//! └── posts/
//!     └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! title = "vertin.dev"               # Required, must not be blank
//! description = "My development journey"
//! author = "Jane Doe"                # Optional
//! avatar = "./logo.svg"
//! avatar_class = "border-hidden"     # Optional CSS class for the avatar
//! favicon = "favicon.png"
//! theme = "dark"                     # light | dark | auto
//! date_style = "long"                # short | long
//! lang = "en"
//! canonical_url = "https://vertin.dev"  # Optional, used for feed links
//!
//! [[links]]
//! title = "GitHub"
//! url = "https://github.com/mtracewicz"
//! ```
//!
//! The camelCase spellings `avatarClass`, `dateStyle` and `canonicalUrl` are
//! accepted too. Unknown keys are rejected to catch typos early.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Site configuration loaded from `config.toml`.
///
/// Everything but `title` has a default. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Blog title, shown in the header, the `<title>` of the home page, and the feed.
    pub title: String,
    /// One-line tagline under the title.
    pub description: String,
    /// Post author, shown on post pages and in feed items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Avatar image URI shown on the home page header.
    pub avatar: String,
    /// Extra CSS class applied to the avatar `<img>`.
    #[serde(alias = "avatarClass", skip_serializing_if = "Option::is_none")]
    pub avatar_class: Option<String>,
    /// Navigation links, rendered in this exact order.
    pub links: Vec<Link>,
    /// Favicon URI referenced from every page.
    pub favicon: String,
    /// Color scheme.
    pub theme: Theme,
    /// How publish dates are displayed.
    #[serde(alias = "dateStyle")]
    pub date_style: DateStyle,
    /// `lang` attribute of every page and the feed language.
    pub lang: String,
    /// Absolute base URL of the deployed site. Feed links are relative without it.
    #[serde(alias = "canonicalUrl", skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            author: None,
            avatar: String::new(),
            avatar_class: None,
            links: Vec::new(),
            favicon: String::new(),
            theme: Theme::default(),
            date_style: DateStyle::default(),
            lang: "en".to_string(),
            canonical_url: None,
        }
    }
}

/// A navigation link: `{ title, url }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub title: String,
    pub url: String,
}

impl Link {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    /// `1/5/24`
    Short,
    /// `January 5, 2024`
    #[default]
    Long,
}

impl DateStyle {
    pub fn format(self, date: NaiveDate) -> String {
        match self {
            DateStyle::Short => date.format("%-m/%-d/%y").to_string(),
            DateStyle::Long => date.format("%B %-d, %Y").to_string(),
        }
    }
}

impl SiteConfig {
    /// Check required fields are present and well-formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::Invalid("title must not be empty".into()));
        }
        for (idx, link) in self.links.iter().enumerate() {
            if link.title.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "links[{idx}].title must not be empty"
                )));
            }
            if link.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "links[{idx}].url must not be empty"
                )));
            }
        }
        if let Some(url) = &self.canonical_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::Invalid(format!(
                "canonical_url must be an absolute http(s) URL, got {url:?}"
            )));
        }
        Ok(())
    }

    /// Canonical base URL without a trailing slash, or `""` when unset.
    pub fn base_url(&self) -> &str {
        self.canonical_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .unwrap_or("")
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// Base layer that user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so arrays
///   such as `links` are replaced, never concatenated.
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

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// camelCase spellings accepted in `config.toml`, with their canonical key.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("avatarClass", "avatar_class"),
    ("dateStyle", "date_style"),
    ("canonicalUrl", "canonical_url"),
];

/// Rename aliased top-level keys so they override, not duplicate, the
/// canonical keys of the base layer.
fn normalize_aliases(value: toml::Value) -> toml::Value {
    let mut table = match value {
        toml::Value::Table(table) => table,
        other => return other,
    };
    for (alias, key) in KEY_ALIASES {
        if let Some(v) = table.remove(*alias) {
            table.insert((*key).to_string(), v);
        }
    }
    toml::Value::Table(table)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, normalize_aliases(ov)),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// A missing file resolves to the stock defaults, which fail validation
/// because there is no title.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    let config = resolve_config(base, overlay)?;
    log::debug!(
        "loaded config {:?} with {} links",
        config.title,
        config.links.len()
    );
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Blog Configuration
# =========================
# Only `title` is required. Values shown below are the defaults or examples.
# Unknown keys will cause an error.

# Blog title (required).
title = "My Blog"

# One-line tagline shown under the title and used as the feed description.
description = ""

# Post author, shown on post pages and in feed items.
# author = "Jane Doe"

# Avatar image shown on the home page, and an optional CSS class for it.
avatar = ""
# avatar_class = "border-hidden"

# Favicon referenced from every page.
favicon = ""

# Color scheme: "light", "dark", or "auto" (follows the visitor's OS setting).
theme = "auto"

# Date display: "long" (January 5, 2024) or "short" (1/5/24).
date_style = "long"

# Language of the pages and the feed.
lang = "en"

# Absolute URL of the deployed site. Feed links are relative without it.
# canonical_url = "https://example.com"

# ---------------------------------------------------------------------------
# Navigation links, rendered in this order on every page.
# ---------------------------------------------------------------------------
# [[links]]
# title = "GitHub"
# url = "https://github.com/you"
"##
}

/// Generate CSS custom properties for the configured theme.
///
/// `auto` emits the light palette with a `prefers-color-scheme: dark` override.
pub fn generate_theme_css(theme: Theme) -> String {
    match theme {
        Theme::Light => format!(":root {{\n{}}}", palette_vars(&LIGHT, 1)),
        Theme::Dark => format!(":root {{\n{}}}", palette_vars(&DARK, 1)),
        Theme::Auto => format!(
            ":root {{\n{}}}\n\n@media (prefers-color-scheme: dark) {{\n    :root {{\n{}    }}\n}}",
            palette_vars(&LIGHT, 1),
            palette_vars(&DARK, 2),
        ),
    }
}

struct Palette {
    background: &'static str,
    text: &'static str,
    text_muted: &'static str,
    border: &'static str,
    link: &'static str,
    code_background: &'static str,
}

const LIGHT: Palette = Palette {
    background: "#ffffff",
    text: "#111111",
    text_muted: "#666666",
    border: "#e0e0e0",
    link: "#0550ae",
    code_background: "#f6f8fa",
};

const DARK: Palette = Palette {
    background: "#0d1117",
    text: "#e6edf3",
    text_muted: "#8b949e",
    border: "#30363d",
    link: "#58a6ff",
    code_background: "#161b22",
};

fn palette_vars(p: &Palette, depth: usize) -> String {
    let pad = "    ".repeat(depth);
    [
        ("--color-bg", p.background),
        ("--color-text", p.text),
        ("--color-text-muted", p.text_muted),
        ("--color-border", p.border),
        ("--color-link", p.link),
        ("--color-code-bg", p.code_background),
    ]
    .iter()
    .map(|(name, value)| format!("{pad}{name}: {value};\n"))
    .collect()
}
