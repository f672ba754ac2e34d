//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by an optional `config.toml` at the project root. The defaults
//! reproduce the conventional tutorial layout, so most projects need no
//! config file at all.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! base_url = "https://webduino.io/"   # Prefix for og:image / og:url / sitemap
//!
//! [paths]
//! source = "app/_md"                  # Markdown tutorials
//! layouts = "app/_layout"             # Main layouts and partials
//! combined = "app/_layout-combine"    # Layouts with partials included
//! fragments = "app/_md2html"          # Rendered Markdown, before layout
//! pages = "app/tutorials"             # Fragments merged into layouts
//! styles_src = "app/_less"            # Stylesheet sources
//! styles = "app/style"                # Compiled stylesheets
//! json = "app/json"                   # Metadata index directory
//! media = "app/media"
//! scripts = "app/js"
//! output = "build"                    # Production output
//!
//! [layout]
//! main_dir = "main"                   # Sub-directory of `layouts` holding main layouts
//! default_master = "main.html"        # Master used when a fragment names none
//! include_prefix = "@!@"              # Variable prefix inside partials
//!
//! [metadata]
//! paragraphs = 1                      # Leading <p> elements holding `key: value` lines
//! join = "path"                       # "path" or "title" (match <h1> against `title`)
//! strip = false                       # Remove the metadata block from published pages
//! index_file = "tutorials.json"
//! index_date = false                  # Add `date` from the source file mtime
//!
//! [styles]
//! compiler = ["lessc", "{input}"]     # Stylesheet compiler; CSS is read from stdout
//! extension = "less"
//! lib_dir = "lib"                     # Copied verbatim
//!
//! [sitemap]
//! changefreq = "daily"
//! priority = 0.5
//!
//! [processing]
//! max_processes = 4                   # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
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
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute site URL with a trailing slash. Meta URLs are built by plain
    /// concatenation onto it.
    pub base_url: String,
    pub paths: PathsConfig,
    pub layout: LayoutConfig,
    pub metadata: MetadataConfig,
    pub styles: StylesConfig,
    pub sitemap: SitemapConfig,
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://webduino.io/".to_string(),
            paths: PathsConfig::default(),
            layout: LayoutConfig::default(),
            metadata: MetadataConfig::default(),
            styles: StylesConfig::default(),
            sitemap: SitemapConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(
                "base_url must start with http:// or https://".into(),
            ));
        }
        if !self.base_url.ends_with('/') {
            return Err(ConfigError::Validation(
                "base_url must end with '/'".into(),
            ));
        }
        if self.metadata.paragraphs == 0 {
            return Err(ConfigError::Validation(
                "metadata.paragraphs must be at least 1".into(),
            ));
        }
        if self.metadata.index_file.is_empty() {
            return Err(ConfigError::Validation(
                "metadata.index_file must not be empty".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.sitemap.priority) {
            return Err(ConfigError::Validation(
                "sitemap.priority must be between 0.0 and 1.0".into(),
            ));
        }
        Ok(())
    }

    /// Site URL without the trailing slash, as used for sitemap `<loc>` entries.
    pub fn site_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Project-relative locations of every input, intermediate, and output tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub source: PathBuf,
    pub layouts: PathBuf,
    pub combined: PathBuf,
    pub fragments: PathBuf,
    pub pages: PathBuf,
    pub styles_src: PathBuf,
    pub styles: PathBuf,
    pub json: PathBuf,
    pub media: PathBuf,
    pub scripts: PathBuf,
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: "app/_md".into(),
            layouts: "app/_layout".into(),
            combined: "app/_layout-combine".into(),
            fragments: "app/_md2html".into(),
            pages: "app/tutorials".into(),
            styles_src: "app/_less".into(),
            styles: "app/style".into(),
            json: "app/json".into(),
            media: "app/media".into(),
            scripts: "app/js".into(),
            output: "build".into(),
        }
    }
}

/// Layout composition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Sub-directory of `paths.layouts` whose files become combined layouts.
    pub main_dir: String,
    /// Master layout used by fragments without a `@@master` directive.
    pub default_master: String,
    /// Prefix marking variables inside partials (`@!@title`).
    pub include_prefix: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            main_dir: "main".to_string(),
            default_master: "main.html".to_string(),
            include_prefix: "@!@".to_string(),
        }
    }
}

/// How laid-out pages find their metadata record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKey {
    /// Match by page id (source path relative to the Markdown root).
    #[default]
    Path,
    /// Match the page's `<h1>` inner HTML against the record's `title` field.
    Title,
}

/// Metadata extraction, injection, and index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    /// Number of leading `<p>` elements that hold `key: value` lines.
    pub paragraphs: usize,
    pub join: JoinKey,
    /// Remove the marked metadata block from published pages.
    pub strip: bool,
    /// File name of the JSON index inside `paths.json`.
    pub index_file: String,
    /// Add a `date` field taken from the source Markdown mtime.
    pub index_date: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            paragraphs: 1,
            join: JoinKey::Path,
            strip: false,
            index_file: "tutorials.json".to_string(),
            index_date: false,
        }
    }
}

/// Stylesheet compilation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StylesConfig {
    /// Compiler argv. `{input}` is replaced by the source path; the compiled
    /// CSS is read from stdout.
    pub compiler: Vec<String>,
    /// Extension of sources that go through the compiler.
    pub extension: String,
    /// Sub-directory copied verbatim.
    pub lib_dir: String,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            compiler: vec!["lessc".to_string(), "{input}".to_string()],
            extension: "less".to_string(),
            lib_dir: "lib".to_string(),
        }
    }
}

/// Sitemap entry settings shared by every URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapConfig {
    pub changefreq: String,
    pub priority: f32,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            changefreq: "daily".to_string(),
            priority: 0.5,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render/extract workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
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

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the project root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Tutorial Site Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Absolute site URL, with trailing slash. og:image, og:url and the sitemap
# are built from it.
base_url = "https://webduino.io/"

# ---------------------------------------------------------------------------
# Directory layout (relative to the project root)
# ---------------------------------------------------------------------------
[paths]
source = "app/_md"
layouts = "app/_layout"
combined = "app/_layout-combine"
fragments = "app/_md2html"
pages = "app/tutorials"
styles_src = "app/_less"
styles = "app/style"
json = "app/json"
media = "app/media"
scripts = "app/js"
output = "build"

# ---------------------------------------------------------------------------
# Layout composition
# ---------------------------------------------------------------------------
[layout]
# Files under <layouts>/<main_dir> become combined layouts. Partials are
# pulled in with <include src="../module/header.html"></include>.
main_dir = "main"

# Master layout for fragments without <!-- @@master = ... -->.
default_master = "main.html"

# Variables passed as include attributes are referenced as <prefix><name>.
include_prefix = "@!@"

# ---------------------------------------------------------------------------
# Page metadata
# ---------------------------------------------------------------------------
[metadata]
# Leading paragraphs of each tutorial holding `key: value` lines.
paragraphs = 1

# How pages find their metadata: "path" (source file) or "title" (<h1> text).
join = "path"

# Remove the metadata paragraph (and its <hr> separators) when publishing.
strip = false

# JSON catalog written to <paths.json>/<index_file>.
index_file = "tutorials.json"

# Add a `date` field from the Markdown file's modification time.
index_date = false

# ---------------------------------------------------------------------------
# Stylesheets
# ---------------------------------------------------------------------------
[styles]
# Compiler command; {input} is replaced by the source path and the CSS is
# read from stdout. Plain .css sources are copied without it.
compiler = ["lessc", "{input}"]
extension = "less"

# Copied verbatim to <paths.styles>/<lib_dir>.
lib_dir = "lib"

# ---------------------------------------------------------------------------
# Sitemap
# ---------------------------------------------------------------------------
[sitemap]
changefreq = "daily"
priority = 0.5

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for rendering and extraction.
# Omit to use all CPU cores. Values above the core count are clamped.
# max_processes = 4
"##
}
