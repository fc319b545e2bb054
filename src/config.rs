//! Configuration types for normalization and scraping.
//!
//! [`NormalizeConfig`] holds the authoring conventions the normalizer
//! recognises (which colour marks a heading, which indentation marks a list
//! item). [`ScrapeConfig`] holds everything the fetch/download side needs.
//! Both are built through builders that validate on `build()`.

use crate::dom::style::{self, StyleDeclaration};
use crate::dom::{Element, Role, TextStyle};
use crate::error::PatchNotesError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default listing URL; `{index}` is empty for page 1 and `_N` afterwards.
pub const DEFAULT_URL_PATTERN: &str = "https://www.eveechoes.com/news/updata/index{index}.html";

/// Browser-like user agent; the news site rejects obvious bots.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/117.0";

// ── Normalization ────────────────────────────────────────────────────────

/// Authoring conventions recognised by the normalizer.
///
/// # Example
/// ```rust
/// use ee_patch_notes::NormalizeConfig;
///
/// let config = NormalizeConfig::builder()
///     .heading_color("#FFA500")
///     .list_indent("margin-left: 2em")
///     .build()
///     .unwrap();
/// assert_eq!(config.heading_colors.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Colours that mark a `span` as a heading, lower-cased. Default: `#ff8c00`.
    pub heading_colors: Vec<String>,

    /// Paragraph style declaration that marks a bullet list item.
    /// Default: `margin-left: 40px`.
    pub list_indent: StyleDeclaration,

    /// `list-style-type` of reconstructed lists. Default: `square`.
    pub list_marker: String,

    /// Remove every image from the article. Default: true.
    pub strip_images: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            heading_colors: vec!["#ff8c00".to_string()],
            list_indent: StyleDeclaration::new("margin-left", "40px"),
            list_marker: "square".to_string(),
            strip_images: true,
        }
    }
}

impl NormalizeConfig {
    pub fn builder() -> NormalizeConfigBuilder {
        NormalizeConfigBuilder {
            config: Self::default(),
            list_indent: None,
        }
    }

    /// True if `el` is a `span` whose style carries a recognised heading colour.
    pub fn is_heading_marker(&self, el: &Element) -> bool {
        el.role() == Role::TextStyle(TextStyle::Span)
            && el
                .attr("style")
                .and_then(|s| style::property(s, "color"))
                .is_some_and(|c| self.heading_colors.contains(&c))
    }

    /// True if `el` is a paragraph carrying the list indentation marker.
    pub fn is_list_item(&self, el: &Element) -> bool {
        el.role() == Role::Paragraph
            && el
                .attr("style")
                .is_some_and(|s| style::declares(s, &self.list_indent))
    }

    /// Inline style applied to reconstructed lists.
    pub fn list_style(&self) -> String {
        format!("list-style-type: {};", self.list_marker)
    }
}

/// Builder for [`NormalizeConfig`].
#[derive(Debug)]
pub struct NormalizeConfigBuilder {
    config: NormalizeConfig,
    list_indent: Option<String>,
}

impl NormalizeConfigBuilder {
    /// Add a recognised heading colour (any CSS colour literal).
    pub fn heading_color(mut self, color: impl AsRef<str>) -> Self {
        let color = StyleDeclaration::new("color", color.as_ref()).value;
        if !self.config.heading_colors.contains(&color) {
            self.config.heading_colors.push(color);
        }
        self
    }

    /// Replace the recognised heading colours.
    pub fn heading_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.heading_colors.clear();
        for c in colors {
            self = self.heading_color(c);
        }
        self
    }

    /// The list indentation declaration, e.g. `margin-left: 40px`.
    pub fn list_indent(mut self, declaration: impl Into<String>) -> Self {
        self.list_indent = Some(declaration.into());
        self
    }

    pub fn list_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.list_marker = marker.into();
        self
    }

    pub fn strip_images(mut self, v: bool) -> Self {
        self.config.strip_images = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<NormalizeConfig, PatchNotesError> {
        if let Some(raw) = self.list_indent.take() {
            self.config.list_indent = StyleDeclaration::parse(&raw).ok_or_else(|| {
                PatchNotesError::InvalidConfig(format!(
                    "list indent must look like 'property: value', got '{raw}'"
                ))
            })?;
        }
        if self.config.heading_colors.is_empty() {
            return Err(PatchNotesError::InvalidConfig(
                "at least one heading colour is required".into(),
            ));
        }
        if self.config.list_marker.trim().is_empty() {
            return Err(PatchNotesError::InvalidConfig(
                "list marker must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Scraping ─────────────────────────────────────────────────────────────

/// Configuration for fetching listing pages and downloading articles.
#[derive(Clone)]
pub struct ScrapeConfig {
    /// Listing URL pattern containing `{index}`.
    pub url_pattern: String,

    /// Directory that receives saved articles and the cache file.
    /// Default: `data/patch_notes`.
    pub output_dir: PathBuf,

    /// Minimum spacing between two requests, in seconds. Default: 1.0.
    pub rate_limit_secs: f64,

    /// Upper bound of the random extra delay added when throttling, in
    /// seconds. Default: 2.0.
    pub rate_limit_jitter: f64,

    pub user_agent: String,

    /// Per-request timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Optional per-document progress events for downloads.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url_pattern: DEFAULT_URL_PATTERN.to_string(),
            output_dir: PathBuf::from("data/patch_notes"),
            rate_limit_secs: 1.0,
            rate_limit_jitter: 2.0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 30,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ScrapeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeConfig")
            .field("url_pattern", &self.url_pattern)
            .field("output_dir", &self.output_dir)
            .field("rate_limit_secs", &self.rate_limit_secs)
            .field("rate_limit_jitter", &self.rate_limit_jitter)
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ScrapeConfig {
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder {
            config: Self::default(),
        }
    }

    /// Listing page URL for a 1-indexed page number.
    pub fn listing_url(&self, page: u32) -> String {
        let index = if page <= 1 {
            String::new()
        } else {
            format!("_{page}")
        };
        self.url_pattern.replace("{index}", &index)
    }

    /// Path of the metadata cache inside the output directory.
    pub fn cache_path(&self) -> PathBuf {
        self.output_dir.join("cache.jsonl")
    }
}

/// Builder for [`ScrapeConfig`].
#[derive(Debug)]
pub struct ScrapeConfigBuilder {
    config: ScrapeConfig,
}

impl ScrapeConfigBuilder {
    pub fn url_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.url_pattern = pattern.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn rate_limit_secs(mut self, secs: f64) -> Self {
        self.config.rate_limit_secs = secs;
        self
    }

    pub fn rate_limit_jitter(mut self, secs: f64) -> Self {
        self.config.rate_limit_jitter = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScrapeConfig, PatchNotesError> {
        let c = &self.config;
        if !c.url_pattern.contains("{index}") {
            return Err(PatchNotesError::InvalidConfig(format!(
                "url pattern must contain {{index}}, got '{}'",
                c.url_pattern
            )));
        }
        for (name, v) in [
            ("rate limit", c.rate_limit_secs),
            ("rate limit jitter", c.rate_limit_jitter),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(PatchNotesError::InvalidConfig(format!(
                    "{name} must be a non-negative number of seconds, got {v}"
                )));
            }
        }
        Ok(self.config)
    }
}
