//! Bookmark session configuration.
//!
//! Every field has a default, so a partial JSON document is enough:
//!
//! ```ignore
//! use http_bookmarks::BookmarksConfig;
//!
//! let config = BookmarksConfig::from_json_str(r#"{ "max_parameters": 8 }"#)?;
//! assert_eq!(config.max_parameters, 8);
//! assert_eq!(config.comment, "[^]");
//!
//! let config = BookmarksConfig::new()
//!     .with_highlight(Highlight::Cyan)
//!     .with_max_concurrent_repeats(4);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transaction::Highlight;

// ============================================================================
// Defaults
// ============================================================================

/// Caption of the bookmarks tab and default annotation marker.
pub const DEFAULT_MARKER: &str = "[^]";

/// Number of parameters shown in the Parameters column.
pub const DEFAULT_MAX_PARAMETERS: usize = 5;

/// Prefix of the temp directory holding bookmarked buffers.
pub const DEFAULT_TEMP_PREFIX: &str = "http-bookmarks-";

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn default_max_parameters() -> usize {
    DEFAULT_MAX_PARAMETERS
}

fn default_true() -> bool {
    true
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_read_timeout_ms() -> u64 {
    30_000
}

fn default_temp_prefix() -> String {
    DEFAULT_TEMP_PREFIX.to_string()
}

// ============================================================================
// BookmarksConfig
// ============================================================================

/// Session-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarksConfig {
    /// Caption shown on the bookmarks tab.
    #[serde(default = "default_marker")]
    pub tab_caption: String,

    /// Highlight applied to bookmarked transactions.
    #[serde(default)]
    pub highlight: Highlight,

    /// Comment applied to bookmarked transactions.
    #[serde(default = "default_marker")]
    pub comment: String,

    /// Parameters joined into the Parameters column; extra ones are dropped.
    #[serde(default = "default_max_parameters")]
    pub max_parameters: usize,

    /// Initial state of "add repeated request to table".
    #[serde(default = "default_true")]
    pub add_repeated_to_table: bool,

    /// Connect timeout for the built-in issuer, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Response timeout for the built-in issuer, in milliseconds.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Upper bound on in-flight repeats. `None` means unbounded.
    #[serde(default)]
    pub max_concurrent_repeats: Option<usize>,

    /// Prefix of the temp directory used by the default buffer store.
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,
}

impl Default for BookmarksConfig {
    fn default() -> Self {
        Self {
            tab_caption: default_marker(),
            highlight: Highlight::default(),
            comment: default_marker(),
            max_parameters: DEFAULT_MAX_PARAMETERS,
            add_repeated_to_table: true,
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            max_concurrent_repeats: None,
            temp_prefix: default_temp_prefix(),
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl BookmarksConfig {
    /// Creates a configuration with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the document is malformed.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::Json`] if the document is malformed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BookmarksConfig {
    /// Sets the tab caption.
    #[inline]
    #[must_use]
    pub fn with_tab_caption(mut self, caption: impl Into<String>) -> Self {
        self.tab_caption = caption.into();
        self
    }

    /// Sets the highlight applied to bookmarked transactions.
    #[inline]
    #[must_use]
    pub fn with_highlight(mut self, highlight: Highlight) -> Self {
        self.highlight = highlight;
        self
    }

    /// Sets the comment applied to bookmarked transactions.
    #[inline]
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Sets the parameter limit.
    #[inline]
    #[must_use]
    pub fn with_max_parameters(mut self, max: usize) -> Self {
        self.max_parameters = max;
        self
    }

    /// Sets the initial "add repeated request to table" state.
    #[inline]
    #[must_use]
    pub fn with_add_repeated_to_table(mut self, enabled: bool) -> Self {
        self.add_repeated_to_table = enabled;
        self
    }

    /// Sets the issuer timeouts.
    #[inline]
    #[must_use]
    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout_ms = u64::try_from(connect.as_millis()).unwrap_or(u64::MAX);
        self.read_timeout_ms = u64::try_from(read.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Caps the number of in-flight repeats.
    #[inline]
    #[must_use]
    pub fn with_max_concurrent_repeats(mut self, max: usize) -> Self {
        self.max_concurrent_repeats = Some(max);
        self
    }

    /// Sets the temp directory prefix.
    #[inline]
    #[must_use]
    pub fn with_temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_prefix = prefix.into();
        self
    }
}

// ============================================================================
// Accessors & Validation
// ============================================================================

impl BookmarksConfig {
    /// Returns the connect timeout.
    #[inline]
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the response timeout.
    #[inline]
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Checks the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero parameter limit, a zero repeat
    /// bound, or zero timeouts.
    pub fn validate(&self) -> Result<()> {
        if self.max_parameters == 0 {
            return Err(Error::config("max_parameters must be at least 1"));
        }
        if self.max_concurrent_repeats == Some(0) {
            return Err(Error::config(
                "max_concurrent_repeats must be at least 1; omit it for no limit",
            ));
        }
        if self.connect_timeout_ms == 0 || self.read_timeout_ms == 0 {
            return Err(Error::config("timeouts must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_bookmark_tab() {
        let config = BookmarksConfig::new();
        assert_eq!(config.tab_caption, "[^]");
        assert_eq!(config.comment, "[^]");
        assert_eq!(config.highlight, Highlight::Magenta);
        assert_eq!(config.max_parameters, 5);
        assert!(config.add_repeated_to_table);
        assert!(config.max_concurrent_repeats.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config =
            BookmarksConfig::from_json_str(r#"{ "max_parameters": 8, "highlight": "cyan" }"#)
                .unwrap();
        assert_eq!(config.max_parameters, 8);
        assert_eq!(config.highlight, Highlight::Cyan);
        assert_eq!(config.read_timeout_ms, 30_000);
        assert_eq!(config.temp_prefix, DEFAULT_TEMP_PREFIX);
    }

    #[test]
    fn test_malformed_json() {
        let err = BookmarksConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.json");
        fs::write(&path, r#"{ "add_repeated_to_table": false }"#).unwrap();

        let config = BookmarksConfig::from_path(&path).unwrap();
        assert!(!config.add_repeated_to_table);
    }

    #[test]
    fn test_from_missing_path() {
        let err = BookmarksConfig::from_path("/nonexistent/bookmarks.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_builder_methods() {
        let config = BookmarksConfig::new()
            .with_tab_caption("Marks")
            .with_comment("*")
            .with_max_parameters(3)
            .with_add_repeated_to_table(false)
            .with_timeouts(Duration::from_millis(50), Duration::from_millis(75))
            .with_max_concurrent_repeats(2);

        assert_eq!(config.tab_caption, "Marks");
        assert_eq!(config.comment, "*");
        assert_eq!(config.max_parameters, 3);
        assert!(!config.add_repeated_to_table);
        assert_eq!(config.connect_timeout(), Duration::from_millis(50));
        assert_eq!(config.read_timeout(), Duration::from_millis(75));
        assert_eq!(config.max_concurrent_repeats, Some(2));
    }

    #[test]
    fn test_with_timeouts_saturates() {
        let config = BookmarksConfig::new().with_timeouts(Duration::MAX, Duration::from_secs(1));

        assert_eq!(config.connect_timeout_ms, u64::MAX);
        assert_eq!(config.read_timeout_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(BookmarksConfig::new().with_max_parameters(0).validate().is_err());
        assert!(
            BookmarksConfig::new()
                .with_max_concurrent_repeats(0)
                .validate()
                .is_err()
        );
        assert!(
            BookmarksConfig::new()
                .with_timeouts(Duration::ZERO, Duration::from_secs(1))
                .validate()
                .is_err()
        );
    }
}
