use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::infrastructure::error::{BionicError, Result};

/// Name used for the injected style element id and as the log prefix.
pub const EXT_NAME: &str = "Bionic_Reading";

/// Tag of the wrapper element that replaces a transformed text node.
pub const WORD_TAG: &str = "bionic-word";

/// Tag of the bold prefix element inside a wrapper.
pub const FONT_TAG: &str = "bionic-font";

// most heading tags are bold already
const IGNORED_PARENT_TAGS: &[&str] = &[
    "abbr", "aside", "audio", "b", "bdi", "bdo", "button", "canvas", "code", "datalist",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "input", "kbd", "menu",
    "nav", "noscript", "pre", "script", "strong", "style", "svg", "template", "textarea",
    "th", "time", "title", "var", "video",
];

const INLINE_DECORATORS: &[&str] = &["a", "em"];

/// Which subtree a render pass walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RootStrategy {
    /// First `article`, `main` or `[role="main"]`, else `body`.
    #[default]
    MainContent,
    /// Always the document body.
    Body,
}

/// Metrics for the block-flow layout used to answer bounding-rect queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutMetrics {
    #[serde(default = "default_line_height")]
    pub line_height: f64,

    #[serde(default = "default_chars_per_line")]
    pub chars_per_line: usize,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            line_height: default_line_height(),
            chars_per_line: default_chars_per_line(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BionicConfig {
    /// Trimmed text shorter than this is never transformed.
    #[serde(default = "default_min_characters")]
    pub min_characters: usize,

    #[serde(default = "default_min_words")]
    pub min_words: usize,

    /// Cap on the bold prefix length of a single word.
    #[serde(default = "default_max_bold_letters")]
    pub max_bold_letters: usize,

    /// How far outside the viewport (px) a parent may sit and still be transformed.
    #[serde(default = "default_vertical_offset")]
    pub vertical_offset: f64,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_font_color")]
    pub default_font_color: String,

    #[serde(default = "default_alternate_font_color")]
    pub alternate_font_color: String,

    #[serde(default)]
    pub root: RootStrategy,

    #[serde(default = "default_ignored_tags")]
    pub ignored_tags: Vec<String>,

    #[serde(default = "default_inline_decorators")]
    pub inline_decorators: Vec<String>,

    #[serde(default)]
    pub layout: LayoutMetrics,
}

fn default_min_characters() -> usize {
    3
}

fn default_min_words() -> usize {
    4
}

fn default_max_bold_letters() -> usize {
    6
}

fn default_vertical_offset() -> f64 {
    100.0
}

fn default_debounce_ms() -> u64 {
    180
}

fn default_font_color() -> String {
    "inherit".to_string()
}

fn default_alternate_font_color() -> String {
    "#000000".to_string()
}

fn default_ignored_tags() -> Vec<String> {
    IGNORED_PARENT_TAGS.iter().map(|t| t.to_string()).collect()
}

fn default_inline_decorators() -> Vec<String> {
    INLINE_DECORATORS.iter().map(|t| t.to_string()).collect()
}

fn default_line_height() -> f64 {
    20.0
}

fn default_chars_per_line() -> usize {
    80
}

impl Default for BionicConfig {
    fn default() -> Self {
        Self {
            min_characters: default_min_characters(),
            min_words: default_min_words(),
            max_bold_letters: default_max_bold_letters(),
            vertical_offset: default_vertical_offset(),
            debounce_ms: default_debounce_ms(),
            default_font_color: default_font_color(),
            alternate_font_color: default_alternate_font_color(),
            root: RootStrategy::default(),
            ignored_tags: default_ignored_tags(),
            inline_decorators: default_inline_decorators(),
            layout: LayoutMetrics::default(),
        }
    }
}

impl BionicConfig {
    /// Minimum combined word length for a node with fewer than `min_words` words.
    pub fn min_node_text_length(&self) -> usize {
        self.min_words.saturating_sub(1) * self.max_bold_letters
    }

    pub fn debounce_wait(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn is_ignored_tag(&self, tag: &str) -> bool {
        self.ignored_tags.iter().any(|t| t == tag)
    }

    pub fn is_inline_decorator(&self, tag: &str) -> bool {
        self.inline_decorators.iter().any(|t| t == tag)
    }

    /// Load config from the default path, or fall back to defaults.
    pub fn load() -> Self {
        let config_path = Self::get_config_path();
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %config_path.display(), error = %e, "failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from an explicit path. Missing fields take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_bold_letters == 0 {
            return Err(BionicError::Config("max_bold_letters must be positive".to_string()));
        }
        if self.layout.chars_per_line == 0 {
            return Err(BionicError::Config("layout.chars_per_line must be positive".to_string()));
        }
        if !(self.layout.line_height > 0.0) {
            return Err(BionicError::Config("layout.line_height must be positive".to_string()));
        }
        Ok(())
    }

    /// Get config file path (cross-platform)
    pub fn get_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("bionic-reader");
        path.push("config.json");
        path
    }
}
