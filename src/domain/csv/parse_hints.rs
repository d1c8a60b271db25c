// ============================================================
// PARSE HINTS
// ============================================================
// Ordered encoding candidates and CSV dialect options

use serde::{Deserialize, Serialize};

/// Always tried first
pub const UTF8_LABEL: &str = "utf-8";

/// Latin-1 family fallback tried second
pub const LATIN1_LABEL: &str = "latin-1";

/// Options for turning raw bytes into a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseHints {
    /// Encoding labels, tried in order until one decodes cleanly
    pub encodings: Vec<String>,

    /// Field delimiter; detected from the content when `None`
    pub delimiter: Option<u8>,

    /// Whether to trim whitespace around values
    pub trim: bool,
}

impl Default for ParseHints {
    fn default() -> Self {
        Self {
            encodings: vec![UTF8_LABEL.to_string(), LATIN1_LABEL.to_string()],
            delimiter: None,
            trim: false,
        }
    }
}

impl ParseHints {
    /// Use exactly these encodings, in this order.
    pub fn with_encodings<I, S>(encodings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            encodings: encodings.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Append caller-configured encodings after the defaults, skipping repeats.
    pub fn with_fallbacks(mut self, fallbacks: &[String]) -> Self {
        for label in fallbacks {
            let label = label.trim();
            if label.is_empty() {
                continue;
            }
            if !self.encodings.iter().any(|e| e.eq_ignore_ascii_case(label)) {
                self.encodings.push(label.to_string());
            }
        }
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}
