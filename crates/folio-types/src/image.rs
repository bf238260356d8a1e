use serde::{Deserialize, Serialize};

/// Prefix marking raw image data embedded in a URI.
pub const INLINE_PREFIX: &str = "data:";

/// Where an artwork image currently lives.
///
/// An admin form either carries freshly picked image data (a `data:` URI)
/// or re-submits the reference the record already points at. Only inline
/// payloads need uploading before they can be stored on a record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageSource {
    Inline(String),
    Reference(String),
}

impl ImageSource {
    /// Classify raw image text by its prefix.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.starts_with(INLINE_PREFIX) {
            Self::Inline(raw)
        } else {
            Self::Reference(raw)
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }

    /// Returns `true` when there is nothing to store or reference.
    pub fn is_empty(&self) -> bool {
        self.as_str().trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Inline(s) | Self::Reference(s) => s,
        }
    }
}

impl From<String> for ImageSource {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

impl From<&str> for ImageSource {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<ImageSource> for String {
    fn from(source: ImageSource) -> Self {
        match source {
            ImageSource::Inline(s) | ImageSource::Reference(s) => s,
        }
    }
}
