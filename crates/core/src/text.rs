use serde::{Deserialize, Serialize};

/// Text shown on the site in English with an optional Hindi rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hi: Option<String>,
}

impl LocalizedText {
    pub fn en(text: impl Into<String>) -> Self {
        Self {
            en: text.into(),
            hi: None,
        }
    }

    pub fn with_hi(mut self, text: impl Into<String>) -> Self {
        self.hi = Some(text.into());
        self
    }
}

impl From<&str> for LocalizedText {
    fn from(text: &str) -> Self {
        Self::en(text)
    }
}
