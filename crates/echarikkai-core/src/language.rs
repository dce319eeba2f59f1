//! Language detection and translation.
//!
//! Detection is a Unicode-range check; translation is a placeholder that
//! passes English through and marks Tamil as untranslated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Tamil Unicode block.
const TAMIL_BLOCK: std::ops::RangeInclusive<char> = '\u{0B80}'..='\u{0BFF}';

const TO_ENGLISH_PLACEHOLDER: &str = "[Tamil text detected - translation not implemented]";
const TO_TAMIL_PLACEHOLDER: &str = "[Tamil translation not implemented]";

/// A supported language, serialized as its ISO 639-1 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ta")]
    Tamil,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Tamil => "ta",
        }
    }

    /// Look up a language by code; `None` for unsupported codes.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "en" => Some(Language::English),
            "ta" => Some(Language::Tamil),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn require_text(text: &str, name: &'static str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        Err(CoreError::EmptyInput(name))
    } else {
        Ok(())
    }
}

/// Tamil if any character falls in the Tamil block, English otherwise.
pub fn detect_language(text: &str) -> Result<Language, CoreError> {
    require_text(text, "text")?;

    if text.chars().any(|c| TAMIL_BLOCK.contains(&c)) {
        Ok(Language::Tamil)
    } else {
        Ok(Language::English)
    }
}

/// English text unchanged; anything else becomes a fixed placeholder.
pub fn translate_to_english(text: &str) -> Result<String, CoreError> {
    match detect_language(text)? {
        Language::English => Ok(text.to_string()),
        Language::Tamil => {
            tracing::warn!("Tamil input detected; translation is not available");
            Ok(TO_ENGLISH_PLACEHOLDER.to_string())
        }
    }
}

/// Translate English text into `target`.
///
/// English and unsupported codes return the text unchanged; Tamil returns a
/// fixed placeholder.
pub fn translate_from_english(text: &str, target: &str) -> Result<String, CoreError> {
    require_text(text, "text")?;
    require_text(target, "target_language")?;

    match Language::from_code(target) {
        Some(Language::Tamil) => Ok(TO_TAMIL_PLACEHOLDER.to_string()),
        Some(Language::English) => Ok(text.to_string()),
        None => {
            tracing::debug!(language = target, "Unsupported target language, returning text unchanged");
            Ok(text.to_string())
        }
    }
}
