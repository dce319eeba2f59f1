//! Input normalization.
//!
//! Every plan description passes through here before extraction, so the
//! keyword registries only ever see lowercase, single-spaced, NFC text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::CoreError;

/// Kinds of input the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(InputType::Text),
            other => Err(CoreError::UnsupportedInputType(other.to_string())),
        }
    }
}

/// Normalize raw input: NFC, lowercase, collapse whitespace runs, trim.
///
/// # Errors
///
/// [`CoreError::EmptyInput`] if `data` is empty or whitespace-only.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(normalize_input(InputType::Text, "  Héllo\tWörld\n")?, "héllo wörld");
/// ```
pub fn normalize_input(input_type: InputType, data: &str) -> Result<String, CoreError> {
    match input_type {
        InputType::Text => normalize_text(data),
    }
}

fn normalize_text(data: &str) -> Result<String, CoreError> {
    if data.trim().is_empty() {
        return Err(CoreError::EmptyInput("input_data"));
    }

    let composed: String = data.nfc().collect();
    let lowered = composed.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");

    Ok(collapsed)
}
