//! Crop market knowledge base.
//!
//! A small local document describing each crop's market outlook:
//!
//! ```yaml
//! crops:
//!   rice:
//!     price_trend: stable
//!     volatility: low
//!     demand_level: high
//! ```
//!
//! Documents are structure-checked against an embedded JSON Schema on load.
//! Field values are checked on lookup, one field at a time: a non-string or
//! anything outside the closed vocabularies reads as unset rather than
//! failing the document.

mod schema;

pub use schema::validate_knowledge_schema;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{canonical_tokens, Crop};
use crate::CoreError;

/// Knowledge base shipped with the crate.
const BUILTIN_KNOWLEDGE_JSON: &str = include_str!("../../data/crop_knowledge.json");

/// Errors that can occur when loading a knowledge base.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Failed to read market data file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Market data validation failed: {}", .0.join("; "))]
    ValidationError(Vec<String>),
}

canonical_tokens! {
    /// Direction of recent price movement.
    pub enum PriceTrend ("price_trend") {
        Rising => "rising",
        Stable => "stable",
        Falling => "falling",
    }
}

canonical_tokens! {
    /// A three-step level, used for volatility and demand.
    pub enum Level ("level") {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

/// Market outlook for one crop. Every field may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketContext {
    pub price_trend: Option<PriceTrend>,
    pub volatility: Option<Level>,
    pub demand_level: Option<Level>,
}

impl MarketContext {
    /// A context with every field unset.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// A crop record as written in the document, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
struct CropRecord {
    #[serde(default)]
    price_trend: Option<serde_json::Value>,
    #[serde(default)]
    volatility: Option<serde_json::Value>,
    #[serde(default)]
    demand_level: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeDocument {
    crops: BTreeMap<String, CropRecord>,
}

/// A loaded, schema-valid knowledge base.
#[derive(Debug, Clone, Default)]
pub struct MarketKnowledgeBase {
    crops: BTreeMap<String, CropRecord>,
}

impl MarketKnowledgeBase {
    /// The knowledge base embedded in the crate.
    pub fn builtin() -> Result<Self, MarketDataError> {
        Self::from_json(BUILTIN_KNOWLEDGE_JSON)
    }

    /// A knowledge base with no crops; every lookup reads as unset.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a knowledge base from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, MarketDataError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a knowledge base from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, MarketDataError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a knowledge base from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MarketDataError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a knowledge base from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, MarketDataError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load a file, choosing the format by extension (`.yaml`/`.yml`, else JSON).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MarketDataError> {
        let path = path.as_ref();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        if is_yaml {
            Self::from_yaml_file(path)
        } else {
            Self::from_json_file(path)
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, MarketDataError> {
        validate_knowledge_schema(&value).map_err(MarketDataError::ValidationError)?;

        let document: KnowledgeDocument = serde_json::from_value(value)?;
        let crops = document
            .crops
            .into_iter()
            .map(|(name, record)| (name.trim().to_lowercase(), record))
            .collect();

        Ok(Self { crops })
    }

    /// Number of crops in the document.
    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    /// Market context for a crop name. Case-insensitive.
    ///
    /// Unknown crops and invalid field values read as unset.
    ///
    /// # Errors
    ///
    /// [`CoreError::EmptyInput`] if `crop` is empty or whitespace-only.
    pub fn lookup(&self, crop: &str) -> Result<MarketContext, CoreError> {
        if crop.trim().is_empty() {
            return Err(CoreError::EmptyInput("crop"));
        }

        let key = crop.trim().to_lowercase();
        let Some(record) = self.crops.get(&key) else {
            tracing::debug!(crop = %key, "Crop not in market knowledge base");
            return Ok(MarketContext::unavailable());
        };

        Ok(MarketContext {
            price_trend: checked_field(&key, "price_trend", record.price_trend.as_ref()),
            volatility: checked_field(&key, "volatility", record.volatility.as_ref()),
            demand_level: checked_field(&key, "demand_level", record.demand_level.as_ref()),
        })
    }

    /// Market context for an extracted crop.
    pub fn context_for(&self, crop: Crop) -> MarketContext {
        self.lookup(crop.as_str()).unwrap_or_default()
    }
}

fn checked_field<T>(crop: &str, field: &'static str, raw: Option<&serde_json::Value>) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = match raw? {
        serde_json::Value::Null => return None,
        serde_json::Value::String(raw) => raw,
        other => {
            tracing::debug!(crop, field, value = %other, "Ignoring non-string market field");
            return None;
        }
    };
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(crop, field, error = %e, "Ignoring invalid market field");
            None
        }
    }
}
