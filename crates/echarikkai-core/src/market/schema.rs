//! JSON Schema validation for market knowledge documents.
//!
//! Documents are validated against `data/crop_knowledge.schema.json`, which
//! is embedded at compile time and compiled once.

use std::sync::OnceLock;

/// Embedded knowledge-base schema.
const KNOWLEDGE_SCHEMA_JSON: &str = include_str!("../../data/crop_knowledge.schema.json");

/// Compiled validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn get_validator() -> Result<&'static jsonschema::Validator, String> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(KNOWLEDGE_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result.as_ref().map_err(Clone::clone)
}

/// Validate a knowledge document.
///
/// Returns every violation as `"<message> at <path>"`.
pub fn validate_knowledge_schema(document: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(document)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
