//! JSON output of schemas and reports.

use crate::error::{Error, Result};
use serde::Serialize;
use std::str::FromStr;

/// JSON output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Compact single-line JSON
    Compact,
    /// Pretty-printed with 2-space indentation
    #[default]
    Pretty,
}

impl FromStr for JsonFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(JsonFormat::Compact),
            "pretty" => Ok(JsonFormat::Pretty),
            other => Err(format!("unknown JSON format '{}'", other)),
        }
    }
}

/// Serialize any schema value to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Compact => serde_json::to_string(value),
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
    };
    json.map_err(|e| Error::Serialization(format!("JSON serialization error: {}", e)))
}

/// Serialize with default formatting.
pub fn to_json_default<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    to_json(value, JsonFormat::Pretty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract, ExtractOptions};
    use crate::model::Document;
    use crate::schema::{Category, ParameterSchema};

    fn schema() -> ParameterSchema {
        let mut doc = Document::new();
        doc.core.title = Some("Test".to_string());
        extract(
            &doc,
            &ExtractOptions::new().with_categories([Category::CoreProperties]),
        )
        .unwrap()
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&schema(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"title\": \"Test\""));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&schema(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"title\":\"Test\""));
    }

    #[test]
    fn test_to_json_default() {
        let json = to_json_default(&schema()).unwrap();
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_schema_roundtrip() {
        let original = schema();
        let json = to_json(&original, JsonFormat::Pretty).unwrap();
        let parsed = ParameterSchema::from_json(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("Compact".parse::<JsonFormat>(), Ok(JsonFormat::Compact));
        assert!("yaml".parse::<JsonFormat>().is_err());
    }
}
