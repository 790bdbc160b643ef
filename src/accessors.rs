//! Single-field property access.
//!
//! Setters coerce a textual value, wrap it in a one-category
//! [`ParameterSchema`] and hand that to [`crate::apply`], so they share the
//! engine's validation.

use crate::apply::{apply, ApplyOptions, ApplyReport};
use crate::docx::parse_timestamp;
use crate::error::{Error, Result};
use crate::model::{CoreProperties, CustomProperties, CustomValue, Document};
use crate::schema::ParameterSchema;
use serde_json::{Map, Value};

/// Core property names accepted by [`set_core_property`].
pub const CORE_PROPERTY_NAMES: &[&str] = &[
    "author",
    "title",
    "subject",
    "keywords",
    "comments",
    "category",
    "content_status",
    "identifier",
    "language",
    "last_modified_by",
    "revision",
    "version",
    "created",
    "modified",
    "last_printed",
];

const TIMESTAMP_PROPERTIES: &[&str] = &["created", "modified", "last_printed"];

fn canonical_core_name(name: &str) -> Result<&'static str> {
    let key = name.trim().to_ascii_lowercase();
    let key = match key.as_str() {
        "status" => "content_status",
        "description" => "comments",
        "creator" => "author",
        other => other,
    };
    CORE_PROPERTY_NAMES
        .iter()
        .copied()
        .find(|candidate| *candidate == key)
        .ok_or_else(|| {
            Error::validation(format!(
                "unknown core property '{}'; valid properties are: {}",
                name,
                CORE_PROPERTY_NAMES.join(", ")
            ))
        })
}

/// Set one core property from its textual form.
///
/// `revision` takes an integer and the timestamps take RFC 3339 or plain
/// dates. `status` is accepted for `content_status`.
pub fn set_core_property(doc: &mut Document, name: &str, value: &str) -> Result<ApplyReport> {
    let key = canonical_core_name(name)?;
    let json = if key == "revision" {
        let revision: u32 = value.trim().parse().map_err(|_| {
            Error::validation(format!("revision must be a non-negative integer, got '{}'", value))
        })?;
        Value::from(revision)
    } else if TIMESTAMP_PROPERTIES.contains(&key) {
        let timestamp = parse_timestamp(value).ok_or_else(|| {
            Error::validation(format!("'{}' is not a valid timestamp for {}", value, key))
        })?;
        Value::from(timestamp.to_rfc3339())
    } else {
        Value::from(value)
    };

    let mut fields = Map::new();
    fields.insert(key.to_string(), json);
    let core: CoreProperties = serde_json::from_value(Value::Object(fields))?;
    let fragment = ParameterSchema {
        core_properties: Some(core),
        ..Default::default()
    };
    apply(&fragment, doc, &ApplyOptions::default())
}

/// Current value of a core property in textual form.
pub fn core_property(doc: &Document, name: &str) -> Result<Option<String>> {
    let key = canonical_core_name(name)?;
    let value = serde_json::to_value(&doc.core)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(match value.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

/// Coerce text to a typed custom value.
///
/// Type names: `string`/`text`, `number`/`int`/`float`, `boolean`/`bool`,
/// `datetime`/`date`.
pub fn coerce_custom_value(value: &str, kind: &str) -> Result<CustomValue> {
    let invalid = |expected: &str| {
        Error::validation(format!("'{}' is not a valid {} value", value, expected))
    };
    match kind.trim().to_ascii_lowercase().as_str() {
        "string" | "text" | "str" => Ok(CustomValue::String(value.to_string())),
        "number" | "int" | "integer" | "float" => {
            let number: f64 = value.trim().parse().map_err(|_| invalid("number"))?;
            if number.is_finite() {
                Ok(CustomValue::Number(number))
            } else {
                Err(invalid("number"))
            }
        }
        "boolean" | "bool" => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(CustomValue::Boolean(true)),
            "false" | "0" | "no" => Ok(CustomValue::Boolean(false)),
            _ => Err(invalid("boolean")),
        },
        "datetime" | "date" => parse_timestamp(value)
            .map(CustomValue::Datetime)
            .ok_or_else(|| invalid("datetime")),
        other => Err(Error::validation(format!(
            "unknown custom property type '{}'; expected string, number, boolean or datetime",
            other
        ))),
    }
}

/// Set one custom property, coercing `value` to the named type.
pub fn set_custom_property(
    doc: &mut Document,
    name: &str,
    value: &str,
    kind: &str,
) -> Result<ApplyReport> {
    let value = coerce_custom_value(value, kind)?;
    let mut custom = CustomProperties::new();
    custom.insert(name.to_string(), value);
    let fragment = ParameterSchema {
        custom_properties: Some(custom),
        ..Default::default()
    };
    apply(&fragment, doc, &ApplyOptions::default())
}
