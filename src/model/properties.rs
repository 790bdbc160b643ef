//! Document metadata: core properties, custom properties and variables.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Core properties from docProps/core.xml.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreProperties {
    /// Document author/creator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,

    /// Stored as `dc:description`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_printed: Option<DateTime<Utc>>,
}

impl CoreProperties {
    /// Overwrite every field that is set in `other`.
    pub fn merge(&mut self, other: &CoreProperties) {
        fn take<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if src.is_some() {
                *dst = src.clone();
            }
        }
        take(&mut self.author, &other.author);
        take(&mut self.title, &other.title);
        take(&mut self.subject, &other.subject);
        take(&mut self.keywords, &other.keywords);
        take(&mut self.comments, &other.comments);
        take(&mut self.category, &other.category);
        take(&mut self.content_status, &other.content_status);
        take(&mut self.identifier, &other.identifier);
        take(&mut self.language, &other.language);
        take(&mut self.last_modified_by, &other.last_modified_by);
        take(&mut self.revision, &other.revision);
        take(&mut self.version, &other.version);
        take(&mut self.created, &other.created);
        take(&mut self.modified, &other.modified);
        take(&mut self.last_printed, &other.last_printed);
    }

    pub fn is_empty(&self) -> bool {
        *self == CoreProperties::default()
    }
}

/// A typed custom property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CustomValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Datetime(DateTime<Utc>),
}

impl CustomValue {
    /// The type tag used in the schema.
    pub fn type_name(&self) -> &'static str {
        match self {
            CustomValue::String(_) => "string",
            CustomValue::Number(_) => "number",
            CustomValue::Boolean(_) => "boolean",
            CustomValue::Datetime(_) => "datetime",
        }
    }
}

impl std::fmt::Display for CustomValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CustomValue::String(s) => write!(f, "{}", s),
            CustomValue::Number(n) => write!(f, "{}", n),
            CustomValue::Boolean(b) => write!(f, "{}", b),
            CustomValue::Datetime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

/// User-defined properties, in declaration order.
pub type CustomProperties = IndexMap<String, CustomValue>;

/// Document variables (`w:docVar`), in declaration order.
pub type Variables = IndexMap<String, String>;
