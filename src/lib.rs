//! # docparam
//!
//! Bidirectional parameter schema engine for Word (.docx) documents.
//!
//! The library reads a document's formatting (core and custom properties,
//! document variables, page geometry, the style catalog with inheritance,
//! list definitions, headers and footers, table structure) into a
//! serializable [`ParameterSchema`], and applies such a schema, whole or in
//! part, to a new or existing document.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docparam::{apply, extract, ApplyOptions, Document, ExtractOptions};
//!
//! // Describe a template
//! let template = Document::open("template.docx")?;
//! let schema = extract(&template, &ExtractOptions::default())?;
//!
//! // Rebuild its formatting in a fresh document
//! let mut doc = Document::new();
//! let report = apply(&schema, &mut doc, &ApplyOptions::default())?;
//! println!("Styles written: {}", report.styles);
//! doc.save("output.docx")?;
//! # Ok::<(), docparam::Error>(())
//! ```
//!
//! ## Partial updates
//!
//! ```
//! use docparam::{apply, ApplyOptions, Document, ParameterSchema};
//!
//! let mut doc = Document::new();
//! let fragment = ParameterSchema::from_json(
//!     r#"{"sections": [{"margins": {"top_mm": 15, "bottom_mm": 15}}]}"#,
//! )?;
//! apply(&fragment, &mut doc, &ApplyOptions::default())?;
//! assert_eq!(doc.sections[0].margins.top, 850);
//! # Ok::<(), docparam::Error>(())
//! ```
//!
//! ## Features
//!
//! - `async`: Async file I/O with Tokio (`Document::open_async`, `save_async`)

pub mod accessors;
pub mod apply;
pub mod container;
pub mod content;
pub mod detect;
pub mod docx;
pub mod error;
pub mod extract;
pub mod model;
pub mod render;
pub mod resolve;
pub mod schema;
pub mod service;
pub mod units;

// Re-exports
pub use accessors::{core_property, set_core_property, set_custom_property};
pub use apply::{apply, validate, ApplyOptions, ApplyReport, Phase};
pub use container::{OoxmlContainer, PackageWriter, Relationship, Relationships};
pub use error::{Error, ErrorKind, Result};
pub use extract::{extract, ExtractOptions, Extraction, Scope};
pub use model::{
    Alignment, CoreProperties, CustomValue, Document, Orientation, Paragraph, SectionProps,
    StyleKind, Table,
};
pub use resolve::{StyleCatalog, StyleResolver};
pub use schema::{Category, ParameterSchema};
pub use service::{Request, Response, Session};

use std::path::Path;

/// Extract the full parameter schema of a .docx file.
///
/// # Example
///
/// ```no_run
/// let schema = docparam::extract_file("report.docx")?;
/// println!("{} styles", schema.styles.map_or(0, |s| s.len()));
/// # Ok::<(), docparam::Error>(())
/// ```
pub fn extract_file(path: impl AsRef<Path>) -> Result<ParameterSchema> {
    let doc = Document::open(path)?;
    extract(&doc, &ExtractOptions::default())
}

/// Apply a schema to a .docx file and write the result to `output`.
///
/// # Example
///
/// ```no_run
/// use docparam::{apply_to_file, ParameterSchema};
///
/// let schema = ParameterSchema::from_json(r#"{"core_properties": {"title": "Q3"}}"#)?;
/// apply_to_file(&schema, "draft.docx", "final.docx")?;
/// # Ok::<(), docparam::Error>(())
/// ```
pub fn apply_to_file(
    schema: &ParameterSchema,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<ApplyReport> {
    let mut doc = Document::open(input)?;
    let report = apply(schema, &mut doc, &ApplyOptions::default())?;
    doc.save(output)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_file_missing() {
        let err = extract_file("does-not-exist.docx").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_apply_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.docx");
        let output = dir.path().join("out.docx");
        Document::new().save(&input).unwrap();

        let schema =
            ParameterSchema::from_json(r#"{"variables": {"client": "ACME"}}"#).unwrap();
        let report = apply_to_file(&schema, &input, &output).unwrap();
        assert_eq!(report.properties, 1);

        let schema = extract_file(&output).unwrap();
        assert_eq!(schema.variables.unwrap()["client"], "ACME");
    }
}
