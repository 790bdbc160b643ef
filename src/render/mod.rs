//! Output rendering for schemas and reports.
//!
//! # Example
//!
//! ```
//! use docparam::render::{to_json, JsonFormat};
//! use docparam::{extract, Document, ExtractOptions};
//!
//! let schema = extract(&Document::new(), &ExtractOptions::default())?;
//! let json = to_json(&schema, JsonFormat::Compact)?;
//! assert!(json.starts_with('{'));
//! # Ok::<(), docparam::Error>(())
//! ```

mod json;

pub use json::{to_json, to_json_default, JsonFormat};
