//! DOCX (Word) package reading and writing.
//!
//! This module converts between the Office Open XML (.docx) parts and the
//! in-memory [`crate::model`] types.

mod numbering;
mod parser;
mod properties;
mod props;
mod styles;
mod writer;
pub(crate) mod xml;

pub use parser::DocxReader;
pub use properties::parse_timestamp;
pub use styles::{stored_name, ui_name};
pub use writer::DocxWriter;
