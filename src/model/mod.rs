//! In-memory model of a word-processing document.
//!
//! This module defines the structures a [`Document`] is made of. The
//! [`crate::docx`] module converts them from and to the container's XML
//! parts; the schema engine reads and mutates them.

mod document;
mod numbering;
mod paragraph;
mod properties;
mod section;
mod style;

pub use document::*;
pub use numbering::*;
pub use paragraph::*;
pub use properties::*;
pub use section::*;
pub use style::*;
