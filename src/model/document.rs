//! The in-memory document handle.

use super::{
    Block, CoreProperties, CustomProperties, Numbering, Paragraph, SectionProps, StyleSheet,
    Table, Variables,
};
use crate::docx::{DocxReader, DocxWriter};
use crate::error::Result;
use std::path::Path;

/// An opened, mutable word-processing document.
///
/// A `Document` is owned by whoever opened it; nothing in this crate shares
/// or locks it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Core metadata (docProps/core.xml)
    pub core: CoreProperties,

    /// Custom properties (docProps/custom.xml)
    pub custom: CustomProperties,

    /// Document variables (word/settings.xml)
    pub variables: Variables,

    /// Style catalog (word/styles.xml)
    pub styles: StyleSheet,

    /// List definitions (word/numbering.xml)
    pub numbering: Numbering,

    /// Sections in physical order; never empty
    pub sections: Vec<SectionProps>,

    /// Body content in physical order
    pub body: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with the built-in style set.
    pub fn new() -> Self {
        Self {
            core: CoreProperties::default(),
            custom: CustomProperties::new(),
            variables: Variables::new(),
            styles: StyleSheet::builtin(),
            numbering: Numbering::builtin(),
            sections: vec![SectionProps::letter()],
            body: Vec::new(),
        }
    }

    /// Open a .docx file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use docparam::Document;
    ///
    /// let doc = Document::open("report.docx")?;
    /// println!("Sections: {}", doc.sections.len());
    /// # Ok::<(), docparam::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        crate::detect::check_docx_path(path)?;
        log::debug!("opening {}", path.display());
        DocxReader::open(path)?.read()
    }

    /// Read a document from .docx bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        crate::detect::check_docx_bytes(&data)?;
        DocxReader::from_bytes(data)?.read()
    }

    /// Serialize to .docx bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        DocxWriter::new(self).write()
    }

    /// Save to a .docx file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = self.to_bytes()?;
        std::fs::write(path, data)?;
        log::debug!("saved {}", path.display());
        Ok(())
    }

    /// Open a .docx file without blocking the runtime.
    #[cfg(feature = "async")]
    pub async fn open_async(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            return Err(crate::Error::NotFound(path.to_path_buf()));
        }
        let data = tokio::fs::read(path).await?;
        Self::from_bytes(data)
    }

    /// Save to a .docx file without blocking the runtime.
    #[cfg(feature = "async")]
    pub async fn save_async(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = self.to_bytes()?;
        tokio::fs::write(path.as_ref(), data).await?;
        Ok(())
    }

    /// Body-level paragraphs in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.body.iter_mut().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    /// Body-level tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.iter().filter_map(|block| match block {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.body.iter_mut().filter_map(|block| match block {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.body.push(Block::Paragraph(paragraph));
    }

    pub fn push_table(&mut self, table: Table) {
        self.body.push(Block::Table(table));
    }

    /// Append a new section at the end of the document.
    ///
    /// The current last section is closed by a section-break paragraph and
    /// the new one starts with the same page geometry. Returns the new
    /// section's index.
    pub fn add_section(&mut self) -> usize {
        let geometry = self
            .sections
            .last()
            .map(SectionProps::geometry_only)
            .unwrap_or_default();
        self.push_paragraph(Paragraph {
            ends_section: true,
            ..Default::default()
        });
        self.sections.push(geometry);
        self.sections.len() - 1
    }
}
