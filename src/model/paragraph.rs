//! Body content: paragraphs, runs and tables.

use super::style::{Alignment, RunProps};

/// A reference from a paragraph to a numbering instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingRef {
    pub num_id: String,
    pub level: u8,
}

/// A text run with direct formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    /// Text; `\t` and `\n` stand for tabs and line breaks
    pub text: String,
    /// Character style ID
    pub style_id: Option<String>,
    pub props: RunProps,
    /// Language tag (e.g., "en-US")
    pub lang: Option<String>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    /// Paragraph style ID
    pub style_id: Option<String>,
    /// Direct alignment override
    pub alignment: Option<Alignment>,
    /// Direct first-line indent override in twips
    pub indent_first_line: Option<i32>,
    pub numbering: Option<NumberingRef>,
    pub runs: Vec<Run>,
    /// This paragraph carries the properties of the section it closes
    pub ends_section: bool,
}

impl Paragraph {
    /// A single-run paragraph.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![Run::new(text)],
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style_id: impl Into<String>) -> Self {
        self.style_id = Some(style_id.into());
        self
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A table cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub paragraphs: Vec<Paragraph>,
}

impl Cell {
    /// A cell holding one empty paragraph, as editors create them.
    pub fn empty() -> Self {
        Self {
            paragraphs: vec![Paragraph::default()],
        }
    }

    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace the cell content with one paragraph per line.
    pub fn set_text(&mut self, text: &str) {
        self.paragraphs = text.split('\n').map(Paragraph::with_text).collect();
    }
}

/// A table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Table style ID
    pub style_id: Option<String>,
    /// Number of grid columns (`w:gridCol` count); 0 when unknown
    pub grid_columns: usize,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// An empty table of the given shape.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            style_id: None,
            grid_columns: columns,
            rows: (0..rows).map(|_| vec![Cell::empty(); columns]).collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        let widest = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        self.grid_columns.max(widest)
    }

    /// Cell text, row by row.
    pub fn cell_text(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(Cell::text).collect())
            .collect()
    }

    /// Grow or shrink to the given shape; new cells are empty.
    pub fn resize(&mut self, rows: usize, columns: usize) {
        self.rows.resize_with(rows, Vec::new);
        for row in &mut self.rows {
            row.resize_with(columns, Cell::empty);
        }
        self.grid_columns = columns;
    }

    /// All paragraphs inside the table's cells.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .flat_map(|cell| cell.paragraphs.iter())
    }
}

/// A body-level content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}
