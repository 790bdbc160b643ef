//! Content append operations on an explicit document handle.

use crate::apply::{apply, ensure_style, ApplyOptions};
use crate::error::{Error, Result};
use crate::model::{Alignment, Document, Paragraph, Run};
use crate::schema::{
    FontParams, Margins, ParagraphFormatParams, ParameterSchema, SectionParams, StyleParams,
};
use crate::units;
use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const HOUSE_FONT: &str = "Times New Roman";
const BLACK: &str = "000000";
const HEADING_PREVIEW: usize = 100;
const PARAGRAPH_PREVIEW: usize = 50;

/// The house style every new document starts with.
pub fn house_style() -> ParameterSchema {
    let heading = StyleParams {
        font: Some(FontParams {
            name: Some(HOUSE_FONT.to_string()),
            size_pt: Some(16.0),
            bold: Some(false),
            color: Some(BLACK.to_string()),
            ..Default::default()
        }),
        paragraph_format: Some(ParagraphFormatParams {
            alignment: Some(Alignment::Center),
            line_spacing: Some(1.0),
            space_before_pt: Some(0.0),
            space_after_pt: Some(12.0),
            first_line_indent_mm: Some(0.0),
            ..Default::default()
        }),
        ..Default::default()
    };
    let normal = StyleParams {
        font: Some(FontParams {
            name: Some(HOUSE_FONT.to_string()),
            size_pt: Some(14.0),
            color: Some(BLACK.to_string()),
            ..Default::default()
        }),
        paragraph_format: Some(ParagraphFormatParams {
            alignment: Some(Alignment::Justify),
            line_spacing: Some(1.15),
            space_after_pt: Some(12.0),
            first_line_indent_mm: Some(12.7),
            ..Default::default()
        }),
        ..Default::default()
    };

    let mut styles = IndexMap::new();
    styles.insert("Normal".to_string(), normal);
    styles.insert("Heading 1".to_string(), heading.clone());
    styles.insert("Heading 2".to_string(), heading);

    let section = SectionParams {
        margins: Some(Margins {
            top_mm: Some(15.0),
            bottom_mm: Some(15.0),
            left_mm: Some(20.0),
            right_mm: Some(20.0),
            ..Default::default()
        }),
        ..Default::default()
    };

    ParameterSchema {
        styles: Some(styles),
        sections: Some(vec![section]),
        ..Default::default()
    }
}

/// A new document with the house style applied.
pub fn create_document() -> Result<Document> {
    let mut doc = Document::new();
    apply(&house_style(), &mut doc, &ApplyOptions::default())?;
    let now = Utc::now();
    doc.core.created = Some(now);
    doc.core.modified = Some(now);
    Ok(doc)
}

/// Append a heading. Level 0 is the title.
pub fn add_heading(
    doc: &mut Document,
    text: &str,
    level: u8,
    font_size: Option<f64>,
) -> Result<()> {
    let style = match level {
        0 => "Title".to_string(),
        1..=9 => format!("Heading {}", level),
        _ => {
            return Err(Error::validation(format!(
                "heading level must be between 0 and 9, got {}",
                level
            )))
        }
    };
    if let Some(size) = font_size {
        check_font_size(size)?;
    }
    let style_id = ensure_style(doc, &style)?;
    let mut paragraph = Paragraph::with_text(text).with_style(style_id);
    if let Some(size) = font_size {
        for run in &mut paragraph.runs {
            run.props.size = Some(units::pt_to_half_points(size));
        }
    }
    doc.push_paragraph(paragraph);
    Ok(())
}

/// Append a body paragraph.
///
/// The alignment defaults to justified. Without `indent_first_line` the
/// style's first-line indent is overridden with zero.
pub fn add_paragraph(
    doc: &mut Document,
    text: &str,
    alignment: Option<Alignment>,
    indent_first_line: bool,
) {
    let mut paragraph = Paragraph::with_text(text);
    paragraph.alignment = Some(alignment.unwrap_or(Alignment::Justify));
    if !indent_first_line {
        paragraph.indent_first_line = Some(0);
    }
    doc.push_paragraph(paragraph);
}

/// Direct formatting for an appended run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunFormat {
    pub bold: bool,
    pub italic: bool,
    /// Points
    pub font_size: Option<f64>,
    /// Language tag such as `en-US`
    pub lang: Option<String>,
}

/// Append a formatted run to a body paragraph. Negative indices count from
/// the end (`-1` is the last paragraph).
pub fn add_formatted_text(
    doc: &mut Document,
    paragraph_index: isize,
    text: &str,
    format: &RunFormat,
) -> Result<()> {
    if let Some(size) = format.font_size {
        check_font_size(size)?;
    }
    let count = doc.paragraph_count();
    let index = if paragraph_index < 0 {
        count.checked_sub(paragraph_index.unsigned_abs())
    } else {
        Some(paragraph_index as usize).filter(|i| *i < count)
    };
    let paragraph = index
        .and_then(|i| doc.paragraphs_mut().nth(i))
        .ok_or_else(|| {
            Error::UnknownReference(format!(
                "paragraph index {} out of range ({} paragraphs)",
                paragraph_index, count
            ))
        })?;

    let mut run = Run::new(text);
    run.props.bold = Some(format.bold);
    run.props.italic = Some(format.italic);
    run.props.size = format.font_size.map(units::pt_to_half_points);
    run.lang = format.lang.clone();
    paragraph.runs.push(run);
    Ok(())
}

/// Append a paragraph in a list style such as `List Bullet`.
pub fn add_list_item(doc: &mut Document, text: &str, style: Option<&str>) -> Result<()> {
    let style_id = ensure_style(doc, style.unwrap_or("List Bullet"))?;
    doc.push_paragraph(Paragraph::with_text(text).with_style(style_id));
    Ok(())
}

fn check_font_size(size: f64) -> Result<()> {
    if size.is_finite() && size > 0.0 && size <= 1638.0 {
        Ok(())
    } else {
        Err(Error::validation(format!("invalid font size {} pt", size)))
    }
}

/// A heading entry of [`DocumentStructure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingInfo {
    pub index: usize,
    /// Style name, e.g. `Heading 2`
    pub level: String,
    pub text: String,
}

/// A body paragraph entry of [`DocumentStructure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphInfo {
    pub index: usize,
    pub style: String,
    pub text_preview: String,
}

/// Outline of a document's body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub headings: Vec<HeadingInfo>,
    pub paragraphs: Vec<ParagraphInfo>,
    pub tables_count: usize,
}

fn preview(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let mut cut: String = text.chars().take(limit).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

/// Headings, non-empty paragraphs and the table count.
pub fn document_structure(doc: &Document) -> DocumentStructure {
    let default_style = doc
        .styles
        .default_id(crate::model::StyleKind::Paragraph)
        .unwrap_or("Normal");
    let mut structure = DocumentStructure {
        tables_count: doc.table_count(),
        ..Default::default()
    };

    for (index, paragraph) in doc.paragraphs().enumerate() {
        let id = paragraph.style_id.as_deref().unwrap_or(default_style);
        let style = doc.styles.name_of(id).unwrap_or(id).to_string();
        let text = paragraph.text();
        if style.starts_with("Heading") || style == "Title" {
            structure.headings.push(HeadingInfo {
                index,
                level: style,
                text: preview(&text, HEADING_PREVIEW),
            });
        } else if !text.trim().is_empty() {
            structure.paragraphs.push(ParagraphInfo {
                index,
                style,
                text_preview: preview(&text, PARAGRAPH_PREVIEW),
            });
        }
    }
    structure
}
