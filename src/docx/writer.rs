//! DOCX writer: document model to package parts.

use super::numbering::write_numbering;
use super::properties::{write_core, write_custom, write_settings};
use super::props::{write_indent, write_run_props};
use super::styles::write_styles;
use super::xml::{XmlWriter, R_NS, W_NS};
use crate::container::{content_types, rel_types, PackageWriter, Relationships};
use crate::detect::MAIN_PART;
use crate::error::Result;
use crate::model::{Block, Document, Orientation, Paragraph, Run, SectionProps, Table};

/// A header or footer part to emit.
struct PartRef {
    rel_id: String,
    kind: &'static str,
}

#[derive(Default)]
struct SectionParts {
    headers: Vec<PartRef>,
    footers: Vec<PartRef>,
}

/// Serializes a [`Document`] as a DOCX package.
pub struct DocxWriter<'a> {
    doc: &'a Document,
}

impl<'a> DocxWriter<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    /// Build the package and return the ZIP bytes.
    pub fn write(&self) -> Result<Vec<u8>> {
        let doc = self.doc;
        let mut package = PackageWriter::new();

        let mut package_rels = Relationships::new();
        package_rels.add("rId1", rel_types::OFFICE_DOCUMENT, MAIN_PART);
        package_rels.add("rId2", rel_types::CORE_PROPERTIES, "docProps/core.xml");
        if !doc.custom.is_empty() {
            package_rels.add("rId3", rel_types::CUSTOM_PROPERTIES, "docProps/custom.xml");
        }

        let mut document_rels = Relationships::new();
        document_rels.add("rId1", rel_types::STYLES, "styles.xml");
        document_rels.add("rId2", rel_types::SETTINGS, "settings.xml");
        document_rels.add("rId3", rel_types::NUMBERING, "numbering.xml");

        // Header and footer parts, numbered in section order
        let mut section_parts = Vec::with_capacity(doc.sections.len());
        let mut header_count = 0;
        let mut footer_count = 0;
        for section in &doc.sections {
            let mut parts = SectionParts::default();
            let variants = [("default", &section.header.default), ("first", &section.header.first)];
            for (kind, text) in variants {
                if let Some(text) = text {
                    header_count += 1;
                    let rel_id = format!("rId{}", document_rels.entries.len() + 1);
                    let target = format!("header{}.xml", header_count);
                    package.add_part(
                        &format!("word/{}", target),
                        content_types::HEADER,
                        write_header_footer("w:hdr", text)?,
                    );
                    document_rels.add(rel_id.clone(), rel_types::HEADER, target);
                    parts.headers.push(PartRef { rel_id, kind });
                }
            }
            let variants = [("default", &section.footer.default), ("first", &section.footer.first)];
            for (kind, text) in variants {
                if let Some(text) = text {
                    footer_count += 1;
                    let rel_id = format!("rId{}", document_rels.entries.len() + 1);
                    let target = format!("footer{}.xml", footer_count);
                    package.add_part(
                        &format!("word/{}", target),
                        content_types::FOOTER,
                        write_header_footer("w:ftr", text)?,
                    );
                    document_rels.add(rel_id.clone(), rel_types::FOOTER, target);
                    parts.footers.push(PartRef { rel_id, kind });
                }
            }
            section_parts.push(parts);
        }

        package.add_part(
            MAIN_PART,
            content_types::DOCUMENT,
            self.document_xml(&section_parts)?,
        );
        package.add_part(
            "word/styles.xml",
            content_types::STYLES,
            write_styles(&doc.styles)?,
        );
        package.add_part(
            "word/settings.xml",
            content_types::SETTINGS,
            write_settings(&doc.variables)?,
        );
        package.add_part(
            "word/numbering.xml",
            content_types::NUMBERING,
            write_numbering(&doc.numbering)?,
        );
        package.add_part(
            "docProps/core.xml",
            content_types::CORE_PROPERTIES,
            write_core(&doc.core)?,
        );
        if !doc.custom.is_empty() {
            package.add_part(
                "docProps/custom.xml",
                content_types::CUSTOM_PROPERTIES,
                write_custom(&doc.custom)?,
            );
        }

        package.add_relationships("_rels/.rels", &package_rels)?;
        package.add_relationships("word/_rels/document.xml.rels", &document_rels)?;

        log::debug!(
            "writing {} blocks, {} sections, {} header and {} footer parts",
            doc.body.len(),
            doc.sections.len(),
            header_count,
            footer_count
        );
        package.finish()
    }

    fn document_xml(&self, section_parts: &[SectionParts]) -> Result<Vec<u8>> {
        let doc = self.doc;
        let mut w = XmlWriter::new()?;
        w.start("w:document", &[("xmlns:w", W_NS), ("xmlns:r", R_NS)])?;
        w.start("w:body", &[])?;

        let last = doc.sections.len().saturating_sub(1);
        let mut section_index = 0;
        for block in &doc.body {
            match block {
                Block::Paragraph(p) => {
                    // Section breaks beyond the declared sections are dropped
                    let closes = if p.ends_section && section_index < last {
                        let index = section_index;
                        section_index += 1;
                        Some(index)
                    } else {
                        None
                    };
                    let section =
                        closes.map(|i| (&doc.sections[i], &section_parts[i]));
                    write_paragraph(&mut w, p, section)?;
                }
                Block::Table(t) => write_table(&mut w, t)?,
            }
        }

        if let (Some(section), Some(parts)) = (doc.sections.last(), section_parts.last()) {
            write_section(&mut w, section, parts)?;
        }

        w.end("w:body")?;
        w.end("w:document")?;
        Ok(w.finish())
    }
}

fn write_paragraph(
    w: &mut XmlWriter,
    p: &Paragraph,
    section: Option<(&SectionProps, &SectionParts)>,
) -> Result<()> {
    w.start("w:p", &[])?;

    let has_props = p.style_id.is_some()
        || p.numbering.is_some()
        || p.indent_first_line.is_some()
        || p.alignment.is_some()
        || section.is_some();
    if has_props {
        w.start("w:pPr", &[])?;
        if let Some(style_id) = &p.style_id {
            w.val("w:pStyle", style_id)?;
        }
        if let Some(numbering) = &p.numbering {
            w.start("w:numPr", &[])?;
            w.val("w:ilvl", &numbering.level.to_string())?;
            w.val("w:numId", &numbering.num_id)?;
            w.end("w:numPr")?;
        }
        write_indent(w, None, None, p.indent_first_line)?;
        if let Some(alignment) = p.alignment {
            w.val("w:jc", alignment.as_ooxml())?;
        }
        if let Some((props, parts)) = section {
            write_section(w, props, parts)?;
        }
        w.end("w:pPr")?;
    }

    for run in &p.runs {
        write_run(w, run)?;
    }
    w.end("w:p")
}

fn write_run(w: &mut XmlWriter, run: &Run) -> Result<()> {
    w.start("w:r", &[])?;
    write_run_props(w, run.style_id.as_deref(), &run.props, run.lang.as_deref())?;
    write_run_text(w, &run.text)?;
    w.end("w:r")
}

/// Write run text; tabs and line breaks become their own elements.
fn write_run_text(w: &mut XmlWriter, text: &str) -> Result<()> {
    let mut segment = String::new();
    for ch in text.chars() {
        match ch {
            '\t' | '\n' => {
                if !segment.is_empty() {
                    w.text_element("w:t", &[("xml:space", "preserve")], &segment)?;
                    segment.clear();
                }
                w.empty(if ch == '\t' { "w:tab" } else { "w:br" }, &[])?;
            }
            _ => segment.push(ch),
        }
    }
    if !segment.is_empty() {
        w.text_element("w:t", &[("xml:space", "preserve")], &segment)?;
    }
    Ok(())
}

fn write_table(w: &mut XmlWriter, table: &Table) -> Result<()> {
    w.start("w:tbl", &[])?;
    w.start("w:tblPr", &[])?;
    if let Some(style_id) = &table.style_id {
        w.val("w:tblStyle", style_id)?;
    }
    w.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
    w.end("w:tblPr")?;

    w.start("w:tblGrid", &[])?;
    for _ in 0..table.column_count() {
        w.empty("w:gridCol", &[])?;
    }
    w.end("w:tblGrid")?;

    for row in &table.rows {
        w.start("w:tr", &[])?;
        for cell in row {
            w.start("w:tc", &[])?;
            // A cell must end with a paragraph
            if cell.paragraphs.is_empty() {
                w.empty("w:p", &[])?;
            }
            for p in &cell.paragraphs {
                write_paragraph(w, p, None)?;
            }
            w.end("w:tc")?;
        }
        w.end("w:tr")?;
    }

    w.end("w:tbl")
}

fn write_section(w: &mut XmlWriter, section: &SectionProps, parts: &SectionParts) -> Result<()> {
    w.start("w:sectPr", &[])?;
    for part in &parts.headers {
        w.empty(
            "w:headerReference",
            &[("w:type", part.kind), ("r:id", part.rel_id.as_str())],
        )?;
    }
    for part in &parts.footers {
        w.empty(
            "w:footerReference",
            &[("w:type", part.kind), ("r:id", part.rel_id.as_str())],
        )?;
    }

    let width = section.page_width.to_string();
    let height = section.page_height.to_string();
    let mut size = vec![("w:w", width.as_str()), ("w:h", height.as_str())];
    if section.orientation == Orientation::Landscape {
        size.push(("w:orient", "landscape"));
    }
    w.empty("w:pgSz", &size)?;

    let m = &section.margins;
    let values = [
        m.top.to_string(),
        m.right.to_string(),
        m.bottom.to_string(),
        m.left.to_string(),
        m.header.to_string(),
        m.footer.to_string(),
        m.gutter.to_string(),
    ];
    let keys = [
        "w:top", "w:right", "w:bottom", "w:left", "w:header", "w:footer", "w:gutter",
    ];
    let margins: Vec<(&str, &str)> = keys
        .iter()
        .zip(values.iter())
        .map(|(k, v)| (*k, v.as_str()))
        .collect();
    w.empty("w:pgMar", &margins)?;

    if section.title_page {
        w.empty("w:titlePg", &[])?;
    }
    w.end("w:sectPr")
}

/// A header (`w:hdr`) or footer (`w:ftr`) part with one paragraph per line.
fn write_header_footer(root: &str, text: &str) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.start(root, &[("xmlns:w", W_NS), ("xmlns:r", R_NS)])?;
    for line in text.split('\n') {
        w.start("w:p", &[])?;
        if !line.is_empty() {
            w.start("w:r", &[])?;
            write_run_text(&mut w, line)?;
            w.end("w:r")?;
        }
        w.end("w:p")?;
    }
    w.end(root)?;
    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::OoxmlContainer;
    use crate::model::{Cell, Paragraph};

    #[test]
    fn test_package_layout() {
        let mut doc = Document::new();
        doc.sections[0].header.default = Some("H".into());
        doc.sections[0].footer.default = Some("F".into());
        doc.custom.insert(
            "Client".into(),
            crate::model::CustomValue::String("ACME".into()),
        );

        let bytes = DocxWriter::new(&doc).write().unwrap();
        let container = OoxmlContainer::from_bytes(bytes).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/settings.xml",
            "word/numbering.xml",
            "word/header1.xml",
            "word/footer1.xml",
            "docProps/core.xml",
            "docProps/custom.xml",
        ] {
            assert!(container.exists(part), "missing {}", part);
        }

        let rels = container.read_relationships("word/document.xml").unwrap();
        assert_eq!(rels.get_by_type(rel_types::HEADER).len(), 1);
        assert_eq!(rels.get_by_type(rel_types::FOOTER).len(), 1);
    }

    #[test]
    fn test_section_breaks_are_written_in_paragraphs() {
        let mut doc = Document::new();
        doc.push_paragraph(Paragraph::with_text("one"));
        doc.add_section();
        doc.sections[1].orientation = Orientation::Landscape;
        doc.push_paragraph(Paragraph::with_text("two"));

        let xml = String::from_utf8(DocxWriter::new(&doc).document_xml(&[
            SectionParts::default(),
            SectionParts::default(),
        ]).unwrap())
        .unwrap();
        assert_eq!(xml.matches("<w:sectPr>").count(), 2);
        assert_eq!(xml.matches(r#"w:orient="landscape""#).count(), 1);
    }

    #[test]
    fn test_run_text_segments() {
        let mut w = XmlWriter::new().unwrap();
        write_run_text(&mut w, "a\tb\nc").unwrap();
        let xml = String::from_utf8(w.finish()).unwrap();
        assert!(xml.contains("<w:t xml:space=\"preserve\">a</w:t><w:tab/>"));
        assert!(xml.contains("<w:br/><w:t xml:space=\"preserve\">c</w:t>"));
    }

    #[test]
    fn test_empty_cells_get_a_paragraph() {
        let mut table = Table::new(1, 1);
        table.rows[0][0] = Cell::default();
        let mut w = XmlWriter::new().unwrap();
        write_table(&mut w, &table).unwrap();
        let xml = String::from_utf8(w.finish()).unwrap();
        assert!(xml.contains("<w:tc><w:p/></w:tc>"));
    }
}
