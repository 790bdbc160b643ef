//! DOCX reader: package parts to the document model.

use super::numbering::parse_numbering;
use super::properties::{parse_core, parse_custom, parse_variables};
use super::props::read_run_prop;
use super::styles::parse_styles;
use super::xml::{attr, int_attr, on_off, text_of};
use crate::container::{rel_types, OoxmlContainer, Relationships};
use crate::detect::MAIN_PART;
use crate::error::Result;
use crate::model::{
    Alignment, Block, Cell, Document, Numbering, NumberingRef, Orientation,
    Paragraph, Run, SectionProps, StyleSheet, Table,
};
use quick_xml::events::{BytesStart, Event};
use std::path::Path;

/// Reader for DOCX (Word) packages.
pub struct DocxReader {
    container: OoxmlContainer,
    document_path: String,
    package_rels: Relationships,
    relationships: Relationships,
}

impl DocxReader {
    /// Open a DOCX file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let container = OoxmlContainer::open(path)?;
        Self::from_container(container)
    }

    /// Create a reader from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let container = OoxmlContainer::from_bytes(data)?;
        Self::from_container(container)
    }

    fn from_container(container: OoxmlContainer) -> Result<Self> {
        let package_rels = container.read_relationships("")?;
        let document_path = package_rels
            .get_by_type(rel_types::OFFICE_DOCUMENT)
            .first()
            .map(|rel| OoxmlContainer::resolve_path("", &rel.target))
            .unwrap_or_else(|| MAIN_PART.to_string());
        let relationships = container.read_relationships(&document_path)?;

        Ok(Self {
            container,
            document_path,
            package_rels,
            relationships,
        })
    }

    /// Path of the part related to the main document by `rel_type`.
    fn document_part(&self, rel_type: &str, fallback: &str) -> String {
        self.relationships
            .get_by_type(rel_type)
            .first()
            .map(|rel| OoxmlContainer::resolve_path(&self.document_path, &rel.target))
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Path of the part related to the package by `rel_type`.
    fn package_part(&self, rel_type: &str, fallback: &str) -> String {
        self.package_rels
            .get_by_type(rel_type)
            .first()
            .map(|rel| OoxmlContainer::resolve_path("", &rel.target))
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Read the whole package into a document model.
    pub fn read(&self) -> Result<Document> {
        let core_path = self.package_part(rel_types::CORE_PROPERTIES, "docProps/core.xml");
        let core = match self.container.read_optional_xml(&core_path)? {
            Some(xml) => parse_core(&xml)?,
            None => Default::default(),
        };

        let custom_path = self.package_part(rel_types::CUSTOM_PROPERTIES, "docProps/custom.xml");
        let custom = match self.container.read_optional_xml(&custom_path)? {
            Some(xml) => parse_custom(&xml)?,
            None => Default::default(),
        };

        let settings_path = self.document_part(rel_types::SETTINGS, "word/settings.xml");
        let variables = match self.container.read_optional_xml(&settings_path)? {
            Some(xml) => parse_variables(&xml)?,
            None => Default::default(),
        };

        let styles_path = self.document_part(rel_types::STYLES, "word/styles.xml");
        let styles = match self.container.read_optional_xml(&styles_path)? {
            Some(xml) => parse_styles(&xml)?,
            None => {
                log::warn!("package has no styles part");
                StyleSheet::default()
            }
        };

        let numbering_path = self.document_part(rel_types::NUMBERING, "word/numbering.xml");
        let numbering = match self.container.read_optional_xml(&numbering_path)? {
            Some(xml) => parse_numbering(&xml)?,
            None => Numbering::default(),
        };

        let xml = self.container.read_xml(&self.document_path)?;
        let (body, drafts) = parse_body(&xml)?;
        let sections = drafts
            .into_iter()
            .map(|draft| self.resolve_section(draft))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "read {} blocks in {} sections from {}",
            body.len(),
            sections.len(),
            self.document_path
        );

        Ok(Document {
            core,
            custom,
            variables,
            styles,
            numbering,
            sections,
            body,
        })
    }

    /// Attach header and footer text to a parsed section.
    fn resolve_section(&self, draft: SectionDraft) -> Result<SectionProps> {
        let mut props = draft.props;
        for reference in draft.references {
            let Some(rel) = self.relationships.get(&reference.rel_id) else {
                log::warn!("dangling header/footer reference {}", reference.rel_id);
                continue;
            };
            let path = OoxmlContainer::resolve_path(&self.document_path, &rel.target);
            let Some(xml) = self.container.read_optional_xml(&path)? else {
                log::warn!("missing header/footer part {}", path);
                continue;
            };
            let text = part_text(&xml)?;

            let set = if reference.is_header {
                &mut props.header
            } else {
                &mut props.footer
            };
            match reference.kind.as_str() {
                "default" => set.default = text,
                "first" => set.first = text,
                other => log::debug!("skipping '{}' header/footer variant", other),
            }
        }
        Ok(props)
    }

    /// Get a reference to the container.
    pub fn container(&self) -> &OoxmlContainer {
        &self.container
    }
}

struct PartReference {
    is_header: bool,
    kind: String,
    rel_id: String,
}

struct SectionDraft {
    props: SectionProps,
    references: Vec<PartReference>,
}

/// Parser state for the body of document.xml.
#[derive(Default)]
struct BodyState {
    blocks: Vec<Block>,
    sections: Vec<SectionDraft>,
    paragraph: Option<Paragraph>,
    run: Option<Run>,
    table: Option<Table>,
    table_depth: usize,
    row: Option<Vec<Cell>>,
    cell: Option<Cell>,
    section: Option<SectionDraft>,
    num_level: u8,
    num_id: Option<String>,
}

fn contains(stack: &[Vec<u8>], name: &[u8]) -> bool {
    stack.iter().any(|n| n == name)
}

impl BodyState {
    fn start(&mut self, e: &BytesStart, stack: &[Vec<u8>]) {
        let name = e.name();
        let name = name.as_ref();

        if contains(stack, b"w:sectPr") {
            self.section_element(name, e);
            return;
        }

        match name {
            b"w:p" => {
                self.paragraph = Some(Paragraph::default());
                self.num_id = None;
                self.num_level = 0;
            }
            b"w:r" if self.paragraph.is_some() => self.run = Some(Run::default()),
            b"w:sectPr" => {
                self.section = Some(SectionDraft {
                    props: SectionProps::letter(),
                    references: Vec::new(),
                });
            }
            b"w:tbl" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.table = Some(Table::default());
                }
            }
            _ if self.table_depth == 1 && self.paragraph.is_none() => self.table_element(name, e),
            _ if contains(stack, b"w:rPr") && contains(stack, b"w:r") => {
                let Some(run) = self.run.as_mut() else {
                    return;
                };
                match name {
                    b"w:rStyle" => run.style_id = attr(e, b"w:val"),
                    b"w:lang" => run.lang = attr(e, b"w:val"),
                    _ => {
                        read_run_prop(e, &mut run.props);
                    }
                }
            }
            _ if contains(stack, b"w:pPr") && !contains(stack, b"w:rPr") => {
                self.paragraph_property(name, e)
            }
            b"w:tab" | b"w:br" | b"w:cr" if stack.last().is_some_and(|n| n == b"w:r") => {
                if let Some(run) = self.run.as_mut() {
                    run.text.push(if name == b"w:tab" { '\t' } else { '\n' });
                }
            }
            _ => {}
        }
    }

    fn paragraph_property(&mut self, name: &[u8], e: &BytesStart) {
        let Some(paragraph) = self.paragraph.as_mut() else {
            return;
        };
        match name {
            b"w:pStyle" => paragraph.style_id = attr(e, b"w:val"),
            b"w:ilvl" => {
                self.num_level = int_attr(e, b"w:val")
                    .and_then(|l| u8::try_from(l).ok())
                    .unwrap_or(0)
            }
            b"w:numId" => self.num_id = attr(e, b"w:val"),
            b"w:jc" => {
                paragraph.alignment = attr(e, b"w:val").and_then(|v| Alignment::from_ooxml(&v))
            }
            b"w:ind" => {
                if let Some(hanging) = int_attr(e, b"w:hanging") {
                    paragraph.indent_first_line = Some(-hanging);
                } else if let Some(first) = int_attr(e, b"w:firstLine") {
                    paragraph.indent_first_line = Some(first);
                }
            }
            _ => {}
        }
    }

    fn table_element(&mut self, name: &[u8], e: &BytesStart) {
        let Some(table) = self.table.as_mut() else {
            return;
        };
        match name {
            b"w:tblStyle" => table.style_id = attr(e, b"w:val"),
            b"w:gridCol" => table.grid_columns += 1,
            b"w:tr" => self.row = Some(Vec::new()),
            b"w:tc" => self.cell = Some(Cell::default()),
            _ => {}
        }
    }

    fn section_element(&mut self, name: &[u8], e: &BytesStart) {
        let Some(section) = self.section.as_mut() else {
            return;
        };
        let props = &mut section.props;
        match name {
            b"w:pgSz" => {
                if let Some(width) = int_attr(e, b"w:w") {
                    props.page_width = width;
                }
                if let Some(height) = int_attr(e, b"w:h") {
                    props.page_height = height;
                }
                props.orientation = match attr(e, b"w:orient").as_deref() {
                    Some("landscape") => Orientation::Landscape,
                    _ => Orientation::Portrait,
                };
            }
            b"w:pgMar" => {
                let margins = &mut props.margins;
                for (key, field) in [
                    (&b"w:top"[..], &mut margins.top),
                    (&b"w:bottom"[..], &mut margins.bottom),
                    (&b"w:left"[..], &mut margins.left),
                    (&b"w:right"[..], &mut margins.right),
                    (&b"w:header"[..], &mut margins.header),
                    (&b"w:footer"[..], &mut margins.footer),
                    (&b"w:gutter"[..], &mut margins.gutter),
                ] {
                    if let Some(value) = int_attr(e, key) {
                        *field = value;
                    }
                }
            }
            b"w:titlePg" => props.title_page = on_off(e),
            b"w:headerReference" | b"w:footerReference" => {
                if let Some(rel_id) = attr(e, b"r:id") {
                    section.references.push(PartReference {
                        is_header: name == b"w:headerReference",
                        kind: attr(e, b"w:type").unwrap_or_else(|| "default".to_string()),
                        rel_id,
                    });
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8], stack: &[Vec<u8>]) {
        match name {
            b"w:sectPr" => {
                let Some(section) = self.section.take() else {
                    return;
                };
                if contains(stack, b"w:pPr") {
                    if let Some(paragraph) = self.paragraph.as_mut() {
                        paragraph.ends_section = true;
                    }
                }
                self.sections.push(section);
            }
            b"w:r" => {
                if let (Some(run), Some(paragraph)) = (self.run.take(), self.paragraph.as_mut()) {
                    paragraph.runs.push(run);
                }
            }
            b"w:p" => {
                let Some(mut paragraph) = self.paragraph.take() else {
                    return;
                };
                if let Some(num_id) = self.num_id.take() {
                    paragraph.numbering = Some(NumberingRef {
                        num_id,
                        level: self.num_level,
                    });
                }
                if self.table_depth > 0 {
                    if let Some(cell) = self.cell.as_mut() {
                        cell.paragraphs.push(paragraph);
                    }
                } else {
                    self.blocks.push(Block::Paragraph(paragraph));
                }
            }
            b"w:tc" if self.table_depth == 1 => {
                if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
                    row.push(cell);
                }
            }
            b"w:tr" if self.table_depth == 1 => {
                if let (Some(row), Some(table)) = (self.row.take(), self.table.as_mut()) {
                    table.rows.push(row);
                }
            }
            b"w:tbl" => {
                if self.table_depth == 1 {
                    if let Some(table) = self.table.take() {
                        self.blocks.push(Block::Table(table));
                    }
                }
                self.table_depth = self.table_depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str, stack: &[Vec<u8>]) {
        if stack.last().is_some_and(|n| n == b"w:t") {
            if let Some(run) = self.run.as_mut() {
                run.text.push_str(text);
            }
        }
    }
}

/// Parse the body of document.xml into blocks and section drafts.
fn parse_body(xml: &str) -> Result<(Vec<Block>, Vec<SectionDraft>)> {
    let mut reader = quick_xml::Reader::from_str(xml);
    // Whitespace inside w:t is content
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut state = BodyState::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                state.start(&e, &stack);
                stack.push(e.name().as_ref().to_vec());
            }
            Ok(Event::Empty(e)) => {
                state.start(&e, &stack);
                state.end(e.name().as_ref(), &stack);
            }
            Ok(Event::End(e)) => {
                stack.pop();
                state.end(e.name().as_ref(), &stack);
            }
            Ok(Event::Text(e)) => state.text(&text_of(&e), &stack),
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    let mut sections = state.sections;
    let breaks = state
        .blocks
        .iter()
        .filter(|b| matches!(b, Block::Paragraph(p) if p.ends_section))
        .count();
    if sections.len() == breaks {
        log::warn!("document has no body section properties; assuming Letter");
        sections.push(SectionDraft {
            props: SectionProps::letter(),
            references: Vec::new(),
        });
    }

    Ok((state.blocks, sections))
}

/// Text of a header or footer part, one line per paragraph.
///
/// A part whose paragraphs are all empty has no text.
fn part_text(xml: &str) -> Result<Option<String>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => current = Some(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" => lines.push(String::new()),
                b"w:tab" => {
                    if let Some(line) = current.as_mut() {
                        line.push('\t');
                    }
                }
                b"w:br" | b"w:cr" => {
                    if let Some(line) = current.as_mut() {
                        line.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                if let Some(line) = current.as_mut() {
                    line.push_str(&text_of(&e));
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(line) = current.take() {
                        lines.push(line);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    if lines.iter().all(|l| l.is_empty()) {
        return Ok(None);
    }
    Ok(Some(lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:body>
    <w:p>
      <w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="center"/></w:pPr>
      <w:r><w:t>Intro</w:t></w:r>
    </w:p>
    <w:p>
      <w:pPr><w:pStyle w:val="ListBullet"/><w:numPr><w:ilvl w:val="1"/><w:numId w:val="1"/></w:numPr>
        <w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs>
        <w:rPr><w:b/></w:rPr>
      </w:pPr>
      <w:r><w:rPr><w:rStyle w:val="Strong"/><w:sz w:val="28"/><w:lang w:val="en-GB"/></w:rPr><w:t xml:space="preserve">Item </w:t><w:tab/><w:t>one</w:t></w:r>
      <w:r><w:instrText>PAGE</w:instrText></w:r>
    </w:p>
    <w:tbl>
      <w:tblPr><w:tblStyle w:val="TableGrid"/></w:tblPr>
      <w:tblGrid><w:gridCol w:w="100"/><w:gridCol w:w="100"/></w:tblGrid>
      <w:tr><w:tc><w:p><w:r><w:t>A1</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr>
      <w:tr><w:tc><w:p><w:r><w:t>A2</w:t></w:r></w:p>
        <w:tbl><w:tr><w:tc><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
      </w:tc></w:tr>
    </w:tbl>
    <w:p>
      <w:pPr><w:sectPr><w:pgSz w:w="16838" w:h="11906" w:orient="landscape"/>
        <w:pgMar w:top="851" w:right="1134" w:bottom="851" w:left="1134" w:header="709" w:footer="709" w:gutter="0"/>
      </w:sectPr></w:pPr>
    </w:p>
    <w:p><w:r><w:t>Second section</w:t></w:r></w:p>
    <w:sectPr>
      <w:headerReference w:type="default" r:id="rId9"/>
      <w:pgSz w:w="11906" w:h="16838"/>
      <w:titlePg/>
    </w:sectPr>
  </w:body>
</w:document>"#;

    #[test]
    fn test_parse_body_blocks() {
        let (blocks, sections) = parse_body(BODY).unwrap();
        assert_eq!(blocks.len(), 5);

        let Block::Paragraph(heading) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(heading.style_id.as_deref(), Some("Heading1"));
        assert_eq!(heading.alignment, Some(Alignment::Center));
        assert_eq!(heading.text(), "Intro");

        let Block::Paragraph(item) = &blocks[1] else {
            panic!("expected paragraph");
        };
        assert_eq!(item.text(), "Item \tone");
        assert_eq!(
            item.numbering,
            Some(NumberingRef {
                num_id: "1".into(),
                level: 1
            })
        );
        assert_eq!(item.runs[0].style_id.as_deref(), Some("Strong"));
        assert_eq!(item.runs[0].props.size, Some(28));
        assert_eq!(item.runs[0].lang.as_deref(), Some("en-GB"));

        let Block::Table(table) = &blocks[2] else {
            panic!("expected table");
        };
        assert_eq!(table.style_id.as_deref(), Some("TableGrid"));
        assert_eq!(table.grid_columns, 2);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell_text()[0], vec!["A1", ""]);
        assert_eq!(table.cell_text()[1][0], "A2\ninner");

        let Block::Paragraph(brk) = &blocks[3] else {
            panic!("expected paragraph");
        };
        assert!(brk.ends_section);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].props.orientation, Orientation::Landscape);
        assert_eq!(sections[0].props.margins.top, 851);
        assert!(sections[1].props.title_page);
        assert_eq!(sections[1].references.len(), 1);
        assert_eq!(sections[1].references[0].rel_id, "rId9");
    }

    #[test]
    fn test_missing_body_section_defaults_to_letter() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
            <w:body><w:p><w:r><w:t>only</w:t></w:r></w:p></w:body></w:document>"#;
        let (blocks, sections) = parse_body(xml).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].props, SectionProps::letter());
    }

    #[test]
    fn test_part_text() {
        let xml = r#"<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
            <w:p><w:r><w:t>Company</w:t></w:r></w:p>
            <w:p><w:r><w:t>Confidential</w:t></w:r></w:p></w:hdr>"#;
        assert_eq!(
            part_text(xml).unwrap().as_deref(),
            Some("Company\nConfidential")
        );

        let empty = r#"<w:ftr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p/></w:ftr>"#;
        assert_eq!(part_text(empty).unwrap(), None);
    }

    #[test]
    fn test_read_written_document() {
        let mut doc = Document::new();
        doc.push_paragraph(Paragraph::with_text("Hello").with_style("Title"));
        doc.sections[0].header.default = Some("Top".into());
        doc.sections[0].footer.first = Some("Bottom".into());
        doc.sections[0].title_page = true;

        let bytes = doc.to_bytes().unwrap();
        let read = DocxReader::from_bytes(bytes).unwrap().read().unwrap();
        assert_eq!(read, doc);
    }

    #[test]
    fn test_header_even_variant_is_skipped() {
        let draft = SectionDraft {
            props: SectionProps::letter(),
            references: vec![PartReference {
                is_header: true,
                kind: "even".into(),
                rel_id: "rId404".into(),
            }],
        };
        let reader = DocxReader::from_bytes(Document::new().to_bytes().unwrap()).unwrap();
        let props = reader.resolve_section(draft).unwrap();
        assert!(props.header.is_empty());
    }
}
