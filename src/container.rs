//! ZIP container access for OOXML packages: reading parts and writing packages.

use crate::docx::xml::{attr, XmlWriter};
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Write};
use std::path::Path;

/// Relationship type URIs used by word-processing packages.
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const CUSTOM_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/custom-properties";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const SETTINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
    pub const NUMBERING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
    pub const HEADER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
    pub const FOOTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
}

/// Content types of the parts this crate writes.
pub mod content_types {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const DOCUMENT: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const STYLES: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
    pub const SETTINGS: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml";
    pub const NUMBERING: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
    pub const HEADER: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
    pub const FOOTER: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const CUSTOM_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.custom-properties+xml";
}

/// A relationship entry from a .rels file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Whether the target is external
    pub external: bool,
}

/// Relationships of one part, in file order.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    pub entries: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.id == id)
    }

    /// Get relationships by type.
    pub fn get_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        self.entries
            .iter()
            .filter(|r| r.rel_type == rel_type)
            .collect()
    }

    /// Add an internal relationship.
    pub fn add(&mut self, id: impl Into<String>, rel_type: &str, target: impl Into<String>) {
        self.entries.push(Relationship {
            id: id.into(),
            rel_type: rel_type.to_string(),
            target: target.into(),
            external: false,
        });
    }

    /// Serialize as a .rels part.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut w = XmlWriter::new()?;
        w.start(
            "Relationships",
            &[(
                "xmlns",
                "http://schemas.openxmlformats.org/package/2006/relationships",
            )],
        )?;
        for rel in &self.entries {
            let mut attrs = vec![
                ("Id", rel.id.as_str()),
                ("Type", rel.rel_type.as_str()),
                ("Target", rel.target.as_str()),
            ];
            if rel.external {
                attrs.push(("TargetMode", "External"));
            }
            w.empty("Relationship", &attrs)?;
        }
        w.end("Relationships")?;
        Ok(w.finish())
    }
}

/// Decode XML bytes handling different encodings (UTF-8, UTF-16 LE/BE).
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    let invalid = |e: &dyn std::fmt::Display| {
        Error::CorruptContainer(format!("undecodable XML part: {}", e))
    };

    if let Some(rest) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        return String::from_utf8(rest.to_vec()).map_err(|e| invalid(&e));
    }
    if let Some(rest) = bytes.strip_prefix(b"\xFF\xFE") {
        let units = rest.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]));
        let content = char::decode_utf16(units)
            .collect::<std::result::Result<String, _>>()
            .map_err(|e| invalid(&e))?;
        return Ok(fix_xml_encoding_declaration(&content));
    }
    if let Some(rest) = bytes.strip_prefix(b"\xFE\xFF") {
        let units = rest.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]]));
        let content = char::decode_utf16(units)
            .collect::<std::result::Result<String, _>>()
            .map_err(|e| invalid(&e))?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Ok(s),
        Err(_) => {
            log::warn!("XML part is not valid UTF-8; decoding lossily");
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// The declaration of re-decoded UTF-16 text still claims UTF-16.
fn fix_xml_encoding_declaration(content: &str) -> String {
    match content.find("?>") {
        Some(end) if content.starts_with("<?xml") => {
            let decl = content[..end + 2]
                .replace("\"UTF-16\"", "\"UTF-8\"")
                .replace("\"utf-16\"", "\"UTF-8\"")
                .replace("'UTF-16'", "'UTF-8'")
                .replace("'utf-16'", "'UTF-8'");
            format!("{}{}", decl, &content[end + 2..])
        }
        _ => content.to_string(),
    }
}

/// Read-only view of an OOXML package.
pub struct OoxmlContainer {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl OoxmlContainer {
    /// Open an OOXML container from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Create an OOXML container from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Read an XML part as a string.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(path)
            .map_err(|_| Error::CorruptContainer(format!("missing part: {}", path)))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        decode_xml_bytes(&bytes)
    }

    /// Read an XML part if the package has it.
    pub fn read_optional_xml(&self, path: &str) -> Result<Option<String>> {
        if self.exists(path) {
            self.read_xml(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Check if a part exists in the archive.
    pub fn exists(&self, path: &str) -> bool {
        let archive = self.archive.borrow();
        let found = archive.file_names().any(|n| n == path);
        found
    }

    /// List all parts in the archive.
    pub fn list_files(&self) -> Vec<String> {
        let archive = self.archive.borrow();
        archive.file_names().map(String::from).collect()
    }

    /// Read the relationships of a part (`dir/_rels/name.rels`).
    pub fn read_relationships(&self, part_path: &str) -> Result<Relationships> {
        let rels_path = if part_path.is_empty() || part_path == "/" {
            "_rels/.rels".to_string()
        } else {
            let path = Path::new(part_path);
            let parent = path.parent().unwrap_or(Path::new(""));
            let filename = path.file_name().unwrap_or_default().to_string_lossy();
            if parent.as_os_str().is_empty() {
                format!("_rels/{}.rels", filename)
            } else {
                format!("{}/_rels/{}.rels", parent.display(), filename)
            }
        };

        match self.read_optional_xml(&rels_path)? {
            Some(content) => parse_relationships(&content),
            None => Ok(Relationships::new()),
        }
    }

    /// Resolve a relationship target relative to the part that owns it.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let base_path = Path::new(base);
        let base_dir = base_path.parent().unwrap_or(Path::new(""));

        let mut result = base_dir.to_path_buf();
        for component in Path::new(relative).components() {
            match component {
                std::path::Component::ParentDir => {
                    result.pop();
                }
                std::path::Component::Normal(c) => {
                    result.push(c);
                }
                _ => {}
            }
        }

        result.to_string_lossy().replace('\\', "/")
    }
}

impl std::fmt::Debug for OoxmlContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OoxmlContainer")
            .field("files", &self.list_files().len())
            .finish()
    }
}

/// Parse a relationships part.
fn parse_relationships(content: &str) -> Result<Relationships> {
    let mut rels = Relationships::new();
    if content.trim().is_empty() {
        return Ok(rels);
    }

    let mut reader = quick_xml::Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Empty(e)) | Ok(quick_xml::events::Event::Start(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr(&e, b"Id").unwrap_or_default();
                if !id.is_empty() {
                    rels.entries.push(Relationship {
                        id,
                        rel_type: attr(&e, b"Type").unwrap_or_default(),
                        target: attr(&e, b"Target").unwrap_or_default(),
                        external: attr(&e, b"TargetMode")
                            .is_some_and(|m| m.eq_ignore_ascii_case("external")),
                    });
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Builds a package: collects parts and writes the ZIP with its content types.
#[derive(Debug, Default)]
pub struct PackageWriter {
    parts: Vec<(String, Vec<u8>)>,
    overrides: Vec<(String, String)>,
}

impl PackageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part with an explicit content type.
    pub fn add_part(&mut self, path: &str, content_type: &str, data: Vec<u8>) {
        self.overrides
            .push((format!("/{}", path), content_type.to_string()));
        self.parts.push((path.to_string(), data));
    }

    /// Add a relationships part (covered by the `rels` default content type).
    pub fn add_relationships(&mut self, path: &str, rels: &Relationships) -> Result<()> {
        self.parts.push((path.to_string(), rels.to_xml()?));
        Ok(())
    }

    fn content_types_xml(&self) -> Result<Vec<u8>> {
        let mut w = XmlWriter::new()?;
        w.start(
            "Types",
            &[(
                "xmlns",
                "http://schemas.openxmlformats.org/package/2006/content-types",
            )],
        )?;
        w.empty(
            "Default",
            &[
                ("Extension", "rels"),
                ("ContentType", content_types::RELATIONSHIPS),
            ],
        )?;
        w.empty(
            "Default",
            &[("Extension", "xml"), ("ContentType", content_types::XML)],
        )?;
        for (part_name, content_type) in &self.overrides {
            w.empty(
                "Override",
                &[("PartName", part_name.as_str()), ("ContentType", content_type.as_str())],
            )?;
        }
        w.end("Types")?;
        Ok(w.finish())
    }

    /// Write the package and return the ZIP bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let content_types = self.content_types_xml()?;
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(&content_types)?;
        for (path, data) in &self.parts {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(data)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}
