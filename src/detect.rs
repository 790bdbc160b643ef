//! Container checks run before a document is parsed.

use crate::container::decode_xml_bytes;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Content type for the DOCX main document part.
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

/// Main document part path.
pub const MAIN_PART: &str = "word/document.xml";

/// Check that a path names an existing word-processing package.
///
/// Fails with [`Error::NotFound`] for a missing file and
/// [`Error::CorruptContainer`] for anything that is not a DOCX package.
pub fn check_docx_path(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let mut reader = BufReader::new(File::open(path)?);
    let mut magic = [0u8; 4];
    let read = reader.read(&mut magic)?;
    if !is_zip_file(&magic[..read]) {
        return Err(Error::CorruptContainer(format!(
            "{} is not a ZIP package",
            path.display()
        )));
    }
    reader.rewind()?;
    check_docx_reader(reader)
}

/// Check that a byte buffer holds a word-processing package.
pub fn check_docx_bytes(data: &[u8]) -> Result<()> {
    if !is_zip_file(data) {
        return Err(Error::CorruptContainer("data is not a ZIP package".to_string()));
    }
    check_docx_reader(std::io::Cursor::new(data))
}

fn check_docx_reader<R: Read + Seek>(reader: R) -> Result<()> {
    let mut archive = zip::ZipArchive::new(reader)?;

    let content_types = match archive.by_name("[Content_Types].xml") {
        Ok(mut file) => {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            decode_xml_bytes(&bytes)?
        }
        Err(_) => {
            return Err(Error::CorruptContainer(
                "missing part: [Content_Types].xml".to_string(),
            ))
        }
    };

    let has_main_part = archive.file_names().any(|n| n == MAIN_PART);
    if !has_main_part {
        return Err(Error::CorruptContainer(format!("missing part: {}", MAIN_PART)));
    }
    if !content_types.contains(DOCX_CONTENT_TYPE) {
        log::warn!("package does not declare the WordprocessingML main content type");
    }
    Ok(())
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_zip_file() {
        assert!(is_zip_file(&[0x50, 0x4B, 0x03, 0x04, 0x00]));
        assert!(!is_zip_file(&[0x00, 0x00, 0x00, 0x00]));
        assert!(!is_zip_file(&[0x50, 0x4B])); // Too short
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result = check_docx_path("definitely/not/here.docx");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_non_zip_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.docx");
        std::fs::write(&path, b"just some text").unwrap();
        assert!(matches!(
            check_docx_path(&path),
            Err(Error::CorruptContainer(_))
        ));
    }

    #[test]
    fn test_zip_without_main_part_is_corrupt() {
        let mut package = crate::container::PackageWriter::new();
        package.add_part("docProps/core.xml", "application/xml", b"<x/>".to_vec());
        let bytes = package.finish().unwrap();
        assert!(matches!(
            check_docx_bytes(&bytes),
            Err(Error::CorruptContainer(_))
        ));
    }

    #[test]
    fn test_saved_document_passes() {
        let bytes = crate::Document::new().to_bytes().unwrap();
        assert!(check_docx_bytes(&bytes).is_ok());
    }
}
