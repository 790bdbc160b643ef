//! Small quick-xml helpers shared by the part readers and writers.

use crate::error::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// WordprocessingML main namespace.
pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Office relationships namespace (`r:id` attributes).
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Get an attribute value, unescaped.
pub fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| match a.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
        })
}

/// Helper to get a boolean attribute value.
pub fn get_bool_attr(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr(e, key).map(|val| !matches!(val.as_str(), "0" | "false" | "off"))
}

/// An on/off element such as `<w:b/>`: a missing `w:val` means on.
pub fn on_off(e: &BytesStart) -> bool {
    get_bool_attr(e, b"w:val").unwrap_or(true)
}

/// Get an integer attribute; tolerates decimal notation written by some producers.
pub fn int_attr(e: &BytesStart, key: &[u8]) -> Option<i32> {
    let raw = attr(e, key)?;
    let raw = raw.trim();
    raw.parse::<i32>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|v| v.round() as i32))
}

/// Unescaped text content of a text event.
pub fn text_of(e: &BytesText) -> String {
    match e.unescape() {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(e).into_owned(),
    }
}

fn write_error(err: impl std::fmt::Display) -> Error {
    Error::Io(std::io::Error::other(err.to_string()))
}

/// Streaming XML writer for package parts.
pub struct XmlWriter {
    writer: Writer<Vec<u8>>,
}

impl XmlWriter {
    /// Start a part with a standalone UTF-8 declaration.
    pub fn new() -> Result<Self> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(write_error)?;
        Ok(Self { writer })
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(write_error)
    }

    /// Open an element.
    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut element = BytesStart::new(name);
        for (key, value) in attrs {
            element.push_attribute((*key, *value));
        }
        self.write(Event::Start(element))
    }

    /// Write a self-closing element.
    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut element = BytesStart::new(name);
        for (key, value) in attrs {
            element.push_attribute((*key, *value));
        }
        self.write(Event::Empty(element))
    }

    /// Write `<name w:val="value"/>`.
    pub fn val(&mut self, name: &str, value: &str) -> Result<()> {
        self.empty(name, &[("w:val", value)])
    }

    /// Close an element.
    pub fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// Write escaped character data.
    pub fn text(&mut self, text: &str) -> Result<()> {
        self.write(Event::Text(BytesText::new(text)))
    }

    /// Write `<name>text</name>`.
    pub fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.text(text)?;
        self.end(name)
    }

    pub fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}
