//! Metadata parts: core properties, custom properties and document variables.

use super::xml::{attr, text_of, XmlWriter, W_NS};
use crate::error::Result;
use crate::model::{CoreProperties, CustomProperties, CustomValue, Variables};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use quick_xml::events::Event;

const CP_NS: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const DCTERMS_NS: &str = "http://purl.org/dc/terms/";
const DCMITYPE_NS: &str = "http://purl.org/dc/dcmitype/";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const CUSTOM_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/custom-properties";
const VT_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes";

/// Format identifier Word uses for user-defined properties.
const CUSTOM_FMTID: &str = "{D5CDD505-2E9C-101B-9397-08002B2CF9AE}";

/// Parse a W3CDTF / RFC 3339 timestamp; zone-less values are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse docProps/core.xml.
pub fn parse_core(xml: &str) -> Result<CoreProperties> {
    let mut core = CoreProperties::default();
    if xml.trim().is_empty() {
        return Ok(core);
    }

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut current: Option<Vec<u8>> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => current = Some(e.local_name().as_ref().to_vec()),
            Ok(Event::Text(e)) => {
                if let Some(field) = &current {
                    let text = text_of(&e);
                    set_core_field(&mut core, field, text);
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(core)
}

fn set_core_field(core: &mut CoreProperties, field: &[u8], text: String) {
    let timestamp = |text: &str| {
        let parsed = parse_timestamp(text);
        if parsed.is_none() {
            log::warn!("ignoring unparseable core timestamp '{}'", text);
        }
        parsed
    };

    match field {
        b"creator" => core.author = Some(text),
        b"title" => core.title = Some(text),
        b"subject" => core.subject = Some(text),
        b"keywords" => core.keywords = Some(text),
        b"description" => core.comments = Some(text),
        b"category" => core.category = Some(text),
        b"contentStatus" => core.content_status = Some(text),
        b"identifier" => core.identifier = Some(text),
        b"language" => core.language = Some(text),
        b"lastModifiedBy" => core.last_modified_by = Some(text),
        b"revision" => core.revision = text.trim().parse().ok(),
        b"version" => core.version = Some(text),
        b"created" => core.created = timestamp(&text),
        b"modified" => core.modified = timestamp(&text),
        b"lastPrinted" => core.last_printed = timestamp(&text),
        _ => {}
    }
}

/// Serialize core properties as docProps/core.xml.
pub fn write_core(core: &CoreProperties) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.start(
        "cp:coreProperties",
        &[
            ("xmlns:cp", CP_NS),
            ("xmlns:dc", DC_NS),
            ("xmlns:dcterms", DCTERMS_NS),
            ("xmlns:dcmitype", DCMITYPE_NS),
            ("xmlns:xsi", XSI_NS),
        ],
    )?;

    let text_fields = [
        ("dc:title", &core.title),
        ("dc:subject", &core.subject),
        ("dc:creator", &core.author),
        ("cp:keywords", &core.keywords),
        ("dc:description", &core.comments),
        ("cp:lastModifiedBy", &core.last_modified_by),
        ("cp:category", &core.category),
        ("cp:contentStatus", &core.content_status),
        ("dc:identifier", &core.identifier),
        ("dc:language", &core.language),
        ("cp:version", &core.version),
    ];
    for (name, value) in text_fields {
        if let Some(value) = value {
            w.text_element(name, &[], value)?;
        }
    }
    if let Some(revision) = core.revision {
        w.text_element("cp:revision", &[], &revision.to_string())?;
    }
    if let Some(printed) = &core.last_printed {
        w.text_element("cp:lastPrinted", &[], &format_timestamp(printed))?;
    }
    for (name, value) in [("dcterms:created", &core.created), ("dcterms:modified", &core.modified)] {
        if let Some(value) = value {
            w.text_element(
                name,
                &[("xsi:type", "dcterms:W3CDTF")],
                &format_timestamp(value),
            )?;
        }
    }

    w.end("cp:coreProperties")?;
    Ok(w.finish())
}

fn custom_value(vt_type: &str, text: &str) -> CustomValue {
    match vt_type {
        "lpwstr" | "lpstr" | "bstr" => CustomValue::String(text.to_string()),
        "i1" | "i2" | "i4" | "i8" | "int" | "ui1" | "ui2" | "ui4" | "ui8" | "uint" | "r4"
        | "r8" | "decimal" => match text.trim().parse::<f64>() {
            Ok(n) => CustomValue::Number(n),
            Err(_) => {
                log::warn!("custom number '{}' is not numeric; keeping text", text);
                CustomValue::String(text.to_string())
            }
        },
        "bool" => CustomValue::Boolean(matches!(text.trim(), "true" | "1")),
        "filetime" | "date" => match parse_timestamp(text) {
            Some(dt) => CustomValue::Datetime(dt),
            None => {
                log::warn!("custom timestamp '{}' is unparseable; keeping text", text);
                CustomValue::String(text.to_string())
            }
        },
        other => {
            log::warn!("custom property type vt:{} read as string", other);
            CustomValue::String(text.to_string())
        }
    }
}

/// Parse docProps/custom.xml.
pub fn parse_custom(xml: &str) -> Result<CustomProperties> {
    let mut props = CustomProperties::new();
    if xml.trim().is_empty() {
        return Ok(props);
    }

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut name: Option<String> = None;
    let mut value_type: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"property" {
                    name = attr(&e, b"name");
                } else if name.is_some() {
                    value_type = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    text.clear();
                }
            }
            Ok(Event::Empty(e)) => {
                if let (Some(key), false) = (&name, e.local_name().as_ref() == b"property") {
                    let vt_type = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    props.insert(key.clone(), custom_value(&vt_type, ""));
                }
            }
            Ok(Event::Text(e)) => {
                if value_type.is_some() {
                    text.push_str(&text_of(&e));
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"property" {
                    name = None;
                } else if let (Some(key), Some(vt_type)) = (&name, value_type.take()) {
                    props.insert(key.clone(), custom_value(&vt_type, &text));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(props)
}

/// Serialize custom properties as docProps/custom.xml.
pub fn write_custom(props: &CustomProperties) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.start("Properties", &[("xmlns", CUSTOM_NS), ("xmlns:vt", VT_NS)])?;

    // pid 0 and 1 are reserved
    for (index, (name, value)) in props.iter().enumerate() {
        let pid = (index + 2).to_string();
        w.start(
            "property",
            &[("fmtid", CUSTOM_FMTID), ("pid", pid.as_str()), ("name", name.as_str())],
        )?;
        match value {
            CustomValue::String(s) => w.text_element("vt:lpwstr", &[], s)?,
            CustomValue::Number(n) => {
                if n.fract() == 0.0 && *n >= i32::MIN as f64 && *n <= i32::MAX as f64 {
                    w.text_element("vt:i4", &[], &(*n as i32).to_string())?
                } else {
                    w.text_element("vt:r8", &[], &n.to_string())?
                }
            }
            CustomValue::Boolean(b) => w.text_element("vt:bool", &[], &b.to_string())?,
            CustomValue::Datetime(dt) => w.text_element(
                "vt:filetime",
                &[],
                &dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            )?,
        }
        w.end("property")?;
    }

    w.end("Properties")?;
    Ok(w.finish())
}

/// Read document variables from word/settings.xml.
pub fn parse_variables(xml: &str) -> Result<Variables> {
    let mut vars = Variables::new();
    if xml.trim().is_empty() {
        return Ok(vars);
    }

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"w:docVar" => {
                if let Some(name) = attr(&e, b"w:name") {
                    vars.insert(name, attr(&e, b"w:val").unwrap_or_default());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(vars)
}

/// Serialize word/settings.xml carrying the document variables.
pub fn write_settings(vars: &Variables) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.start("w:settings", &[("xmlns:w", W_NS)])?;
    w.val("w:defaultTabStop", "720")?;
    if !vars.is_empty() {
        w.start("w:docVars", &[])?;
        for (name, value) in vars {
            w.empty("w:docVar", &[("w:name", name.as_str()), ("w:val", value.as_str())])?;
        }
        w.end("w:docVars")?;
    }
    w.end("w:settings")?;
    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_core() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"
    xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>Quarterly &amp; Annual</dc:title>
  <dc:creator>Jo</dc:creator>
  <dc:description>Notes</dc:description>
  <cp:revision>7</cp:revision>
  <dcterms:created xsi:type="dcterms:W3CDTF">2024-03-01T09:30:00Z</dcterms:created>
  <dcterms:modified xsi:type="dcterms:W3CDTF">not a date</dcterms:modified>
</cp:coreProperties>"#;

        let core = parse_core(xml).unwrap();
        assert_eq!(core.title.as_deref(), Some("Quarterly & Annual"));
        assert_eq!(core.author.as_deref(), Some("Jo"));
        assert_eq!(core.comments.as_deref(), Some("Notes"));
        assert_eq!(core.revision, Some(7));
        assert_eq!(
            core.created,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap())
        );
        assert_eq!(core.modified, None);
    }

    #[test]
    fn test_core_write_then_parse() {
        let core = CoreProperties {
            title: Some("Report".into()),
            author: Some("Ann <ann@example.com>".into()),
            keywords: Some("a, b".into()),
            revision: Some(3),
            created: Some(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()),
            ..Default::default()
        };
        let xml = String::from_utf8(write_core(&core).unwrap()).unwrap();
        assert_eq!(parse_core(&xml).unwrap(), core);
    }

    #[test]
    fn test_custom_write_then_parse() {
        let mut props = CustomProperties::new();
        props.insert("Client".into(), CustomValue::String("ACME".into()));
        props.insert("Budget".into(), CustomValue::Number(1500.0));
        props.insert("Ratio".into(), CustomValue::Number(0.25));
        props.insert("Approved".into(), CustomValue::Boolean(true));
        props.insert(
            "Due".into(),
            CustomValue::Datetime(Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()),
        );
        props.insert("Empty".into(), CustomValue::String(String::new()));

        let xml = String::from_utf8(write_custom(&props).unwrap()).unwrap();
        assert!(xml.contains("<vt:i4>1500</vt:i4>"));
        assert!(xml.contains("<vt:r8>0.25</vt:r8>"));

        let parsed = parse_custom(&xml).unwrap();
        assert_eq!(parsed, props);
        let keys: Vec<_> = parsed.keys().cloned().collect();
        assert_eq!(keys, ["Client", "Budget", "Ratio", "Approved", "Due", "Empty"]);
    }

    #[test]
    fn test_unknown_custom_type_reads_as_string() {
        let xml = r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/custom-properties"
            xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
            <property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="2" name="Blob"><vt:clsid>{1234}</vt:clsid></property>
        </Properties>"#;
        let parsed = parse_custom(xml).unwrap();
        assert_eq!(parsed["Blob"], CustomValue::String("{1234}".into()));
    }

    #[test]
    fn test_variables() {
        let mut vars = Variables::new();
        vars.insert("Client".into(), "ACME & Co".into());
        vars.insert("Ref".into(), "42".into());
        let xml = String::from_utf8(write_settings(&vars).unwrap()).unwrap();
        assert_eq!(parse_variables(&xml).unwrap(), vars);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert!(parse_timestamp("2024-01-02T03:04:05+02:00").is_some());
        assert!(parse_timestamp("2024-01-02T03:04:05").is_some());
        assert!(parse_timestamp("2024-01-02").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
