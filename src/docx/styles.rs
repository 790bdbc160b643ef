//! DOCX styles part (`word/styles.xml`).

use super::props::{read_para_prop, read_run_prop, write_para_props, write_run_props};
use super::xml::{attr, on_off, XmlWriter, W_NS};
use crate::error::Result;
use crate::model::{DocDefaults, StyleDef, StyleKind, StyleSheet};
use quick_xml::events::{BytesStart, Event};

/// Built-in styles whose stored name is lower case.
const LOWERCASE_NAMES: [&str; 4] = ["caption", "header", "footer", "footnote text"];

/// UI name of a style from its stored `w:name`.
///
/// Word stores some built-in names in lower case ("heading 1") but shows
/// them capitalised; the catalog uses the shown name.
pub fn ui_name(stored: &str) -> String {
    if let Some(level) = stored.strip_prefix("heading ") {
        return format!("Heading {}", level);
    }
    if LOWERCASE_NAMES.contains(&stored) {
        let mut chars = stored.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }
    stored.to_string()
}

/// Stored `w:name` of a style from its UI name.
pub fn stored_name(ui: &str) -> String {
    if let Some(level) = ui.strip_prefix("Heading ") {
        if level.parse::<u8>().is_ok() {
            return format!("heading {}", level);
        }
    }
    let lower = ui.to_lowercase();
    if LOWERCASE_NAMES.contains(&lower.as_str()) {
        return lower;
    }
    ui.to_string()
}

#[derive(PartialEq)]
enum Target {
    None,
    Defaults,
    Style,
}

/// Parse styles.xml into a style sheet.
pub fn parse_styles(xml: &str) -> Result<StyleSheet> {
    let mut sheet = StyleSheet::default();
    if xml.trim().is_empty() {
        return Ok(sheet);
    }

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<StyleDef> = None;
    let mut defaults = DocDefaults::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                handle_element(&e, &stack, &mut current, &mut defaults);
                stack.push(e.name().as_ref().to_vec());
            }
            Ok(Event::Empty(e)) => {
                handle_element(&e, &stack, &mut current, &mut defaults);
                if e.name().as_ref() == b"w:style" {
                    if let Some(style) = current.take() {
                        sheet.push(style);
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"w:style" {
                    if let Some(style) = current.take() {
                        sheet.push(style);
                    }
                }
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    sheet.defaults = defaults;
    log::debug!("parsed {} styles", sheet.len());
    Ok(sheet)
}

fn handle_element(
    e: &BytesStart,
    stack: &[Vec<u8>],
    current: &mut Option<StyleDef>,
    defaults: &mut DocDefaults,
) {
    // Conditional table formatting does not describe the style itself.
    if stack.iter().any(|n| n == b"w:tblStylePr" || n == b"w:latentStyles") {
        return;
    }
    let in_element = |name: &[u8]| stack.iter().any(|n| n == name);
    let target = if in_element(b"w:docDefaults") {
        Target::Defaults
    } else if current.is_some() {
        Target::Style
    } else {
        Target::None
    };

    if e.name().as_ref() == b"w:style" {
        let kind = attr(e, b"w:type")
            .and_then(|t| StyleKind::from_ooxml(&t))
            .unwrap_or_default();
        let id = attr(e, b"w:styleId").unwrap_or_default();
        let mut style = StyleDef::new(id.clone(), id, kind);
        style.is_default = attr(e, b"w:default").is_some_and(|v| v == "1" || v == "true");
        *current = Some(style);
        return;
    }

    let in_rpr = in_element(b"w:rPr");
    let in_ppr = in_element(b"w:pPr");

    match target {
        Target::Defaults => {
            if in_rpr {
                read_run_prop(e, &mut defaults.run);
            } else if in_ppr {
                read_para_prop(e, &mut defaults.para);
            }
        }
        Target::Style => {
            let Some(style) = current.as_mut() else {
                return;
            };
            if in_rpr {
                read_run_prop(e, &mut style.run);
                return;
            }
            if in_ppr {
                if e.name().as_ref() == b"w:numId" && in_element(b"w:numPr") {
                    style.num_id = attr(e, b"w:val");
                } else {
                    read_para_prop(e, &mut style.para);
                }
                return;
            }
            match e.name().as_ref() {
                b"w:name" => {
                    if let Some(name) = attr(e, b"w:val") {
                        style.name = ui_name(&name);
                    }
                }
                b"w:basedOn" => style.based_on = attr(e, b"w:val"),
                b"w:hidden" | b"w:semiHidden" => style.hidden |= on_off(e),
                _ => {}
            }
        }
        Target::None => {}
    }
}

/// Serialize a style sheet as styles.xml.
pub fn write_styles(sheet: &StyleSheet) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.start("w:styles", &[("xmlns:w", W_NS)])?;

    w.start("w:docDefaults", &[])?;
    w.start("w:rPrDefault", &[])?;
    if sheet.defaults.run.is_empty() {
        w.empty("w:rPr", &[])?;
    } else {
        write_run_props(&mut w, None, &sheet.defaults.run, None)?;
    }
    w.end("w:rPrDefault")?;
    w.start("w:pPrDefault", &[])?;
    w.start("w:pPr", &[])?;
    write_para_props(&mut w, &sheet.defaults.para)?;
    w.end("w:pPr")?;
    w.end("w:pPrDefault")?;
    w.end("w:docDefaults")?;

    for style in &sheet.styles {
        write_style(&mut w, style)?;
    }

    w.end("w:styles")?;
    Ok(w.finish())
}

fn write_style(w: &mut XmlWriter, style: &StyleDef) -> Result<()> {
    let mut attrs = vec![("w:type", style.kind.as_ooxml())];
    if style.is_default {
        attrs.push(("w:default", "1"));
    }
    attrs.push(("w:styleId", style.id.as_str()));
    w.start("w:style", &attrs)?;

    w.val("w:name", &stored_name(&style.name))?;
    if let Some(base) = &style.based_on {
        w.val("w:basedOn", base)?;
    }
    if style.hidden {
        w.empty("w:semiHidden", &[])?;
    }

    if style.num_id.is_some() || !style.para.is_empty() {
        w.start("w:pPr", &[])?;
        if let Some(num_id) = &style.num_id {
            w.start("w:numPr", &[])?;
            w.val("w:numId", num_id)?;
            w.end("w:numPr")?;
        }
        write_para_props(w, &style.para)?;
        w.end("w:pPr")?;
    }
    write_run_props(w, None, &style.run, None)?;

    w.end("w:style")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alignment, LineSpacing};

    #[test]
    fn test_parse_styles() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:docDefaults>
        <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>
        <w:pPrDefault><w:pPr><w:spacing w:after="160"/></w:pPr></w:pPrDefault>
    </w:docDefaults>
    <w:latentStyles><w:lsdException w:name="Normal"/></w:latentStyles>
    <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
        <w:name w:val="Normal"/>
    </w:style>
    <w:style w:type="paragraph" w:styleId="Heading1">
        <w:name w:val="heading 1"/>
        <w:basedOn w:val="Normal"/>
        <w:pPr><w:spacing w:before="240" w:line="360" w:lineRule="auto"/><w:jc w:val="center"/></w:pPr>
        <w:rPr><w:b/><w:sz w:val="32"/></w:rPr>
    </w:style>
    <w:style w:type="table" w:styleId="Grid">
        <w:name w:val="Grid"/>
        <w:semiHidden/>
        <w:tblStylePr w:type="firstRow"><w:rPr><w:b/></w:rPr></w:tblStylePr>
    </w:style>
</w:styles>"#;

        let sheet = parse_styles(xml).unwrap();
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.defaults.run.font.as_deref(), Some("Calibri"));
        assert_eq!(sheet.defaults.para.space_after, Some(160));

        let normal = sheet.by_id("Normal").unwrap();
        assert!(normal.is_default);

        let h1 = sheet.by_name("Heading 1").unwrap();
        assert_eq!(h1.id, "Heading1");
        assert_eq!(h1.based_on.as_deref(), Some("Normal"));
        assert_eq!(h1.run.bold, Some(true));
        assert_eq!(h1.run.size, Some(32));
        assert_eq!(h1.para.line, Some(LineSpacing::Multiple(360)));
        assert_eq!(h1.para.alignment, Some(Alignment::Center));

        let grid = sheet.by_id("Grid").unwrap();
        assert!(grid.hidden);
        assert_eq!(grid.kind, StyleKind::Table);
        assert_eq!(grid.run.bold, None);
    }

    #[test]
    fn test_builtin_sheet_survives_write() {
        let sheet = StyleSheet::builtin();
        let xml = String::from_utf8(write_styles(&sheet).unwrap()).unwrap();
        assert!(xml.contains(r#"w:val="heading 1""#));
        let parsed = parse_styles(&xml).unwrap();
        assert_eq!(parsed, sheet);
    }

    #[test]
    fn test_name_mapping() {
        assert_eq!(ui_name("heading 3"), "Heading 3");
        assert_eq!(ui_name("caption"), "Caption");
        assert_eq!(ui_name("Body Text"), "Body Text");
        assert_eq!(stored_name("Heading 3"), "heading 3");
        assert_eq!(stored_name("Caption"), "caption");
        assert_eq!(stored_name("Heading Custom"), "Heading Custom");
    }
}
