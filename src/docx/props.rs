//! Run (`w:rPr`) and paragraph (`w:pPr`) property elements.
//!
//! Styles, document defaults and body content share these readers and
//! writers so the same element maps to the same model field everywhere.

use super::xml::{attr, int_attr, on_off, XmlWriter};
use crate::error::Result;
use crate::model::{Alignment, LineSpacing, ParaProps, RunProps};
use quick_xml::events::BytesStart;

/// Read one child of `w:rPr` into run properties.
///
/// Returns `false` when the element is not a run property this crate models.
pub fn read_run_prop(e: &BytesStart, props: &mut RunProps) -> bool {
    match e.name().as_ref() {
        b"w:rFonts" => {
            if let Some(font) = attr(e, b"w:ascii").or_else(|| attr(e, b"w:hAnsi")) {
                props.font = Some(font);
            }
        }
        b"w:b" => props.bold = Some(on_off(e)),
        b"w:i" => props.italic = Some(on_off(e)),
        b"w:u" => {
            let val = attr(e, b"w:val").unwrap_or_else(|| "single".to_string());
            props.underline = Some(val != "none");
        }
        b"w:color" => {
            if let Some(val) = attr(e, b"w:val") {
                if val != "auto" {
                    props.color = Some(val.to_ascii_uppercase());
                }
            }
        }
        b"w:sz" => {
            if let Some(size) = int_attr(e, b"w:val") {
                props.size = u32::try_from(size).ok();
            }
        }
        _ => return false,
    }
    true
}

/// Read one child of `w:pPr` into paragraph properties.
///
/// Returns `false` when the element is not a paragraph property this crate models.
pub fn read_para_prop(e: &BytesStart, props: &mut ParaProps) -> bool {
    match e.name().as_ref() {
        b"w:jc" => {
            props.alignment = attr(e, b"w:val").and_then(|v| Alignment::from_ooxml(&v));
        }
        b"w:spacing" => {
            if let Some(before) = int_attr(e, b"w:before") {
                props.space_before = Some(before);
            }
            if let Some(after) = int_attr(e, b"w:after") {
                props.space_after = Some(after);
            }
            if let Some(line) = int_attr(e, b"w:line") {
                let rule = attr(e, b"w:lineRule");
                props.line = Some(match rule.as_deref() {
                    Some("exact") => LineSpacing::Exact(line),
                    Some("atLeast") => LineSpacing::AtLeast(line),
                    _ => LineSpacing::Multiple(line),
                });
            }
        }
        b"w:ind" => {
            if let Some(left) = int_attr(e, b"w:left").or_else(|| int_attr(e, b"w:start")) {
                props.indent_left = Some(left);
            }
            if let Some(right) = int_attr(e, b"w:right").or_else(|| int_attr(e, b"w:end")) {
                props.indent_right = Some(right);
            }
            if let Some(hanging) = int_attr(e, b"w:hanging") {
                props.indent_first_line = Some(-hanging);
            } else if let Some(first) = int_attr(e, b"w:firstLine") {
                props.indent_first_line = Some(first);
            }
        }
        _ => return false,
    }
    true
}

/// Write a `w:rPr` element; nothing is written when there is nothing to say.
pub fn write_run_props(
    w: &mut XmlWriter,
    style_id: Option<&str>,
    props: &RunProps,
    lang: Option<&str>,
) -> Result<()> {
    if style_id.is_none() && props.is_empty() && lang.is_none() {
        return Ok(());
    }

    w.start("w:rPr", &[])?;
    if let Some(style_id) = style_id {
        w.val("w:rStyle", style_id)?;
    }
    if let Some(font) = &props.font {
        w.empty(
            "w:rFonts",
            &[
                ("w:ascii", font.as_str()),
                ("w:hAnsi", font.as_str()),
                ("w:cs", font.as_str()),
            ],
        )?;
    }
    if let Some(bold) = props.bold {
        write_on_off(w, "w:b", bold)?;
    }
    if let Some(italic) = props.italic {
        write_on_off(w, "w:i", italic)?;
    }
    if let Some(color) = &props.color {
        w.val("w:color", color)?;
    }
    if let Some(size) = props.size {
        let size = size.to_string();
        w.val("w:sz", &size)?;
        w.val("w:szCs", &size)?;
    }
    if let Some(underline) = props.underline {
        w.val("w:u", if underline { "single" } else { "none" })?;
    }
    if let Some(lang) = lang {
        w.val("w:lang", lang)?;
    }
    w.end("w:rPr")
}

fn write_on_off(w: &mut XmlWriter, name: &str, value: bool) -> Result<()> {
    if value {
        w.empty(name, &[])
    } else {
        w.val(name, "0")
    }
}

/// Write the spacing, indentation and alignment children of a `w:pPr`.
///
/// The caller owns the `w:pPr` wrapper because style and numbering
/// references precede these children.
pub fn write_para_props(w: &mut XmlWriter, props: &ParaProps) -> Result<()> {
    if props.space_before.is_some() || props.space_after.is_some() || props.line.is_some() {
        let before = props.space_before.map(|v| v.to_string());
        let after = props.space_after.map(|v| v.to_string());
        let (line, rule) = match props.line {
            Some(LineSpacing::Multiple(v)) => (Some(v.to_string()), Some("auto")),
            Some(LineSpacing::Exact(v)) => (Some(v.to_string()), Some("exact")),
            Some(LineSpacing::AtLeast(v)) => (Some(v.to_string()), Some("atLeast")),
            None => (None, None),
        };

        let mut attrs = Vec::new();
        if let Some(before) = &before {
            attrs.push(("w:before", before.as_str()));
        }
        if let Some(after) = &after {
            attrs.push(("w:after", after.as_str()));
        }
        if let (Some(line), Some(rule)) = (&line, rule) {
            attrs.push(("w:line", line.as_str()));
            attrs.push(("w:lineRule", rule));
        }
        w.empty("w:spacing", &attrs)?;
    }

    write_indent(w, props.indent_left, props.indent_right, props.indent_first_line)?;

    if let Some(alignment) = props.alignment {
        w.val("w:jc", alignment.as_ooxml())?;
    }
    Ok(())
}

/// Write a `w:ind` element; a negative first-line value is a hanging indent.
pub fn write_indent(
    w: &mut XmlWriter,
    left: Option<i32>,
    right: Option<i32>,
    first_line: Option<i32>,
) -> Result<()> {
    if left.is_none() && right.is_none() && first_line.is_none() {
        return Ok(());
    }
    let left = left.map(|v| v.to_string());
    let right = right.map(|v| v.to_string());
    let first = first_line.map(|v| (v < 0, v.abs().to_string()));

    let mut attrs = Vec::new();
    if let Some(left) = &left {
        attrs.push(("w:left", left.as_str()));
    }
    if let Some(right) = &right {
        attrs.push(("w:right", right.as_str()));
    }
    if let Some((hanging, value)) = &first {
        let key = if *hanging { "w:hanging" } else { "w:firstLine" };
        attrs.push((key, value.as_str()));
    }
    w.empty("w:ind", &attrs)
}
