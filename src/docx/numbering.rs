//! DOCX numbering part (`word/numbering.xml`).

use super::xml::{attr, int_attr, XmlWriter, W_NS};
use crate::error::Result;
use crate::model::{AbstractNum, NumInstance, NumLevel, Numbering};
use quick_xml::events::{BytesStart, Event};

#[derive(Default)]
struct ParseState {
    current_abstract: Option<AbstractNum>,
    current_level: Option<NumLevel>,
    current_num: Option<NumInstance>,
}

/// Parse numbering.xml.
pub fn parse_numbering(xml: &str) -> Result<Numbering> {
    let mut numbering = Numbering::default();
    if xml.trim().is_empty() {
        return Ok(numbering);
    }

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut state = ParseState::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => start_element(&e, &mut state),
            Ok(Event::Empty(e)) => {
                start_element(&e, &mut state);
                end_element(e.name().as_ref(), &mut state, &mut numbering);
            }
            Ok(Event::End(e)) => end_element(e.name().as_ref(), &mut state, &mut numbering),
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(numbering)
}

fn start_element(e: &BytesStart, state: &mut ParseState) {
    match e.name().as_ref() {
        b"w:abstractNum" => {
            state.current_abstract = Some(AbstractNum {
                id: attr(e, b"w:abstractNumId").unwrap_or_default(),
                levels: Vec::new(),
            });
        }
        b"w:lvl" if state.current_abstract.is_some() => {
            let level = int_attr(e, b"w:ilvl")
                .and_then(|l| u8::try_from(l).ok())
                .unwrap_or(0);
            state.current_level = Some(NumLevel {
                level,
                start: 1,
                format: "decimal".to_string(),
                text: String::new(),
                indent_left: None,
                hanging: None,
            });
        }
        b"w:num" => {
            state.current_num = Some(NumInstance {
                num_id: attr(e, b"w:numId").unwrap_or_default(),
                abstract_id: String::new(),
            });
        }
        b"w:abstractNumId" => {
            if let Some(num) = state.current_num.as_mut() {
                num.abstract_id = attr(e, b"w:val").unwrap_or_default();
            }
        }
        name => {
            let Some(level) = state.current_level.as_mut() else {
                return;
            };
            match name {
                b"w:start" => {
                    if let Some(start) = int_attr(e, b"w:val") {
                        level.start = u32::try_from(start).unwrap_or(0);
                    }
                }
                b"w:numFmt" => {
                    if let Some(format) = attr(e, b"w:val") {
                        level.format = format;
                    }
                }
                b"w:lvlText" => level.text = attr(e, b"w:val").unwrap_or_default(),
                b"w:ind" => {
                    level.indent_left = int_attr(e, b"w:left").or_else(|| int_attr(e, b"w:start"));
                    level.hanging = int_attr(e, b"w:hanging");
                }
                _ => {}
            }
        }
    }
}

fn end_element(name: &[u8], state: &mut ParseState, numbering: &mut Numbering) {
    match name {
        b"w:lvl" => {
            if let (Some(level), Some(abstract_num)) =
                (state.current_level.take(), state.current_abstract.as_mut())
            {
                abstract_num.levels.push(level);
            }
        }
        b"w:abstractNum" => {
            if let Some(abstract_num) = state.current_abstract.take() {
                numbering.abstracts.push(abstract_num);
            }
        }
        b"w:num" => {
            if let Some(num) = state.current_num.take() {
                numbering.instances.push(num);
            }
        }
        _ => {}
    }
}

/// Serialize numbering definitions as numbering.xml.
pub fn write_numbering(numbering: &Numbering) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.start("w:numbering", &[("xmlns:w", W_NS)])?;

    // All abstract definitions precede the instances.
    for abstract_num in &numbering.abstracts {
        w.start("w:abstractNum", &[("w:abstractNumId", abstract_num.id.as_str())])?;
        w.val("w:multiLevelType", "hybridMultilevel")?;
        for level in &abstract_num.levels {
            write_level(&mut w, level)?;
        }
        w.end("w:abstractNum")?;
    }
    for num in &numbering.instances {
        w.start("w:num", &[("w:numId", num.num_id.as_str())])?;
        w.val("w:abstractNumId", &num.abstract_id)?;
        w.end("w:num")?;
    }

    w.end("w:numbering")?;
    Ok(w.finish())
}

fn write_level(w: &mut XmlWriter, level: &NumLevel) -> Result<()> {
    w.start("w:lvl", &[("w:ilvl", level.level.to_string().as_str())])?;
    w.val("w:start", &level.start.to_string())?;
    w.val("w:numFmt", &level.format)?;
    w.val("w:lvlText", &level.text)?;
    w.val("w:lvlJc", "left")?;
    if level.indent_left.is_some() || level.hanging.is_some() {
        let left = level.indent_left.map(|v| v.to_string());
        let hanging = level.hanging.map(|v| v.to_string());
        let mut attrs = Vec::new();
        if let Some(left) = &left {
            attrs.push(("w:left", left.as_str()));
        }
        if let Some(hanging) = &hanging {
            attrs.push(("w:hanging", hanging.as_str()));
        }
        w.start("w:pPr", &[])?;
        w.empty("w:ind", &attrs)?;
        w.end("w:pPr")?;
    }
    w.end("w:lvl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbering() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:abstractNum w:abstractNumId="0">
        <w:lvl w:ilvl="0">
            <w:start w:val="1"/>
            <w:numFmt w:val="bullet"/>
            <w:lvlText w:val="•"/>
            <w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr>
        </w:lvl>
        <w:lvl w:ilvl="1">
            <w:start w:val="3"/>
            <w:numFmt w:val="lowerLetter"/>
            <w:lvlText w:val="%2)"/>
        </w:lvl>
    </w:abstractNum>
    <w:num w:numId="4">
        <w:abstractNumId w:val="0"/>
    </w:num>
</w:numbering>"#;

        let numbering = parse_numbering(xml).unwrap();
        let levels = numbering.levels("4").unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].format, "bullet");
        assert_eq!(levels[0].text, "•");
        assert_eq!(levels[0].indent_left, Some(720));
        assert_eq!(levels[0].hanging, Some(360));
        assert_eq!(levels[1].start, 3);
        assert_eq!(levels[1].indent_left, None);
    }

    #[test]
    fn test_builtin_numbering_survives_write() {
        let numbering = Numbering::builtin();
        let xml = String::from_utf8(write_numbering(&numbering).unwrap()).unwrap();
        assert_eq!(parse_numbering(&xml).unwrap(), numbering);
    }
}
