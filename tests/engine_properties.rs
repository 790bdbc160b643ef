//! Behavioural properties of the extraction and application engines.
//!
//! Run with: cargo test --test engine_properties

use docparam::content::{add_heading, add_paragraph, create_document};
use docparam::{
    apply, extract, validate, ApplyOptions, Category, Document, Error, ErrorKind,
    ExtractOptions, Paragraph, ParameterSchema, StyleResolver, Table,
};

fn schema(json: &str) -> ParameterSchema {
    ParameterSchema::from_json(json).unwrap()
}

fn apply_default(json: &str, doc: &mut Document) -> docparam::Result<docparam::ApplyReport> {
    apply(&schema(json), doc, &ApplyOptions::default())
}

#[test]
fn test_derived_style_inherits_unset_attributes() {
    let mut doc = Document::new();
    apply_default(
        r#"{"styles": {
            "Base": {"base_style": null, "font": {"name": "Arial", "size_pt": 10, "italic": true}},
            "Derived": {"base_style": "Base", "font": {"bold": true}}
        }}"#,
        &mut doc,
    )
    .unwrap();

    let derived = doc.styles.by_name("Derived").unwrap();
    assert_eq!(derived.run.font, None);
    assert_eq!(derived.run.bold, Some(true));

    let effective = StyleResolver::new(&doc.styles).effective("Derived").unwrap();
    assert_eq!(effective.run.font.as_deref(), Some("Arial"));
    assert_eq!(effective.run.size, Some(20));
    assert_eq!(effective.run.italic, Some(true));
    assert_eq!(effective.run.bold, Some(true));
}

#[test]
fn test_inheritance_is_live() {
    let mut doc = Document::new();
    apply_default(
        r#"{"styles": {
            "Base": {"base_style": null, "font": {"size_pt": 10}},
            "Derived": {"base_style": "Base", "font": {"bold": true}}
        }}"#,
        &mut doc,
    )
    .unwrap();

    apply_default(r#"{"styles": {"Base": {"font": {"size_pt": 20}}}}"#, &mut doc).unwrap();

    let effective = StyleResolver::new(&doc.styles).effective("Derived").unwrap();
    assert_eq!(effective.run.size, Some(40));
    assert_eq!(effective.run.bold, Some(true));

    let extracted = extract(&doc, &ExtractOptions::default()).unwrap();
    let derived = &extracted.styles.unwrap()["Derived"];
    assert_eq!(derived.effective_font.as_ref().unwrap().size_pt, Some(20.0));
}

#[test]
fn test_ancestors_nearest_first() {
    let mut doc = Document::new();
    apply_default(
        r#"{"styles": {
            "Level 2": {"base_style": "Level 1"},
            "Level 1": {"base_style": "Normal"}
        }}"#,
        &mut doc,
    )
    .unwrap();
    let resolver = StyleResolver::new(&doc.styles);
    assert_eq!(
        resolver.ancestors("Level 2").unwrap(),
        vec!["Level 1".to_string(), "Normal".to_string()]
    );
}

#[test]
fn test_cycles_are_rejected_everywhere() {
    let cyclic = schema(
        r#"{"styles": {
            "A": {"base_style": "B"},
            "B": {"base_style": "C"},
            "C": {"base_style": "A"}
        }}"#,
    );
    let mut doc = Document::new();
    let before = doc.clone();

    let err = validate(&cyclic, &doc, &ApplyOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicInheritance);
    let err = apply(&cyclic, &mut doc, &ApplyOptions::default()).unwrap_err();
    match err {
        Error::CyclicInheritance { chain } => {
            assert_eq!(chain.first(), chain.last());
            assert!(chain.len() >= 4);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(doc, before);
}

#[test]
fn test_cycle_through_existing_style() {
    let mut doc = Document::new();
    apply_default(r#"{"styles": {"Outer": {"base_style": "Normal"}}}"#, &mut doc).unwrap();
    let before = doc.clone();

    // Normal is left as-is in the schema but would now sit below Outer
    let err = apply_default(r#"{"styles": {"Normal": {"base_style": "Outer"}}}"#, &mut doc)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicInheritance);
    assert_eq!(doc, before);
}

#[test]
fn test_partial_schema_touches_only_its_categories() {
    let mut doc = create_document().unwrap();
    add_heading(&mut doc, "Introduction", 1, None).unwrap();
    add_paragraph(&mut doc, "Body text.", None, true);
    let before = doc.clone();

    let report = apply_default(
        r#"{"sections": [{"margins": {"left_mm": 30}}]}"#,
        &mut doc,
    )
    .unwrap();
    assert_eq!(report.sections, 1);
    assert_eq!(report.total(), 1);

    assert_eq!(doc.styles, before.styles);
    assert_eq!(doc.core, before.core);
    assert_eq!(doc.body, before.body);
    assert_eq!(doc.sections[0].margins.left, 1701);
    assert_eq!(doc.sections[0].margins.top, before.sections[0].margins.top);
}

#[test]
fn test_partial_style_update_keeps_unmentioned_attributes() {
    let mut doc = create_document().unwrap();
    apply_default(
        r#"{"styles": {"Normal": {"paragraph_format": {"space_after_pt": 6}}}}"#,
        &mut doc,
    )
    .unwrap();
    let normal = doc.styles.by_name("Normal").unwrap();
    assert_eq!(normal.run.font.as_deref(), Some("Times New Roman"));
    assert_eq!(normal.run.size, Some(28));
    assert_eq!(normal.para.space_after, Some(120));
    assert_eq!(normal.para.indent_first_line, Some(720));
}

#[test]
fn test_compact_and_all_styles_scopes() {
    let mut doc = Document::new();
    doc.styles.styles.retain(|s| s.name != "Caption");
    doc.push_paragraph(Paragraph::with_text("Title").with_style("Heading1"));
    doc.push_paragraph(Paragraph::with_text("Body"));
    doc.push_table(Table::new(1, 1));

    let full = extract(&doc, &ExtractOptions::default()).unwrap().styles.unwrap();
    assert_eq!(full.len(), doc.styles.len());
    assert!(!full.contains_key("Caption"));

    let compact = extract(&doc, &ExtractOptions::new().with_compact(true))
        .unwrap()
        .styles
        .unwrap();
    let mut names: Vec<&str> = compact.keys().map(String::as_str).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Heading 1", "Normal", "Normal Table"]);

    let everything = extract(
        &doc,
        &ExtractOptions::new().with_compact(true).with_all_styles(true),
    )
    .unwrap()
    .styles
    .unwrap();
    assert_eq!(everything.len(), doc.styles.len() + 1);
    assert!(everything.contains_key("Caption"));
}

#[test]
fn test_category_scope() {
    let doc = create_document().unwrap();
    let only = extract(
        &doc,
        &ExtractOptions::new().with_categories([Category::Sections, Category::Variables]),
    )
    .unwrap();
    assert_eq!(only.categories(), vec![Category::Variables, Category::Sections]);
    assert!(only.styles.is_none());
}

#[test]
fn test_validation_precedes_mutation() {
    let mut doc = create_document().unwrap();
    let before = doc.clone();

    let cases = [
        r#"{"core_properties": {"title": "New"}, "styles": {"Normal": {"font": {"size_pt": -4}}}}"#,
        r#"{"variables": {"a": "1"}, "styles": {"Body": {"base_style": "Nowhere"}}}"#,
        r#"{"sections": [{"margins": {"top_mm": 10}}], "tables_summary": [{"row_count": 1, "column_count": 1, "style": "No Such Table"}]}"#,
        r#"{"styles": {"Normal": {"paragraph_format": {"line_spacing": 1.5, "line_spacing_pt": 18}}}}"#,
        r#"{"numbering": {"3": {"levels": [{"level": 9, "format": "decimal"}]}}}"#,
        r#"{"styles": {"Body": {"numbering_id": "99"}}}"#,
    ];
    for case in cases {
        assert!(apply_default(case, &mut doc).is_err(), "{case}");
        assert_eq!(doc, before, "{case}");
    }
}

#[test]
fn test_unknown_nested_key_is_a_parse_error() {
    let err = ParameterSchema::from_json(r#"{"styles": {"Normal": {"fnot": {}}}}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
}

#[test]
fn test_house_style_margins_scenario() {
    let doc = create_document().unwrap();
    let extracted = extract(&doc, &ExtractOptions::default()).unwrap();

    let margins = extracted.sections.unwrap()[0].margins.clone().unwrap();
    assert_eq!(margins.top_mm, Some(15.0));
    assert_eq!(margins.bottom_mm, Some(15.0));
    assert_eq!(margins.left_mm, Some(20.0));
    assert_eq!(margins.right_mm, Some(20.0));

    let styles = extracted.styles.unwrap();
    let normal = styles["Normal"].effective_font.clone().unwrap();
    assert_eq!(normal.name.as_deref(), Some("Times New Roman"));
    assert_eq!(normal.size_pt, Some(14.0));
    let heading = styles["Heading 1"].effective_font.clone().unwrap();
    assert_eq!(heading.size_pt, Some(16.0));
    assert_eq!(heading.bold, Some(false));
}

#[test]
fn test_dry_run_reports_without_writing() {
    let mut doc = Document::new();
    let before = doc.clone();
    let report = apply(
        &schema(r#"{"variables": {"a": "1", "b": "2"}, "sections": [{}, {}]}"#),
        &mut doc,
        &ApplyOptions::new().with_dry_run(true),
    )
    .unwrap();
    assert!(report.dry_run);
    assert_eq!(report.properties, 2);
    assert_eq!(report.sections, 2);
    assert_eq!(doc, before);
}

#[test]
fn test_section_margins_scenario() {
    let mut doc = Document::new();
    apply_default(
        r#"{"sections": [{
            "orientation": "portrait",
            "margins": {"top_mm": 15, "bottom_mm": 15, "left_mm": 20, "right_mm": 20}
        }]}"#,
        &mut doc,
    )
    .unwrap();

    let extracted = extract(
        &doc,
        &ExtractOptions::new().with_categories([Category::Sections]),
    )
    .unwrap();
    let section = &extracted.sections.unwrap()[0];
    assert_eq!(section.orientation, Some(docparam::Orientation::Portrait));
    let m = section.margins.as_ref().unwrap();
    assert_eq!(
        (m.top_mm, m.bottom_mm, m.left_mm, m.right_mm),
        (Some(15.0), Some(15.0), Some(20.0), Some(20.0))
    );
}
