//! Parameter schema to document.
//!
//! Application runs in six fixed phases: properties, styles, numbering,
//! sections, headers/footers, tables. The complete schema is validated
//! against the target before the first phase touches it, so a rejected
//! schema leaves the document exactly as it was. A failure inside a phase
//! is reported as [`Error::PartialApply`] and the document keeps whatever
//! earlier phases wrote.

use crate::error::{Error, Result};
use crate::model::{Document, NumLevel, Numbering, StyleDef, StyleSheet, Table};
use crate::resolve::{Overlay, StyleCatalog, StyleResolver};
use crate::schema::{
    normalize_color, Category, FontParams, ParagraphFormatParams, ParameterSchema, StyleParams,
};
use crate::units;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Largest font size a document can store, in points.
const MAX_FONT_SIZE_PT: f64 = 1638.0;

/// Deepest list level.
const MAX_LIST_LEVEL: u8 = 8;

/// One mutation stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Properties,
    Styles,
    Numbering,
    Sections,
    HeadersFooters,
    Tables,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Properties,
        Phase::Styles,
        Phase::Numbering,
        Phase::Sections,
        Phase::HeadersFooters,
        Phase::Tables,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Properties => "properties",
            Phase::Styles => "styles",
            Phase::Numbering => "numbering",
            Phase::Sections => "sections",
            Phase::HeadersFooters => "headers_footers",
            Phase::Tables => "tables",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for application.
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Run the tables phase
    pub tables: bool,

    /// Validate and report without mutating
    pub dry_run: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            tables: true,
            dry_run: false,
        }
    }
}

impl ApplyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(mut self, tables: bool) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Items written per phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub properties: usize,
    pub styles: usize,
    pub numbering: usize,
    pub sections: usize,
    pub headers_footers: usize,
    pub tables: usize,
    /// Nothing was written
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
}

impl ApplyReport {
    pub fn count(&self, phase: Phase) -> usize {
        match phase {
            Phase::Properties => self.properties,
            Phase::Styles => self.styles,
            Phase::Numbering => self.numbering,
            Phase::Sections => self.sections,
            Phase::HeadersFooters => self.headers_footers,
            Phase::Tables => self.tables,
        }
    }

    pub fn total(&self) -> usize {
        Phase::ALL.iter().map(|p| self.count(*p)).sum()
    }
}

/// Validated work order.
struct Plan {
    /// Styles to write, bases before derived styles. Names the schema does
    /// not mention are built-ins to materialise.
    style_order: Vec<String>,
}

/// Check a schema against a target without mutating it.
pub fn validate(schema: &ParameterSchema, doc: &Document, options: &ApplyOptions) -> Result<()> {
    plan(schema, doc, options).map(|_| ())
}

/// Apply a full or partial schema to a document.
///
/// Absent categories leave the document untouched.
///
/// # Example
///
/// ```
/// use docparam::{apply, ApplyOptions, Document, ParameterSchema};
///
/// let schema = ParameterSchema::from_json(
///     r#"{"styles": {"Normal": {"font": {"name": "Georgia", "size_pt": 12}}}}"#,
/// )?;
/// let mut doc = Document::new();
/// let report = apply(&schema, &mut doc, &ApplyOptions::default())?;
/// assert_eq!(report.styles, 1);
/// assert_eq!(doc.styles.by_name("Normal").unwrap().run.size, Some(24));
/// # Ok::<(), docparam::Error>(())
/// ```
pub fn apply(
    schema: &ParameterSchema,
    doc: &mut Document,
    options: &ApplyOptions,
) -> Result<ApplyReport> {
    let plan = plan(schema, doc, options)?;
    let report = ApplyReport {
        properties: schema.core_properties.iter().count()
            + schema.custom_properties.as_ref().map_or(0, |c| c.len())
            + schema.variables.as_ref().map_or(0, |v| v.len()),
        styles: plan.style_order.len() + usize::from(schema.document_defaults.is_some()),
        numbering: schema.numbering.as_ref().map_or(0, |n| n.len()),
        sections: schema.sections.as_ref().map_or(0, |s| s.len()),
        headers_footers: schema.headers_footers.as_ref().map_or(0, |h| h.len()),
        tables: if options.tables {
            schema.tables_summary.as_ref().map_or(0, |t| t.len())
        } else {
            0
        },
        dry_run: options.dry_run,
    };
    if options.dry_run {
        return Ok(report);
    }

    apply_properties(schema, doc);
    log::debug!("phase {}: {} items", Phase::Properties, report.properties);

    if let Some(defaults) = &schema.document_defaults {
        defaults.merge_into(&mut doc.styles.defaults);
    }
    if let Some(styles) = &schema.styles {
        apply_styles(styles, &plan.style_order, doc)?;
    }
    if schema.has(Category::Styles) {
        log::debug!("phase {}: {} items", Phase::Styles, report.styles);
    }
    if let Some(numbering) = &schema.numbering {
        for (id, params) in numbering {
            let levels = params
                .levels
                .iter()
                .map(|l| NumLevel {
                    level: l.level,
                    start: l.start,
                    format: l.format.clone(),
                    text: l.text.clone(),
                    indent_left: l.indent_mm.map(units::mm_to_twips),
                    hanging: l.hanging_mm.map(units::mm_to_twips),
                })
                .collect();
            doc.numbering.set_levels(id, levels);
        }
        log::debug!("phase {}: {} items", Phase::Numbering, report.numbering);
    }
    if let Some(sections) = &schema.sections {
        while doc.sections.len() < sections.len() {
            doc.add_section();
        }
        for (index, params) in sections.iter().enumerate() {
            let section = doc
                .sections
                .get_mut(index)
                .ok_or_else(|| missing_section(index))
                .map_err(failed(Phase::Sections, format!("section {}", index)))?;
            params.apply_to(section);
        }
        log::debug!("phase {}: {} items", Phase::Sections, report.sections);
    }
    if let Some(headers_footers) = &schema.headers_footers {
        for (&index, params) in headers_footers {
            let section = doc
                .sections
                .get_mut(index)
                .ok_or_else(|| missing_section(index))
                .map_err(failed(Phase::HeadersFooters, format!("section {}", index)))?;
            set_part(&mut section.header.default, &params.header_text);
            set_part(&mut section.footer.default, &params.footer_text);
            set_part(&mut section.header.first, &params.first_page_header_text);
            set_part(&mut section.footer.first, &params.first_page_footer_text);
        }
        log::debug!(
            "phase {}: {} items",
            Phase::HeadersFooters,
            report.headers_footers
        );
    }
    if options.tables {
        if let Some(tables) = &schema.tables_summary {
            apply_tables(tables, doc)?;
            log::debug!("phase {}: {} items", Phase::Tables, report.tables);
        }
    }

    Ok(report)
}

fn failed(phase: Phase, item: String) -> impl FnOnce(Error) -> Error {
    move |source| Error::PartialApply {
        phase,
        item,
        source: Box::new(source),
    }
}

fn missing_section(index: usize) -> Error {
    Error::UnknownReference(format!("section {}", index))
}

/// An empty string removes the part.
fn set_part(slot: &mut Option<String>, text: &Option<String>) {
    if let Some(text) = text {
        *slot = (!text.is_empty()).then(|| text.clone());
    }
}

fn apply_properties(schema: &ParameterSchema, doc: &mut Document) {
    if let Some(core) = &schema.core_properties {
        doc.core.merge(core);
    }
    if let Some(custom) = &schema.custom_properties {
        for (name, value) in custom {
            doc.custom.insert(name.clone(), value.clone());
        }
    }
    if let Some(variables) = &schema.variables {
        for (name, value) in variables {
            doc.variables.insert(name.clone(), value.clone());
        }
    }
}

fn apply_styles(
    styles: &IndexMap<String, StyleParams>,
    order: &[String],
    doc: &mut Document,
) -> Result<()> {
    for name in order {
        let result = match styles.get(name) {
            Some(params) => apply_style(doc, name, params),
            None => ensure_style(doc, name).map(|_| ()),
        };
        result.map_err(failed(Phase::Styles, format!("style '{}'", name)))?;
    }
    Ok(())
}

/// Write one style entry.
///
/// Groups with an effective counterpart are snapshots: the explicit group is
/// replaced, then the smallest set of extra explicit attributes is written
/// so that the resolved group equals the effective one.
fn apply_style(doc: &mut Document, name: &str, params: &StyleParams) -> Result<()> {
    if doc.styles.by_name(name).is_none() {
        if StyleSheet::builtin_catalog().by_name(name).is_some() {
            ensure_style(doc, name)?;
        } else {
            let id = doc.styles.unique_id(name);
            doc.styles
                .push(StyleDef::new(id, name, params.kind.unwrap_or_default()));
        }
    }

    let base_id = match &params.base_style {
        None => None,
        Some(None) => Some(None),
        Some(Some(base)) => Some(Some(ensure_style(doc, base)?)),
    };
    let font_snapshot = params.effective_font.is_some();
    let para_snapshot = params.effective_paragraph_format.is_some();

    let style = style_mut(doc, name)?;
    if let Some(kind) = params.kind {
        style.kind = kind;
    }
    if let Some(base_id) = base_id {
        style.based_on = base_id;
    }
    if font_snapshot || para_snapshot {
        style.hidden = params.hidden.unwrap_or(false);
        style.num_id = params.numbering_id.clone();
    } else {
        if let Some(hidden) = params.hidden {
            style.hidden = hidden;
        }
        if let Some(num_id) = &params.numbering_id {
            style.num_id = Some(num_id.clone());
        }
    }

    let run = params.font.as_ref().map(FontParams::to_run);
    if font_snapshot {
        style.run = run.unwrap_or_default();
    } else if let Some(run) = run {
        style.run.merge(&run);
    }
    let para = params
        .paragraph_format
        .as_ref()
        .map(ParagraphFormatParams::to_para);
    if para_snapshot {
        style.para = para.unwrap_or_default();
    } else if let Some(para) = para {
        style.para.merge(&para);
    }

    if font_snapshot || para_snapshot {
        let resolver = StyleResolver::new(&doc.styles);
        let inherited = match doc.styles.lookup(name).and_then(|entry| entry.base) {
            Some(base) => resolver.effective(&base)?,
            None => resolver.root(),
        };
        let style = style_mut(doc, name)?;
        if let Some(wanted) = &params.effective_font {
            let wanted = wanted.to_run();
            let (own, from) = (&mut style.run, &inherited.run);
            settle(&mut own.font, &from.font, &wanted.font);
            settle(&mut own.size, &from.size, &wanted.size);
            settle(&mut own.bold, &from.bold, &wanted.bold);
            settle(&mut own.italic, &from.italic, &wanted.italic);
            settle(&mut own.underline, &from.underline, &wanted.underline);
            settle(&mut own.color, &from.color, &wanted.color);
        }
        if let Some(wanted) = &params.effective_paragraph_format {
            let wanted = wanted.to_para();
            let (own, from) = (&mut style.para, &inherited.para);
            settle(&mut own.alignment, &from.alignment, &wanted.alignment);
            settle(&mut own.space_before, &from.space_before, &wanted.space_before);
            settle(&mut own.space_after, &from.space_after, &wanted.space_after);
            settle(&mut own.line, &from.line, &wanted.line);
            settle(&mut own.indent_left, &from.indent_left, &wanted.indent_left);
            settle(&mut own.indent_right, &from.indent_right, &wanted.indent_right);
            settle(
                &mut own.indent_first_line,
                &from.indent_first_line,
                &wanted.indent_first_line,
            );
        }
    }
    Ok(())
}

/// Set `own` explicitly when the value it resolves to differs from `wanted`.
fn settle<T: Clone + PartialEq>(own: &mut Option<T>, inherited: &Option<T>, wanted: &Option<T>) {
    if wanted.is_none() {
        return;
    }
    let resolved = if own.is_some() { own.as_ref() } else { inherited.as_ref() };
    if resolved != wanted.as_ref() {
        *own = wanted.clone();
    }
}

fn style_mut<'a>(doc: &'a mut Document, name: &str) -> Result<&'a mut StyleDef> {
    doc.styles
        .by_name_mut(name)
        .ok_or_else(|| Error::UnknownReference(format!("style '{}'", name)))
}

/// Id of the named style, copying it from the built-in catalog (bases
/// first) when the document does not have it yet.
pub(crate) fn ensure_style(doc: &mut Document, name: &str) -> Result<String> {
    if let Some(style) = doc.styles.by_name(name) {
        return Ok(style.id.clone());
    }
    let builtins = StyleSheet::builtin_catalog();
    let template = builtins
        .by_name(name)
        .ok_or_else(|| Error::UnknownReference(format!("style '{}'", name)))?;

    let mut style = template.clone();
    if let Some(base_id) = &template.based_on {
        let base_name = builtins.name_of(base_id).unwrap_or(base_id);
        style.based_on = Some(ensure_style(doc, base_name)?);
    }
    if doc.styles.by_id(&style.id).is_some() {
        style.id = doc.styles.unique_id(name);
    }
    if style.is_default && doc.styles.default_id(style.kind).is_some() {
        style.is_default = false;
    }
    if let Some(num_id) = style.num_id.clone() {
        if !doc.numbering.contains(&num_id) {
            match Numbering::builtin().levels(&num_id) {
                Some(levels) => doc.numbering.set_levels(&num_id, levels.to_vec()),
                None => style.num_id = None,
            }
        }
    }

    log::debug!("materialised built-in style '{}' as '{}'", name, style.id);
    let id = style.id.clone();
    doc.styles.push(style);
    Ok(id)
}

fn apply_tables(tables: &[crate::schema::TableSummary], doc: &mut Document) -> Result<()> {
    let existing = doc.table_count();
    for (index, summary) in tables.iter().enumerate() {
        let item = format!("table {}", index);
        let style_id = summary
            .style
            .as_deref()
            .map(|name| ensure_style(doc, name))
            .transpose()
            .map_err(failed(Phase::Tables, item.clone()))?;

        if index >= existing {
            doc.push_table(Table::new(summary.row_count, summary.column_count));
        }
        let table = doc
            .tables_mut()
            .nth(index)
            .ok_or_else(|| Error::UnknownReference(item.clone()))
            .map_err(failed(Phase::Tables, item.clone()))?;
        table.resize(summary.row_count, summary.column_count);
        if style_id.is_some() {
            table.style_id = style_id;
        }
        if let Some(cells) = &summary.cells {
            for (row, texts) in table.rows.iter_mut().zip(cells) {
                for (cell, text) in row.iter_mut().zip(texts) {
                    cell.set_text(text);
                }
            }
        }
    }
    Ok(())
}

fn plan(schema: &ParameterSchema, doc: &Document, options: &ApplyOptions) -> Result<Plan> {
    if let Some(custom) = &schema.custom_properties {
        if custom.keys().any(|k| k.trim().is_empty()) {
            return Err(Error::validation("custom property names must not be empty"));
        }
    }
    if let Some(variables) = &schema.variables {
        if variables.keys().any(|k| k.trim().is_empty()) {
            return Err(Error::validation("variable names must not be empty"));
        }
    }

    if let Some(defaults) = &schema.document_defaults {
        if let Some(font) = &defaults.font {
            validate_font("document defaults", font)?;
        }
        if let Some(format) = &defaults.paragraph_format {
            validate_format("document defaults", format)?;
        }
    }

    let style_order = match &schema.styles {
        Some(styles) => plan_styles(schema, styles, doc)?,
        None => Vec::new(),
    };

    if let Some(numbering) = &schema.numbering {
        for (id, params) in numbering {
            validate_levels(id, &params.levels)?;
        }
    }

    if let Some(sections) = &schema.sections {
        for (index, section) in sections.iter().enumerate() {
            for (field, value) in [
                ("page_width_mm", section.page_width_mm),
                ("page_height_mm", section.page_height_mm),
            ] {
                if let Some(value) = value {
                    if !value.is_finite() || units::mm_to_twips(value) <= 0 {
                        return Err(Error::validation(format!(
                            "section {}: {} must be at least one twip, got {}",
                            index, field, value
                        )));
                    }
                }
            }
            if let Some(margins) = &section.margins {
                for (field, value) in margins.values() {
                    if !value.is_finite() {
                        return Err(Error::validation(format!(
                            "section {}: {} is not a number",
                            index, field
                        )));
                    }
                }
            }
        }
    }

    if let Some(headers_footers) = &schema.headers_footers {
        let available = doc
            .sections
            .len()
            .max(schema.sections.as_ref().map_or(0, |s| s.len()));
        if let Some(index) = headers_footers.keys().find(|&&i| i >= available) {
            return Err(Error::validation(format!(
                "headers_footers refers to section {} but the document has {} sections",
                index, available
            )));
        }
    }

    if options.tables {
        if let Some(tables) = &schema.tables_summary {
            for (index, summary) in tables.iter().enumerate() {
                if let Some(style) = &summary.style {
                    let known = doc.styles.by_name(style).is_some()
                        || schema.styles.as_ref().is_some_and(|s| s.contains_key(style))
                        || StyleSheet::builtin_catalog().by_name(style).is_some();
                    if !known {
                        return Err(Error::UnknownReference(format!(
                            "style '{}' of table {}",
                            style, index
                        )));
                    }
                }
                if let Some(cells) = &summary.cells {
                    let fits = cells.len() <= summary.row_count
                        && cells.iter().all(|row| row.len() <= summary.column_count);
                    if !fits {
                        return Err(Error::validation(format!(
                            "table {}: cell text does not fit {}x{}",
                            index, summary.row_count, summary.column_count
                        )));
                    }
                }
            }
        }
    }

    Ok(Plan { style_order })
}

/// Validate the style map and order it so that every base comes first.
fn plan_styles(
    schema: &ParameterSchema,
    styles: &IndexMap<String, StyleParams>,
    doc: &Document,
) -> Result<Vec<String>> {
    let overlay =
        Overlay::new(styles, &doc.styles).with_defaults(schema.document_defaults.as_ref());
    let resolver = StyleResolver::new(&overlay);
    let mut order: IndexSet<String> = IndexSet::new();

    for (name, params) in styles {
        if name.trim().is_empty() {
            return Err(Error::validation("style names must not be empty"));
        }
        let owner = format!("style '{}'", name);
        for font in [&params.font, &params.effective_font].into_iter().flatten() {
            validate_font(&owner, font)?;
        }
        for format in [&params.paragraph_format, &params.effective_paragraph_format]
            .into_iter()
            .flatten()
        {
            validate_format(&owner, format)?;
        }
        if let Some(num_id) = &params.numbering_id {
            let known = doc.numbering.contains(num_id)
                || schema.numbering.as_ref().is_some_and(|n| n.contains_key(num_id));
            if !known {
                return Err(Error::UnknownReference(format!(
                    "numbering '{}' of style '{}'",
                    num_id, name
                )));
            }
        }

        let chain = resolver.chain(name)?;
        for (link, _) in chain.iter().rev() {
            if styles.contains_key(link) || doc.styles.by_name(link).is_none() {
                order.insert(link.clone());
            }
        }
    }
    Ok(order.into_iter().collect())
}

fn validate_font(owner: &str, font: &FontParams) -> Result<()> {
    if let Some(size) = font.size_pt {
        if !size.is_finite() || size > MAX_FONT_SIZE_PT || units::pt_to_half_points(size) < 1 {
            return Err(Error::validation(format!(
                "{}: font size {} pt is outside [0.5, {}]",
                owner, size, MAX_FONT_SIZE_PT
            )));
        }
    }
    if let Some(name) = &font.name {
        if name.trim().is_empty() {
            return Err(Error::validation(format!(
                "{}: font name must not be empty",
                owner
            )));
        }
    }
    if let Some(color) = &font.color {
        let hex = normalize_color(color);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::validation(format!(
                "{}: color '{}' is not a six-digit hex value",
                owner, color
            )));
        }
    }
    Ok(())
}

fn validate_format(owner: &str, format: &ParagraphFormatParams) -> Result<()> {
    let rules: [(&str, Option<f64>, fn(f64) -> i32); 3] = [
        ("line_spacing", format.line_spacing, units::multiple_to_line),
        ("line_spacing_pt", format.line_spacing_pt, units::pt_to_twips),
        ("line_spacing_at_least_pt", format.line_spacing_at_least_pt, units::pt_to_twips),
    ];
    if rules.iter().filter(|(_, value, _)| value.is_some()).count() > 1 {
        return Err(Error::validation(format!(
            "{}: line_spacing, line_spacing_pt and line_spacing_at_least_pt are mutually exclusive",
            owner
        )));
    }
    for (field, value, to_stored) in rules {
        if let Some(value) = value {
            // must survive conversion to container units
            if !value.is_finite() || to_stored(value) <= 0 {
                return Err(Error::validation(format!(
                    "{}: {} must be positive, got {}",
                    owner, field, value
                )));
            }
        }
    }
    for (field, value) in [
        ("space_before_pt", format.space_before_pt),
        ("space_after_pt", format.space_after_pt),
    ] {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::validation(format!(
                    "{}: {} must not be negative",
                    owner, field
                )));
            }
        }
    }
    for value in [
        format.first_line_indent_mm,
        format.left_indent_mm,
        format.right_indent_mm,
    ]
    .into_iter()
    .flatten()
    {
        if !value.is_finite() {
            return Err(Error::validation(format!(
                "{}: indent is not a number",
                owner
            )));
        }
    }
    Ok(())
}

fn validate_levels(id: &str, levels: &[crate::schema::LevelParams]) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::validation("numbering ids must not be empty"));
    }
    let mut seen = HashSet::new();
    for level in levels {
        if level.level > MAX_LIST_LEVEL {
            return Err(Error::validation(format!(
                "numbering '{}': level {} is deeper than {}",
                id, level.level, MAX_LIST_LEVEL
            )));
        }
        if !seen.insert(level.level) {
            return Err(Error::validation(format!(
                "numbering '{}': level {} is declared twice",
                id, level.level
            )));
        }
        if level.format.trim().is_empty() {
            return Err(Error::validation(format!(
                "numbering '{}': level {} has no format",
                id, level.level
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomValue, Orientation, Paragraph};

    fn schema(json: &str) -> ParameterSchema {
        ParameterSchema::from_json(json).unwrap()
    }

    #[test]
    fn test_new_style_on_builtin_base() {
        let mut doc = Document::new();
        let report = apply(
            &schema(r#"{"styles": {"Body": {"base_style": "Normal", "font": {"bold": true}}}}"#),
            &mut doc,
            &ApplyOptions::default(),
        )
        .unwrap();
        assert_eq!(report.styles, 1);
        let body = doc.styles.by_name("Body").unwrap();
        assert_eq!(body.based_on.as_deref(), Some("Normal"));
        assert_eq!(body.run.bold, Some(true));
    }

    #[test]
    fn test_partial_font_update_keeps_other_attributes() {
        let mut doc = Document::new();
        apply(
            &schema(r#"{"styles": {"Normal": {"font": {"bold": true}}}}"#),
            &mut doc,
            &ApplyOptions::default(),
        )
        .unwrap();
        let normal = doc.styles.by_name("Normal").unwrap();
        assert_eq!(normal.run.font.as_deref(), Some("Calibri"));
        assert_eq!(normal.run.bold, Some(true));
    }

    #[test]
    fn test_bases_are_created_first() {
        let mut doc = Document::new();
        let s = schema(
            r#"{"styles": {
                "Child": {"base_style": "Parent", "font": {"italic": true}},
                "Parent": {"base_style": null, "font": {"size_pt": 9}}
            }}"#,
        );
        apply(&s, &mut doc, &ApplyOptions::default()).unwrap();
        let parent_id = doc.styles.by_name("Parent").unwrap().id.clone();
        assert_eq!(
            doc.styles.by_name("Child").unwrap().based_on.as_deref(),
            Some(parent_id.as_str())
        );
        let effective = StyleResolver::new(&doc.styles).effective("Child").unwrap();
        assert_eq!(effective.run.size, Some(18));
    }

    #[test]
    fn test_unknown_base_leaves_document_untouched() {
        let mut doc = Document::new();
        let before = doc.clone();
        let err = apply(
            &schema(
                r#"{"core_properties": {"title": "T"},
                    "styles": {"Body": {"base_style": "Missing"}}}"#,
            ),
            &mut doc,
            &ApplyOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownBaseStyle { ref base, .. } if base == "Missing"));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_cycle_aborts_before_mutation() {
        let mut doc = Document::new();
        let before = doc.clone();
        let err = apply(
            &schema(
                r#"{"variables": {"a": "1"},
                    "styles": {"X": {"base_style": "Y"}, "Y": {"base_style": "X"}}}"#,
            ),
            &mut doc,
            &ApplyOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::CyclicInheritance { .. }));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_materialises_missing_builtin_base() {
        let mut doc = Document::new();
        doc.styles.styles.retain(|s| s.name != "Quote");
        apply(
            &schema(r#"{"styles": {"Pull Quote": {"base_style": "Quote"}}}"#),
            &mut doc,
            &ApplyOptions::default(),
        )
        .unwrap();
        let quote = doc.styles.by_name("Quote").unwrap();
        assert_eq!(quote.run.italic, Some(true));
        assert_eq!(
            doc.styles.by_name("Pull Quote").unwrap().based_on.as_deref(),
            Some(quote.id.as_str())
        );
    }

    #[test]
    fn test_snapshot_writes_minimal_overrides() {
        let mut doc = Document::new();
        // Normal in the target is 11 pt; the snapshot says 14 pt effective
        apply(
            &schema(
                r#"{"styles": {"Heading 4": {
                    "base_style": "Normal",
                    "font": {"bold": false},
                    "effective_font": {"name": "Calibri", "size_pt": 14, "bold": false}
                }}}"#,
            ),
            &mut doc,
            &ApplyOptions::default(),
        )
        .unwrap();
        let heading = doc.styles.by_name("Heading 4").unwrap();
        assert_eq!(heading.run.size, Some(28));
        assert_eq!(heading.run.font, None);
        assert_eq!(heading.run.bold, Some(false));
        assert_eq!(heading.run.italic, None);
        assert_eq!(heading.run.color, None);
    }

    #[test]
    fn test_sections_grow_and_margins_set() {
        let mut doc = Document::new();
        doc.push_paragraph(Paragraph::with_text("body"));
        apply(
            &schema(
                r#"{"sections": [
                    {"margins": {"top_mm": 15, "bottom_mm": 15, "left_mm": 20, "right_mm": 20}},
                    {"orientation": "landscape", "page_width_mm": 279.4, "page_height_mm": 215.9}
                ]}"#,
            ),
            &mut doc,
            &ApplyOptions::default(),
        )
        .unwrap();
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].margins.top, 850);
        assert_eq!(doc.sections[1].orientation, Orientation::Landscape);
        assert_eq!(doc.sections[1].margins.left, 1440);
    }

    #[test]
    fn test_header_index_out_of_range() {
        let mut doc = Document::new();
        let err = apply(
            &schema(r#"{"headers_footers": {"3": {"header_text": "H"}}}"#),
            &mut doc,
            &ApplyOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_header_index_counts_new_sections() {
        let mut doc = Document::new();
        apply(
            &schema(
                r#"{"sections": [{}, {}],
                    "headers_footers": {"1": {"header_text": "Second", "footer_text": ""}}}"#,
            ),
            &mut doc,
            &ApplyOptions::default(),
        )
        .unwrap();
        assert_eq!(doc.sections[1].header.default.as_deref(), Some("Second"));
        assert_eq!(doc.sections[1].footer.default, None);
    }

    #[test]
    fn test_tables_resize_and_append() {
        let mut doc = Document::new();
        doc.push_table(Table::new(1, 1));
        apply(
            &schema(
                r#"{"tables_summary": [
                    {"row_count": 2, "column_count": 3, "style": "Table Grid"},
                    {"row_count": 1, "column_count": 2, "cells": [["a", "b"]]}
                ]}"#,
            ),
            &mut doc,
            &ApplyOptions::default(),
        )
        .unwrap();
        let tables: Vec<&Table> = doc.tables().collect();
        assert_eq!(tables.len(), 2);
        assert_eq!((tables[0].row_count(), tables[0].column_count()), (2, 3));
        assert_eq!(tables[0].style_id.as_deref(), Some("TableGrid"));
        assert_eq!(tables[1].cell_text(), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_tables_phase_can_be_disabled() {
        let mut doc = Document::new();
        let report = apply(
            &schema(r#"{"tables_summary": [{"row_count": 1, "column_count": 1}]}"#),
            &mut doc,
            &ApplyOptions::new().with_tables(false),
        )
        .unwrap();
        assert_eq!(report.tables, 0);
        assert_eq!(doc.table_count(), 0);
    }

    #[test]
    fn test_dangling_references() {
        let doc = Document::new();
        let options = ApplyOptions::default();
        let err = validate(
            &schema(r#"{"styles": {"Steps": {"numbering_id": "42"}}}"#),
            &doc,
            &options,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownReference(_)));

        let err = validate(
            &schema(r#"{"tables_summary": [{"row_count": 1, "column_count": 1, "style": "Fancy"}]}"#),
            &doc,
            &options,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownReference(_)));

        validate(
            &schema(
                r#"{"numbering": {"42": {"levels": [{"level": 0, "format": "decimal"}]}},
                    "styles": {"Steps": {"numbering_id": "42"}}}"#,
            ),
            &doc,
            &options,
        )
        .unwrap();
    }

    #[test]
    fn test_value_checks() {
        let doc = Document::new();
        let options = ApplyOptions::default();
        for json in [
            r#"{"styles": {"Normal": {"font": {"size_pt": 0}}}}"#,
            r#"{"styles": {"Normal": {"font": {"color": "blue"}}}}"#,
            r#"{"styles": {"Normal": {"paragraph_format": {"line_spacing": 1.0, "line_spacing_pt": 12}}}}"#,
            r#"{"numbering": {"9": {"levels": [{"level": 9, "format": "decimal"}]}}}"#,
            r#"{"numbering": {"9": {"levels": [{"level": 0, "format": ""}]}}}"#,
            r#"{"sections": [{"page_width_mm": -1}]}"#,
            r#"{"tables_summary": [{"row_count": 1, "column_count": 1, "cells": [["a", "b"]]}]}"#,
            r#"{"styles": {"Normal": {"paragraph_format": {"line_spacing_pt": 12, "line_spacing_at_least_pt": 12}}}}"#,
            r#"{"document_defaults": {"font": {"color": "blue"}}}"#,
        ] {
            let err = validate(&schema(json), &doc, &options).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{json}: {err}");
        }
    }

    #[test]
    fn test_values_that_round_to_zero_are_rejected() {
        let doc = Document::new();
        let options = ApplyOptions::default();
        for json in [
            r#"{"styles": {"Normal": {"font": {"size_pt": 0.2}}}}"#,
            r#"{"styles": {"Normal": {"effective_font": {"size_pt": 0.1}}}}"#,
            r#"{"document_defaults": {"font": {"size_pt": 0.2}}}"#,
            r#"{"styles": {"Normal": {"paragraph_format": {"line_spacing_pt": 0.01}}}}"#,
            r#"{"styles": {"Normal": {"paragraph_format": {"line_spacing": 0.001}}}}"#,
            r#"{"sections": [{"page_width_mm": 0.005}]}"#,
            r#"{"sections": [{"page_height_mm": 0.005}]}"#,
        ] {
            let err = validate(&schema(json), &doc, &options).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{json}: {err}");
        }

        let mut doc = Document::new();
        apply(
            &schema(
                r#"{"styles": {"Normal": {"font": {"size_pt": 0.5}}},
                    "sections": [{"page_width_mm": 0.1}]}"#,
            ),
            &mut doc,
            &options,
        )
        .unwrap();
        assert_eq!(doc.styles.by_name("Normal").unwrap().run.size, Some(1));
        assert_eq!(doc.sections[0].page_width, 6);
    }

    #[test]
    fn test_document_defaults_applied_before_styles() {
        let mut doc = Document::new();
        let report = apply(
            &schema(
                r#"{"document_defaults": {"font": {"name": "Cambria", "size_pt": 12}},
                    "styles": {"Plain": {
                        "base_style": null,
                        "effective_font": {"name": "Cambria", "size_pt": 12, "bold": true}
                    }}}"#,
            ),
            &mut doc,
            &ApplyOptions::default(),
        )
        .unwrap();
        assert_eq!(report.styles, 2);
        assert_eq!(doc.styles.defaults.run.font.as_deref(), Some("Cambria"));
        assert_eq!(doc.styles.defaults.run.size, Some(24));

        // only what the defaults do not already supply is written
        let plain = doc.styles.by_name("Plain").unwrap();
        assert_eq!(plain.run.font, None);
        assert_eq!(plain.run.size, None);
        assert_eq!(plain.run.bold, Some(true));
    }

    #[test]
    fn test_properties_only_leave_styles_alone() {
        let mut doc = Document::new();
        let styles = doc.styles.clone();
        apply(
            &schema(
                r#"{"core_properties": {"author": "Ana"},
                    "custom_properties": {"Pages": {"type": "number", "value": 3}}}"#,
            ),
            &mut doc,
            &ApplyOptions::default(),
        )
        .unwrap();
        assert_eq!(doc.styles, styles);
        assert_eq!(doc.core.author.as_deref(), Some("Ana"));
        assert_eq!(doc.custom["Pages"], CustomValue::Number(3.0));
    }

    #[test]
    fn test_dry_run_does_not_mutate() {
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
    fn test_partial_apply_reports_phase() {
        let err = failed(Phase::Tables, "table 0".into())(Error::validation("boom"));
        match err {
            Error::PartialApply { phase, item, .. } => {
                assert_eq!(phase, Phase::Tables);
                assert_eq!(item, "table 0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
