//! Document to parameter schema.

use crate::error::Result;
use crate::model::{Block, Document, Paragraph, StyleDef, StyleKind, StyleSheet};
use crate::resolve::StyleResolver;
use crate::schema::{
    Category, DefaultsParams, FontParams, HeaderFooterParams, LevelParams, NumberingParams,
    ParagraphFormatParams, ParameterSchema, SectionParams, StyleParams, TableSummary,
};
use crate::units;
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Which schema sections to populate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    /// Every category
    #[default]
    Full,
    /// Only the listed categories
    Only(Vec<Category>),
}

impl Scope {
    pub fn includes(&self, category: Category) -> bool {
        match self {
            Scope::Full => true,
            Scope::Only(categories) => categories.contains(&category),
        }
    }
}

/// Options for extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub scope: Scope,

    /// Only report styles that content refers to, plus their ancestors
    pub compact: bool,

    /// Report the complete built-in catalog as well; wins over `compact`
    pub all_styles: bool,

    /// Report table cell text
    pub include_cell_text: bool,

    /// Report inherited attributes next to explicit ones
    pub include_effective: bool,

    /// Leave out hidden styles that content does not use
    pub skip_hidden: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            scope: Scope::Full,
            compact: false,
            all_styles: false,
            include_cell_text: false,
            include_effective: true,
            skip_hidden: false,
        }
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict extraction to the given categories.
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.scope = Scope::Only(categories.into_iter().collect());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn with_all_styles(mut self, all_styles: bool) -> Self {
        self.all_styles = all_styles;
        self
    }

    pub fn with_cell_text(mut self, include: bool) -> Self {
        self.include_cell_text = include;
        self
    }

    pub fn with_effective(mut self, include: bool) -> Self {
        self.include_effective = include;
        self
    }

    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }
}

/// Extract the parameter schema of a document.
///
/// The document is only read. Sections, tables and list definitions come out
/// in document order, maps in first-seen order.
///
/// # Example
///
/// ```
/// use docparam::{extract, Document, ExtractOptions};
///
/// let doc = Document::new();
/// let schema = extract(&doc, &ExtractOptions::new().with_compact(true))?;
/// assert!(schema.styles.is_some());
/// # Ok::<(), docparam::Error>(())
/// ```
pub fn extract(doc: &Document, options: &ExtractOptions) -> Result<ParameterSchema> {
    let scope = &options.scope;
    let mut schema = ParameterSchema::default();

    if scope.includes(Category::CoreProperties) {
        schema.core_properties = Some(doc.core.clone());
    }
    if scope.includes(Category::CustomProperties) {
        schema.custom_properties = Some(doc.custom.clone());
    }
    if scope.includes(Category::Variables) {
        schema.variables = Some(doc.variables.clone());
    }
    if scope.includes(Category::Sections) {
        schema.sections = Some(doc.sections.iter().map(SectionParams::from_section).collect());
    }
    if scope.includes(Category::Styles) {
        schema.document_defaults = Some(DefaultsParams::from_defaults(&doc.styles.defaults));
        schema.styles = Some(extract_styles(doc, options)?);
    }
    if scope.includes(Category::Numbering) {
        schema.numbering = Some(extract_numbering(doc));
    }
    if scope.includes(Category::HeadersFooters) {
        schema.headers_footers = Some(extract_headers_footers(doc));
    }
    if scope.includes(Category::TablesSummary) {
        schema.tables_summary = Some(extract_tables(doc, options.include_cell_text));
    }

    log::debug!("extracted {} categories", schema.categories().len());
    Ok(schema)
}

/// Style catalog by name.
fn extract_styles(
    doc: &Document,
    options: &ExtractOptions,
) -> Result<IndexMap<String, StyleParams>> {
    let sheet = &doc.styles;
    let resolver = StyleResolver::new(sheet);
    let used = used_style_names(doc);

    let candidates: Vec<(&StyleDef, &StyleSheet)> = if options.all_styles {
        let builtins = StyleSheet::builtin_catalog();
        let missing = builtins
            .styles
            .iter()
            .filter(|s| sheet.by_name(&s.name).is_none())
            .map(|s| (s, builtins));
        sheet.styles.iter().map(|s| (s, sheet)).chain(missing).collect()
    } else if options.compact {
        let mut keep: IndexSet<String> = IndexSet::new();
        for name in &used {
            keep.insert(name.clone());
            keep.extend(resolver.ancestors(name)?);
        }
        let mut selected: Vec<(&StyleDef, &StyleSheet)> = Vec::new();
        for name in &keep {
            if let Some(style) = sheet.by_name(name) {
                selected.push((style, sheet));
            } else if let Some(style) = StyleSheet::builtin_catalog().by_name(name) {
                selected.push((style, StyleSheet::builtin_catalog()));
            }
        }
        // catalog order rather than discovery order
        selected.sort_by_key(|(style, owner)| {
            let position = owner.styles.iter().position(|s| s.id == style.id);
            (!std::ptr::eq(*owner, sheet), position)
        });
        selected
    } else {
        sheet.styles.iter().map(|s| (s, sheet)).collect()
    };

    let mut styles = IndexMap::new();
    for (style, owner) in candidates {
        if options.skip_hidden && style.hidden && !used.contains(&style.name) {
            continue;
        }
        let base = style.based_on.as_deref().map(|id| {
            owner
                .name_of(id)
                .or_else(|| sheet.name_of(id))
                .unwrap_or(id)
                .to_string()
        });
        let mut params = StyleParams {
            kind: Some(style.kind),
            base_style: Some(base),
            font: (!style.run.is_empty()).then(|| FontParams::from_run(&style.run)),
            paragraph_format: (!style.para.is_empty())
                .then(|| ParagraphFormatParams::from_para(&style.para)),
            numbering_id: style.num_id.clone(),
            hidden: style.hidden.then_some(true),
            effective_font: None,
            effective_paragraph_format: None,
        };
        if options.include_effective {
            let effective = resolver.effective(&style.name)?;
            params.effective_font = Some(FontParams::from_run(&effective.run));
            params.effective_paragraph_format =
                Some(ParagraphFormatParams::from_para(&effective.para));
        }
        styles.insert(style.name.clone(), params);
    }
    Ok(styles)
}

/// Names of the styles that paragraphs, runs and tables refer to, directly
/// or through the default style of their kind.
pub fn used_style_names(doc: &Document) -> IndexSet<String> {
    let sheet = &doc.styles;
    let mut ids: IndexSet<&str> = IndexSet::new();
    let default_paragraph = sheet.default_id(StyleKind::Paragraph);
    let default_table = sheet.default_id(StyleKind::Table);

    for block in &doc.body {
        match block {
            Block::Paragraph(p) => visit_paragraph(p, default_paragraph, &mut ids),
            Block::Table(t) => {
                if let Some(id) = t.style_id.as_deref().or(default_table) {
                    ids.insert(id);
                }
                for p in t.paragraphs() {
                    visit_paragraph(p, default_paragraph, &mut ids);
                }
            }
        }
    }

    ids.into_iter()
        .filter_map(|id| match sheet.name_of(id) {
            Some(name) => Some(name.to_string()),
            None => {
                log::warn!("content refers to unknown style id '{}'", id);
                None
            }
        })
        .collect()
}

fn visit_paragraph<'a>(p: &'a Paragraph, default: Option<&'a str>, ids: &mut IndexSet<&'a str>) {
    if let Some(id) = p.style_id.as_deref().or(default) {
        ids.insert(id);
    }
    ids.extend(p.runs.iter().filter_map(|r| r.style_id.as_deref()));
}

fn extract_numbering(doc: &Document) -> IndexMap<String, NumberingParams> {
    doc.numbering
        .instances
        .iter()
        .filter_map(|instance| {
            let levels = doc.numbering.levels(&instance.num_id)?;
            let levels = levels
                .iter()
                .map(|l| LevelParams {
                    level: l.level,
                    format: l.format.clone(),
                    text: l.text.clone(),
                    start: l.start,
                    indent_mm: l.indent_left.map(units::twips_to_mm),
                    hanging_mm: l.hanging.map(units::twips_to_mm),
                })
                .collect();
            Some((instance.num_id.clone(), NumberingParams { levels }))
        })
        .collect()
}

fn extract_headers_footers(doc: &Document) -> IndexMap<usize, HeaderFooterParams> {
    doc.sections
        .iter()
        .enumerate()
        .filter_map(|(index, section)| {
            let params = HeaderFooterParams {
                header_text: section.header.default.clone(),
                footer_text: section.footer.default.clone(),
                first_page_header_text: section.header.first.clone(),
                first_page_footer_text: section.footer.first.clone(),
            };
            (!params.is_empty()).then_some((index, params))
        })
        .collect()
}

fn extract_tables(doc: &Document, include_cell_text: bool) -> Vec<TableSummary> {
    doc.tables()
        .map(|table| {
            let column_count = table.column_count();
            let cells = include_cell_text.then(|| {
                table
                    .cell_text()
                    .into_iter()
                    .map(|mut row| {
                        row.resize(column_count, String::new());
                        row
                    })
                    .collect()
            });
            TableSummary {
                row_count: table.row_count(),
                column_count,
                style: table
                    .style_id
                    .as_deref()
                    .map(|id| doc.styles.name_of(id).unwrap_or(id).to_string()),
                cells,
            }
        })
        .collect()
}

/// Full extraction result with provenance, as returned to callers.
///
/// The schema is flattened into the envelope, so the whole envelope is
/// itself an applicable [`ParameterSchema`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    pub extraction_timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub parameters: ParameterSchema,
    pub paragraphs_count: usize,
    pub tables_count: usize,
}

impl Extraction {
    /// Extract a document and wrap the result.
    pub fn run(
        doc: &Document,
        source_file: Option<String>,
        options: &ExtractOptions,
    ) -> Result<Self> {
        Ok(Self {
            source_file,
            extraction_timestamp: Utc::now(),
            parameters: extract(doc, options)?,
            paragraphs_count: doc.paragraph_count(),
            tables_count: doc.table_count(),
        })
    }
}
