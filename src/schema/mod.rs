//! The parameter schema: a serializable description of a document's
//! formatting, shared by extraction and application.
//!
//! Every top-level section is optional. During extraction an absent section
//! was not requested; during application it is left untouched. Lengths are
//! in millimetres (`*_mm`) and font metrics in points (`*_pt`).

use crate::error::Result;
use crate::model::{
    Alignment, CoreProperties, CustomProperties, DocDefaults, LineSpacing, Orientation, ParaProps,
    RunProps, SectionProps, StyleKind, Variables,
};
use crate::units;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// The parameter tree.
///
/// Unknown top-level keys are ignored, so an extraction envelope can be fed
/// back to [`crate::apply`] as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_properties: Option<CoreProperties>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_properties: Option<CustomProperties>,

    #[serde(
        default,
        alias = "document_variables",
        skip_serializing_if = "Option::is_none"
    )]
    pub variables: Option<Variables>,

    /// Page geometry, one entry per section in physical order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<SectionParams>>,

    /// Style catalog keyed by style name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<IndexMap<String, StyleParams>>,

    /// Formatting every style inherits below its root; part of the styles
    /// category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_defaults: Option<DefaultsParams>,

    /// List definitions keyed by numbering id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering: Option<IndexMap<String, NumberingParams>>,

    /// Header and footer text keyed by section index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers_footers: Option<IndexMap<usize, HeaderFooterParams>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables_summary: Option<Vec<TableSummary>>,
}

impl ParameterSchema {
    /// Parse a schema from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Categories present in this schema, in application order.
    pub fn categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.has(*c))
            .collect()
    }

    /// Whether a category is present.
    pub fn has(&self, category: Category) -> bool {
        match category {
            Category::CoreProperties => self.core_properties.is_some(),
            Category::CustomProperties => self.custom_properties.is_some(),
            Category::Variables => self.variables.is_some(),
            Category::Sections => self.sections.is_some(),
            Category::Styles => self.styles.is_some() || self.document_defaults.is_some(),
            Category::Numbering => self.numbering.is_some(),
            Category::HeadersFooters => self.headers_footers.is_some(),
            Category::TablesSummary => self.tables_summary.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories().is_empty()
    }
}

/// A top-level schema section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CoreProperties,
    CustomProperties,
    Variables,
    Sections,
    Styles,
    Numbering,
    HeadersFooters,
    TablesSummary,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::CoreProperties,
        Category::CustomProperties,
        Category::Variables,
        Category::Sections,
        Category::Styles,
        Category::Numbering,
        Category::HeadersFooters,
        Category::TablesSummary,
    ];

    /// The schema key of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CoreProperties => "core_properties",
            Category::CustomProperties => "custom_properties",
            Category::Variables => "variables",
            Category::Sections => "sections",
            Category::Styles => "styles",
            Category::Numbering => "numbering",
            Category::HeadersFooters => "headers_footers",
            Category::TablesSummary => "tables_summary",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Margins {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gutter_mm: Option<f64>,
}

impl Margins {
    /// Present values with their field names.
    pub(crate) fn values(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("top_mm", self.top_mm),
            ("bottom_mm", self.bottom_mm),
            ("left_mm", self.left_mm),
            ("right_mm", self.right_mm),
            ("header_mm", self.header_mm),
            ("footer_mm", self.footer_mm),
            ("gutter_mm", self.gutter_mm),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
    }
}

/// Page geometry of one section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_width_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_height_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margins: Option<Margins>,
    /// Separate first-page header and footer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub different_first_page: Option<bool>,
}

impl SectionParams {
    /// Describe a section completely.
    pub fn from_section(section: &SectionProps) -> Self {
        let m = &section.margins;
        Self {
            page_width_mm: Some(units::twips_to_mm(section.page_width)),
            page_height_mm: Some(units::twips_to_mm(section.page_height)),
            orientation: Some(section.orientation),
            margins: Some(Margins {
                top_mm: Some(units::twips_to_mm(m.top)),
                bottom_mm: Some(units::twips_to_mm(m.bottom)),
                left_mm: Some(units::twips_to_mm(m.left)),
                right_mm: Some(units::twips_to_mm(m.right)),
                header_mm: Some(units::twips_to_mm(m.header)),
                footer_mm: Some(units::twips_to_mm(m.footer)),
                gutter_mm: Some(units::twips_to_mm(m.gutter)),
            }),
            different_first_page: Some(section.title_page),
        }
    }

    /// Write the present fields onto a section.
    pub fn apply_to(&self, section: &mut SectionProps) {
        if let Some(width) = self.page_width_mm {
            section.page_width = units::mm_to_twips(width);
        }
        if let Some(height) = self.page_height_mm {
            section.page_height = units::mm_to_twips(height);
        }
        if let Some(orientation) = self.orientation {
            section.orientation = orientation;
        }
        if let Some(margins) = &self.margins {
            let m = &mut section.margins;
            let fields = [
                (margins.top_mm, &mut m.top),
                (margins.bottom_mm, &mut m.bottom),
                (margins.left_mm, &mut m.left),
                (margins.right_mm, &mut m.right),
                (margins.header_mm, &mut m.header),
                (margins.footer_mm, &mut m.footer),
                (margins.gutter_mm, &mut m.gutter),
            ];
            for (value, field) in fields {
                if let Some(mm) = value {
                    *field = units::mm_to_twips(mm);
                }
            }
        }
        if let Some(first) = self.different_first_page {
            section.title_page = first;
        }
    }
}

/// Character formatting of a style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_pt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    /// RGB hex (`"1F3864"`, a leading `#` is accepted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl FontParams {
    pub fn from_run(run: &RunProps) -> Self {
        Self {
            name: run.font.clone(),
            size_pt: run.size.map(units::half_points_to_pt),
            bold: run.bold,
            italic: run.italic,
            underline: run.underline,
            color: run.color.clone(),
        }
    }

    /// Container form; colours are normalised to upper-case hex.
    pub fn to_run(&self) -> RunProps {
        RunProps {
            font: self.name.clone(),
            size: self.size_pt.map(units::pt_to_half_points),
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            color: self.color.as_deref().map(normalize_color),
        }
    }
}

/// Strip a leading `#` and upper-case a hex colour.
pub fn normalize_color(color: &str) -> String {
    color.trim().trim_start_matches('#').to_ascii_uppercase()
}

/// Paragraph formatting of a style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParagraphFormatParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    /// Proportional line spacing (1.0 = single)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f64>,
    /// Exact line spacing in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_spacing_pt: Option<f64>,
    /// Minimum line spacing in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_spacing_at_least_pt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_before_pt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_after_pt: Option<f64>,
    /// Negative values are hanging indents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_line_indent_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_indent_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_indent_mm: Option<f64>,
}

impl ParagraphFormatParams {
    pub fn from_para(para: &ParaProps) -> Self {
        let (line_spacing, line_spacing_pt, line_spacing_at_least_pt) = match para.line {
            Some(LineSpacing::Multiple(line)) => (Some(units::line_to_multiple(line)), None, None),
            Some(LineSpacing::Exact(twips)) => (None, Some(units::twips_to_pt(twips)), None),
            Some(LineSpacing::AtLeast(twips)) => (None, None, Some(units::twips_to_pt(twips))),
            None => (None, None, None),
        };
        Self {
            alignment: para.alignment,
            line_spacing,
            line_spacing_pt,
            line_spacing_at_least_pt,
            space_before_pt: para.space_before.map(units::twips_to_pt),
            space_after_pt: para.space_after.map(units::twips_to_pt),
            first_line_indent_mm: para.indent_first_line.map(units::twips_to_mm),
            left_indent_mm: para.indent_left.map(units::twips_to_mm),
            right_indent_mm: para.indent_right.map(units::twips_to_mm),
        }
    }

    pub fn to_para(&self) -> ParaProps {
        let line = match (
            self.line_spacing,
            self.line_spacing_pt,
            self.line_spacing_at_least_pt,
        ) {
            (Some(multiple), _, _) => {
                Some(LineSpacing::Multiple(units::multiple_to_line(multiple)))
            }
            (None, Some(pt), _) => Some(LineSpacing::Exact(units::pt_to_twips(pt))),
            (None, None, Some(pt)) => Some(LineSpacing::AtLeast(units::pt_to_twips(pt))),
            (None, None, None) => None,
        };
        ParaProps {
            alignment: self.alignment,
            space_before: self.space_before_pt.map(units::pt_to_twips),
            space_after: self.space_after_pt.map(units::pt_to_twips),
            line,
            indent_left: self.left_indent_mm.map(units::mm_to_twips),
            indent_right: self.right_indent_mm.map(units::mm_to_twips),
            indent_first_line: self.first_line_indent_mm.map(units::mm_to_twips),
        }
    }
}

/// Document defaults (`w:docDefaults`), the implicit root of every style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_format: Option<ParagraphFormatParams>,
}

impl DefaultsParams {
    /// Report the set groups of container defaults.
    pub fn from_defaults(defaults: &DocDefaults) -> Self {
        Self {
            font: (!defaults.run.is_empty()).then(|| FontParams::from_run(&defaults.run)),
            paragraph_format: (!defaults.para.is_empty())
                .then(|| ParagraphFormatParams::from_para(&defaults.para)),
        }
    }

    /// Lay the present attributes over existing defaults.
    pub fn merge_into(&self, defaults: &mut DocDefaults) {
        if let Some(font) = &self.font {
            defaults.run.merge(&font.to_run());
        }
        if let Some(format) = &self.paragraph_format {
            defaults.para.merge(&format.to_para());
        }
    }
}

/// One style of the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleParams {
    /// Style type; new styles default to paragraph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<StyleKind>,

    /// Absent: unchanged. `null`: root style. String: base style name.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub base_style: Option<Option<String>>,

    /// Explicitly set character attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontParams>,

    /// Explicitly set paragraph attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_format: Option<ParagraphFormatParams>,

    /// Linked numbering definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    /// Computed character attributes after inheritance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_font: Option<FontParams>,

    /// Computed paragraph attributes after inheritance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_paragraph_format: Option<ParagraphFormatParams>,
}

impl StyleParams {
    /// The declared base, flattened: `None` for roots and unchanged links.
    pub fn base_name(&self) -> Option<&str> {
        self.base_style.as_ref().and_then(|b| b.as_deref())
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// One level of a list definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelParams {
    /// Level index, 0 to 8
    pub level: u8,
    /// Number format (`bullet`, `decimal`, `lowerLetter`, ...)
    pub format: String,
    /// Level text such as `%1.`
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_start")]
    pub start: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hanging_mm: Option<f64>,
}

fn default_start() -> u32 {
    1
}

/// A list definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumberingParams {
    pub levels: Vec<LevelParams>,
}

/// Header and footer text of one section. An empty string removes the part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderFooterParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_page_header_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_page_footer_text: Option<String>,
}

impl HeaderFooterParams {
    pub fn is_empty(&self) -> bool {
        *self == HeaderFooterParams::default()
    }
}

/// Structure of one body-level table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSummary {
    pub row_count: usize,
    pub column_count: usize,
    /// Table style name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Cell text, row by row; only present when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cells: Option<Vec<Vec<String>>>,
}
