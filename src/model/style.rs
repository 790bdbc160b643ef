//! Style catalog model.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

/// Style type (paragraph, character, table, numbering).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    #[default]
    Paragraph,
    Character,
    Table,
    Numbering,
}

impl StyleKind {
    /// The `w:type` attribute value.
    pub fn as_ooxml(&self) -> &'static str {
        match self {
            StyleKind::Paragraph => "paragraph",
            StyleKind::Character => "character",
            StyleKind::Table => "table",
            StyleKind::Numbering => "numbering",
        }
    }

    /// Parse a `w:type` attribute value.
    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "paragraph" => Some(StyleKind::Paragraph),
            "character" => Some(StyleKind::Character),
            "table" => Some(StyleKind::Table),
            "numbering" => Some(StyleKind::Numbering),
            _ => None,
        }
    }
}

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
    Distribute,
}

impl Alignment {
    /// The `w:jc` value.
    pub fn as_ooxml(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
            Alignment::Distribute => "distribute",
        }
    }

    /// Parse a `w:jc` value, including the bidi-aware `start`/`end` forms.
    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" => Some(Alignment::Justify),
            "distribute" => Some(Alignment::Distribute),
            _ => None,
        }
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" | "centre" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            "justify" | "both" => Ok(Alignment::Justify),
            "distribute" => Ok(Alignment::Distribute),
            other => Err(format!("unknown alignment '{}'", other)),
        }
    }
}

/// Line spacing as stored in `w:spacing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSpacing {
    /// Proportional spacing in 240ths of a line (`lineRule="auto"`).
    Multiple(i32),
    /// Fixed spacing in twips (`lineRule="exact"`).
    Exact(i32),
    /// Minimum spacing in twips (`lineRule="atLeast"`).
    AtLeast(i32),
}

/// Run-level (character) properties. `None` means "not set at this level".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProps {
    pub font: Option<String>,
    /// Font size in half-points
    pub size: Option<u32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    /// RGB hex, upper case, without `#`
    pub color: Option<String>,
}

impl RunProps {
    /// Merge with another RunProps (other takes precedence).
    pub fn merge(&mut self, other: &RunProps) {
        if other.font.is_some() {
            self.font = other.font.clone();
        }
        if other.size.is_some() {
            self.size = other.size;
        }
        if other.bold.is_some() {
            self.bold = other.bold;
        }
        if other.italic.is_some() {
            self.italic = other.italic;
        }
        if other.underline.is_some() {
            self.underline = other.underline;
        }
        if other.color.is_some() {
            self.color = other.color.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == RunProps::default()
    }
}

/// Paragraph-level properties. Lengths are in twips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParaProps {
    pub alignment: Option<Alignment>,
    pub space_before: Option<i32>,
    pub space_after: Option<i32>,
    pub line: Option<LineSpacing>,
    pub indent_left: Option<i32>,
    pub indent_right: Option<i32>,
    /// Negative values are hanging indents
    pub indent_first_line: Option<i32>,
}

impl ParaProps {
    /// Merge with another ParaProps (other takes precedence).
    pub fn merge(&mut self, other: &ParaProps) {
        if other.alignment.is_some() {
            self.alignment = other.alignment;
        }
        if other.space_before.is_some() {
            self.space_before = other.space_before;
        }
        if other.space_after.is_some() {
            self.space_after = other.space_after;
        }
        if other.line.is_some() {
            self.line = other.line;
        }
        if other.indent_left.is_some() {
            self.indent_left = other.indent_left;
        }
        if other.indent_right.is_some() {
            self.indent_right = other.indent_right;
        }
        if other.indent_first_line.is_some() {
            self.indent_first_line = other.indent_first_line;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ParaProps::default()
    }
}

/// A style definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDef {
    /// Style ID (e.g., "Heading1")
    pub id: String,
    /// Display name (e.g., "Heading 1")
    pub name: String,
    pub kind: StyleKind,
    /// ID of the style this one is based on
    pub based_on: Option<String>,
    /// Default style for its kind
    pub is_default: bool,
    pub hidden: bool,
    /// Numbering instance linked from the style's paragraph properties
    pub num_id: Option<String>,
    pub run: RunProps,
    pub para: ParaProps,
}

impl StyleDef {
    /// Create a style with the given id, name and kind.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: StyleKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    fn based_on(mut self, id: &str) -> Self {
        self.based_on = Some(id.to_string());
        self
    }

    fn default_for_kind(mut self) -> Self {
        self.is_default = true;
        self
    }

    fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Document-wide defaults (`w:docDefaults`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocDefaults {
    pub run: RunProps,
    pub para: ParaProps,
}

/// The style catalog of a document, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    pub styles: Vec<StyleDef>,
    pub defaults: DocDefaults,
}

impl StyleSheet {
    /// Get a style by ID.
    pub fn by_id(&self, id: &str) -> Option<&StyleDef> {
        self.styles.iter().find(|s| s.id == id)
    }

    /// Get a style by display name. With duplicate names the first
    /// declaration wins.
    pub fn by_name(&self, name: &str) -> Option<&StyleDef> {
        self.styles.iter().find(|s| s.name == name)
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut StyleDef> {
        self.styles.iter_mut().find(|s| s.name == name)
    }

    /// Display name for a style ID.
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.by_id(id).map(|s| s.name.as_str())
    }

    /// ID of the default style of a kind.
    pub fn default_id(&self, kind: StyleKind) -> Option<&str> {
        self.styles
            .iter()
            .find(|s| s.kind == kind && s.is_default)
            .map(|s| s.id.as_str())
    }

    /// Derive an unused style ID from a display name.
    pub fn unique_id(&self, name: &str) -> String {
        let mut base: String = name.chars().filter(|c| c.is_alphanumeric()).collect();
        if base.is_empty() {
            base = "Style".to_string();
        }
        if self.by_id(&base).is_none() {
            return base;
        }
        (1..)
            .map(|n| format!("{}{}", base, n))
            .find(|candidate| self.by_id(candidate).is_none())
            .unwrap_or(base)
    }

    /// Append a style.
    pub fn push(&mut self, style: StyleDef) {
        self.styles.push(style);
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Shared, immutable copy of [`StyleSheet::builtin`].
    pub fn builtin_catalog() -> &'static StyleSheet {
        static CATALOG: OnceLock<StyleSheet> = OnceLock::new();
        CATALOG.get_or_init(StyleSheet::builtin)
    }

    /// The built-in catalog a new document starts with.
    pub fn builtin() -> Self {
        let mut styles = Vec::new();

        let mut normal = StyleDef::new("Normal", "Normal", StyleKind::Paragraph).default_for_kind();
        normal.run.font = Some("Calibri".to_string());
        normal.run.size = Some(22);
        normal.para.space_after = Some(160);
        normal.para.line = Some(LineSpacing::Multiple(259));
        styles.push(normal);

        styles.push(
            StyleDef::new("DefaultParagraphFont", "Default Paragraph Font", StyleKind::Character)
                .default_for_kind()
                .hidden(),
        );
        styles.push(
            StyleDef::new("TableNormal", "Normal Table", StyleKind::Table)
                .default_for_kind()
                .hidden(),
        );
        styles.push(
            StyleDef::new("NoList", "No List", StyleKind::Numbering)
                .default_for_kind()
                .hidden(),
        );

        const HEADING_SIZES: [Option<u32>; 9] =
            [Some(32), Some(26), Some(24), None, None, None, None, None, None];
        for (i, size) in HEADING_SIZES.iter().enumerate() {
            let level = i + 1;
            let mut heading = StyleDef::new(
                format!("Heading{}", level),
                format!("Heading {}", level),
                StyleKind::Paragraph,
            )
            .based_on("Normal");
            heading.run.size = *size;
            heading.run.bold = Some(level <= 3);
            heading.run.italic = if level == 4 || level == 7 { Some(true) } else { None };
            heading.run.color = Some("2F5496".to_string());
            heading.para.space_before = Some(if level == 1 { 240 } else { 40 });
            heading.para.space_after = Some(0);
            styles.push(heading);
        }

        let mut title = StyleDef::new("Title", "Title", StyleKind::Paragraph).based_on("Normal");
        title.run.size = Some(56);
        title.para.space_after = Some(0);
        title.para.line = Some(LineSpacing::Multiple(240));
        styles.push(title);

        let mut subtitle =
            StyleDef::new("Subtitle", "Subtitle", StyleKind::Paragraph).based_on("Normal");
        subtitle.run.color = Some("5A5A5A".to_string());
        subtitle.run.italic = Some(true);
        styles.push(subtitle);

        let mut list_paragraph =
            StyleDef::new("ListParagraph", "List Paragraph", StyleKind::Paragraph)
                .based_on("Normal");
        list_paragraph.para.indent_left = Some(720);
        styles.push(list_paragraph);

        let mut list_bullet =
            StyleDef::new("ListBullet", "List Bullet", StyleKind::Paragraph).based_on("Normal");
        list_bullet.num_id = Some("1".to_string());
        styles.push(list_bullet);

        let mut list_number =
            StyleDef::new("ListNumber", "List Number", StyleKind::Paragraph).based_on("Normal");
        list_number.num_id = Some("2".to_string());
        styles.push(list_number);

        let mut quote = StyleDef::new("Quote", "Quote", StyleKind::Paragraph).based_on("Normal");
        quote.run.italic = Some(true);
        quote.para.alignment = Some(Alignment::Center);
        styles.push(quote);

        let mut caption =
            StyleDef::new("Caption", "Caption", StyleKind::Paragraph).based_on("Normal");
        caption.run.size = Some(18);
        caption.run.italic = Some(true);
        styles.push(caption);

        let mut no_spacing = StyleDef::new("NoSpacing", "No Spacing", StyleKind::Paragraph);
        no_spacing.para.space_after = Some(0);
        no_spacing.para.line = Some(LineSpacing::Multiple(240));
        styles.push(no_spacing);

        let mut strong = StyleDef::new("Strong", "Strong", StyleKind::Character)
            .based_on("DefaultParagraphFont");
        strong.run.bold = Some(true);
        styles.push(strong);

        let mut emphasis = StyleDef::new("Emphasis", "Emphasis", StyleKind::Character)
            .based_on("DefaultParagraphFont");
        emphasis.run.italic = Some(true);
        styles.push(emphasis);

        let mut hyperlink = StyleDef::new("Hyperlink", "Hyperlink", StyleKind::Character)
            .based_on("DefaultParagraphFont");
        hyperlink.run.underline = Some(true);
        hyperlink.run.color = Some("0563C1".to_string());
        styles.push(hyperlink);

        let mut grid =
            StyleDef::new("TableGrid", "Table Grid", StyleKind::Table).based_on("TableNormal");
        grid.para.space_after = Some(0);
        styles.push(grid);

        Self {
            styles,
            defaults: DocDefaults::default(),
        }
    }
}
