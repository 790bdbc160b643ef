//! Section (page geometry) model.

use serde::{Deserialize, Serialize};

/// Page orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page margins in twips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageMargins {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
    pub header: i32,
    pub footer: i32,
    pub gutter: i32,
}

/// Header or footer text for one section, one entry per part type.
///
/// Text holds one line per paragraph, joined with `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFooterSet {
    pub default: Option<String>,
    pub first: Option<String>,
}

impl HeaderFooterSet {
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.first.is_none()
    }
}

/// Properties of one document section (`w:sectPr`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionProps {
    /// Page width in twips
    pub page_width: i32,
    /// Page height in twips
    pub page_height: i32,
    pub orientation: Orientation,
    pub margins: PageMargins,
    /// Separate first-page header/footer (`w:titlePg`)
    pub title_page: bool,
    pub header: HeaderFooterSet,
    pub footer: HeaderFooterSet,
}

impl SectionProps {
    /// US Letter, portrait, one-inch margins.
    pub fn letter() -> Self {
        Self {
            page_width: 12240,
            page_height: 15840,
            orientation: Orientation::Portrait,
            margins: PageMargins {
                top: 1440,
                bottom: 1440,
                left: 1440,
                right: 1440,
                header: 720,
                footer: 720,
                gutter: 0,
            },
            title_page: false,
            header: HeaderFooterSet::default(),
            footer: HeaderFooterSet::default(),
        }
    }

    /// Same geometry, no header or footer content.
    pub fn geometry_only(&self) -> Self {
        Self {
            header: HeaderFooterSet::default(),
            footer: HeaderFooterSet::default(),
            title_page: false,
            ..self.clone()
        }
    }
}

impl Default for SectionProps {
    fn default() -> Self {
        Self::letter()
    }
}
