//! Style inheritance resolution.
//!
//! A style names at most one base style. The attributes a style actually
//! renders with are found by walking those links up to a root and letting
//! each level override only what it sets explicitly. The walk keeps a
//! visited set, so a cycle ends in [`Error::CyclicInheritance`] instead of
//! looping. Document defaults sit below every root, so a root style
//! inherits whatever it leaves unset from them.
//!
//! Resolution is independent of where the styles live: anything that can
//! look a style up by name implements [`StyleCatalog`]. Names missing from
//! the catalog fall back to the built-in catalog of a new document.

use crate::error::{Error, Result};
use crate::model::{DocDefaults, ParaProps, RunProps, StyleSheet};
use crate::schema::{DefaultsParams, StyleParams};
use indexmap::IndexMap;
use std::collections::HashSet;

/// One style as seen by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleEntry {
    /// Base style name; `None` for a root
    pub base: Option<String>,
    /// Explicit character attributes
    pub run: RunProps,
    /// Explicit paragraph attributes
    pub para: ParaProps,
}

/// Name-addressed style lookup.
pub trait StyleCatalog {
    fn lookup(&self, name: &str) -> Option<StyleEntry>;

    /// Attributes below every root style.
    fn defaults(&self) -> DocDefaults {
        DocDefaults::default()
    }
}

impl StyleCatalog for StyleSheet {
    fn lookup(&self, name: &str) -> Option<StyleEntry> {
        let style = self.by_name(name)?;
        let base = style.based_on.as_deref().map(|id| {
            self.name_of(id)
                .or_else(|| StyleSheet::builtin_catalog().name_of(id))
                .unwrap_or(id)
                .to_string()
        });
        Some(StyleEntry {
            base,
            run: style.run.clone(),
            para: style.para.clone(),
        })
    }

    fn defaults(&self) -> DocDefaults {
        self.defaults.clone()
    }
}

/// A schema's style map on its own; an absent base means a root.
impl StyleCatalog for IndexMap<String, StyleParams> {
    fn lookup(&self, name: &str) -> Option<StyleEntry> {
        let params = self.get(name)?;
        Some(StyleEntry {
            base: params.base_name().map(str::to_string),
            run: params.font.as_ref().map(|f| f.to_run()).unwrap_or_default(),
            para: params
                .paragraph_format
                .as_ref()
                .map(|p| p.to_para())
                .unwrap_or_default(),
        })
    }
}

/// Schema styles laid over a document's catalog: the view an application
/// of the schema would produce.
pub struct Overlay<'a> {
    styles: &'a IndexMap<String, StyleParams>,
    target: &'a StyleSheet,
    defaults: Option<&'a DefaultsParams>,
}

impl<'a> Overlay<'a> {
    pub fn new(styles: &'a IndexMap<String, StyleParams>, target: &'a StyleSheet) -> Self {
        Self {
            styles,
            target,
            defaults: None,
        }
    }

    /// Lay schema document defaults over the target's as well.
    pub fn with_defaults(mut self, defaults: Option<&'a DefaultsParams>) -> Self {
        self.defaults = defaults;
        self
    }
}

impl StyleCatalog for Overlay<'_> {
    fn lookup(&self, name: &str) -> Option<StyleEntry> {
        let existing = self
            .target
            .lookup(name)
            .or_else(|| StyleSheet::builtin_catalog().lookup(name));
        let Some(params) = self.styles.get(name) else {
            return existing;
        };
        let mut entry = existing.unwrap_or_default();
        if let Some(base) = &params.base_style {
            entry.base = base.clone();
        }
        if let Some(font) = &params.font {
            if params.effective_font.is_some() {
                entry.run = font.to_run();
            } else {
                entry.run.merge(&font.to_run());
            }
        } else if params.effective_font.is_some() {
            entry.run = RunProps::default();
        }
        if let Some(format) = &params.paragraph_format {
            if params.effective_paragraph_format.is_some() {
                entry.para = format.to_para();
            } else {
                entry.para.merge(&format.to_para());
            }
        } else if params.effective_paragraph_format.is_some() {
            entry.para = ParaProps::default();
        }
        Some(entry)
    }

    fn defaults(&self) -> DocDefaults {
        let mut defaults = self.target.defaults.clone();
        if let Some(params) = self.defaults {
            params.merge_into(&mut defaults);
        }
        defaults
    }
}

/// Fully inherited attributes of a style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveStyle {
    pub run: RunProps,
    pub para: ParaProps,
}

/// Walks base-style chains over a [`StyleCatalog`].
pub struct StyleResolver<'a, C: StyleCatalog + ?Sized> {
    catalog: &'a C,
    builtins: &'a StyleSheet,
}

impl<'a, C: StyleCatalog + ?Sized> StyleResolver<'a, C> {
    /// Resolve against `catalog`, falling back to the default built-ins.
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            builtins: StyleSheet::builtin_catalog(),
        }
    }

    /// Resolve against `catalog`, falling back to the given built-ins.
    pub fn with_builtins(catalog: &'a C, builtins: &'a StyleSheet) -> Self {
        Self { catalog, builtins }
    }

    fn entry(&self, name: &str) -> Option<StyleEntry> {
        self.catalog
            .lookup(name)
            .or_else(|| self.builtins.lookup(name))
    }

    /// Whether the name resolves to a style at all.
    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// The inheritance chain of a style, starting with the style itself and
    /// ending with its root.
    pub fn chain(&self, name: &str) -> Result<Vec<(String, StyleEntry)>> {
        let mut current = self
            .entry(name)
            .ok_or_else(|| Error::UnknownReference(format!("style '{}'", name)))?;
        let mut current_name = name.to_string();
        let mut seen = HashSet::new();
        let mut chain = Vec::new();

        loop {
            seen.insert(current_name.clone());
            let base = current.base.clone();
            chain.push((current_name.clone(), current));

            let Some(base) = base else {
                return Ok(chain);
            };
            if seen.contains(&base) {
                let mut names: Vec<String> = chain.into_iter().map(|(n, _)| n).collect();
                names.push(base);
                return Err(Error::CyclicInheritance { chain: names });
            }
            current = self.entry(&base).ok_or_else(|| Error::UnknownBaseStyle {
                style: current_name.clone(),
                base: base.clone(),
            })?;
            current_name = base;
        }
    }

    /// Names of all ancestors, nearest first.
    pub fn ancestors(&self, name: &str) -> Result<Vec<String>> {
        Ok(self
            .chain(name)?
            .into_iter()
            .skip(1)
            .map(|(n, _)| n)
            .collect())
    }

    /// What a root style inherits: the catalog's document defaults.
    pub fn root(&self) -> EffectiveStyle {
        let defaults = self.catalog.defaults();
        EffectiveStyle {
            run: defaults.run,
            para: defaults.para,
        }
    }

    /// Effective attributes of a style.
    pub fn effective(&self, name: &str) -> Result<EffectiveStyle> {
        let chain = self.chain(name)?;
        let mut effective = self.root();
        for (_, entry) in chain.iter().rev() {
            effective.run.merge(&entry.run);
            effective.para.merge(&entry.para);
        }
        Ok(effective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StyleDef, StyleKind};
    use crate::schema::FontParams;

    fn sheet() -> StyleSheet {
        let mut sheet = StyleSheet::default();
        let mut a = StyleDef::new("A", "A", StyleKind::Paragraph);
        a.run.size = Some(24);
        a.run.font = Some("Arial".into());
        sheet.push(a);
        let mut b = StyleDef::new("B", "Style B", StyleKind::Paragraph);
        b.based_on = Some("A".into());
        b.run.bold = Some(true);
        sheet.push(b);
        sheet
    }

    #[test]
    fn test_effective_merges_root_first() {
        let sheet = sheet();
        let resolver = StyleResolver::new(&sheet);
        let effective = resolver.effective("Style B").unwrap();
        assert_eq!(effective.run.size, Some(24));
        assert_eq!(effective.run.bold, Some(true));
        assert_eq!(effective.run.font.as_deref(), Some("Arial"));
    }

    #[test]
    fn test_inheritance_is_live() {
        let mut sheet = sheet();
        sheet.by_name_mut("A").unwrap().run.size = Some(30);
        let effective = StyleResolver::new(&sheet).effective("Style B").unwrap();
        assert_eq!(effective.run.size, Some(30));
    }

    #[test]
    fn test_document_defaults_sit_below_roots() {
        let mut sheet = sheet();
        sheet.defaults.run.font = Some("Cambria".into());
        sheet.defaults.run.italic = Some(true);
        sheet.defaults.para.space_after = Some(160);

        let effective = StyleResolver::new(&sheet).effective("Style B").unwrap();
        assert_eq!(effective.run.font.as_deref(), Some("Arial"));
        assert_eq!(effective.run.italic, Some(true));
        assert_eq!(effective.para.space_after, Some(160));
        assert_eq!(StyleResolver::new(&sheet).root().run.font.as_deref(), Some("Cambria"));
    }

    #[test]
    fn test_overlay_lays_schema_defaults_over_target() {
        let mut target = sheet();
        target.defaults.run.size = Some(20);
        target.defaults.run.italic = Some(true);
        let styles = IndexMap::new();
        let defaults = DefaultsParams {
            font: Some(FontParams {
                size_pt: Some(12.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = Overlay::new(&styles, &target).with_defaults(Some(&defaults));
        let root = StyleResolver::new(&overlay).root();
        assert_eq!(root.run.size, Some(24));
        assert_eq!(root.run.italic, Some(true));
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut sheet = StyleSheet::default();
        let mut x = StyleDef::new("X", "X", StyleKind::Paragraph);
        x.based_on = Some("Y".into());
        let mut y = StyleDef::new("Y", "Y", StyleKind::Paragraph);
        y.based_on = Some("X".into());
        sheet.push(x);
        sheet.push(y);

        let err = StyleResolver::new(&sheet).effective("X").unwrap_err();
        match err {
            Error::CyclicInheritance { chain } => assert_eq!(chain, ["X", "Y", "X"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(StyleResolver::new(&sheet).chain("Y").is_err());
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut sheet = StyleSheet::default();
        let mut s = StyleDef::new("S", "S", StyleKind::Paragraph);
        s.based_on = Some("S".into());
        sheet.push(s);
        assert!(matches!(
            StyleResolver::new(&sheet).chain("S"),
            Err(Error::CyclicInheritance { .. })
        ));
    }

    #[test]
    fn test_unknown_base() {
        let mut styles = IndexMap::new();
        styles.insert(
            "Body".to_string(),
            StyleParams {
                base_style: Some(Some("Missing".into())),
                ..Default::default()
            },
        );
        let err = StyleResolver::new(&styles).chain("Body").unwrap_err();
        match err {
            Error::UnknownBaseStyle { style, base } => {
                assert_eq!(style, "Body");
                assert_eq!(base, "Missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_start_is_unknown_reference() {
        let sheet = StyleSheet::default();
        assert!(matches!(
            StyleResolver::new(&sheet).chain("Nope"),
            Err(Error::UnknownReference(_))
        ));
    }

    #[test]
    fn test_schema_falls_back_to_builtins() {
        let mut styles = IndexMap::new();
        styles.insert(
            "Body".to_string(),
            StyleParams {
                base_style: Some(Some("Normal".into())),
                font: Some(FontParams {
                    bold: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        let resolver = StyleResolver::new(&styles);
        assert_eq!(resolver.ancestors("Body").unwrap(), ["Normal"]);
        let effective = resolver.effective("Body").unwrap();
        assert_eq!(effective.run.font.as_deref(), Some("Calibri"));
        assert_eq!(effective.run.bold, Some(true));
    }

    #[test]
    fn test_overlay_keeps_target_base_when_absent() {
        let target = sheet();
        let mut styles = IndexMap::new();
        styles.insert(
            "Style B".to_string(),
            StyleParams {
                font: Some(FontParams {
                    italic: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        let overlay = Overlay::new(&styles, &target);
        let entry = overlay.lookup("Style B").unwrap();
        assert_eq!(entry.base.as_deref(), Some("A"));
        assert_eq!(entry.run.bold, Some(true));
        assert_eq!(entry.run.italic, Some(true));
    }

    #[test]
    fn test_overlay_can_introduce_cycle() {
        let target = sheet();
        let mut styles = IndexMap::new();
        styles.insert(
            "A".to_string(),
            StyleParams {
                base_style: Some(Some("Style B".into())),
                ..Default::default()
            },
        );
        let overlay = Overlay::new(&styles, &target);
        assert!(matches!(
            StyleResolver::new(&overlay).chain("Style B"),
            Err(Error::CyclicInheritance { .. })
        ));
    }
}
