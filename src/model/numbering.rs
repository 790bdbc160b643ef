//! Numbering (list) definitions.

/// A numbering level definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumLevel {
    /// Level index (0-8)
    pub level: u8,
    /// Start value
    pub start: u32,
    /// Number format (decimal, bullet, lowerLetter, etc.)
    pub format: String,
    /// Level text (e.g., "%1.", "%1.%2.")
    pub text: String,
    /// Left indent in twips
    pub indent_left: Option<i32>,
    /// Hanging indent in twips
    pub hanging: Option<i32>,
}

/// Abstract numbering definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractNum {
    pub id: String,
    pub levels: Vec<NumLevel>,
}

/// Concrete numbering instance (`w:num`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumInstance {
    pub num_id: String,
    pub abstract_id: String,
}

/// Collection of numbering definitions, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Numbering {
    pub abstracts: Vec<AbstractNum>,
    pub instances: Vec<NumInstance>,
}

impl Numbering {
    pub fn instance(&self, num_id: &str) -> Option<&NumInstance> {
        self.instances.iter().find(|n| n.num_id == num_id)
    }

    pub fn abstract_num(&self, abstract_id: &str) -> Option<&AbstractNum> {
        self.abstracts.iter().find(|a| a.id == abstract_id)
    }

    /// Levels used by a numbering instance.
    pub fn levels(&self, num_id: &str) -> Option<&[NumLevel]> {
        let instance = self.instance(num_id)?;
        self.abstract_num(&instance.abstract_id)
            .map(|a| a.levels.as_slice())
    }

    pub fn contains(&self, num_id: &str) -> bool {
        self.instance(num_id).is_some()
    }

    fn next_abstract_id(&self) -> String {
        let next = self
            .abstracts
            .iter()
            .filter_map(|a| a.id.parse::<u32>().ok())
            .max()
            .map_or(0, |max| max + 1);
        next.to_string()
    }

    /// Replace the levels of a numbering instance, creating it if needed.
    ///
    /// An abstract definition shared with other instances is never edited in
    /// place; the instance is moved onto a fresh abstract definition instead.
    pub fn set_levels(&mut self, num_id: &str, levels: Vec<NumLevel>) {
        let shared_or_missing = match self.instance(num_id) {
            Some(instance) => {
                let abstract_id = instance.abstract_id.clone();
                let users = self
                    .instances
                    .iter()
                    .filter(|n| n.abstract_id == abstract_id)
                    .count();
                users > 1 || self.abstract_num(&abstract_id).is_none()
            }
            None => true,
        };

        if shared_or_missing {
            let abstract_id = self.next_abstract_id();
            self.abstracts.push(AbstractNum {
                id: abstract_id.clone(),
                levels,
            });
            match self.instances.iter_mut().find(|n| n.num_id == num_id) {
                Some(instance) => instance.abstract_id = abstract_id,
                None => self.instances.push(NumInstance {
                    num_id: num_id.to_string(),
                    abstract_id,
                }),
            }
            return;
        }

        let abstract_id = self
            .instance(num_id)
            .map(|n| n.abstract_id.clone())
            .unwrap_or_default();
        if let Some(abstract_num) = self.abstracts.iter_mut().find(|a| a.id == abstract_id) {
            abstract_num.levels = levels;
        }
    }

    /// Bullet list (id 1) and decimal list (id 2) used by the built-in list styles.
    pub fn builtin() -> Self {
        let bullets = ["\u{2022}", "o", "\u{25AA}"];
        let bullet_levels = (0..9u8)
            .map(|level| NumLevel {
                level,
                start: 1,
                format: "bullet".to_string(),
                text: bullets[level as usize % bullets.len()].to_string(),
                indent_left: Some(720 * (level as i32 + 1)),
                hanging: Some(360),
            })
            .collect();
        let decimal_levels = (0..9u8)
            .map(|level| NumLevel {
                level,
                start: 1,
                format: "decimal".to_string(),
                text: format!("%{}.", level + 1),
                indent_left: Some(720 * (level as i32 + 1)),
                hanging: Some(360),
            })
            .collect();

        Self {
            abstracts: vec![
                AbstractNum {
                    id: "0".to_string(),
                    levels: bullet_levels,
                },
                AbstractNum {
                    id: "1".to_string(),
                    levels: decimal_levels,
                },
            ],
            instances: vec![
                NumInstance {
                    num_id: "1".to_string(),
                    abstract_id: "0".to_string(),
                },
                NumInstance {
                    num_id: "2".to_string(),
                    abstract_id: "1".to_string(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(format: &str) -> NumLevel {
        NumLevel {
            level: 0,
            start: 1,
            format: format.to_string(),
            text: "%1)".to_string(),
            indent_left: None,
            hanging: None,
        }
    }

    #[test]
    fn test_builtin_lists() {
        let numbering = Numbering::builtin();
        assert_eq!(numbering.levels("1").unwrap()[0].format, "bullet");
        assert_eq!(numbering.levels("2").unwrap()[2].text, "%3.");
        assert!(numbering.levels("3").is_none());
    }

    #[test]
    fn test_set_levels_creates_instance() {
        let mut numbering = Numbering::builtin();
        numbering.set_levels("7", vec![level("lowerLetter")]);
        assert_eq!(numbering.levels("7").unwrap()[0].format, "lowerLetter");
        assert_eq!(numbering.instance("7").unwrap().abstract_id, "2");
    }

    #[test]
    fn test_shared_abstract_is_not_edited() {
        let mut numbering = Numbering::builtin();
        numbering.instances.push(NumInstance {
            num_id: "5".to_string(),
            abstract_id: "1".to_string(),
        });
        numbering.set_levels("5", vec![level("upperRoman")]);
        assert_eq!(numbering.levels("2").unwrap()[0].format, "decimal");
        assert_eq!(numbering.levels("5").unwrap()[0].format, "upperRoman");
    }

    #[test]
    fn test_exclusive_abstract_is_edited_in_place() {
        let mut numbering = Numbering::builtin();
        numbering.set_levels("2", vec![level("upperRoman")]);
        assert_eq!(numbering.abstracts.len(), 2);
        assert_eq!(numbering.levels("2").unwrap()[0].format, "upperRoman");
    }
}
