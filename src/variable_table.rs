//! Ordered variable storage shared by the builder and the resolver
//!
//! The table keeps two insertion-ordered collections:
//! - general variables, emitted as `variables.scss`
//! - basic variables (size scale, breakpoints and the site colour section),
//!   emitted as `basic_vars.scss` and loaded before everything else
//!
//! A qualified name lives in at most one of the two collections.

use crate::types::{ResolvedVariable, LOADER_SIZE, LOADER_SIZE_ANCHOR, PALETTE_COLORS};
use indexmap::IndexMap;

/// Which collection a variable belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableSet {
    General,
    Basic,
}

#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    general: IndexMap<String, String>,
    basic: IndexMap<String, String>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a variable in the given collection.
    ///
    /// An existing entry keeps its position; the name is removed from the
    /// other collection so the two stay disjoint.
    pub fn insert(&mut self, set: VariableSet, name: String, value: String) {
        let (target, other) = match set {
            VariableSet::General => (&mut self.general, &mut self.basic),
            VariableSet::Basic => (&mut self.basic, &mut self.general),
        };
        if other.shift_remove(&name).is_some() {
            log::debug!("Variable {} moved to the {:?} collection", name, set);
        }
        if let Some(previous) = target.insert(name.clone(), value) {
            log::trace!("Variable {} redefined (was '{}')", name, previous);
        }
    }

    /// True if either collection already holds `name`
    pub fn contains(&self, name: &str) -> bool {
        self.general.contains_key(name) || self.basic.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.general
            .get(name)
            .or_else(|| self.basic.get(name))
            .map(String::as_str)
    }

    pub fn set_of(&self, name: &str) -> Option<VariableSet> {
        if self.general.contains_key(name) {
            Some(VariableSet::General)
        } else if self.basic.contains_key(name) {
            Some(VariableSet::Basic)
        } else {
            None
        }
    }

    pub fn general_len(&self) -> usize {
        self.general.len()
    }

    pub fn basic_len(&self) -> usize {
        self.basic.len()
    }

    pub fn len(&self) -> usize {
        self.general.len() + self.basic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn general(&self) -> impl Iterator<Item = (&str, &str)> {
        self.general.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn basic(&self) -> impl Iterator<Item = (&str, &str)> {
        self.basic.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Position of `name` inside the basic collection
    pub fn basic_position(&self, name: &str) -> Option<usize> {
        self.basic.get_index_of(name)
    }

    pub fn resolved(&self, set: VariableSet) -> Vec<ResolvedVariable> {
        let entries = match set {
            VariableSet::General => &self.general,
            VariableSet::Basic => &self.basic,
        };
        entries
            .iter()
            .map(|(name, value)| ResolvedVariable {
                qualified_name: name.clone(),
                value_expression: value.clone(),
            })
            .collect()
    }

    /// Apply the fixed basic-variable orderings:
    /// each palette `-header-color` right after its `-text-color`, and
    /// `$loader-size` right after `$relative-big`.
    pub fn apply_basic_reorderings(&mut self) {
        for color in PALETTE_COLORS {
            let text = format!("${}-text-color", color);
            let header = format!("${}-header-color", color);
            self.move_after(&header, &text);
        }
        self.move_after(LOADER_SIZE, LOADER_SIZE_ANCHOR);
    }

    /// Move basic entry `name` so it sits immediately after `anchor`
    fn move_after(&mut self, name: &str, anchor: &str) -> bool {
        if !self.basic.contains_key(anchor) {
            log::warn!("Cannot place {}: anchor {} is not a basic variable", name, anchor);
            return false;
        }
        let Some(value) = self.basic.shift_remove(name) else {
            log::warn!("Cannot place {} after {}: not a basic variable", name, anchor);
            return false;
        };
        // Removal may have shifted the anchor, so look it up afterwards
        let anchor_index = self.basic.get_index_of(anchor).unwrap_or(self.basic.len());
        self.basic.shift_insert(anchor_index + 1, name.to_string(), value);
        true
    }

    /// Render one collection as Sass `!default` assignments
    pub fn render(&self, set: VariableSet) -> String {
        let entries = match set {
            VariableSet::General => &self.general,
            VariableSet::Basic => &self.basic,
        };
        let mut out = String::new();
        for (name, value) in entries {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str(" !default;\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_names(table: &VariableTable) -> Vec<&str> {
        table.basic().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_insert_keeps_collections_disjoint() {
        let mut table = VariableTable::new();
        table.insert(VariableSet::General, "$x".to_string(), "1".to_string());
        table.insert(VariableSet::Basic, "$x".to_string(), "2".to_string());

        assert_eq!(table.general_len(), 0);
        assert_eq!(table.set_of("$x"), Some(VariableSet::Basic));
        assert_eq!(table.get("$x"), Some("2"));
    }

    #[test]
    fn test_redefinition_overwrites_in_place() {
        let mut table = VariableTable::new();
        table.insert(VariableSet::General, "$a".to_string(), "1".to_string());
        table.insert(VariableSet::General, "$b".to_string(), "2".to_string());
        table.insert(VariableSet::General, "$a".to_string(), "3".to_string());

        let entries: Vec<_> = table.general().collect();
        assert_eq!(entries, vec![("$a", "3"), ("$b", "2")]);
    }

    #[test]
    fn test_header_color_follows_text_color() {
        let mut table = VariableTable::new();
        // headers first in reverse palette order, texts rotated, filler in between
        for color in PALETTE_COLORS.iter().rev() {
            table.insert(VariableSet::Basic, format!("${}-header-color", color), "#000".to_string());
        }
        table.insert(VariableSet::Basic, "$page".to_string(), "#FFF".to_string());
        let rotated = PALETTE_COLORS.iter().cycle().skip(5).take(PALETTE_COLORS.len());
        for color in rotated {
            table.insert(VariableSet::Basic, format!("${}-text-color", color), "#111".to_string());
        }
        table.apply_basic_reorderings();

        for color in PALETTE_COLORS {
            let text = table.basic_position(&format!("${}-text-color", color)).unwrap();
            let header = table.basic_position(&format!("${}-header-color", color)).unwrap();
            assert_eq!(header, text + 1, "{} header must follow its text color", color);
        }
        assert_eq!(basic_names(&table).len(), PALETTE_COLORS.len() * 2 + 1);
    }

    #[test]
    fn test_loader_size_follows_relative_big() {
        let mut table = VariableTable::new();
        table.insert(VariableSet::Basic, "$loader-size".to_string(), "1em".to_string());
        table.insert(VariableSet::Basic, "$relative-big".to_string(), "1.2em".to_string());
        table.insert(VariableSet::Basic, "$relative-huge".to_string(), "1.4em".to_string());
        table.apply_basic_reorderings();

        assert_eq!(
            basic_names(&table),
            vec!["$relative-big", "$loader-size", "$relative-huge"]
        );
    }

    #[test]
    fn test_reordering_is_idempotent() {
        let mut table = VariableTable::new();
        for name in ["$green-header-color", "$relative-big", "$green-text-color", "$loader-size"] {
            table.insert(VariableSet::Basic, name.to_string(), "x".to_string());
        }
        table.apply_basic_reorderings();
        let once: Vec<String> = basic_names(&table).iter().map(|s| s.to_string()).collect();
        table.apply_basic_reorderings();
        assert_eq!(basic_names(&table), once);
    }

    #[test]
    fn test_missing_anchor_leaves_order_untouched() {
        let mut table = VariableTable::new();
        table.insert(VariableSet::Basic, "$teal-header-color".to_string(), "x".to_string());
        table.insert(VariableSet::Basic, "$loader-size".to_string(), "y".to_string());
        table.apply_basic_reorderings();
        assert_eq!(basic_names(&table), vec!["$teal-header-color", "$loader-size"]);
    }

    #[test]
    fn test_render() {
        let mut table = VariableTable::new();
        table.insert(VariableSet::General, "$page-background".to_string(), "#FFF".to_string());
        table.insert(VariableSet::Basic, "$em-size".to_string(), "14px".to_string());

        assert_eq!(table.render(VariableSet::General), "$page-background: #FFF !default;\n");
        assert_eq!(table.render(VariableSet::Basic), "$em-size: 14px !default;\n");
    }
}
