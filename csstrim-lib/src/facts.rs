use std::collections::HashSet;

use crate::parser::html;

/// Everything the pruner knows about a page: which tags, ids and class
/// tokens occur anywhere in it.
///
/// Built once per HTML input and shared read-only by every liveness check.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FactSet {
    /// Lowercase tag names (e.g. "div").
    tags: HashSet<String>,
    /// Values of `id` attributes, case-sensitive.
    ids: HashSet<String>,
    /// Individual class tokens, case-sensitive.
    classes: HashSet<String>,
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan an HTML document and collect its facts.
    pub fn from_html(html_content: &str) -> Self {
        html::extract_facts(html_content)
    }

    /// Record an element. Tag names are stored lowercased.
    pub fn add_tag(&mut self, tag: &str) {
        if !tag.is_empty() {
            self.tags.insert(tag.to_ascii_lowercase());
        }
    }

    pub fn add_id(&mut self, id: &str) {
        if !id.is_empty() {
            self.ids.insert(id.to_string());
        }
    }

    /// Record the value of a `class` attribute, split on whitespace.
    ///
    /// `&#32;` is decoded to a space first so pages that encode the
    /// separator still yield individual tokens.
    pub fn add_class_attribute(&mut self, value: &str) {
        let decoded = value.replace("&#32;", " ");
        for class in decoded.split_whitespace() {
            self.classes.insert(class.to_string());
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag.to_ascii_lowercase())
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn id_count(&self) -> usize {
        self.ids.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.ids.is_empty() && self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_case_insensitive() {
        let mut facts = FactSet::new();
        facts.add_tag("DIV");
        assert!(facts.has_tag("div"));
        assert!(facts.has_tag("Div"));
        assert_eq!(facts.tag_count(), 1);
    }

    #[test]
    fn test_ids_are_case_sensitive() {
        let mut facts = FactSet::new();
        facts.add_id("Hero");
        assert!(facts.has_id("Hero"));
        assert!(!facts.has_id("hero"));
    }

    #[test]
    fn test_class_attribute_is_split_into_tokens() {
        let mut facts = FactSet::new();
        facts.add_class_attribute("  card   card--wide\tactive ");
        assert!(facts.has_class("card"));
        assert!(facts.has_class("card--wide"));
        assert!(facts.has_class("active"));
        assert!(!facts.has_class("card--"));
        assert_eq!(facts.class_count(), 3);
    }

    #[test]
    fn test_encoded_space_separates_classes() {
        let mut facts = FactSet::new();
        facts.add_class_attribute("a&#32;b");
        assert!(facts.has_class("a"));
        assert!(facts.has_class("b"));
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let mut facts = FactSet::new();
        facts.add_tag("");
        facts.add_id("");
        facts.add_class_attribute("   ");
        assert!(facts.is_empty());
    }
}
