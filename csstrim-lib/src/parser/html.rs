//! Fact extraction from HTML.
//!
//! html5ever's tokenizer does the lexing (entity decoding, attribute
//! quoting, recovery from malformed markup). No tree is built: the sink below
//! records the name, `id` and `class` of every start tag it is handed, so the
//! facts are exactly the tags written in the text. Fragments, `<noscript>`
//! content and misnested tags all count; nothing is implied.

use crate::facts::FactSet;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, StartTag, Tag, TagToken, Token, TokenSink, TokenSinkResult, Tokenizer,
    TokenizerOpts,
};
use html5ever::Attribute;
use std::cell::RefCell;

/// Scan `html_content` and return the tags, ids and class tokens it contains.
///
/// Never fails: markup the tokenizer cannot make sense of simply contributes
/// no facts.
pub fn extract_facts(html_content: &str) -> FactSet {
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html_content));

    let tokenizer = Tokenizer::new(FactTokenSink::new(), TokenizerOpts::default());
    let _ = tokenizer.feed(&input);
    tokenizer.end();

    let facts = tokenizer.sink.finish();
    log::debug!(
        "collected {} tags, {} ids, {} classes from {} bytes of HTML",
        facts.tag_count(),
        facts.id_count(),
        facts.class_count(),
        html_content.len()
    );
    facts
}

/// A `TokenSink` that keeps only the facts carried by start tags.
pub struct FactTokenSink {
    facts: RefCell<FactSet>,
}

impl FactTokenSink {
    pub fn new() -> Self {
        Self {
            facts: RefCell::new(FactSet::new()),
        }
    }

    pub fn finish(self) -> FactSet {
        self.facts.into_inner()
    }

    fn record_tag(&self, tag: &Tag) {
        let mut facts = self.facts.borrow_mut();
        facts.add_tag(&tag.name);
        record_attributes(&mut facts, &tag.attrs);
    }
}

impl Default for FactTokenSink {
    fn default() -> Self {
        Self::new()
    }
}

fn record_attributes(facts: &mut FactSet, attrs: &[Attribute]) {
    for attr in attrs {
        match attr.name.local.as_ref() {
            "id" => facts.add_id(&attr.value),
            "class" => facts.add_class_attribute(&attr.value),
            _ => {}
        }
    }
}

impl TokenSink for FactTokenSink {
    type Handle = ();

    // The sink never asks for RAWTEXT or script data, so markup inside
    // `<script>` and `<style>` is scanned like any other text.
    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            TagToken(tag) if tag.kind == StartTag => self.record_tag(&tag),
            Token::ParseError(msg) => log::trace!("html parse error: {}", msg),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collects_tags_lowercased() {
        let facts = extract_facts("<DIV><Span>hi</Span></DIV><section></section>");
        assert!(facts.has_tag("div"));
        assert!(facts.has_tag("span"));
        assert!(facts.has_tag("section"));
        assert!(!facts.has_tag("article"));
    }

    #[test]
    fn test_only_written_tags_are_recorded() {
        let facts = extract_facts("<p>text</p>");
        assert!(facts.has_tag("p"));
        assert!(!facts.has_tag("html"));
        assert!(!facts.has_tag("head"));
        assert!(!facts.has_tag("body"));
        assert_eq!(extract_facts("").tag_count(), 0);
    }

    #[test]
    fn test_table_cells_outside_a_table() {
        let facts = extract_facts(r#"<tr><td class="price">9</td></tr>"#);
        assert!(facts.has_tag("tr"));
        assert!(facts.has_tag("td"));
        assert!(facts.has_class("price"));
    }

    #[test]
    fn test_noscript_content_is_scanned() {
        let facts = extract_facts(r#"<noscript><img class="pixel" id="track"></noscript>"#);
        assert!(facts.has_tag("img"));
        assert!(facts.has_class("pixel"));
        assert!(facts.has_id("track"));
    }

    #[test]
    fn test_misnested_tags_are_recorded() {
        let html = r#"<form><form id="inner"></form></form><p><div class="x"></div></p>"#;
        let facts = extract_facts(html);
        assert!(facts.has_id("inner"));
        assert!(facts.has_class("x"));
    }

    #[test]
    fn test_end_tags_and_comments_add_nothing() {
        let facts = extract_facts(r#"</aside><!-- <nav class="hidden"> -->"#);
        assert!(!facts.has_tag("aside"));
        assert!(!facts.has_tag("nav"));
        assert!(!facts.has_class("hidden"));
    }

    #[test]
    fn test_collects_ids_with_either_quote_style() {
        let facts = extract_facts(r#"<div id="Main"></div><p id='footer'></p>"#);
        assert!(facts.has_id("Main"));
        assert!(facts.has_id("footer"));
        assert!(!facts.has_id("main"));
    }

    #[test]
    fn test_collects_class_tokens() {
        let facts = extract_facts(r#"<p class='a c'></p><div class="btn btn-primary"></div>"#);
        for class in ["a", "c", "btn", "btn-primary"] {
            assert!(facts.has_class(class), "missing class {class}");
        }
        assert!(!facts.has_class("b"));
        assert!(!facts.has_class("a c"));
    }

    #[test]
    fn test_decodes_encoded_space_in_class() {
        let facts = extract_facts(r#"<span class="one&#32;two"></span>"#);
        assert!(facts.has_class("one"));
        assert!(facts.has_class("two"));
    }

    #[test]
    fn test_repeated_body_tag_attributes_are_recorded() {
        let facts = extract_facts(r#"<body class="first"><div></div><body class="late" id="b2">"#);
        assert!(facts.has_class("first"));
        assert!(facts.has_class("late"));
        assert!(facts.has_id("b2"));
    }

    #[test]
    fn test_malformed_html_does_not_panic() {
        let facts = extract_facts("<div class=\"x\"<<>><p id=");
        assert!(facts.has_tag("div"));
        let empty = extract_facts("");
        assert!(!empty.has_class("x"));
    }
}
