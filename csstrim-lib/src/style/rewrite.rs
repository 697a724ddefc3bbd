//! Turning verdicts back into text.
//!
//! Planned changes are collected as [`Edit`]s against the comment-stripped
//! stylesheet and applied in one pass, last offset first, so no edit moves
//! the text another edit points at. Everything outside an edit keeps its
//! original bytes until the global whitespace pass.

use crate::parser::ruleset::Ruleset;
use crate::parser::sanitize::sanitize;
use crate::style::selector::Selector;
use std::ops::Range;

/// Upper bound on cleanup passes. Each pass removes the innermost empty
/// blocks, so this is also the deepest nesting that gets fully collapsed.
const MAX_CLEANUP_PASSES: usize = 16;

/// Literal substitutions applied after line breaks are removed and spaces
/// collapsed.
const TIGHTEN: &[(&str, &str)] = &[
    (": ", ":"),
    (" {", "{"),
    (" (", "("),
    (", ", ","),
    (" + ", "+"),
];

/// Replace `start..end` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl Edit {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Blank a whole ruleset: an empty block padded with spaces to the same
/// length, which the cleanup pass later removes.
pub fn blank_ruleset(ruleset: &Ruleset) -> Edit {
    let len = ruleset.end - ruleset.start;
    let mut replacement = String::with_capacity(len);
    replacement.push_str("{}");
    replacement.push_str(&" ".repeat(len.saturating_sub(2)));
    Edit {
        start: ruleset.start,
        end: ruleset.end,
        replacement,
    }
}

/// Rewrite a selector list keeping only the live selectors.
///
/// Dead selectors and the commas that separated them become padding, so the
/// list keeps its length and never ends up with a leading, trailing or
/// doubled comma. Returns `None` for an empty list.
pub fn prune_selector_list(selectors: &[Selector]) -> Option<Edit> {
    let start = selectors.first()?.start;
    let end = selectors.last()?.end;

    let mut replacement = String::with_capacity(end - start);
    let mut pending_padding = 0;
    let mut wrote_live = false;
    for (i, selector) in selectors.iter().enumerate() {
        // Every selector after the first was preceded by a comma.
        let has_separator = i > 0;
        if selector.is_live() {
            if has_separator {
                if wrote_live {
                    replacement.push(',');
                } else {
                    pending_padding += 1;
                }
            }
            replacement.push_str(&" ".repeat(pending_padding));
            pending_padding = 0;
            replacement.push_str(&selector.raw_text);
            wrote_live = true;
        } else {
            pending_padding += usize::from(has_separator) + selector.raw_text.len();
        }
    }
    replacement.push_str(&" ".repeat(pending_padding));

    Some(Edit {
        start,
        end,
        replacement,
    })
}

/// Apply `edits` to `text`, highest offset first.
///
/// Edits that overlap one already applied, or that do not fall on character
/// boundaries, are skipped with a warning rather than corrupting the buffer.
pub fn apply_edits(text: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    let mut buffer = text.to_string();
    let mut floor = text.len();
    for edit in edits {
        let fits = edit.start <= edit.end
            && edit.end <= floor
            && buffer.is_char_boundary(edit.start)
            && buffer.is_char_boundary(edit.end);
        if !fits {
            log::warn!("skipping edit {:?}: overlaps or splits a character", edit.span());
            continue;
        }
        buffer.replace_range(edit.span(), &edit.replacement);
        floor = edit.start;
    }
    buffer
}

/// Drop line breaks, collapse runs of spaces and tighten the spacing around
/// a few punctuation marks. Tabs are left alone.
///
/// The substitutions run until none applies, so the result does not depend
/// on their order and a second call changes nothing.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        match ch {
            // A line break counts as a space so tokens on adjacent lines
            // never run together.
            ' ' | '\r' | '\n' => {
                if !last_was_space {
                    out.push(' ');
                }
                last_was_space = true;
            }
            _ => {
                out.push(ch);
                last_was_space = false;
            }
        }
    }

    loop {
        let before = out.len();
        for (from, to) in TIGHTEN {
            if out.contains(from) {
                out = out.replace(from, to);
            }
        }
        if out.len() == before {
            return out;
        }
    }
}

/// Find every block that contains nothing but whitespace, together with the
/// selector list in front of it.
fn empty_ruleset_spans(masked: &str) -> Vec<Range<usize>> {
    let bytes = masked.as_bytes();
    let mut spans = Vec::new();
    let mut boundary = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                if bytes.get(j) == Some(&b'}') {
                    spans.push(boundary..j + 1);
                    boundary = j + 1;
                    i = j + 1;
                    continue;
                }
                boundary = i + 1;
            }
            b'}' | b';' => boundary = i + 1,
            _ => {}
        }
        i += 1;
    }
    spans
}

/// Delete `selector-list {}` units until none are left.
///
/// Removing the last rule of a group leaves the group empty, which the next
/// pass picks up. Returns the new text and how many units were removed.
pub fn remove_empty_rulesets(text: &str) -> (String, usize) {
    let mut current = text.to_string();
    let mut removed = 0;
    for _ in 0..MAX_CLEANUP_PASSES {
        let masked = sanitize(&current).masked;
        let spans = empty_ruleset_spans(&masked);
        if spans.is_empty() {
            break;
        }
        removed += spans.len();
        let edits = spans
            .into_iter()
            .map(|span| Edit {
                start: span.start,
                end: span.end,
                replacement: String::new(),
            })
            .collect();
        current = apply_edits(&current, edits);
    }
    (current, removed)
}

/// Apply the planned edits and tidy up the result.
///
/// Returns the final stylesheet and the number of empty rulesets removed.
pub fn rewrite(stripped: &str, edits: Vec<Edit>) -> (String, usize) {
    let edited = apply_edits(stripped, edits);
    let normalized = normalize_whitespace(&edited);
    let (cleaned, removed) = remove_empty_rulesets(&normalized);
    (cleaned.trim_matches(' ').to_string(), removed)
}
