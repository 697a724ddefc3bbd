//! Selector decomposition and classification.
//!
//! A selector list is split on top-level commas into selectors, each selector
//! on combinators into compound groups, and each compound group at `.`, `#`
//! and `[` into sections. Scanning runs on the masked text (strings already
//! filled in by the sanitizer); text is always sliced from the unmasked copy
//! at the same offsets.

use std::fmt;
use std::ops::Range;

/// What kind of simple selector a section is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CssSelectorType {
    /// Contains `*`.
    Universal,
    /// Element name, e.g. `div`.
    Type,
    /// `.name`
    Class,
    /// `#name`
    Id,
    /// `[attr...]`
    Attribute,
    /// At-rule preludes, keyframe markers and anything else that cannot be
    /// checked against the page.
    Unknown,
}

impl fmt::Display for CssSelectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CssSelectorType::Universal => "universal",
            CssSelectorType::Type => "type",
            CssSelectorType::Class => "class",
            CssSelectorType::Id => "id",
            CssSelectorType::Attribute => "attribute",
            CssSelectorType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One simple selector inside a compound selector, e.g. `.card` in
/// `div.card#hero`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Position within the selector, counting every section.
    pub index: usize,
    /// Source text, pseudo suffix included.
    pub raw_text: String,
    /// The value compared against the page: the name without its `.`/`#`
    /// marker (escapes resolved) for classes and ids, the text without the
    /// pseudo suffix otherwise.
    pub cleaned_text: String,
    /// Pseudo-class or pseudo-element suffix that was cut off, if any.
    /// Kept for inspection only; it does not affect liveness.
    pub pseudo: Option<String>,
    pub kind: CssSelectorType,
    pub(crate) live: bool,
}

impl Section {
    pub fn is_live(&self) -> bool {
        self.live
    }
}

/// One comma-separated member of a selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Byte offsets of `raw_text` in the original stylesheet.
    pub start: usize,
    pub end: usize,
    /// Everything between the separating commas, whitespace included.
    pub raw_text: String,
    pub cleaned_text: String,
    pub sections: Vec<Section>,
    pub(crate) live: bool,
}

impl Selector {
    /// False only once liveness analysis has found a section that cannot
    /// match the page.
    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Length of the escape sequence starting at the backslash at `i`:
/// up to six hex digits plus one optional whitespace, or a single character.
fn escape_len(bytes: &[u8], i: usize) -> usize {
    let hex = bytes[i + 1..]
        .iter()
        .take(6)
        .take_while(|b| b.is_ascii_hexdigit())
        .count();
    if hex > 0 {
        let mut len = 1 + hex;
        if bytes.get(i + len).is_some_and(|b| b.is_ascii_whitespace()) {
            len += 1;
        }
        return len;
    }
    match bytes.get(i + 1) {
        // Keep whole UTF-8 sequences together.
        Some(&b) if b >= 0x80 => {
            let width = match b {
                0xF0..=0xFF => 4,
                0xE0..=0xEF => 3,
                _ => 2,
            };
            (1 + width).min(bytes.len() - i)
        }
        Some(_) => 2,
        None => 1,
    }
}

/// Walk `bytes[range]`, calling `visit` for every byte that is at bracket
/// depth zero and not part of an escape. `(...)` and `[...]` both nest.
fn scan_top_level(bytes: &[u8], range: Range<usize>, mut visit: impl FnMut(usize, u8)) {
    let mut depth = 0usize;
    let mut i = range.start;
    while i < range.end {
        let b = bytes[i];
        match b {
            b'\\' => {
                i += escape_len(&bytes[..range.end], i);
                continue;
            }
            b'(' | b'[' => {
                if depth == 0 {
                    visit(i, b);
                }
                depth += 1;
            }
            b')' | b']' => {
                depth = depth.saturating_sub(1);
            }
            _ if depth == 0 => visit(i, b),
            _ => {}
        }
        i += 1;
    }
}

fn trim_range(bytes: &[u8], range: Range<usize>) -> Range<usize> {
    let mut start = range.start;
    let mut end = range.end;
    while start < end && bytes[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && bytes[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    start..end
}

fn slice(text: &str, range: Range<usize>) -> &str {
    text.get(range).unwrap_or("")
}

/// Split a selector list into selectors.
///
/// `masked` and `original` are the same span of the masked and unmasked
/// stylesheet; `offset` is where that span starts in the stylesheet.
pub fn parse_selector_list(masked: &str, original: &str, offset: usize) -> Vec<Selector> {
    let bytes = masked.as_bytes();
    let mut pieces = Vec::new();
    let mut piece_start = 0;
    scan_top_level(bytes, 0..bytes.len(), |i, b| {
        if b == b',' {
            pieces.push(piece_start..i);
            piece_start = i + 1;
        }
    });
    pieces.push(piece_start..bytes.len());

    // A list that is nothing but whitespace has no selectors at all.
    if pieces.len() == 1 && trim_range(bytes, pieces[0].clone()).is_empty() {
        return Vec::new();
    }

    pieces
        .into_iter()
        .map(|piece| {
            let trimmed = trim_range(bytes, piece.clone());
            Selector {
                start: offset + piece.start,
                end: offset + piece.end,
                raw_text: slice(original, piece).to_string(),
                cleaned_text: slice(original, trimmed.clone()).to_string(),
                sections: parse_sections(masked, original, trimmed),
                live: true,
            }
        })
        .collect()
}

/// Break one selector (given as a range into the list text) into sections.
fn parse_sections(masked: &str, original: &str, range: Range<usize>) -> Vec<Section> {
    let bytes = masked.as_bytes();

    let mut groups = Vec::new();
    let mut group_start = range.start;
    scan_top_level(bytes, range.clone(), |i, b| {
        if b.is_ascii_whitespace() || matches!(b, b'>' | b'~' | b'+' | b'|') {
            groups.push(group_start..i);
            group_start = i + 1;
        }
    });
    groups.push(group_start..range.end);

    let mut sections = Vec::new();
    for group in groups.into_iter().filter(|g| !g.is_empty()) {
        let mut cuts = Vec::new();
        scan_top_level(bytes, group.clone(), |i, b| {
            if matches!(b, b'.' | b'#' | b'[') && i > group.start {
                cuts.push(i);
            }
        });
        cuts.push(group.end);

        let mut sub_start = group.start;
        for cut in cuts {
            let sub = sub_start..cut;
            sub_start = cut;
            if let Some(section) = build_section(masked, original, sub, sections.len()) {
                sections.push(section);
            }
        }
    }
    sections
}

fn build_section(masked: &str, original: &str, sub: Range<usize>, index: usize) -> Option<Section> {
    let bytes = masked.as_bytes();
    let sub = trim_range(bytes, sub);
    if sub.is_empty() {
        return None;
    }

    // The first top-level colon starts the pseudo suffix; `::` is just the
    // element form of the same thing.
    let mut colon = None;
    scan_top_level(bytes, sub.clone(), |i, b| {
        if b == b':' && colon.is_none() {
            colon = Some(i);
        }
    });
    let (body, pseudo) = match colon {
        Some(at) => (
            sub.start..at,
            Some(slice(original, at..sub.end).to_string()),
        ),
        None => (sub.clone(), None),
    };
    if body.is_empty() {
        return None;
    }

    let kind = classify(slice(masked, body.clone()));
    let text = slice(original, body);
    let cleaned_text = match kind {
        CssSelectorType::Class | CssSelectorType::Id => unescape(text.get(1..).unwrap_or("")),
        _ => text.to_string(),
    };

    Some(Section {
        index,
        raw_text: slice(original, sub).to_string(),
        cleaned_text,
        pseudo,
        kind,
        live: true,
    })
}

/// Classify a section with its pseudo suffix already removed.
///
/// The order of the checks matters: `*.a` is universal, `@media` and
/// keyframe markers are unknown even though they start with letters.
pub fn classify(section: &str) -> CssSelectorType {
    if section.contains('*') {
        CssSelectorType::Universal
    } else if section.starts_with('.') {
        CssSelectorType::Class
    } else if section.starts_with('#') {
        CssSelectorType::Id
    } else if section.starts_with('[') {
        CssSelectorType::Attribute
    } else if section.starts_with('@')
        || section.eq_ignore_ascii_case("from")
        || section.eq_ignore_ascii_case("to")
    {
        CssSelectorType::Unknown
    } else if section.starts_with(|c: char| c.is_ascii_alphabetic()) {
        CssSelectorType::Type
    } else {
        CssSelectorType::Unknown
    }
}

/// Resolve CSS escapes in an identifier (`md\:flex` -> `md:flex`,
/// `\31 0` -> `10`).
fn unescape(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let mut chars = ident.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(*c);
                    chars.next();
                }
                _ => break,
            }
        }
        if hex.is_empty() {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
            continue;
        }
        if chars.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            chars.next();
        }
        let decoded = u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        out.push(decoded);
    }
    out
}
