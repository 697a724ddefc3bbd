//! Masking of comments and string literals.
//!
//! The structural scanners downstream look for `,`, `{`, `}`, `;` and `:`
//! without knowing anything about CSS tokens. Comments and strings can hold
//! any of those, so they are overwritten first. Every replacement is byte for
//! byte, which keeps each offset found in the masked text valid against the
//! original.

use std::ops::Range;

/// Byte used to fill the interior of string literals.
const STRING_FILLER: u8 = b'X';

/// The result of sanitizing one stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    /// Comments blanked out, string contents replaced with filler. Only
    /// used for finding structure.
    pub masked: String,
    /// Comments blanked out, strings untouched. This is the text edits are
    /// applied to, since comments never survive into the output.
    pub stripped: String,
    /// Spans of the comments that were removed, in source order.
    pub comments: Vec<Range<usize>>,
    /// True if the input ended inside a comment or a string.
    pub unterminated: bool,
}

enum State {
    Normal,
    Comment { start: usize },
    String { quote: u8 },
}

/// Mask comments and string literals in `css`.
///
/// Comments run from `/*` to the next `*/`, or to the end of input when the
/// terminator is missing. Strings end at the matching quote; an unescaped
/// line break also ends them, as it does in the CSS tokenizer, so a stray
/// quote cannot swallow the rest of the sheet.
pub fn sanitize(css: &str) -> Sanitized {
    let bytes = css.as_bytes();
    let mut masked = bytes.to_vec();
    let mut stripped = bytes.to_vec();
    let mut comments = Vec::new();
    let mut state = State::Normal;

    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match state {
            State::Normal => {
                if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
                    state = State::Comment { start: i };
                    i += 2;
                    continue;
                }
                if b == b'"' || b == b'\'' {
                    state = State::String { quote: b };
                } else if b == b'\\' && i + 1 < bytes.len() {
                    // An escaped quote outside a string is not a string start.
                    i += 2;
                    continue;
                }
            }
            State::Comment { start } => {
                if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    let end = i + 2;
                    blank(&mut masked[start..end]);
                    blank(&mut stripped[start..end]);
                    comments.push(start..end);
                    state = State::Normal;
                    i = end;
                    continue;
                }
            }
            State::String { quote } => {
                if b == quote || b == b'\n' || b == b'\r' {
                    state = State::Normal;
                } else if b == b'\\' && i + 1 < bytes.len() {
                    masked[i] = STRING_FILLER;
                    if bytes[i + 1] != b'\n' && bytes[i + 1] != b'\r' {
                        masked[i + 1] = STRING_FILLER;
                        i += 2;
                        continue;
                    }
                } else {
                    masked[i] = STRING_FILLER;
                }
            }
        }
        i += 1;
    }

    let unterminated = match state {
        State::Normal => false,
        State::Comment { start } => {
            blank(&mut masked[start..]);
            blank(&mut stripped[start..]);
            comments.push(start..bytes.len());
            true
        }
        State::String { .. } => true,
    };
    if unterminated {
        log::warn!("stylesheet ends inside an unterminated comment or string");
    }

    Sanitized {
        masked: into_string(masked),
        stripped: into_string(stripped),
        comments,
        unterminated,
    }
}

/// Overwrite a span with spaces.
fn blank(span: &mut [u8]) {
    span.fill(b' ');
}

/// Both buffers start as valid UTF-8 and only ever have whole multi-byte
/// sequences replaced with ASCII, so conversion cannot fail; the lossy path
/// is there to avoid a panic branch.
fn into_string(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}
