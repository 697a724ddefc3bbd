//! Ruleset discovery.
//!
//! One pass over the masked stylesheet with a stack of open blocks. A block
//! that closes without having opened another one is a leaf ruleset; a block
//! that contains other blocks (`@media`, `@supports`, `@keyframes`, nested
//! rules) is a group and carries its children in `nested`.

use std::ops::Range;

/// One `selector-list { declarations }` unit.
///
/// All offsets are byte offsets into the original stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruleset {
    /// Start of the selector list, i.e. just after the previous `{`, `}` or
    /// `;` (leading whitespace included).
    pub start: usize,
    /// One past the closing brace.
    pub end: usize,
    pub selector_list: Range<usize>,
    /// The braces and everything between them.
    pub declarations: Range<usize>,
    pub nested: Vec<Ruleset>,
}

impl Ruleset {
    /// A leaf has no rulesets inside its block, so its selector list is the
    /// one that has to match elements.
    pub fn is_leaf(&self) -> bool {
        self.nested.is_empty()
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Every leaf in `rulesets`, depth first, in source order.
pub fn leaves(rulesets: &[Ruleset]) -> Vec<&Ruleset> {
    let mut out = Vec::new();
    collect_leaves(rulesets, &mut out);
    out
}

fn collect_leaves<'a>(rulesets: &'a [Ruleset], out: &mut Vec<&'a Ruleset>) {
    for ruleset in rulesets {
        if ruleset.is_leaf() {
            out.push(ruleset);
        } else {
            collect_leaves(&ruleset.nested, out);
        }
    }
}

/// A block that has been opened but not yet closed.
struct OpenBlock {
    selector_start: usize,
    open: usize,
    children: Vec<Ruleset>,
}

/// Find all rulesets in `masked`, which must come from the sanitizer so that
/// braces and semicolons inside comments and strings are already gone.
///
/// Unbalanced input never fails: a stray `}` is skipped, and blocks still
/// open at the end are dropped while the complete rulesets found inside them
/// are kept.
pub fn parse_rulesets(masked: &str) -> Vec<Ruleset> {
    let mut top_level = Vec::new();
    let mut stack: Vec<OpenBlock> = Vec::new();
    let mut boundary = 0;

    for (i, b) in masked.bytes().enumerate() {
        match b {
            b'{' => {
                stack.push(OpenBlock {
                    selector_start: boundary,
                    open: i,
                    children: Vec::new(),
                });
                boundary = i + 1;
            }
            b'}' => {
                match stack.pop() {
                    Some(block) => {
                        let ruleset = Ruleset {
                            start: block.selector_start,
                            end: i + 1,
                            selector_list: block.selector_start..block.open,
                            declarations: block.open..i + 1,
                            nested: block.children,
                        };
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(ruleset),
                            None => top_level.push(ruleset),
                        }
                    }
                    None => log::warn!("unmatched '}}' at byte {}", i),
                }
                boundary = i + 1;
            }
            b';' => boundary = i + 1,
            _ => {}
        }
    }

    if !stack.is_empty() {
        log::warn!("{} block(s) left open at end of stylesheet", stack.len());
        for block in stack {
            top_level.extend(block.children);
        }
        top_level.sort_by_key(|ruleset| ruleset.start);
    }

    top_level
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn selector_lists<'a>(css: &'a str, rulesets: &[Ruleset]) -> Vec<&'a str> {
        leaves(rulesets)
            .into_iter()
            .map(|r| css[r.selector_list.clone()].trim())
            .collect()
    }

    #[test]
    fn test_flat_rulesets() {
        let css = ".a{x:1}\n.b, .c { y: 2 }";
        let rulesets = parse_rulesets(css);
        assert_eq!(rulesets.len(), 2);
        assert_eq!(rulesets[0].span(), 0..7);
        assert_eq!(rulesets[0].selector_list, 0..2);
        assert_eq!(rulesets[0].declarations, 2..7);
        assert_eq!(&css[rulesets[1].span()], "\n.b, .c { y: 2 }");
        assert_eq!(selector_lists(css, &rulesets), vec![".a", ".b, .c"]);
    }

    #[test]
    fn test_group_rulesets_are_nested() {
        let css = "@media print{.a{x:1}.b{y:2}}p{z:3}";
        let rulesets = parse_rulesets(css);
        assert_eq!(rulesets.len(), 2);
        let media = &rulesets[0];
        assert!(!media.is_leaf());
        assert_eq!(&css[media.selector_list.clone()], "@media print");
        assert_eq!(media.nested.len(), 2);
        assert_eq!(&css[media.nested[0].span()], ".a{x:1}");
        assert_eq!(&css[media.nested[1].span()], ".b{y:2}");
        assert_eq!(selector_lists(css, &rulesets), vec![".a", ".b", "p"]);
    }

    #[test]
    fn test_semicolon_starts_new_selector_list() {
        let css = "@import url(x.css);\n.a{x:1}";
        let rulesets = parse_rulesets(css);
        assert_eq!(rulesets.len(), 1);
        assert_eq!(&css[rulesets[0].span()], "\n.a{x:1}");
    }

    #[test]
    fn test_deeper_nesting() {
        let css = "@supports (display:grid){@media screen{.grid{display:grid}}}";
        let rulesets = parse_rulesets(css);
        assert_eq!(rulesets.len(), 1);
        assert_eq!(rulesets[0].nested.len(), 1);
        assert_eq!(rulesets[0].nested[0].nested.len(), 1);
        assert_eq!(selector_lists(css, &rulesets), vec![".grid"]);
    }

    #[test]
    fn test_stray_closing_brace_is_skipped() {
        let css = "}.a{x:1}}.b{y:2}";
        let rulesets = parse_rulesets(css);
        assert_eq!(selector_lists(css, &rulesets), vec![".a", ".b"]);
    }

    #[test]
    fn test_unclosed_group_keeps_complete_children() {
        let css = ".a{x:1}@media print{.b{y:2}.c{z:";
        let rulesets = parse_rulesets(css);
        assert_eq!(selector_lists(css, &rulesets), vec![".a", ".b"]);
        assert_eq!(rulesets.iter().map(|r| r.start).collect::<Vec<_>>(), vec![0, 20]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_rulesets("").is_empty());
        assert!(parse_rulesets("   \n").is_empty());
    }
}
