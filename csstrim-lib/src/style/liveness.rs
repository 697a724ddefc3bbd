//! Deciding which selectors can still match the page.

use crate::facts::FactSet;
use crate::style::selector::{CssSelectorType, Section, Selector};

/// What should happen to a ruleset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every selector is live; leave the ruleset alone.
    KeepAll,
    /// Some selectors are dead. Holds their positions in the selector list.
    KeepPartial { dead: Vec<usize> },
    /// No selector is live; remove the whole ruleset.
    DropAll,
}

/// Whether a single section could match something on the page.
///
/// Universal, attribute and unknown sections cannot be checked against the
/// collected facts and are always live.
pub fn section_is_live(section: &Section, facts: &FactSet) -> bool {
    match section.kind {
        CssSelectorType::Type => facts.has_tag(&section.cleaned_text),
        CssSelectorType::Class => facts.has_class(&section.cleaned_text),
        CssSelectorType::Id => facts.has_id(&section.cleaned_text),
        CssSelectorType::Universal | CssSelectorType::Attribute | CssSelectorType::Unknown => true,
    }
}

/// Mark every section of `selector` and the selector itself.
///
/// A selector is live only if all of its sections are: every compound in a
/// chain like `.nav li.active` has to exist somewhere for it to match.
pub fn analyze_selector(selector: &mut Selector, facts: &FactSet) -> bool {
    let mut live = true;
    for section in &mut selector.sections {
        section.live = section_is_live(section, facts);
        live &= section.live;
    }
    selector.live = live;
    live
}

/// Analyze every selector of a ruleset and reduce them to a verdict.
///
/// An empty selector list is kept: nothing was analyzed, so nothing is
/// known to be dead.
pub fn analyze_ruleset(selectors: &mut [Selector], facts: &FactSet) -> Verdict {
    let dead: Vec<usize> = selectors
        .iter_mut()
        .enumerate()
        .filter_map(|(index, selector)| (!analyze_selector(selector, facts)).then_some(index))
        .collect();

    if dead.is_empty() {
        Verdict::KeepAll
    } else if dead.len() == selectors.len() {
        Verdict::DropAll
    } else {
        Verdict::KeepPartial { dead }
    }
}
