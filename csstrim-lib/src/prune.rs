use crate::error::{InputKind, PruneError};
use crate::facts::FactSet;
use crate::parser::ruleset::{self, Ruleset};
use crate::parser::sanitize::{self, Sanitized};
use crate::style::liveness::{self, Verdict};
use crate::style::rewrite::{self, Edit};
use crate::style::selector;
use rayon::prelude::*;

/// Settings for a [`Pruner`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneOptions {
    /// Reject inputs longer than this many bytes. `None` means no limit.
    pub max_input_bytes: Option<usize>,
}

impl PruneOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_input_bytes(mut self, limit: usize) -> Self {
        self.max_input_bytes = Some(limit);
        self
    }
}

/// What one pruning run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Leaf rulesets whose selectors were checked against the page.
    pub rulesets_analyzed: usize,
    /// Rulesets removed because none of their selectors is live.
    pub rulesets_dropped: usize,
    /// Rulesets kept with some of their selectors removed.
    pub rulesets_rewritten: usize,
    pub selectors_removed: usize,
    pub comments_removed: usize,
    /// Empty `selector {}` units (including emptied groups) deleted at the end.
    pub empty_rulesets_removed: usize,
}

/// The pruned stylesheet together with its report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneOutcome {
    pub css: String,
    pub report: PruneReport,
}

/// A stylesheet that has been sanitized and split into rulesets, ready to be
/// pruned against any number of pages.
struct ParsedStylesheet {
    sanitized: Sanitized,
    rulesets: Vec<Ruleset>,
}

impl ParsedStylesheet {
    fn parse(css: &str) -> Self {
        let sanitized = sanitize::sanitize(css);
        let rulesets = ruleset::parse_rulesets(&sanitized.masked);
        ParsedStylesheet {
            sanitized,
            rulesets,
        }
    }

    /// Decide on every leaf ruleset and turn the verdicts into edits.
    fn plan_edits(&self, facts: &FactSet, report: &mut PruneReport) -> Vec<Edit> {
        let masked = &self.sanitized.masked;
        let stripped = &self.sanitized.stripped;
        let mut edits = Vec::new();

        for ruleset in ruleset::leaves(&self.rulesets) {
            report.rulesets_analyzed += 1;
            let list = ruleset.selector_list.clone();
            let mut selectors = selector::parse_selector_list(
                masked.get(list.clone()).unwrap_or(""),
                stripped.get(list.clone()).unwrap_or(""),
                list.start,
            );

            let verdict = liveness::analyze_ruleset(&mut selectors, facts);
            log::trace!(
                "{:?} {:?}",
                stripped.get(list).unwrap_or("").trim(),
                verdict
            );
            match verdict {
                Verdict::KeepAll => {}
                Verdict::KeepPartial { dead } => {
                    if let Some(edit) = rewrite::prune_selector_list(&selectors) {
                        report.rulesets_rewritten += 1;
                        report.selectors_removed += dead.len();
                        edits.push(edit);
                    }
                }
                Verdict::DropAll => {
                    report.rulesets_dropped += 1;
                    report.selectors_removed += selectors.len();
                    edits.push(rewrite::blank_ruleset(ruleset));
                }
            }
        }
        edits
    }

    fn prune_against(&self, facts: &FactSet) -> PruneOutcome {
        let mut report = PruneReport {
            comments_removed: self.sanitized.comments.len(),
            ..PruneReport::default()
        };
        let edits = self.plan_edits(facts, &mut report);
        let (css, empty_removed) = rewrite::rewrite(&self.sanitized.stripped, edits);
        report.empty_rulesets_removed = empty_removed;

        log::debug!(
            "analyzed {} rulesets: {} dropped, {} rewritten, {} selectors removed",
            report.rulesets_analyzed,
            report.rulesets_dropped,
            report.rulesets_rewritten,
            report.selectors_removed
        );
        PruneOutcome { css, report }
    }
}

/// Prune one stylesheet against one page. Facts and rulesets are gathered
/// concurrently; everything after that runs in order on one buffer.
fn run(css: &str, html: &str) -> PruneOutcome {
    let (facts, parsed) = rayon::join(
        || FactSet::from_html(html),
        || ParsedStylesheet::parse(css),
    );
    parsed.prune_against(&facts)
}

/// Remove every rule from `css` that cannot match anything in `html`.
///
/// Never fails: malformed input is pruned as far as it can be understood
/// and the rest is passed through.
pub fn remove_unused_rules(css: &str, html: &str) -> String {
    run(css, html).css
}

/// Entry point with boundary checks and reporting.
#[derive(Debug, Clone, Default)]
pub struct Pruner {
    options: PruneOptions,
}

impl Pruner {
    pub fn new(options: PruneOptions) -> Self {
        Pruner { options }
    }

    pub fn options(&self) -> &PruneOptions {
        &self.options
    }

    fn check_size(&self, input: InputKind, len: usize) -> Result<(), PruneError> {
        match self.options.max_input_bytes {
            Some(limit) if len > limit => Err(PruneError::InputTooLarge { input, len, limit }),
            _ => Ok(()),
        }
    }

    pub fn prune(&self, css: &str, html: &str) -> Result<String, PruneError> {
        Ok(self.prune_with_report(css, html)?.css)
    }

    pub fn prune_with_report(&self, css: &str, html: &str) -> Result<PruneOutcome, PruneError> {
        self.check_size(InputKind::Css, css.len())?;
        self.check_size(InputKind::Html, html.len())?;
        Ok(run(css, html))
    }

    /// Like [`Pruner::prune`] for raw bytes, which must be UTF-8.
    pub fn prune_bytes(&self, css: &[u8], html: &[u8]) -> Result<String, PruneError> {
        self.check_size(InputKind::Css, css.len())?;
        self.check_size(InputKind::Html, html.len())?;
        let css = decode(InputKind::Css, css)?;
        let html = decode(InputKind::Html, html)?;
        Ok(run(css, html).css)
    }

    /// Prune one stylesheet against several pages in parallel.
    ///
    /// The stylesheet is parsed once; each page gets its own facts and its
    /// own output buffer. The outer error is for the stylesheet, the inner
    /// ones are per page, in the order the pages were given.
    pub fn prune_pages(
        &self,
        css: &str,
        pages: &[&str],
    ) -> Result<Vec<Result<PruneOutcome, PruneError>>, PruneError> {
        self.check_size(InputKind::Css, css.len())?;
        let parsed = ParsedStylesheet::parse(css);
        Ok(pages
            .par_iter()
            .map(|html| -> Result<PruneOutcome, PruneError> {
                self.check_size(InputKind::Html, html.len())?;
                let facts = FactSet::from_html(html);
                Ok(parsed.prune_against(&facts))
            })
            .collect())
    }

    /// [`Pruner::prune_pages`] for raw bytes. The stylesheet and every page
    /// must be UTF-8; a page that is not fails on its own.
    pub fn prune_pages_bytes(
        &self,
        css: &[u8],
        pages: &[&[u8]],
    ) -> Result<Vec<Result<PruneOutcome, PruneError>>, PruneError> {
        self.check_size(InputKind::Css, css.len())?;
        let parsed = ParsedStylesheet::parse(decode(InputKind::Css, css)?);
        Ok(pages
            .par_iter()
            .map(|html| -> Result<PruneOutcome, PruneError> {
                self.check_size(InputKind::Html, html.len())?;
                let facts = FactSet::from_html(decode(InputKind::Html, html)?);
                Ok(parsed.prune_against(&facts))
            })
            .collect())
    }
}

fn decode(input: InputKind, bytes: &[u8]) -> Result<&str, PruneError> {
    std::str::from_utf8(bytes).map_err(|err| PruneError::InvalidEncoding {
        input,
        valid_up_to: err.valid_up_to(),
    })
}
