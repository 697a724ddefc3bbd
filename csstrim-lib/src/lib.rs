//! Dead-selector elimination for CSS.
//!
//! Given a stylesheet and the HTML of a page, [`remove_unused_rules`] returns
//! the stylesheet with every rule removed that cannot match anything on the
//! page. The stylesheet is never re-serialized: rules that survive keep their
//! original text, apart from a final whitespace pass.

pub mod error;
pub mod facts;
pub mod parser;
pub mod prune;
pub mod style;

pub use error::{InputKind, PruneError};
pub use facts::FactSet;
pub use prune::{remove_unused_rules, PruneOptions, PruneOutcome, PruneReport, Pruner};
pub use style::selector::CssSelectorType;
