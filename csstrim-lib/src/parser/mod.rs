pub mod html;
pub mod ruleset;
pub mod sanitize;
