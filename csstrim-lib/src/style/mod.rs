pub mod liveness;
pub mod rewrite;
pub mod selector;
