//! Fix module for auto-remediation.
//!
//! The mutable-default rewrite is planned from scan diagnostics
//! ([`FixPlan`]), turned into byte-range edits over the original text and
//! applied with [`ByteRangeRewriter`]. The result is re-parsed, so a
//! successful [`rewrite`] always hands back a valid tree.

mod mutable_default;
mod plan;
mod rewriter;

use std::path::PathBuf;

pub use mutable_default::{rewrite, AppliedFix, Rewritten};
pub use plan::{FixPlan, PlannedParam};
pub use rewriter::{ByteRangeRewriter, Edit, RewriteError};

/// A planned fix that could not be turned into a valid rewritten tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not synthesize a fix for {}: {source}", path.display())]
pub struct SynthesisError {
    /// Unit the fix was planned for.
    pub path: PathBuf,
    /// Underlying rewrite failure.
    #[source]
    pub source: RewriteError,
}
