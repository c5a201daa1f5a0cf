// patterns/mod.rs
pub mod analysis;
pub mod brace;
pub mod cache;
pub mod extglob;
pub mod matcher;

pub use analysis::*;
pub use cache::{cache_metrics, clear_cache, CacheMetrics};
pub use matcher::{Matcher, MatcherOptions};

use crate::error::GlobError;

/// Compiles a pattern, memoized per (pattern, options) pair
pub fn make_re(pattern: &str, options: &MatcherOptions) -> Result<Matcher, GlobError> {
    cache::get_or_compile(pattern, options)
}

/// Compiles every pattern, preserving order
pub fn convert_patterns_to_re<S: AsRef<str>>(
    patterns: &[S],
    options: &MatcherOptions,
) -> Result<Vec<Matcher>, GlobError> {
    patterns
        .iter()
        .map(|p| make_re(p.as_ref(), options))
        .collect()
}

/// Returns `true` when any matcher accepts the path
///
/// A single leading `./` is ignored, traversal paths and pattern-derived
/// paths may differ only in that prefix.
pub fn match_any(path: &str, matchers: &[Matcher]) -> bool {
    let path = path.strip_prefix("./").unwrap_or(path);
    matchers.iter().any(|m| m.test(path))
}
