// filters/deep.rs
use super::EntryPredicate;
use crate::{
    entry::Entry,
    error::GlobError,
    options::{Depth, Options},
    patterns::{
        convert_patterns_to_re, get_max_naive_patterns_depth, has_glob_star,
        is_affect_depth_of_reading_pattern, match_any, Matcher, MatcherOptions,
    },
};
use std::sync::Arc;

/// Decides whether traversal descends into a directory
#[derive(Clone, Debug)]
pub struct DeepFilter {
    deep: Depth,
    follow_symlinked_directories: bool,
    dot: bool,
    matcher_options: MatcherOptions,
}

impl DeepFilter {
    pub fn new(options: &Options, matcher_options: MatcherOptions) -> Self {
        Self {
            deep: options.deep,
            follow_symlinked_directories: options.follow_symlinked_directories,
            dot: options.dot,
            matcher_options,
        }
    }

    /// Returns the descent predicate for one task
    ///
    /// `positive` are the task patterns relative to its base and bound the
    /// depth. `negative` are negative patterns as written (without `!`),
    /// tested against full entry paths; only those that can exclude a whole
    /// directory are used.
    pub fn get_filter(
        &self,
        positive: &[String],
        negative: &[String],
    ) -> Result<EntryPredicate, GlobError> {
        let max_pattern_depth = max_pattern_depth(positive);
        let negative_re = self.negative_patterns_re(negative)?;
        let this = self.clone();

        Ok(Arc::new(move |entry: &Entry| {
            this.filter(entry, &negative_re, max_pattern_depth)
        }))
    }

    fn negative_patterns_re(&self, patterns: &[String]) -> Result<Vec<Matcher>, GlobError> {
        let affecting: Vec<&String> = patterns
            .iter()
            .filter(|p| is_affect_depth_of_reading_pattern(p))
            .collect();
        convert_patterns_to_re(&affecting, &self.matcher_options)
    }

    fn filter(&self, entry: &Entry, negative_re: &[Matcher], max_pattern_depth: Option<usize>) -> bool {
        let descend = self.deep.allows(entry.depth)
            && max_pattern_depth.map_or(true, |max| entry.depth < max)
            && !self.is_skipped_symlinked_directory(entry)
            && !self.is_skipped_dot_directory(entry)
            && !match_any(&entry.path, negative_re);

        if !descend {
            tracing::trace!(path = %entry.path, depth = entry.depth, "pruned directory");
        }
        descend
    }

    fn is_skipped_symlinked_directory(&self, entry: &Entry) -> bool {
        !self.follow_symlinked_directories && entry.is_symbolic_link()
    }

    fn is_skipped_dot_directory(&self, entry: &Entry) -> bool {
        !self.dot && entry.name().starts_with('.')
    }
}

/// Depth bound derived from the patterns, `None` when a globstar lifts it
fn max_pattern_depth(patterns: &[String]) -> Option<usize> {
    if patterns.iter().any(|p| has_glob_star(p)) {
        None
    } else {
        Some(get_max_naive_patterns_depth(patterns))
    }
}
