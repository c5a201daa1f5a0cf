// tasks.rs
use crate::patterns::{
    convert_to_negative_pattern, get_base_directory, get_negative_patterns_as_positive,
    get_positive_patterns, is_dynamic_pattern, is_negative_pattern, unixify_pattern,
};

/// A planned unit of traversal rooted at one base directory
///
/// `patterns` keeps the unstripped patterns in input order (negatives
/// prefixed with `!`); `positive` and `negative` hold the same patterns
/// relative to `base`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub base: String,
    pub dynamic: bool,
    pub patterns: Vec<String>,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl Task {
    /// Positive patterns as written, for matching full entry paths
    pub fn full_positive(&self) -> Vec<String> {
        get_positive_patterns(&self.patterns)
    }

    /// Negative patterns as written, converted to positive form
    pub fn full_negative(&self) -> Vec<String> {
        get_negative_patterns_as_positive::<_, &str>(&self.patterns, &[])
    }
}

/// Removes the `base/` prefix from a pattern under that base
pub(crate) fn strip_base(pattern: &str, base: &str) -> String {
    if base == "." {
        return pattern.to_string();
    }
    let prefix = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    pattern
        .strip_prefix(prefix.as_str())
        .unwrap_or(pattern)
        .to_string()
}

/// Groups patterns into traversal tasks
///
/// Every distinct base directory of the positive patterns yields one task,
/// in order of first appearance. Negative patterns (main-list negatives
/// first, then `ignore`) subtract from every task. No positive pattern
/// means nothing to read and an empty plan.
pub fn generate<S: AsRef<str>, T: AsRef<str>>(patterns: &[S], ignore: &[T]) -> Vec<Task> {
    let unix_patterns: Vec<String> = patterns.iter().map(|p| unixify_pattern(p.as_ref())).collect();
    let unix_ignore: Vec<String> = ignore.iter().map(|p| unixify_pattern(p.as_ref())).collect();

    let positive = get_positive_patterns(&unix_patterns);
    let negative = get_negative_patterns_as_positive(&unix_patterns, &unix_ignore);

    if positive.is_empty() {
        return Vec::new();
    }

    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for pattern in &positive {
        let base = get_base_directory(pattern);
        match groups.iter_mut().find(|(b, _)| *b == base) {
            Some((_, members)) => members.push(pattern.clone()),
            None => groups.push((base, vec![pattern.clone()])),
        }
    }

    let negated_ignore: Vec<String> = unix_ignore
        .iter()
        .map(|p| convert_to_negative_pattern(p))
        .collect();

    let tasks: Vec<Task> = groups
        .into_iter()
        .map(|(base, members)| {
            let dynamic = members
                .iter()
                .chain(negative.iter())
                .any(|p| is_dynamic_pattern(p));

            let patterns = unix_patterns
                .iter()
                .filter(|p| members.contains(*p) || is_negative_pattern(p))
                .cloned()
                .chain(negated_ignore.iter().cloned())
                .collect();

            Task {
                dynamic,
                patterns,
                positive: members.iter().map(|p| strip_base(p, &base)).collect(),
                negative: negative.iter().map(|p| strip_base(p, &base)).collect(),
                base,
            }
        })
        .collect();

    tracing::debug!(count = tasks.len(), "planned traversal tasks");
    tasks
}
