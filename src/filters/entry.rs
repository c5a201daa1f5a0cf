// filters/entry.rs
use super::EntryPredicate;
use crate::{
    entry::Entry,
    error::GlobError,
    options::Options,
    patterns::{convert_patterns_to_re, match_any, Matcher, MatcherOptions},
    reader::absolute_path,
};
use std::{path::PathBuf, sync::Arc};

/// Decides whether a visited entry is reported
#[derive(Clone, Debug)]
pub struct EntryFilter {
    only_files: bool,
    only_directories: bool,
    absolute: bool,
    cwd: PathBuf,
    matcher_options: MatcherOptions,
}

impl EntryFilter {
    pub fn new(options: &Options, matcher_options: MatcherOptions) -> Self {
        Self {
            only_files: options.only_files,
            only_directories: options.only_directories,
            absolute: options.absolute,
            cwd: options.cwd.clone(),
            matcher_options,
        }
    }

    /// Returns the inclusion predicate for one task
    ///
    /// Both pattern sets are the task patterns as written (negatives without
    /// `!`) and are tested against full entry paths. The dot-file policy is
    /// carried by the compiled matchers.
    pub fn get_filter(
        &self,
        positive: &[String],
        negative: &[String],
    ) -> Result<EntryPredicate, GlobError> {
        let positive_re = convert_patterns_to_re(positive, &self.matcher_options)?;
        let negative_re = convert_patterns_to_re(negative, &self.matcher_options)?;
        let absolute_negative_re: Vec<Matcher> = if self.absolute {
            negative_re
                .iter()
                .filter(|m| m.pattern().starts_with('/'))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        let this = self.clone();

        Ok(Arc::new(move |entry: &Entry| {
            this.filter(entry, &positive_re, &negative_re, &absolute_negative_re)
        }))
    }

    fn filter(
        &self,
        entry: &Entry,
        positive_re: &[Matcher],
        negative_re: &[Matcher],
        absolute_negative_re: &[Matcher],
    ) -> bool {
        if self.only_file_filter(entry) || self.only_directory_filter(entry) {
            return false;
        }

        if self.is_skipped_by_absolute_negative_patterns(entry, absolute_negative_re) {
            return false;
        }

        match_any(&entry.path, positive_re) && !match_any(&entry.path, negative_re)
    }

    fn only_file_filter(&self, entry: &Entry) -> bool {
        self.only_files && !entry.is_file()
    }

    fn only_directory_filter(&self, entry: &Entry) -> bool {
        self.only_directories && !entry.is_directory()
    }

    fn is_skipped_by_absolute_negative_patterns(&self, entry: &Entry, patterns: &[Matcher]) -> bool {
        if patterns.is_empty() {
            return false;
        }
        match_any(&absolute_path(&self.cwd, &entry.path), patterns)
    }
}
