// reader.rs
use crate::{
    entry::{Entry, EntryItem, EntryKind, EntryStats},
    error::GlobError,
    filters::{DeepFilter, EntryFilter, EntryPredicate},
    options::Options,
    tasks::{strip_base, Task},
};
use std::{
    collections::HashSet,
    fmt,
    fs::Metadata,
    path::{Path, PathBuf},
};

/// Per-task settings handed to a traversal primitive
#[derive(Clone)]
pub struct ReaderOptions {
    /// Prefix joined in front of every relative entry path, empty for `.`
    pub base_path: String,
    pub path_separator: char,
    /// Inclusion predicate
    pub filter: EntryPredicate,
    /// Descent predicate, evaluated for directories only
    pub deep: EntryPredicate,
    pub follow_symlinks: bool,
    pub stats: bool,
}

impl fmt::Debug for ReaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderOptions")
            .field("base_path", &self.base_path)
            .field("path_separator", &self.path_separator)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl ReaderOptions {
    /// Joins a root-relative path onto the task base
    pub fn entry_path(&self, rel: &str) -> String {
        if self.base_path.is_empty() {
            rel.to_string()
        } else if self.base_path.ends_with(self.path_separator) {
            format!("{}{}", self.base_path, rel)
        } else {
            format!("{}{}{}", self.base_path, self.path_separator, rel)
        }
    }
}

/// A traversal mode
///
/// Implementors only supply the I/O: a recursive walk for dynamic tasks and
/// a stat of exact paths for static ones. Everything else is shared through
/// the free functions of this module.
pub trait Execution {
    type Output;

    fn run(&self, task: &Task, options: &Options) -> Self::Output;
}

/// Directory a task is read from
pub fn root_directory(cwd: &Path, task: &Task) -> PathBuf {
    if task.base == "." {
        cwd.to_path_buf()
    } else {
        cwd.join(&task.base)
    }
}

/// Compiles the filters of one task
pub fn reader_options(task: &Task, options: &Options) -> Result<ReaderOptions, GlobError> {
    let matcher_options = options.matcher_options();
    let negative = task.full_negative();

    let deep = DeepFilter::new(options, matcher_options).get_filter(&task.positive, &negative)?;
    let filter =
        EntryFilter::new(options, matcher_options).get_filter(&task.full_positive(), &negative)?;

    Ok(ReaderOptions {
        base_path: if task.base == "." {
            String::new()
        } else {
            task.base.clone()
        },
        path_separator: '/',
        filter,
        deep,
        follow_symlinks: options.follow_symlinked_directories,
        stats: options.stats,
    })
}

/// `/`-separated absolute form of an entry path
///
/// A trailing separator on `path` survives the conversion.
pub fn absolute_path(cwd: &Path, path: &str) -> String {
    if path.starts_with('/') {
        return path.to_string();
    }
    let cwd = cwd.to_string_lossy().replace('\\', "/");
    let path = path.strip_prefix("./").unwrap_or(path);
    format!("{}/{}", cwd.trim_end_matches('/'), path)
}

/// Maps an included entry into the caller-visible shape
pub fn transform(mut entry: Entry, options: &Options) -> EntryItem {
    if options.mark_directories && entry.is_directory() && !entry.path.ends_with('/') {
        entry.path.push('/');
    }

    if options.absolute {
        entry.path = absolute_path(&options.cwd, &entry.path);
    }

    let item = if options.stats {
        EntryItem::Entry(entry)
    } else {
        EntryItem::Path(entry.path)
    };

    match &options.transform {
        Some(f) => f(item),
        None => item,
    }
}

/// Depth of a static path below its task root
pub(crate) fn static_depth(pattern: &str, base: &str) -> usize {
    strip_base(pattern, base)
        .split('/')
        .filter(|s| !s.is_empty())
        .count()
        .saturating_sub(1)
}

/// Builds an entry from `lstat` and, for symlinks, the resolved target
pub(crate) fn entry_from_metadata(
    path: String,
    depth: usize,
    lstat: &Metadata,
    target: Option<&Metadata>,
    with_stats: bool,
) -> Entry {
    let meta = target.unwrap_or(lstat);
    Entry {
        path,
        depth,
        kind: EntryKind::from(meta.file_type()),
        symlink: lstat.file_type().is_symlink(),
        stats: with_stats.then(|| EntryStats::from(meta)),
    }
}

/// Single owner of the results of one invocation
///
/// Entries from every task pass through here exactly once; duplicates are
/// dropped by raw entry path when `unique` is set, the rest are transformed.
pub(crate) struct Consolidator {
    seen: Option<HashSet<String>>,
    options: Options,
}

impl Consolidator {
    pub(crate) fn new(options: Options) -> Self {
        Self {
            seen: options.unique.then(HashSet::new),
            options,
        }
    }

    pub(crate) fn accept(&mut self, entry: Entry) -> Option<EntryItem> {
        if let Some(seen) = &mut self.seen {
            if !seen.insert(entry.path.clone()) {
                return None;
            }
        }
        Some(transform(entry, &self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionsBuilder;

    fn entry(path: &str, kind: EntryKind) -> Entry {
        Entry {
            path: path.to_string(),
            depth: 0,
            kind,
            symlink: false,
            stats: None,
        }
    }

    fn directory_entry() -> Entry {
        entry("fixtures/directory", EntryKind::Directory)
    }

    fn file_entry() -> Entry {
        entry("fixtures/file.txt", EntryKind::File)
    }

    fn task(base: &str) -> Task {
        Task {
            base: base.into(),
            dynamic: true,
            patterns: vec!["**/*".into()],
            positive: vec!["**/*".into()],
            negative: vec![],
        }
    }

    #[test]
    fn root_directory_for_global_base() {
        let cwd = Path::new("/work");
        assert_eq!(root_directory(cwd, &task(".")), PathBuf::from("/work"));
    }

    #[test]
    fn root_directory_for_nested_base() {
        let cwd = Path::new("/work");
        assert_eq!(
            root_directory(cwd, &task("fixtures")),
            PathBuf::from("/work/fixtures")
        );
    }

    #[test]
    fn reader_options_for_global_base() {
        let ro = reader_options(&task("."), &Options::default()).unwrap();
        assert_eq!(ro.base_path, "");
        assert_eq!(ro.path_separator, '/');
        assert_eq!(ro.entry_path("a/b.md"), "a/b.md");
    }

    #[test]
    fn reader_options_for_nested_base() {
        let ro = reader_options(&task("fixtures"), &Options::default()).unwrap();
        assert_eq!(ro.base_path, "fixtures");
        assert_eq!(ro.entry_path("a/b.md"), "fixtures/a/b.md");
    }

    #[test]
    fn entry_path_under_filesystem_root() {
        let mut ro = reader_options(&task("."), &Options::default()).unwrap();
        ro.base_path = "/".into();
        assert_eq!(ro.entry_path("etc"), "/etc");
    }

    #[test]
    fn mark_directories() {
        let options = OptionsBuilder::new().mark_directories(true).build();
        assert_eq!(
            transform(directory_entry(), &options),
            EntryItem::from("fixtures/directory/")
        );
        assert_eq!(
            transform(file_entry(), &options),
            EntryItem::from("fixtures/file.txt")
        );
    }

    #[test]
    fn directories_unmarked_by_default() {
        assert_eq!(
            transform(directory_entry(), &Options::default()),
            EntryItem::from("fixtures/directory")
        );
    }

    #[test]
    fn mark_directories_with_absolute() {
        let options = OptionsBuilder::new()
            .cwd("/work")
            .mark_directories(true)
            .absolute(true)
            .build();
        assert_eq!(
            transform(directory_entry(), &options),
            EntryItem::from("/work/fixtures/directory/")
        );
    }

    #[test]
    fn absolute_paths() {
        let options = OptionsBuilder::new().cwd("/work/").absolute(true).build();
        assert_eq!(
            transform(file_entry(), &options),
            EntryItem::from("/work/fixtures/file.txt")
        );

        let already = entry("/abs/file.txt", EntryKind::File);
        assert_eq!(
            transform(already, &options),
            EntryItem::from("/abs/file.txt")
        );
    }

    #[test]
    fn user_transform_runs_last() {
        let options = OptionsBuilder::new()
            .mark_directories(true)
            .transform(|_| EntryItem::from("cake"))
            .build();
        assert_eq!(transform(directory_entry(), &options), EntryItem::from("cake"));
    }

    #[test]
    fn user_transform_sees_marked_path() {
        let options = OptionsBuilder::new()
            .mark_directories(true)
            .transform(|item| EntryItem::Path(item.path().to_uppercase()))
            .build();
        assert_eq!(
            transform(directory_entry(), &options),
            EntryItem::from("FIXTURES/DIRECTORY/")
        );
    }

    #[test]
    fn stats_keep_the_whole_entry() {
        let options = OptionsBuilder::new().stats(true).build();
        match transform(file_entry(), &options) {
            EntryItem::Entry(e) => assert_eq!(e.path, "fixtures/file.txt"),
            other => panic!("unexpected item {other:?}"),
        }
    }

    #[test]
    fn static_depth_below_base() {
        assert_eq!(static_depth("fixtures/file.md", "fixtures"), 0);
        assert_eq!(static_depth("fixtures/a/b/file.md", "fixtures"), 2);
        assert_eq!(static_depth("file.md", "."), 0);
    }

    #[test]
    fn consolidator_drops_duplicates() {
        let mut c = Consolidator::new(Options::default());
        assert!(c.accept(file_entry()).is_some());
        assert!(c.accept(file_entry()).is_none());

        let mut c = Consolidator::new(OptionsBuilder::new().unique(false).build());
        assert!(c.accept(file_entry()).is_some());
        assert!(c.accept(file_entry()).is_some());
    }
}
