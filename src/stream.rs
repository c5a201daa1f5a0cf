// stream.rs
//! Lazy traversal over tokio's async filesystem API.
//!
//! Each task becomes one stream; `consolidate` merges them into the
//! stream handed to the caller.
use crate::{
    entry::{Entry, EntryItem, EntryKind, EntryStats},
    error::GlobError,
    options::Options,
    reader::{
        entry_from_metadata, reader_options, root_directory, static_depth, Consolidator,
        Execution, ReaderOptions,
    },
    tasks::Task,
};
use async_stream::{stream, try_stream};
use futures::{
    stream::{self, select_all, BoxStream},
    Stream, StreamExt,
};
use std::{
    fs::Metadata,
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Lazy traversal that yields entries as directories are read
///
/// Nothing is read until the stream is polled, and dropping the stream stops
/// the traversal.
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamExecution;

impl Execution for StreamExecution {
    type Output = BoxStream<'static, Result<Entry, GlobError>>;

    /// Builds the stream for one task
    ///
    /// A pattern that fails to compile becomes a single-error stream, so
    /// failures surface through the same channel as traversal errors.
    fn run(&self, task: &Task, options: &Options) -> Self::Output {
        let ro = match reader_options(task, options) {
            Ok(ro) => ro,
            Err(err) => return stream::once(async move { Err(err) }).boxed(),
        };
        tracing::debug!(base = %task.base, dynamic = task.dynamic, "streaming task");

        if task.dynamic {
            self.dynamic(root_directory(&options.cwd, task), ro)
        } else {
            self.static_paths(options.cwd.clone(), task.clone(), ro)
        }
    }
}

/// A directory waiting to be read
struct Pending {
    dir: PathBuf,
    rel: String,
    depth: usize,
    /// Canonical paths from the root down to `dir`, kept when following links
    ancestors: Vec<PathBuf>,
}

impl StreamExecution {
    /// Walks `root` depth first, ending the stream at the first fatal error
    ///
    /// # Arguments
    ///
    /// * `root` - Directory the task reads, already joined with the cwd
    /// * `ro` - Filters and path settings for this task
    ///
    /// # Returns
    ///
    /// A stream of `Result<Entry, GlobError>`; an `Err` is always the last item
    ///
    /// # Errors
    ///
    /// Yields `GlobError::SymlinkCycle` when a followed link resolves to a
    /// directory already on the current path, and `GlobError::Io` for
    /// filesystem failures other than not-found.
    pub fn dynamic(
        &self,
        root: PathBuf,
        ro: ReaderOptions,
    ) -> BoxStream<'static, Result<Entry, GlobError>> {
        let s = try_stream! {
            let ancestors = if ro.follow_symlinks {
                match missing_as_none(fs::canonicalize(&root).await, &root)? {
                    Some(canonical) => vec![canonical],
                    None => return,
                }
            } else {
                Vec::new()
            };
            let mut pending = vec![Pending { dir: root, rel: String::new(), depth: 0, ancestors }];

            while let Some(current) = pending.pop() {
                let Some(mut rd) = missing_as_none(fs::read_dir(&current.dir).await, &current.dir)? else {
                    continue;
                };

                while let Some(dent) = rd
                    .next_entry()
                    .await
                    .map_err(|e| GlobError::io(&current.dir, e))?
                {
                    let path = dent.path();
                    let file_name = dent.file_name();
                    let Some(name) = file_name.to_str() else {
                        tracing::trace!(path = %path.display(), "skipping non UTF-8 path");
                        continue;
                    };
                    let rel = if current.rel.is_empty() {
                        name.to_string()
                    } else {
                        format!("{}{}{}", current.rel, ro.path_separator, name)
                    };

                    let Some(file_type) = missing_as_none(dent.file_type().await, &path)? else {
                        continue;
                    };
                    let symlink = file_type.is_symlink();
                    let target = if symlink { fs::metadata(&path).await.ok() } else { None };
                    let kind = target
                        .as_ref()
                        .map(|m| EntryKind::from(m.file_type()))
                        .unwrap_or_else(|| EntryKind::from(file_type));

                    let stats = if ro.stats {
                        let Some(meta) = read_metadata(&path, target.as_ref()).await? else {
                            continue;
                        };
                        Some(EntryStats::from(&meta))
                    } else {
                        None
                    };

                    let entry = Entry {
                        path: ro.entry_path(&rel),
                        depth: current.depth,
                        kind,
                        symlink,
                        stats,
                    };

                    let descend = entry.is_directory()
                        && (!symlink || ro.follow_symlinks)
                        && (ro.deep)(&entry);
                    if descend {
                        let mut ancestors = current.ancestors.clone();
                        if ro.follow_symlinks {
                            let canonical = if symlink {
                                match missing_as_none(fs::canonicalize(&path).await, &path)? {
                                    Some(canonical) => canonical,
                                    None => continue,
                                }
                            } else {
                                match current.ancestors.last() {
                                    Some(parent) => parent.join(name),
                                    None => path.clone(),
                                }
                            };
                            check_cycle(&ancestors, &canonical, &path)?;
                            ancestors.push(canonical);
                        }
                        pending.push(Pending {
                            dir: path,
                            rel,
                            depth: current.depth + 1,
                            ancestors,
                        });
                    }

                    if (ro.filter)(&entry) {
                        yield entry;
                    }
                }
            }
        };
        s.boxed()
    }

    /// Stats the exact paths named by a static task
    ///
    /// Missing paths are skipped, found ones pass through the entry filter.
    ///
    /// # Errors
    ///
    /// Yields `GlobError::Io` when a path exists but cannot be stat'ed.
    pub fn static_paths(
        &self,
        cwd: PathBuf,
        task: Task,
        ro: ReaderOptions,
    ) -> BoxStream<'static, Result<Entry, GlobError>> {
        let s = try_stream! {
            for pattern in task.full_positive() {
                let full = cwd.join(&pattern);
                let Some(lstat) = missing_as_none(fs::symlink_metadata(&full).await, &full)? else {
                    continue;
                };
                let target = if lstat.file_type().is_symlink() {
                    fs::metadata(&full).await.ok()
                } else {
                    None
                };

                let depth = static_depth(&pattern, &task.base);
                let entry = entry_from_metadata(pattern, depth, &lstat, target.as_ref(), ro.stats);
                if (ro.filter)(&entry) {
                    yield entry;
                }
            }
        };
        s.boxed()
    }
}

/// Turns a not-found error into `None`
fn missing_as_none<T>(res: io::Result<T>, path: &Path) -> Result<Option<T>, GlobError> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::trace!(path = %path.display(), "skipping missing path");
            Ok(None)
        }
        Err(err) => Err(GlobError::io(path, err)),
    }
}

fn check_cycle(ancestors: &[PathBuf], canonical: &Path, path: &Path) -> Result<(), GlobError> {
    if ancestors.iter().any(|a| a == canonical) {
        return Err(GlobError::SymlinkCycle(path.to_path_buf()));
    }
    Ok(())
}

async fn read_metadata(path: &Path, target: Option<&Metadata>) -> Result<Option<Metadata>, GlobError> {
    match target {
        Some(meta) => Ok(Some(meta.clone())),
        None => missing_as_none(fs::symlink_metadata(path).await, path),
    }
}

/// Merges per-task streams into the caller-visible stream
///
/// This is the only place that sees entries from every task, so it owns the
/// dedup set. The first error is yielded and ends the stream; entries already
/// yielded stay valid.
pub(crate) fn consolidate(
    streams: Vec<BoxStream<'static, Result<Entry, GlobError>>>,
    options: Options,
) -> impl Stream<Item = Result<EntryItem, GlobError>> + Send + 'static {
    stream! {
        let mut consolidator = Consolidator::new(options);
        let mut merged = select_all(streams);

        while let Some(item) = merged.next().await {
            match item {
                Ok(entry) => {
                    if let Some(item) = consolidator.accept(entry) {
                        yield Ok(item);
                    }
                }
                Err(err) => {
                    yield Err(err);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{options::OptionsBuilder, tasks};
    use futures::TryStreamExt;
    use std::fs::{create_dir_all, File};
    use tempfile::tempdir;

    async fn collect(cwd: &Path, patterns: &[&str], options: Options) -> Vec<String> {
        let options = Options {
            cwd: cwd.to_path_buf(),
            ..options
        };
        let streams = tasks::generate(patterns, &options.ignore)
            .iter()
            .map(|task| StreamExecution.run(task, &options))
            .collect();
        let mut paths: Vec<String> = consolidate(streams, options)
            .map_ok(|item| item.path().to_string())
            .try_collect()
            .await
            .unwrap();
        paths.sort();
        paths
    }

    #[tokio::test]
    async fn streams_matching_files() {
        let dir = tempdir().unwrap();
        create_dir_all(dir.path().join("src/nested")).unwrap();
        File::create(dir.path().join("src/lib.rs")).unwrap();
        File::create(dir.path().join("src/nested/mod.rs")).unwrap();
        File::create(dir.path().join("src/nested/notes.txt")).unwrap();

        let found = collect(dir.path(), &["src/**/*.rs"], Options::default()).await;
        assert_eq!(found, vec!["src/lib.rs", "src/nested/mod.rs"]);
    }

    #[tokio::test]
    async fn overlapping_tasks_are_deduplicated() {
        let dir = tempdir().unwrap();
        create_dir_all(dir.path().join("a/b")).unwrap();
        File::create(dir.path().join("a/b/file.md")).unwrap();

        let found = collect(dir.path(), &["a/**/*.md", "a/b/*.md"], Options::default()).await;
        assert_eq!(found, vec!["a/b/file.md"]);

        let found = collect(
            dir.path(),
            &["a/**/*.md", "a/b/*.md"],
            OptionsBuilder::new().unique(false).build(),
        )
        .await;
        assert_eq!(found, vec!["a/b/file.md", "a/b/file.md"]);
    }

    #[tokio::test]
    async fn depth_bound_from_patterns() {
        let dir = tempdir().unwrap();
        create_dir_all(dir.path().join("a/b/c")).unwrap();
        File::create(dir.path().join("a/one.md")).unwrap();
        File::create(dir.path().join("a/b/two.md")).unwrap();
        File::create(dir.path().join("a/b/c/three.md")).unwrap();

        let found = collect(dir.path(), &["*/*/*.md"], Options::default()).await;
        assert_eq!(found, vec!["a/b/two.md"]);
    }

    #[tokio::test]
    async fn missing_base_is_empty() {
        let dir = tempdir().unwrap();
        let found = collect(dir.path(), &["nope/**"], Options::default()).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn static_paths_are_checked() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("present.md")).unwrap();

        let found = collect(dir.path(), &["present.md", "absent.md"], Options::default()).await;
        assert_eq!(found, vec!["present.md"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_cycle_ends_the_stream() {
        let dir = tempdir().unwrap();
        create_dir_all(dir.path().join("a")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("a"), dir.path().join("a/loop")).unwrap();

        let options = Options {
            cwd: dir.path().to_path_buf(),
            ..Options::default()
        };
        let task = &tasks::generate(&["**/*"], &[] as &[&str])[0];
        let results: Vec<_> = StreamExecution.run(task, &options).collect().await;
        assert!(matches!(
            results.last(),
            Some(Err(GlobError::SymlinkCycle(_)))
        ));
    }
}
