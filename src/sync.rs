// sync.rs
//! Blocking traversal built on walkdir.
//!
//! Dynamic tasks walk their root directory and prune descent with the deep
//! filter; static tasks only stat the paths their patterns name.
use crate::{
    entry::{Entry, EntryKind, EntryStats},
    error::{is_enoent_code_error, GlobError},
    options::Options,
    reader::{
        entry_from_metadata, reader_options, root_directory, static_depth, Execution,
        ReaderOptions,
    },
    tasks::Task,
};
use camino::Utf8Path;
use std::{fs, io, path::Path};
use walkdir::WalkDir;

/// Blocking traversal on the calling thread
///
/// Returns the raw entries of one task. Deduplication and output transforms
/// happen later, once entries of every task are gathered.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyncExecution;

impl Execution for SyncExecution {
    type Output = Result<Vec<Entry>, GlobError>;

    /// Reads one task to completion
    ///
    /// # Errors
    ///
    /// Returns `GlobError` when a pattern of the task fails to compile, for
    /// a symlink cycle traversal would descend into, and for I/O errors other
    /// than a path that vanished or never existed.
    fn run(&self, task: &Task, options: &Options) -> Self::Output {
        let ro = reader_options(task, options)?;
        tracing::debug!(base = %task.base, dynamic = task.dynamic, "reading task");

        if task.dynamic {
            self.dynamic(&root_directory(&options.cwd, task), &ro)
        } else {
            self.static_paths(&options.cwd, task, &ro)
        }
    }
}

impl SyncExecution {
    /// Walks `root`, pruning with the deep filter and keeping what the
    /// entry filter accepts
    ///
    /// A missing root yields no entries. Entry paths are relative to `root`
    /// and prefixed with the task base through [`ReaderOptions::entry_path`].
    ///
    /// # Arguments
    ///
    /// * `root` - Directory the task reads, already joined with the cwd
    /// * `ro` - Filters and path settings for this task
    ///
    /// # Returns
    ///
    /// `Ok(Vec<Entry>)` in walk order, or `Err(GlobError)` on the first fatal error
    ///
    /// # Errors
    ///
    /// Returns `GlobError::SymlinkCycle` when a followed link leads back to an
    /// ancestor the deep filter would descend into, and `GlobError::Walkdir` or
    /// `GlobError::Io` for filesystem failures other than not-found.
    pub fn dynamic(&self, root: &Path, ro: &ReaderOptions) -> Result<Vec<Entry>, GlobError> {
        let mut entries = Vec::new();
        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(ro.follow_symlinks)
            .into_iter();

        while let Some(item) = walker.next() {
            let dent = match item {
                Ok(dent) => dent,
                Err(err) => {
                    if let Some(entry) = pruned_loop_entry(&err, root, ro) {
                        if (ro.filter)(&entry) {
                            entries.push(entry);
                        }
                        continue;
                    }
                    if err.loop_ancestor().is_some() {
                        let path = err.path().unwrap_or(root).to_path_buf();
                        return Err(GlobError::SymlinkCycle(path));
                    }
                    if let Some(entry) = broken_link_entry(&err, root, ro) {
                        if (ro.filter)(&entry) {
                            entries.push(entry);
                        }
                        continue;
                    }
                    let err = GlobError::from(err);
                    if is_enoent_code_error(&err) {
                        tracing::trace!(error = %err, "skipping missing path");
                        continue;
                    }
                    return Err(err);
                }
            };

            let Some(rel) = relative_path(dent.path(), root, ro.path_separator) else {
                tracing::trace!(path = %dent.path().display(), "skipping non UTF-8 path");
                continue;
            };

            let symlink = dent.path_is_symlink();
            // walkdir already reports the target type when following links
            let target = if symlink && !ro.follow_symlinks {
                fs::metadata(dent.path()).ok()
            } else {
                None
            };
            let kind = target
                .as_ref()
                .map(|m| EntryKind::from(m.file_type()))
                .unwrap_or_else(|| EntryKind::from(dent.file_type()));

            let stats = if ro.stats {
                let meta = match target {
                    Some(meta) => meta,
                    None => match dent.metadata() {
                        Ok(meta) => meta,
                        Err(err) => {
                            let err = GlobError::from(err);
                            if is_enoent_code_error(&err) {
                                tracing::trace!(error = %err, "skipping missing path");
                                continue;
                            }
                            return Err(err);
                        }
                    },
                };
                Some(EntryStats::from(&meta))
            } else {
                None
            };

            let entry = Entry {
                path: ro.entry_path(&rel),
                depth: dent.depth() - 1,
                kind,
                symlink,
                stats,
            };

            // only directories walkdir actually opened may be skipped
            if dent.file_type().is_dir() && !(ro.deep)(&entry) {
                walker.skip_current_dir();
            }

            if (ro.filter)(&entry) {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    /// Stats the exact paths named by a static task
    ///
    /// Paths that do not exist are skipped. Each found path still passes the
    /// entry filter, so `only_files` drops a static directory.
    ///
    /// # Errors
    ///
    /// Returns `GlobError::Io` when a path exists but cannot be stat'ed.
    pub fn static_paths(
        &self,
        cwd: &Path,
        task: &Task,
        ro: &ReaderOptions,
    ) -> Result<Vec<Entry>, GlobError> {
        let mut entries = Vec::new();

        for pattern in task.full_positive() {
            let full = cwd.join(&pattern);
            let lstat = match fs::symlink_metadata(&full) {
                Ok(meta) => meta,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    tracing::trace!(path = %full.display(), "skipping missing path");
                    continue;
                }
                Err(err) => return Err(GlobError::io(full, err)),
            };
            let target = if lstat.file_type().is_symlink() {
                fs::metadata(&full).ok()
            } else {
                None
            };

            let depth = static_depth(&pattern, &task.base);
            let entry = entry_from_metadata(pattern, depth, &lstat, target.as_ref(), ro.stats);
            if (ro.filter)(&entry) {
                entries.push(entry);
            }
        }

        Ok(entries)
    }
}

/// `/`-joined path of `path` below `root`, `None` for non UTF-8 names
fn relative_path(path: &Path, root: &Path, sep: char) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let rel = Utf8Path::from_path(rel)?;
    let mut out = String::with_capacity(rel.as_str().len());
    for (i, component) in rel.components().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        out.push_str(component.as_str());
    }
    Some(out)
}

/// Entry for a symlinked directory that closes a loop, when the deep filter
/// would not have descended into it anyway
///
/// walkdir detects loops before the caller gets a chance to prune, so a
/// cycle is only fatal if traversal would really follow it.
fn pruned_loop_entry(err: &walkdir::Error, root: &Path, ro: &ReaderOptions) -> Option<Entry> {
    err.loop_ancestor()?;
    let rel = relative_path(err.path()?, root, ro.path_separator)?;
    let entry = Entry {
        path: ro.entry_path(&rel),
        depth: err.depth().saturating_sub(1),
        kind: EntryKind::Directory,
        symlink: true,
        stats: None,
    };
    if (ro.deep)(&entry) {
        None
    } else {
        Some(entry)
    }
}

/// Entry for a dangling symlink that walkdir failed to follow
fn broken_link_entry(err: &walkdir::Error, root: &Path, ro: &ReaderOptions) -> Option<Entry> {
    let missing = err
        .io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound);
    if !missing || err.depth() == 0 {
        return None;
    }
    let path = err.path()?;
    let lstat = fs::symlink_metadata(path).ok()?;
    if !lstat.file_type().is_symlink() {
        return None;
    }
    let rel = relative_path(path, root, ro.path_separator)?;
    Some(entry_from_metadata(
        ro.entry_path(&rel),
        err.depth() - 1,
        &lstat,
        None,
        ro.stats,
    ))
}
