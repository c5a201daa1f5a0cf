// entry.rs
use std::{
    fs::{FileType, Metadata},
    time::SystemTime,
};

/// Kind of filesystem object an [`Entry`] points at
///
/// For followed symlinks this is the kind of the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

impl From<FileType> for EntryKind {
    fn from(ft: FileType) -> Self {
        if ft.is_dir() {
            EntryKind::Directory
        } else if ft.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// Filesystem metadata captured when the `stats` option is enabled
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryStats {
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
    pub created: Option<SystemTime>,
    pub readonly: bool,
    /// Unix permission bits, 0 on other platforms
    pub mode: u32,
}

impl From<&Metadata> for EntryStats {
    fn from(meta: &Metadata) -> Self {
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            meta.permissions().mode()
        };
        #[cfg(not(unix))]
        let mode = 0;

        Self {
            size: meta.len(),
            modified: meta.modified().ok(),
            accessed: meta.accessed().ok(),
            created: meta.created().ok(),
            readonly: meta.permissions().readonly(),
            mode,
        }
    }
}

/// A traversal record
///
/// `path` is `/`-separated and already carries the task base directory, so
/// it can be matched against patterns as written. `depth` counts directory
/// levels below the task root: direct children have depth 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub depth: usize,
    pub kind: EntryKind,
    pub symlink: bool,
    pub stats: Option<EntryStats>,
}

impl Entry {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_symbolic_link(&self) -> bool {
        self.symlink
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        let trimmed = self.path.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }
}

/// Item produced by the public entry points
///
/// `Path` is the default shape, `Entry` is used when `stats` is enabled. A
/// user transform may return either.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryItem {
    Path(String),
    Entry(Entry),
}

impl EntryItem {
    /// Path of the item regardless of shape
    pub fn path(&self) -> &str {
        match self {
            EntryItem::Path(p) => p,
            EntryItem::Entry(e) => &e.path,
        }
    }
}

impl From<String> for EntryItem {
    fn from(path: String) -> Self {
        EntryItem::Path(path)
    }
}

impl From<&str> for EntryItem {
    fn from(path: &str) -> Self {
        EntryItem::Path(path.to_string())
    }
}

impl PartialEq<&str> for EntryItem {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, EntryItem::Path(p) if p == other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> Entry {
        Entry {
            path: path.to_string(),
            depth: 0,
            kind: EntryKind::Directory,
            symlink: false,
            stats: None,
        }
    }

    #[test]
    fn name_is_last_segment() {
        assert_eq!(entry("fixtures/first/nested").name(), "nested");
        assert_eq!(entry("nested").name(), "nested");
        assert_eq!(entry("fixtures/.git/").name(), ".git");
    }

    #[test]
    fn item_path_for_both_shapes() {
        assert_eq!(EntryItem::from("a/b").path(), "a/b");
        assert_eq!(EntryItem::Entry(entry("a/c")).path(), "a/c");
    }
}
