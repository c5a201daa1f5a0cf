// options.rs
use crate::entry::EntryItem;
use crate::patterns::MatcherOptions;
use std::{fmt, path::PathBuf, sync::Arc};

/// User supplied mapping applied last to every reported item
pub type Transform = Arc<dyn Fn(EntryItem) -> EntryItem + Send + Sync>;

/// How deep traversal may go below a task root
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Depth {
    /// Never descend, only direct children of the task root are read
    Disabled,
    /// Descend while the entry depth is below the limit
    Max(usize),
    /// No limit other than the one derived from the patterns
    Unlimited,
}

impl Depth {
    /// Whether a directory at `depth` may be read
    pub fn allows(&self, depth: usize) -> bool {
        match self {
            Depth::Disabled => false,
            Depth::Max(max) => depth < *max,
            Depth::Unlimited => true,
        }
    }
}

/// Configuration options for glob operations
///
/// Built once per invocation. The working directory is captured when the
/// value is created and never read from the process again afterwards.
#[derive(Clone)]
pub struct Options {
    /// Directory the patterns are resolved against
    pub cwd: PathBuf,

    /// Traversal depth limit
    pub deep: Depth,

    /// Patterns excluded from the results
    pub ignore: Vec<String>,

    /// Whether wildcards match names starting with a period
    pub dot: bool,

    /// Return full entries with metadata instead of paths
    pub stats: bool,

    /// Report files only
    pub only_files: bool,

    /// Report directories only
    pub only_directories: bool,

    /// Descend into symlinked directories
    pub follow_symlinked_directories: bool,

    /// Drop duplicate paths across tasks
    pub unique: bool,

    /// Append `/` to directory paths
    pub mark_directories: bool,

    /// Report absolute paths
    pub absolute: bool,

    pub brace: bool,
    pub globstar: bool,
    pub extglob: bool,

    /// Case-sensitive matching
    pub case: bool,

    /// Match patterns without slashes against basenames
    pub match_base: bool,

    pub transform: Option<Transform>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            deep: Depth::Unlimited,
            ignore: Vec::new(),
            dot: false,
            stats: false,
            only_files: true,
            only_directories: false,
            follow_symlinked_directories: true,
            unique: true,
            mark_directories: false,
            absolute: false,
            brace: true,
            globstar: true,
            extglob: true,
            case: true,
            match_base: false,
            transform: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("cwd", &self.cwd)
            .field("deep", &self.deep)
            .field("ignore", &self.ignore)
            .field("dot", &self.dot)
            .field("stats", &self.stats)
            .field("only_files", &self.only_files)
            .field("only_directories", &self.only_directories)
            .field(
                "follow_symlinked_directories",
                &self.follow_symlinked_directories,
            )
            .field("unique", &self.unique)
            .field("mark_directories", &self.mark_directories)
            .field("absolute", &self.absolute)
            .field("brace", &self.brace)
            .field("globstar", &self.globstar)
            .field("extglob", &self.extglob)
            .field("case", &self.case)
            .field("match_base", &self.match_base)
            .field("transform", &self.transform.as_ref().map(|_| "Fn"))
            .finish()
    }
}

impl Options {
    /// Options handed to the matcher compiler
    pub fn matcher_options(&self) -> MatcherOptions {
        MatcherOptions {
            case_sensitive: self.case,
            dot: self.dot,
            match_base: self.match_base,
            no_brace: !self.brace,
            no_extglob: !self.extglob,
            no_globstar: !self.globstar,
        }
    }
}

/// Builder for Options for fluent configuration
pub struct OptionsBuilder(Options);

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsBuilder {
    /// Creates a new builder with default options
    pub fn new() -> Self {
        Self(Options::default())
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.0.cwd = dir.into();
        self
    }

    pub fn deep(mut self, depth: Depth) -> Self {
        self.0.deep = depth;
        self
    }

    /// Shorthand for `deep(Depth::Max(d))`
    pub fn max_depth(mut self, d: usize) -> Self {
        self.0.deep = Depth::Max(d);
        self
    }

    pub fn ignore<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.ignore = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn dot(mut self, v: bool) -> Self {
        self.0.dot = v;
        self
    }

    pub fn stats(mut self, v: bool) -> Self {
        self.0.stats = v;
        self
    }

    pub fn only_files(mut self, v: bool) -> Self {
        self.0.only_files = v;
        self
    }

    /// Enabling directories-only mode turns files-only mode off
    pub fn only_directories(mut self, v: bool) -> Self {
        self.0.only_directories = v;
        if v {
            self.0.only_files = false;
        }
        self
    }

    pub fn follow_symlinked_directories(mut self, v: bool) -> Self {
        self.0.follow_symlinked_directories = v;
        self
    }

    pub fn unique(mut self, v: bool) -> Self {
        self.0.unique = v;
        self
    }

    pub fn mark_directories(mut self, v: bool) -> Self {
        self.0.mark_directories = v;
        self
    }

    pub fn absolute(mut self, v: bool) -> Self {
        self.0.absolute = v;
        self
    }

    pub fn brace(mut self, v: bool) -> Self {
        self.0.brace = v;
        self
    }

    pub fn globstar(mut self, v: bool) -> Self {
        self.0.globstar = v;
        self
    }

    pub fn extglob(mut self, v: bool) -> Self {
        self.0.extglob = v;
        self
    }

    pub fn case(mut self, v: bool) -> Self {
        self.0.case = v;
        self
    }

    pub fn match_base(mut self, v: bool) -> Self {
        self.0.match_base = v;
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(EntryItem) -> EntryItem + Send + Sync + 'static,
    {
        self.0.transform = Some(Arc::new(f));
        self
    }

    /// Builds the final Options instance
    pub fn build(self) -> Options {
        let mut opts = self.0;
        if opts.only_directories {
            opts.only_files = false;
        }
        opts
    }
}
