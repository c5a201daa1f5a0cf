// lib.rs
#![forbid(unsafe_code)]

#[cfg(feature = "async")]
pub mod async_glob;
pub mod entry;
pub mod error;
pub mod filters;
pub mod options;
pub mod patterns;
pub mod reader;
#[cfg(feature = "async")]
pub mod stream;
pub mod sync;
pub mod tasks;

#[cfg(feature = "async")]
pub use crate::async_glob::DeferredExecution;
pub use crate::entry::{Entry, EntryItem, EntryKind, EntryStats};
pub use crate::error::{is_enoent_code_error, GlobError};
pub use crate::options::{Depth, Options, OptionsBuilder, Transform};
pub use crate::reader::Execution;
#[cfg(feature = "async")]
pub use crate::stream::StreamExecution;
pub use crate::sync::SyncExecution;
pub use crate::tasks::Task;

use crate::reader::Consolidator;

/// Values accepted as the pattern input of every entry point
///
/// `None` stands for a missing input and fails validation, as do an empty
/// list and an empty pattern string.
pub trait IntoPatterns {
    fn into_patterns(self) -> Result<Vec<String>, GlobError>;
}

fn validate(patterns: Vec<String>) -> Result<Vec<String>, GlobError> {
    if patterns.is_empty() || patterns.iter().any(String::is_empty) {
        return Err(GlobError::InvalidPatterns);
    }
    Ok(patterns)
}

impl IntoPatterns for &str {
    fn into_patterns(self) -> Result<Vec<String>, GlobError> {
        validate(vec![self.to_string()])
    }
}

impl IntoPatterns for String {
    fn into_patterns(self) -> Result<Vec<String>, GlobError> {
        validate(vec![self])
    }
}

impl IntoPatterns for &String {
    fn into_patterns(self) -> Result<Vec<String>, GlobError> {
        validate(vec![self.clone()])
    }
}

impl IntoPatterns for Vec<String> {
    fn into_patterns(self) -> Result<Vec<String>, GlobError> {
        validate(self)
    }
}

impl IntoPatterns for Vec<&str> {
    fn into_patterns(self) -> Result<Vec<String>, GlobError> {
        validate(self.into_iter().map(str::to_string).collect())
    }
}

impl IntoPatterns for &[&str] {
    fn into_patterns(self) -> Result<Vec<String>, GlobError> {
        validate(self.iter().map(|p| p.to_string()).collect())
    }
}

impl IntoPatterns for &[String] {
    fn into_patterns(self) -> Result<Vec<String>, GlobError> {
        validate(self.to_vec())
    }
}

impl IntoPatterns for &Vec<String> {
    fn into_patterns(self) -> Result<Vec<String>, GlobError> {
        validate(self.clone())
    }
}

impl<const N: usize> IntoPatterns for [&str; N] {
    fn into_patterns(self) -> Result<Vec<String>, GlobError> {
        validate(self.iter().map(|p| p.to_string()).collect())
    }
}

impl<const N: usize> IntoPatterns for &[&str; N] {
    fn into_patterns(self) -> Result<Vec<String>, GlobError> {
        validate(self.iter().map(|p| p.to_string()).collect())
    }
}

impl<const N: usize> IntoPatterns for [String; N] {
    fn into_patterns(self) -> Result<Vec<String>, GlobError> {
        validate(self.into_iter().collect())
    }
}

impl<T: IntoPatterns> IntoPatterns for Option<T> {
    fn into_patterns(self) -> Result<Vec<String>, GlobError> {
        self.ok_or(GlobError::InvalidPatterns)?.into_patterns()
    }
}

/// Main facade for the DeepGlob library
///
/// Every entry point validates its input, plans traversal tasks and reads
/// them with one execution mode. Results of all tasks go through a single
/// consolidation step that drops duplicates (with `unique`) and applies the
/// output transform.
pub struct DeepGlob;

impl DeepGlob {
    /// Resolves patterns on the calling thread
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use deepglob::{DeepGlob, Options};
    ///
    /// let files = DeepGlob::sync(["src/**/*.rs", "!**/target/**"], Options::default()).unwrap();
    /// for file in files {
    ///     println!("{}", file.path());
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// `GlobError::InvalidPatterns` for a missing or empty input, pattern
    /// compilation errors, and I/O errors other than a missing path.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn sync<P: IntoPatterns>(patterns: P, options: Options) -> Result<Vec<EntryItem>, GlobError> {
        let tasks = Self::prepare(patterns, &options)?;
        let mut items = Vec::new();
        let mut consolidator = Consolidator::new(options.clone());

        for task in &tasks {
            for entry in SyncExecution.run(task, &options)? {
                items.extend(consolidator.accept(entry));
            }
        }

        Ok(items)
    }

    /// Resolves patterns on the tokio blocking pool
    ///
    /// Input is validated before the future is returned; a validation
    /// failure surfaces when the future is awaited. Tasks run concurrently
    /// and the first failing task rejects the whole result.
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), deepglob::GlobError> {
    /// use deepglob::{DeepGlob, OptionsBuilder};
    ///
    /// let options = OptionsBuilder::new().only_directories(true).build();
    /// let dirs = DeepGlob::deferred("**/node_modules", options).await?;
    /// println!("{} dependency trees", dirs.len());
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "async")]
    pub fn deferred<P: IntoPatterns>(
        patterns: P,
        options: Options,
    ) -> impl std::future::Future<Output = Result<Vec<EntryItem>, GlobError>> + Send + 'static {
        use futures::future::try_join_all;
        use tracing::Instrument;

        let prepared = Self::prepare(patterns, &options);

        async move {
            let tasks = prepared?;
            let runs: Vec<_> = tasks
                .iter()
                .map(|task| DeferredExecution.run(task, &options))
                .collect();
            let results = try_join_all(runs).await?;

            let mut consolidator = Consolidator::new(options);
            Ok(results
                .into_iter()
                .flatten()
                .filter_map(|entry| consolidator.accept(entry))
                .collect())
        }
        .instrument(tracing::debug_span!("deferred"))
    }

    /// Resolves patterns as a stream of items
    ///
    /// Input is validated synchronously. The stream yields items as they are
    /// found; the first error is yielded last and ends the stream, items
    /// already yielded remain valid.
    ///
    /// ```no_run
    /// # async fn run() {
    /// use deepglob::{DeepGlob, Options};
    /// use futures::StreamExt;
    ///
    /// let mut items = DeepGlob::stream("**/*.md", Options::default()).unwrap();
    /// while let Some(item) = items.next().await {
    ///     println!("{:?}", item);
    /// }
    /// # }
    /// ```
    #[cfg(feature = "async")]
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn stream<P: IntoPatterns>(
        patterns: P,
        options: Options,
    ) -> Result<
        impl futures::Stream<Item = Result<EntryItem, GlobError>> + Send + Unpin + 'static,
        GlobError,
    > {
        let tasks = Self::prepare(patterns, &options)?;
        let streams = tasks
            .iter()
            .map(|task| StreamExecution.run(task, &options))
            .collect();

        Ok(Box::pin(crate::stream::consolidate(streams, options)))
    }

    /// Plans the traversal tasks for the given input without reading
    pub fn generate_tasks<P: IntoPatterns>(
        patterns: P,
        options: &Options,
    ) -> Result<Vec<Task>, GlobError> {
        Self::prepare(patterns, options)
    }

    fn prepare<P: IntoPatterns>(patterns: P, options: &Options) -> Result<Vec<Task>, GlobError> {
        let patterns = patterns.into_patterns()?;
        Ok(tasks::generate(&patterns, &options.ignore))
    }
}
