// tests/glob.rs
use deepglob::{DeepGlob, Depth, EntryItem, GlobError, Options, OptionsBuilder};
use futures::{StreamExt, TryStreamExt};
use std::fs::{create_dir_all, write};
use tempfile::{tempdir, TempDir};

const ALL_MARKDOWN: [&str; 7] = [
    "fixtures/file.md",
    "fixtures/first/file.md",
    "fixtures/first/nested/directory/file.md",
    "fixtures/first/nested/file.md",
    "fixtures/second/file.md",
    "fixtures/second/nested/directory/file.md",
    "fixtures/second/nested/file.md",
];

const TWO_SOURCES: [&str; 6] = [
    "fixtures/first/file.md",
    "fixtures/first/nested/directory/file.md",
    "fixtures/first/nested/file.md",
    "fixtures/second/file.md",
    "fixtures/second/nested/directory/file.md",
    "fixtures/second/nested/file.md",
];

fn fixtures() -> TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path();
    for sub in ["first", "second"] {
        create_dir_all(root.join(format!("fixtures/{sub}/nested/directory"))).unwrap();
        write(root.join(format!("fixtures/{sub}/file.md")), "").unwrap();
        write(root.join(format!("fixtures/{sub}/nested/file.md")), "").unwrap();
        write(root.join(format!("fixtures/{sub}/nested/directory/file.md")), "").unwrap();
    }
    create_dir_all(root.join("fixtures/.hidden")).unwrap();
    write(root.join("fixtures/file.md"), "# fixtures").unwrap();
    write(root.join("fixtures/file.txt"), "").unwrap();
    write(root.join("fixtures/.hidden/file.md"), "").unwrap();
    dir
}

fn options(dir: &TempDir) -> OptionsBuilder {
    OptionsBuilder::new().cwd(dir.path())
}

fn sorted(items: Vec<EntryItem>) -> Vec<String> {
    let mut paths: Vec<String> = items.into_iter().map(|i| i.path().to_string()).collect();
    paths.sort();
    paths
}

fn sync(patterns: &[&str], options: Options) -> Vec<String> {
    sorted(DeepGlob::sync(patterns, options).unwrap())
}

#[test]
fn sync_returns_entries() {
    let dir = fixtures();
    let found = sync(&["fixtures/**/*.md"], options(&dir).build());
    assert_eq!(found, ALL_MARKDOWN);
}

#[test]
fn sync_returns_entries_from_two_sources() {
    let dir = fixtures();
    let found = sync(
        &["fixtures/first/**/*.md", "fixtures/second/**/*.md"],
        options(&dir).build(),
    );
    assert_eq!(found, TWO_SOURCES);
}

#[tokio::test]
async fn deferred_returns_entries() {
    let dir = fixtures();
    let found = DeepGlob::deferred("fixtures/**/*.md", options(&dir).build())
        .await
        .unwrap();
    assert_eq!(sorted(found), ALL_MARKDOWN);

    let found = DeepGlob::deferred(
        ["fixtures/first/**/*.md", "fixtures/second/**/*.md"],
        options(&dir).build(),
    )
    .await
    .unwrap();
    assert_eq!(sorted(found), TWO_SOURCES);
}

#[tokio::test]
async fn stream_returns_entries() {
    let dir = fixtures();
    let found: Vec<EntryItem> = DeepGlob::stream("fixtures/**/*.md", options(&dir).build())
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(sorted(found), ALL_MARKDOWN);

    let found: Vec<EntryItem> = DeepGlob::stream(
        vec!["fixtures/first/**/*.md", "fixtures/second/**/*.md"],
        options(&dir).build(),
    )
    .unwrap()
    .try_collect()
    .await
    .unwrap();
    assert_eq!(sorted(found), TWO_SOURCES);
}

#[tokio::test]
async fn invalid_input_fails_in_every_mode() {
    let message = "Patterns must be a string or an array of strings";

    let err = DeepGlob::sync(None::<&str>, Options::default()).unwrap_err();
    assert_eq!(err.to_string(), message);

    let err = DeepGlob::deferred(None::<&str>, Options::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GlobError::InvalidPatterns));

    assert!(matches!(
        DeepGlob::stream(Vec::<String>::new(), Options::default()),
        Err(GlobError::InvalidPatterns)
    ));
}

#[test]
fn negative_patterns_and_ignore() {
    let dir = fixtures();
    let expected = vec![
        "fixtures/file.md",
        "fixtures/first/file.md",
        "fixtures/second/file.md",
    ];

    let found = sync(
        &["fixtures/**/*.md", "!**/nested/**"],
        options(&dir).build(),
    );
    assert_eq!(found, expected);

    let found = sync(
        &["fixtures/**/*.md"],
        options(&dir).ignore(["**/nested"]).build(),
    );
    assert_eq!(found, expected);
}

#[test]
fn only_directories() {
    let dir = fixtures();
    let found = sync(&["fixtures/**"], options(&dir).only_directories(true).build());
    assert_eq!(
        found,
        vec![
            "fixtures/first",
            "fixtures/first/nested",
            "fixtures/first/nested/directory",
            "fixtures/second",
            "fixtures/second/nested",
            "fixtures/second/nested/directory",
        ]
    );
}

#[test]
fn mark_directories() {
    let dir = fixtures();
    let found = sync(
        &["fixtures/*"],
        options(&dir).only_files(false).mark_directories(true).build(),
    );
    assert_eq!(
        found,
        vec![
            "fixtures/file.md",
            "fixtures/file.txt",
            "fixtures/first/",
            "fixtures/second/",
        ]
    );
}

#[test]
fn absolute_paths() {
    let dir = fixtures();
    let found = sync(&["fixtures/*.md"], options(&dir).absolute(true).build());
    let cwd = dir.path().to_string_lossy().replace('\\', "/");
    assert_eq!(found, vec![format!("{cwd}/fixtures/file.md")]);
}

#[cfg(unix)]
#[test]
fn absolute_patterns() {
    let dir = fixtures();
    let pattern = format!("{}/fixtures/*.md", dir.path().display());
    let found = sorted(DeepGlob::sync(pattern.as_str(), Options::default()).unwrap());
    assert_eq!(found, vec![format!("{}/fixtures/file.md", dir.path().display())]);
}

#[test]
fn stats_return_entries() {
    let dir = fixtures();
    let items = DeepGlob::sync("fixtures/*.md", options(&dir).stats(true).build()).unwrap();
    assert_eq!(items.len(), 1);
    match &items[0] {
        EntryItem::Entry(entry) => {
            assert_eq!(entry.path, "fixtures/file.md");
            assert!(entry.is_file());
            assert_eq!(entry.stats.as_ref().map(|s| s.size), Some(10));
        }
        other => panic!("expected an entry, got {other:?}"),
    }
}

#[test]
fn unique_across_tasks() {
    let dir = fixtures();
    let patterns = ["fixtures/**/file.md", "fixtures/first/*.md"];

    let found = sync(&patterns, options(&dir).build());
    assert_eq!(found, ALL_MARKDOWN);

    let found = sync(&patterns, options(&dir).unique(false).build());
    assert_eq!(found.len(), ALL_MARKDOWN.len() + 1);
}

#[test]
fn deep_limits_traversal() {
    let dir = fixtures();

    let found = sync(&["fixtures/**/*.md"], options(&dir).max_depth(1).build());
    assert_eq!(
        found,
        vec![
            "fixtures/file.md",
            "fixtures/first/file.md",
            "fixtures/second/file.md",
        ]
    );

    let found = sync(
        &["fixtures/**/*.md"],
        options(&dir).deep(Depth::Disabled).build(),
    );
    assert_eq!(found, vec!["fixtures/file.md"]);
}

#[test]
fn dot_includes_hidden_entries() {
    let dir = fixtures();
    let found = sync(&["fixtures/**/*.md"], options(&dir).dot(true).build());
    assert_eq!(found.len(), ALL_MARKDOWN.len() + 1);
    assert!(found.contains(&"fixtures/.hidden/file.md".to_string()));
}

#[test]
fn missing_base_directory_is_empty() {
    let dir = fixtures();
    assert!(sync(&["missing/**/*.md"], options(&dir).build()).is_empty());
}

#[test]
fn static_patterns() {
    let dir = fixtures();
    let found = sync(
        &["fixtures/file.md", "fixtures/absent.md"],
        options(&dir).build(),
    );
    assert_eq!(found, vec!["fixtures/file.md"]);
}

#[test]
fn user_transform() {
    let dir = fixtures();
    let found = sync(
        &["fixtures/*.md"],
        options(&dir)
            .transform(|item| EntryItem::Path(format!("<{}>", item.path())))
            .build(),
    );
    assert_eq!(found, vec!["<fixtures/file.md>"]);
}

#[test]
fn braces_and_extglobs() {
    let dir = fixtures();

    let found = sync(&["fixtures/{first,second}/file.md"], options(&dir).build());
    assert_eq!(found, vec!["fixtures/first/file.md", "fixtures/second/file.md"]);

    let found = sync(&["fixtures/*/@(nested)/*.md"], options(&dir).build());
    assert_eq!(
        found,
        vec!["fixtures/first/nested/file.md", "fixtures/second/nested/file.md"]
    );
}

#[test]
fn case_insensitive_matching() {
    let dir = fixtures();
    let found = sync(&["fixtures/**/*.MD"], options(&dir).case(false).build());
    assert_eq!(found, ALL_MARKDOWN);

    assert!(sync(&["fixtures/**/*.MD"], options(&dir).build()).is_empty());
}

#[test]
fn generate_tasks_plans_per_base() {
    let tasks = DeepGlob::generate_tasks(
        ["fixtures/first/**/*.md", "fixtures/second/**/*.md", "!**/nested/**"],
        &Options::default(),
    )
    .unwrap();

    let bases: Vec<&str> = tasks.iter().map(|t| t.base.as_str()).collect();
    assert_eq!(bases, vec!["fixtures/first", "fixtures/second"]);
    assert!(tasks.iter().all(|t| t.dynamic));
    assert_eq!(tasks[0].negative, vec!["**/nested/**"]);
}

#[cfg(unix)]
fn cyclic_and_wide() -> TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path();
    create_dir_all(root.join("cyclic/inner")).unwrap();
    write(root.join("cyclic/inner/file.md"), "").unwrap();
    std::os::unix::fs::symlink(root.join("cyclic"), root.join("cyclic/inner/loop")).unwrap();
    create_dir_all(root.join("wide")).unwrap();
    for i in 0..64 {
        write(root.join(format!("wide/file{i}.md")), "").unwrap();
    }
    dir
}

#[cfg(unix)]
const CYCLIC_AND_WIDE: [&str; 2] = ["cyclic/**/*.md", "wide/*.md"];

#[cfg(unix)]
#[tokio::test]
async fn stream_ends_at_first_error_across_tasks() {
    let dir = cyclic_and_wide();
    let results: Vec<Result<EntryItem, GlobError>> =
        DeepGlob::stream(CYCLIC_AND_WIDE, options(&dir).build())
            .unwrap()
            .collect()
            .await;

    let first_err = results
        .iter()
        .position(Result::is_err)
        .expect("cycle must surface as an error");
    assert_eq!(first_err, results.len() - 1, "items yielded after the error");
    assert!(matches!(
        results[first_err],
        Err(GlobError::SymlinkCycle(_))
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn deferred_rejects_when_any_task_fails() {
    let dir = cyclic_and_wide();
    let result = DeepGlob::deferred(CYCLIC_AND_WIDE, options(&dir).build()).await;
    assert!(matches!(result, Err(GlobError::SymlinkCycle(_))));

    let result = DeepGlob::sync(CYCLIC_AND_WIDE, options(&dir).build());
    assert!(matches!(result, Err(GlobError::SymlinkCycle(_))));
}

#[cfg(unix)]
#[test]
fn wide_task_alone_succeeds() {
    let dir = cyclic_and_wide();
    assert_eq!(sync(&["wide/*.md"], options(&dir).build()).len(), 64);
}
