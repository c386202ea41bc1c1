// Local glob strategy tests

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use rulescript::glob::local::glob_local;
use rulescript::glob::{resolve, GlobRequest};
use rulescript::index::IndexState;
use rulescript::RuntimeError;

fn touch(root: &Path, path: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, "").unwrap();
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn results_are_sorted_and_deduplicated() {
    let root = TempDir::new().unwrap();
    touch(root.path(), "b.c");
    touch(root.path(), "a.c");
    touch(root.path(), "z.c");

    let result = glob_local(&strings(&["*.c", "[ab].c"]), &[], false, root.path());
    assert_eq!(result, vec!["a.c", "b.c", "z.c"]);
}

#[test]
fn dotfiles_are_skipped_unless_requested() {
    let root = TempDir::new().unwrap();
    touch(root.path(), "visible.c");
    touch(root.path(), ".hidden.c");

    assert_eq!(glob_local(&strings(&["*.c"]), &[], false, root.path()), vec!["visible.c"]);
    assert_eq!(
        glob_local(&strings(&["*.c"]), &[], true, root.path()),
        vec![".hidden.c", "visible.c"],
    );
}

#[test]
fn only_regular_files_match() {
    let root = TempDir::new().unwrap();
    touch(root.path(), "src/a.c");
    fs::create_dir_all(root.path().join("b.c")).unwrap();

    assert_eq!(
        glob_local(&strings(&["**/*.c"]), &[], false, root.path()),
        vec!["src/a.c"],
    );
}

#[test]
fn star_stays_within_one_directory_level() {
    let root = TempDir::new().unwrap();
    touch(root.path(), "a.c");
    touch(root.path(), "src/b.c");
    touch(root.path(), "src/deep/c.c");

    assert_eq!(glob_local(&strings(&["*.c"]), &[], false, root.path()), vec!["a.c"]);
    assert_eq!(
        glob_local(&strings(&["src/*.c"]), &[], false, root.path()),
        vec!["src/b.c"],
    );
    assert_eq!(
        glob_local(&strings(&["src/**/*.c"]), &[], false, root.path()),
        vec!["src/b.c", "src/deep/c.c"],
    );
}

#[test]
fn literal_excludes_must_match_the_whole_path_exactly() {
    let root = TempDir::new().unwrap();
    touch(root.path(), "a.c");
    touch(root.path(), "b.c");
    touch(root.path(), "src/a.c");

    let result = glob_local(&strings(&["**/*.c"]), &strings(&["a.c"]), false, root.path());
    assert_eq!(result, vec!["b.c", "src/a.c"]);
}

#[test]
fn wildcard_excludes_filter_by_pattern() {
    let root = TempDir::new().unwrap();
    touch(root.path(), "Foo.java");
    touch(root.path(), "FooTest.java");
    touch(root.path(), "Bar.java");

    let result = glob_local(&strings(&["*.java"]), &strings(&["*Test.java"]), false, root.path());
    assert_eq!(result, vec!["Bar.java", "Foo.java"]);
}

#[test]
fn resolve_returns_empty_without_querying_when_includes_are_empty() {
    let root = TempDir::new().unwrap();
    let mut index = IndexState::disabled();
    let result = resolve(
        &GlobRequest { includes: &[], excludes: &[], include_dotfiles: false },
        "",
        root.path(),
        false,
        &mut index,
    )
    .unwrap();
    assert_eq!(result, Vec::<String>::new());
}

#[test]
fn resolve_enforces_the_empty_glob_policy() {
    let root = TempDir::new().unwrap();
    let includes = strings(&["*.zzz"]);
    let mut index = IndexState::disabled();
    let err = resolve(
        &GlobRequest { includes: &includes, excludes: &[], include_dotfiles: false },
        "",
        root.path(),
        false,
        &mut index,
    )
    .unwrap_err();
    assert!(matches!(err, RuntimeError::EmptyGlob { .. }));

    let result = resolve(
        &GlobRequest { includes: &includes, excludes: &[], include_dotfiles: false },
        "",
        root.path(),
        true,
        &mut index,
    )
    .unwrap();
    assert_eq!(result, Vec::<String>::new());
}
