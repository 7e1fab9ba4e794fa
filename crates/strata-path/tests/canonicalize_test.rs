//! Integration tests for strata-path against a real filesystem.
//!
//! Each test builds a small tree of directories and symlinks in a temp dir.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use strata_path::{clean_path, PathResolver, ResolveError, SearchPathRegistry};
use tempfile::tempdir;

/// Temp dirs may themselves sit behind a symlink (/tmp on macOS)
fn real_root(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

#[test]
fn test_no_symlinks_equals_clean_path() {
    let temp = tempdir().unwrap();
    let root = real_root(temp.path());
    fs::create_dir_all(format!("{root}/a/b/c")).unwrap();

    let resolver = PathResolver::default();
    for input in [
        format!("{root}/a/b/c"),
        format!("{root}//a/./b/../b/c/"),
        format!("{root}/a/b/not-there/x"),
    ] {
        assert_eq!(resolver.canonicalize(&input).unwrap(), clean_path(&input));
    }
}

#[test]
fn test_result_is_fixed_point_of_clean_path() {
    let temp = tempdir().unwrap();
    let root = real_root(temp.path());
    fs::create_dir_all(format!("{root}/real/deep")).unwrap();
    symlink(format!("{root}/real"), format!("{root}/link")).unwrap();

    let resolved = PathResolver::default()
        .canonicalize(&format!("{root}/link//deep/./"))
        .unwrap();
    assert_eq!(resolved, format!("{root}/real/deep"));
    assert_eq!(clean_path(&resolved), resolved);
}

#[test]
fn test_relative_link_target() {
    let temp = tempdir().unwrap();
    let root = real_root(temp.path());
    fs::create_dir_all(format!("{root}/dir/sub")).unwrap();
    fs::write(format!("{root}/dir/sub/target"), b"x").unwrap();
    symlink("sub/target", format!("{root}/dir/link")).unwrap();

    let resolved = PathResolver::default()
        .canonicalize(&format!("{root}/dir/link"))
        .unwrap();
    assert_eq!(resolved, format!("{root}/dir/sub/target"));
}

#[test]
fn test_chained_links_through_directories() {
    let temp = tempdir().unwrap();
    let root = real_root(temp.path());
    fs::create_dir_all(format!("{root}/store/v2/bin")).unwrap();
    symlink("v2", format!("{root}/store/current")).unwrap();
    symlink(format!("{root}/store/current"), format!("{root}/active")).unwrap();

    let resolved = PathResolver::default()
        .canonicalize(&format!("{root}/active/bin/tool"))
        .unwrap();
    assert_eq!(resolved, format!("{root}/store/v2/bin/tool"));
}

#[test]
fn test_cycle_fails_instead_of_looping() {
    let temp = tempdir().unwrap();
    let root = real_root(temp.path());
    symlink(format!("{root}/b"), format!("{root}/a")).unwrap();
    symlink(format!("{root}/a"), format!("{root}/b")).unwrap();

    let err = PathResolver::default()
        .canonicalize(&format!("{root}/a/x"))
        .unwrap_err();
    assert!(matches!(err, ResolveError::Cycle { .. }));
    assert_eq!(err.raw_os_error(), Some(nix::errno::Errno::ELOOP as i32));
}

#[test]
fn test_dangling_link_resolves_to_its_target() {
    let temp = tempdir().unwrap();
    let root = real_root(temp.path());
    symlink("gone/file", format!("{root}/dangling")).unwrap();

    let resolved = PathResolver::default()
        .canonicalize(&format!("{root}/dangling"))
        .unwrap();
    assert_eq!(resolved, format!("{root}/gone/file"));
}

#[test]
fn test_empty_input() {
    assert_eq!(PathResolver::default().canonicalize("").unwrap(), "");
}

#[test]
fn test_alias_resolves_through_search_paths() {
    let temp = tempdir().unwrap();
    let root = real_root(temp.path());
    fs::create_dir_all(format!("{root}/first")).unwrap();
    fs::create_dir_all(format!("{root}/second/themes")).unwrap();
    fs::write(format!("{root}/second/themes/dark.toml"), b"").unwrap();
    symlink(
        format!("{root}/second/themes"),
        format!("{root}/first/themes-link"),
    )
    .unwrap();

    let mut registry = SearchPathRegistry::new();
    registry
        .set_search_paths("data", [format!("{root}/first"), format!("{root}/second")])
        .unwrap();
    let resolver = PathResolver::default().with_search_paths(registry);

    assert_eq!(
        resolver.canonical_path("data:themes/dark.toml").unwrap(),
        format!("{root}/second/themes/dark.toml")
    );
    assert_eq!(
        resolver.canonical_path("data:themes-link/dark.toml").unwrap(),
        format!("{root}/second/themes/dark.toml")
    );
    assert!(matches!(
        resolver.canonical_path("data:themes/light.toml"),
        Err(ResolveError::NotFound { .. })
    ));
}
