use std::path::Path;

use docs_template_core::{discover, EntityName, MigrateError};
use docs_template_test_support::PackageFixture;

fn names(entities: &[EntityName]) -> Vec<&str> {
    entities.iter().map(EntityName::as_str).collect()
}

#[test]
fn missing_entities_directory_is_empty_not_an_error() {
    let package = PackageFixture::new().with_source_readme("# Title\n");

    let entities = discover(package.path(), Path::new("data_stream")).expect("discover");
    assert!(entities.is_empty());
}

#[test]
fn only_directories_are_entities() {
    let package = PackageFixture::new()
        .with_data_streams(&["x", "y"])
        .with_file("data_stream/notes.txt", "not an entity");

    let entities = discover(package.path(), Path::new("data_stream")).expect("discover");
    assert_eq!(names(&entities), vec!["x", "y"]);
}

#[test]
fn entities_are_listed_by_name() {
    let package = PackageFixture::new().with_data_streams(&["zeta", "alpha", "mid"]);

    let entities = discover(package.path(), Path::new("data_stream")).expect("discover");
    assert_eq!(names(&entities), vec!["alpha", "mid", "zeta"]);
}

#[test]
fn nested_directories_are_not_entities() {
    let package = PackageFixture::new()
        .with_data_streams(&["logs"])
        .with_file("data_stream/logs/fields/base.yml", "- name: message\n");

    let entities = discover(package.path(), Path::new("data_stream")).expect("discover");
    assert_eq!(names(&entities), vec!["logs"]);
}

#[test]
fn custom_entities_directory_is_honoured() {
    let package = PackageFixture::new().with_file("streams/alpha/manifest.yml", "title: a\n");

    let entities = discover(package.path(), Path::new("streams")).expect("discover");
    assert_eq!(names(&entities), vec!["alpha"]);
}

#[cfg(unix)]
#[test]
fn unreadable_entities_directory_is_an_io_error() {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let package = PackageFixture::new().with_data_streams(&["x"]);
    let dir = package.path().join("data_stream");
    fs::set_permissions(&dir, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not restrict root; nothing to assert in that case.
    if fs::read_dir(&dir).is_ok() {
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = discover(package.path(), Path::new("data_stream"));
    fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();

    match result {
        Err(MigrateError::Io { path, .. }) => assert!(path.starts_with(&dir)),
        other => panic!("expected io error, got {other:?}"),
    }
}

#[test]
fn entities_path_that_is_a_file_is_an_io_error() {
    let package = PackageFixture::new().with_file("data_stream", "not a directory");

    match discover(package.path(), Path::new("data_stream")) {
        Err(MigrateError::Io { path, .. }) => {
            assert_eq!(path, package.path().join("data_stream"))
        }
        other => panic!("expected io error, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn unresolvable_entities_path_is_an_io_error() {
    let package = PackageFixture::new();
    let link = package.path().join("data_stream");
    std::os::unix::fs::symlink(&link, &link).unwrap();

    match discover(package.path(), Path::new("data_stream")) {
        Err(MigrateError::Io { path, .. }) => assert_eq!(path, link),
        other => panic!("expected io error, got {other:?}"),
    }
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_directory_names_are_skipped() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let package = PackageFixture::new().with_data_streams(&["logs"]);
    let bad = package
        .path()
        .join("data_stream")
        .join(OsStr::from_bytes(b"bad\xffname"));
    std::fs::create_dir(&bad).unwrap();

    let entities = discover(package.path(), Path::new("data_stream")).expect("discover");
    assert_eq!(names(&entities), vec!["logs"]);
}
