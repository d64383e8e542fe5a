//! Tests for NormalizedPath and relative path validation

use dotstate_fs::{Error, NormalizedPath, validate_relative_path};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn backslashes_become_forward_slashes() {
    let path = NormalizedPath::new("home\\user\\.bashrc");
    assert_eq!(path.as_str(), "home/user/.bashrc");
}

#[test]
fn join_and_file_name() {
    let root = NormalizedPath::new("/home/user");
    let joined = root.join(".config/nvim");
    assert_eq!(joined.as_str(), "/home/user/.config/nvim");
    assert_eq!(joined.file_name(), Some("nvim"));
    assert_eq!(joined.parent().unwrap().as_str(), "/home/user/.config");
}

#[test]
fn extension_ignores_leading_dot() {
    assert_eq!(NormalizedPath::new("/a/.bashrc").extension(), None);
    assert_eq!(NormalizedPath::new("/a/config.toml").extension(), Some("toml"));
}

#[rstest]
#[case("/home/user/.bashrc", "/home/user", Some(".bashrc"))]
#[case("/home/user", "/home/user", Some(""))]
#[case("/home/username/x", "/home/user", None)]
#[case("/etc/hosts", "/", Some("etc/hosts"))]
fn strip_prefix_cases(#[case] path: &str, #[case] base: &str, #[case] expected: Option<&str>) {
    let path = NormalizedPath::new(path);
    let base = NormalizedPath::new(base);
    assert_eq!(path.strip_prefix(&base), expected);
}

#[rstest]
#[case("")]
#[case(".")]
#[case("/abs")]
#[case("../escape")]
#[case("a/../../b")]
fn invalid_relative_paths_are_rejected(#[case] path: &str) {
    let err = validate_relative_path(path).unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }), "got {err:?}");
}

#[rstest]
#[case(".bashrc")]
#[case(".config/nvim/init.lua")]
#[case("dot..dot")]
fn valid_relative_paths_are_accepted(#[case] path: &str) {
    validate_relative_path(path).unwrap();
}
