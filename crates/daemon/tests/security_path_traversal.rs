// Session-name traversal hardening (§3: "any name containing a path
// separator or `..` is rejected and silently replaced by `default`").
// This lives in rdc-common (rdc-daemon has no direct dependents of its
// own on session naming), exercised here at the daemon-integration layer
// because it's the security boundary a hostile `--session` flag hits.

use rdc_common::session::sanitize_name;

#[test]
fn rejects_parent_directory_traversal_sequences() {
    assert_eq!(sanitize_name("../../../etc/passwd"), "default");
    assert_eq!(sanitize_name("docs/../secrets"), "default");
}

#[test]
fn rejects_path_separators_outright() {
    assert_eq!(sanitize_name("a/b"), "default");
    assert_eq!(sanitize_name("a\\b"), "default");
}

#[test]
fn rejects_empty_name() {
    assert_eq!(sanitize_name(""), "default");
}

#[test]
fn accepts_names_with_no_separators_or_traversal() {
    assert_eq!(sanitize_name("my-session"), "my-session");
    assert_eq!(sanitize_name("diff:abc123:A"), "diff:abc123:A");
}

#[test]
fn a_bare_double_dot_is_rejected_even_without_a_separator() {
    assert_eq!(sanitize_name(".."), "default");
}
