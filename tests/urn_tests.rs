//! External tests for the URN codec.
//!
//! Complements the inline round-trip tests in `src/urn.rs` with the
//! properties listed as invariants: percent-escaping of `/` inside a
//! canonical URI, and the source-URN-is-a-prefix-of-resource-URN relation.

use risp::urn::{marshal_resource_urn, marshal_source_urn, unmarshal_resource_urn, unmarshal_source_urn};

#[test]
fn source_uri_containing_slashes_is_escaped_as_one_segment() {
    let urn = marshal_source_urn("ctx1", "fs", "file:///tmp/a/b/c");
    // the escaped URI must not reintroduce '/' as a path separator
    let segments: Vec<&str> = urn.split('/').collect();
    assert_eq!(segments.len(), 5, "expected exactly 5 URN segments, got: {segments:?}");

    let (context_id, adapter_type, canonical_uri) = unmarshal_source_urn(&urn).unwrap();
    assert_eq!(context_id, "ctx1");
    assert_eq!(adapter_type, "fs");
    assert_eq!(canonical_uri, "file:///tmp/a/b/c");
}

#[test]
fn resource_urn_is_built_on_top_of_its_source_urn() {
    let source_urn = marshal_source_urn("ctx1", "web", "https://example.com");
    let resource_urn = marshal_resource_urn(&source_urn, "web-page", "/a/b?x=1");
    assert!(resource_urn.starts_with(&source_urn));

    let (context_id, adapter_type, source_uri, resource_type, canonical_uri) =
        unmarshal_resource_urn(&resource_urn).unwrap();
    assert_eq!(context_id, "ctx1");
    assert_eq!(adapter_type, "web");
    assert_eq!(source_uri, "https://example.com");
    assert_eq!(resource_type, "web-page");
    assert_eq!(canonical_uri, "/a/b?x=1");
}

#[test]
fn distinct_canonical_uris_never_collide_after_escaping() {
    let a = marshal_source_urn("ctx", "fs", "file:///a/b");
    let b = marshal_source_urn("ctx", "fs", "file:///a%2Fb");
    assert_ne!(a, b);
}
