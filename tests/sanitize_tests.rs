//! External tests for the HTML sanitizer, covering the §8 fixpoint
//! property and the "no head/script/style, no attributes" invariant
//! across inputs the inline unit tests in `src/sanitize.rs` don't exercise.

use risp::sanitize::sanitize_html;

#[test]
fn fixpoint_holds_on_deeply_nested_markup() {
    let input = "<html><head><meta charset=\"utf-8\"><title>T</title></head><body><div id=\"x\"><div><p class=\"y\">a<b>b</b></p></div></div></body></html>";
    let once = sanitize_html(input);
    let twice = sanitize_html(&once);
    assert_eq!(once, twice);
}

#[test]
fn no_head_script_style_or_attributes_survive() {
    let input = "<html><head><title>T</title><style>body{}</style></head><body style=\"color:red\"><script>alert(1)</script><p data-x=\"1\">ok</p></body></html>";
    let out = sanitize_html(input);
    assert!(!out.contains("<head"));
    assert!(!out.contains("<style"));
    assert!(!out.contains("<script"));
    assert!(!out.contains('='));
    assert!(out.contains("<p>ok</p>"));
}

#[test]
fn plain_text_with_no_markup_is_left_intact_in_a_body() {
    let input = "<html><body>just text</body></html>";
    let out = sanitize_html(input);
    assert!(out.contains("just text"));
}
