use tiny_web::http::mime::{DEFAULT_MIME, content_type_for};

#[test]
fn test_known_suffixes() {
    assert_eq!(content_type_for("./home.html"), "text/html");
    assert_eq!(content_type_for("./godzilla.gif"), "image/gif");
    assert_eq!(content_type_for("./photo.jpg"), "image/jpeg");
    assert_eq!(content_type_for("./clip.mp4"), "video/mp4");
}

#[test]
fn test_unknown_suffix_is_plain_text() {
    assert_eq!(content_type_for("./notes.txt"), DEFAULT_MIME);
    assert_eq!(content_type_for("./photo.jpeg"), "text/plain");
    assert_eq!(content_type_for("./Makefile"), "text/plain");
}

#[test]
fn test_suffix_must_be_at_end() {
    assert_eq!(content_type_for("./page.html.bak"), "text/plain");
}

#[test]
fn test_suffix_is_case_sensitive() {
    assert_eq!(content_type_for("./PAGE.HTML"), "text/plain");
}
