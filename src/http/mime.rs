//! Content-type lookup by filename suffix.

pub const DEFAULT_MIME: &str = "text/plain";

/// Checked in order; the first matching suffix wins.
const MIME_TABLE: [(&str, &str); 4] = [
    (".html", "text/html"),
    (".gif", "image/gif"),
    (".jpg", "image/jpeg"),
    (".mp4", "video/mp4"),
];

/// Returns the content type for `filename`, falling back to `text/plain`.
///
/// # Example
///
/// ```
/// # use tiny_web::http::mime::content_type_for;
/// assert_eq!(content_type_for("./home.html"), "text/html");
/// assert_eq!(content_type_for("./notes.txt"), "text/plain");
/// ```
pub fn content_type_for(filename: &str) -> &'static str {
    MIME_TABLE
        .iter()
        .find(|(suffix, _)| filename.ends_with(suffix))
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME)
}
