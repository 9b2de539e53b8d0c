use tiny_web::http::error::{ClientError, report};
use tiny_web::http::response::StatusCode;

#[test]
fn test_not_found_page() {
    let err = ClientError::not_found("./missing.txt");
    let body = err.html_body();

    assert!(body.starts_with("<html><title>Tiny Error</title>"));
    assert!(body.contains("404: Not found\r\n"));
    assert!(body.contains("<p>Tiny couldn't find this file: ./missing.txt\r\n"));
    assert!(body.ends_with("<hr><em>The Tiny Web server</em>\r\n"));
}

#[test]
fn test_error_response_headers() {
    let err = ClientError::not_implemented("BREW");
    let response = err.to_response();

    assert_eq!(response.status, StatusCode::NotImplemented);
    assert_eq!(response.header("Content-type"), Some("text/html"));
    assert_eq!(
        response.header("Content-length"),
        Some(response.body.len().to_string().as_str())
    );
    assert!(String::from_utf8_lossy(&response.body).contains("BREW"));
}

#[test]
fn test_forbidden_messages() {
    assert_eq!(ClientError::unreadable("./a").status, StatusCode::Forbidden);
    assert_eq!(ClientError::unreadable("./a").message, "Tiny couldn't read the file");
    assert_eq!(ClientError::not_executable("./b").status, StatusCode::Forbidden);
}

#[tokio::test]
async fn test_report_writes_complete_response() {
    let err = ClientError::not_found("./missing.txt");
    let mut out: Vec<u8> = Vec::new();
    report(&mut out, &err).await.unwrap();

    let text = String::from_utf8(out).unwrap();
    let (head, body) = text.split_once("\r\n\r\n").unwrap();

    assert_eq!(
        head,
        format!(
            "HTTP/1.0 404 Not found\r\nContent-type: text/html\r\nContent-length: {}",
            body.len()
        )
    );
    assert_eq!(body, err.html_body());
}
