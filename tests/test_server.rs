//! End-to-end transactions against a listener on an ephemeral port.

use std::fs;
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use tiny_web::config::{Config, ContentConfig};
use tiny_web::context::ServeContext;
use tiny_web::process::Reaper;
use tiny_web::server::listener;

const ENV_SCRIPT: &str = "#!/bin/sh
printf 'QUERY_STRING=%s\\n' \"$QUERY_STRING\"
printf 'REQUEST_METHOD=%s\\n' \"$REQUEST_METHOD\"
printf 'CONTENT_TYPE=%s\\n' \"$CONTENT_TYPE\"
printf 'CONTENT_LENGTH=%s\\n' \"$CONTENT_LENGTH\"
printf 'body=%s\\n' \"$body\"
";

const CGI_HEAD: &str = "HTTP/1.0 200 OK\r\nServer: Tiny Web Server\r\n\r\n";

struct TestServer {
    addr: SocketAddr,
    reaper: Reaper,
    _root: TempDir,
}

fn write_file(path: &Path, contents: &[u8], mode: u32) {
    fs::write(path, contents).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

async fn start() -> TestServer {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path();
    fs::create_dir(dir.join("cgi-bin")).unwrap();

    write_file(&dir.join("home.html"), b"<p>hi</p>\n", 0o644);
    write_file(&dir.join("notes.txt"), b"plain notes", 0o644);
    write_file(&dir.join("secret.txt"), b"no read bit", 0o200);
    write_file(&dir.join("cgi-bin/env"), ENV_SCRIPT.as_bytes(), 0o755);
    write_file(&dir.join("cgi-bin/noexec"), ENV_SCRIPT.as_bytes(), 0o644);
    write_file(
        &dir.join("cgi-bin/crash"),
        b"#!/bin/sh\nprintf 'partial'\nexit 1\n",
        0o755,
    );

    let config = Config {
        content: ContentConfig {
            document_root: dir.to_str().unwrap().to_string(),
            ..ContentConfig::default()
        },
        ..Config::default()
    };

    let reaper = Reaper::new();
    reaper.spawn().unwrap();

    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    tokio::spawn(listener::serve(tcp, ServeContext::new(config, reaper.clone())));

    TestServer {
        addr,
        reaper,
        _root: root,
    }
}

async fn send(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    out
}

async fn send_text(addr: SocketAddr, raw: &str) -> String {
    String::from_utf8(send(addr, raw.as_bytes()).await).unwrap()
}

fn split_response(resp: &str) -> (&str, &str) {
    resp.split_once("\r\n\r\n").unwrap()
}

#[tokio::test]
async fn test_get_static_html() {
    let server = start().await;

    let resp = send_text(server.addr, "GET /home.html HTTP/1.0\r\n\r\n").await;

    assert_eq!(
        resp,
        "HTTP/1.0 200 OK\r\n\
         Server: Tiny Web Server\r\n\
         Content-length: 10\r\n\
         Content-type: text/html\r\n\
         \r\n\
         <p>hi</p>\n"
    );
}

#[tokio::test]
async fn test_get_directory_serves_default_document() {
    let server = start().await;

    let resp = send_text(server.addr, "GET / HTTP/1.0\r\n\r\n").await;
    let (head, body) = split_response(&resp);

    assert!(head.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(head.contains("Content-type: text/html"));
    assert_eq!(body, "<p>hi</p>\n");
}

#[tokio::test]
async fn test_unknown_suffix_is_plain_text() {
    let server = start().await;

    let resp = send_text(server.addr, "GET /notes.txt HTTP/1.0\r\n\r\n").await;
    let (head, body) = split_response(&resp);

    assert!(head.contains("Content-type: text/plain"));
    assert!(head.contains("Content-length: 11"));
    assert_eq!(body, "plain notes");
}

#[tokio::test]
async fn test_head_matches_get_headers() {
    let server = start().await;

    let get = send_text(server.addr, "GET /home.html HTTP/1.0\r\n\r\n").await;
    let head = send_text(server.addr, "HEAD /home.html HTTP/1.0\r\n\r\n").await;

    let (get_head, get_body) = split_response(&get);
    let (head_head, head_body) = split_response(&head);
    assert_eq!(get_head, head_head);
    assert_eq!(head_body, "");
    assert_eq!(get_body.len(), 10);
}

#[tokio::test]
async fn test_missing_file_is_404() {
    let server = start().await;

    let resp = send_text(server.addr, "GET /missing.txt HTTP/1.0\r\n\r\n").await;
    let (head, body) = split_response(&resp);

    assert!(head.starts_with("HTTP/1.0 404 Not found\r\n"));
    assert!(head.contains("Content-type: text/html"));
    assert!(head.contains(&format!("Content-length: {}", body.len())));
    assert!(body.contains("missing.txt"));
}

#[tokio::test]
async fn test_missing_program_is_404() {
    let server = start().await;

    let resp = send_text(server.addr, "GET /cgi-bin/nothing?x=1 HTTP/1.0\r\n\r\n").await;

    assert!(resp.starts_with("HTTP/1.0 404 Not found\r\n"));
}

#[tokio::test]
async fn test_unsupported_method_is_501() {
    let server = start().await;

    let resp = send_text(server.addr, "BREW /home.html HTTP/1.0\r\n\r\n").await;
    let (head, body) = split_response(&resp);

    assert!(head.starts_with("HTTP/1.0 501 Not Implemented\r\n"));
    assert!(body.contains("BREW"));
}

#[tokio::test]
async fn test_unsupported_method_on_missing_file_is_still_501() {
    let server = start().await;

    let resp = send_text(server.addr, "PUT /does-not-exist HTTP/1.0\r\n\r\n").await;

    assert!(resp.starts_with("HTTP/1.0 501 Not Implemented\r\n"));
}

#[tokio::test]
async fn test_missing_target_is_400() {
    let server = start().await;

    let resp = send_text(server.addr, "GET\r\n\r\n").await;

    assert!(resp.starts_with("HTTP/1.0 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_unreadable_static_is_403() {
    let server = start().await;

    let resp = send_text(server.addr, "GET /secret.txt HTTP/1.0\r\n\r\n").await;
    let (head, body) = split_response(&resp);

    assert!(head.starts_with("HTTP/1.0 403 Forbidden\r\n"));
    assert!(body.contains("Tiny couldn't read the file"));
}

#[tokio::test]
async fn test_directory_as_program_is_403() {
    let server = start().await;

    let resp = send_text(server.addr, "GET /cgi-bin/ HTTP/1.0\r\n\r\n").await;

    assert!(resp.starts_with("HTTP/1.0 403 Forbidden\r\n"));
}

#[tokio::test]
async fn test_non_executable_program_is_403() {
    let server = start().await;

    let resp = send_text(server.addr, "GET /cgi-bin/noexec HTTP/1.0\r\n\r\n").await;
    let (head, body) = split_response(&resp);

    assert!(head.starts_with("HTTP/1.0 403 Forbidden\r\n"));
    assert!(body.contains("Tiny couldn't run the CGI program"));
}

#[tokio::test]
async fn test_dynamic_get_passes_query_string() {
    let server = start().await;

    let resp = send_text(server.addr, "GET /cgi-bin/env?x=1 HTTP/1.0\r\n\r\n").await;

    assert_eq!(
        resp,
        format!(
            "{}QUERY_STRING=x=1\nREQUEST_METHOD=GET\nCONTENT_TYPE=\nCONTENT_LENGTH=\nbody=\n",
            CGI_HEAD
        )
    );
}

#[tokio::test]
async fn test_dynamic_post_passes_body_in_environment() {
    let server = start().await;

    let resp = send_text(
        server.addr,
        "POST /cgi-bin/env HTTP/1.0\r\n\
         Content-Type: application/x-www-form-urlencoded\r\n\
         Content-Length: 7\r\n\
         \r\n\
         a=1&b=2",
    )
    .await;

    let output = resp.strip_prefix(CGI_HEAD).unwrap();
    assert_eq!(
        output,
        "QUERY_STRING=\n\
         REQUEST_METHOD=POST\n\
         CONTENT_TYPE=application/x-www-form-urlencoded\n\
         CONTENT_LENGTH=7\n\
         body=a=1&b=2\n"
    );
}

#[tokio::test]
async fn test_dynamic_post_body_truncated_at_newline() {
    let server = start().await;

    let resp = send_text(
        server.addr,
        "POST /cgi-bin/env HTTP/1.0\r\nContent-Length: 7\r\n\r\na=1\nb=2",
    )
    .await;

    let output = resp.strip_prefix(CGI_HEAD).unwrap();
    assert!(output.contains("body=a=1\n"));
    assert!(!output.contains("b=2"));
}

#[tokio::test]
async fn test_dynamic_request_method_keeps_client_case() {
    let server = start().await;

    let resp = send_text(server.addr, "post /cgi-bin/env HTTP/1.0\r\n\r\n").await;

    assert!(resp.starts_with(CGI_HEAD));
    assert!(resp.contains("REQUEST_METHOD=post\n"));
}

#[tokio::test]
async fn test_oversized_post_does_not_stop_server() {
    let server = start().await;

    let mut raw = b"POST /cgi-bin/env HTTP/1.0\r\nContent-Length: 200000\r\n\r\n".to_vec();
    raw.extend(std::iter::repeat_n(b'a', 200_000));

    // The server stops reading after the capped body, so the client may see
    // a reset on either side; only the next transaction matters.
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let _ = stream.write_all(&raw).await;
    let mut out = Vec::new();
    let _ = stream.read_to_end(&mut out).await;
    drop(stream);

    let resp = send_text(server.addr, "GET /home.html HTTP/1.0\r\n\r\n").await;
    assert!(resp.starts_with("HTTP/1.0 200 OK\r\n"));
}

#[tokio::test]
async fn test_dynamic_head_runs_no_worker() {
    let server = start().await;

    let resp = send_text(server.addr, "HEAD /cgi-bin/env?x=1 HTTP/1.0\r\n\r\n").await;

    assert_eq!(resp, CGI_HEAD);
    assert_eq!(server.reaper.live_workers(), 0);
}

#[tokio::test]
async fn test_failing_worker_truncates_body_under_200() {
    let server = start().await;

    let resp = send_text(server.addr, "GET /cgi-bin/crash HTTP/1.0\r\n\r\n").await;

    assert_eq!(resp, format!("{}partial", CGI_HEAD));
}

#[tokio::test]
async fn test_sequential_dynamic_requests_leave_no_workers() {
    let server = start().await;

    for i in 0..5 {
        let resp = send_text(
            server.addr,
            &format!("GET /cgi-bin/env?n={} HTTP/1.0\r\n\r\n", i),
        )
        .await;
        assert!(resp.contains(&format!("QUERY_STRING=n={}\n", i)));
    }

    assert_eq!(server.reaper.live_workers(), 0);
}

#[tokio::test]
async fn test_silent_client_does_not_stop_server() {
    let server = start().await;

    drop(TcpStream::connect(server.addr).await.unwrap());

    let resp = send_text(server.addr, "GET /home.html HTTP/1.0\r\n\r\n").await;
    assert!(resp.starts_with("HTTP/1.0 200 OK\r\n"));
}
