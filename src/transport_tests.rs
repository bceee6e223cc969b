//! Tests for query string building, multipart bodies and the ureq transport

use super::*;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc::channel;
use std::thread;
use std::time::Duration;

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Accept one connection, capture the raw request and answer with `status` and `body`.
fn one_shot_server(status: u16, body: &'static str) -> (String, std::sync::mpsc::Receiver<String>) {
    one_shot_server_delayed(status, body, Duration::ZERO)
}

/// Like `one_shot_server`, but waits `delay` after reading the request before answering.
fn one_shot_server_delayed(
    status: u16,
    body: &'static str,
    delay: Duration,
) -> (String, std::sync::mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        // Headers first, then however much body Content-Length announces
        let header_end = loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break request.len();
            }
            request.extend_from_slice(&buf[..n]);
            if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
        let content_length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while request.len() < header_end + content_length {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        thread::sleep(delay);

        let response = format!(
            "HTTP/1.1 {} Test\r\nContent-Type: application/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        tx.send(String::from_utf8_lossy(&request).to_string()).unwrap();
    });

    (format!("http://{}", addr), rx)
}

#[test]
fn test_query_string_escapes_values() {
    let p = params(&[("b", "x y&z"), ("a", "1"), ("custom_fields[Show Name]", "Drama")]);
    assert_eq!(
        build_query_string(&p),
        "?a=1&b=x%20y%26z&custom_fields%5BShow%20Name%5D=Drama"
    );
}

#[test]
fn test_query_string_empty() {
    assert_eq!(build_query_string(&BTreeMap::new()), "");
}

#[test]
fn test_multipart_body_layout() {
    let mut form = MultipartForm::with_boundary("XyZ");
    form.add_text("show_id", "5");
    form.add_bytes("file", "clip \"1\".mp4", b"DATA");
    let body = form.finish().unwrap();

    assert_eq!(body.content_type, "multipart/form-data; boundary=XyZ");
    let length = body.content_length;
    let body = String::from_utf8(body.into_bytes().unwrap()).unwrap();
    assert_eq!(length, body.len() as u64);
    assert_eq!(
        body,
        "--XyZ\r\n\
         Content-Disposition: form-data; name=\"show_id\"\r\n\r\n\
         5\r\n\
         --XyZ\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"clip %221%22.mp4\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n\
         DATA\r\n\
         --XyZ--\r\n"
    );
}

#[test]
fn test_multipart_add_file_uses_basename() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thumb.png");
    std::fs::write(&path, b"PNG").unwrap();

    let mut form = MultipartForm::with_boundary("b");
    form.add_file("file", &path).unwrap();
    let body = form.finish().unwrap();
    let body = String::from_utf8(body.into_bytes().unwrap()).unwrap();
    assert!(body.contains("filename=\"thumb.png\""));
    assert!(body.contains("\r\n\r\nPNG\r\n"));
}

#[test]
fn test_multipart_streams_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("1-0.mp4");
    let video: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, &video).unwrap();

    let mut form = MultipartForm::with_boundary("b");
    form.add_text("key", "uploads/1-0.mp4");
    form.add_file("file", &path).unwrap();
    form.add_text("after", "x");
    let body = form.finish().unwrap();
    let length = body.content_length;
    let bytes = body.into_bytes().unwrap();

    assert_eq!(length, bytes.len() as u64);
    assert!(length > video.len() as u64);
    let start = bytes
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .and_then(|first| {
            bytes[first + 4..]
                .windows(4)
                .position(|w| w == b"\r\n\r\n")
                .map(|second| first + 4 + second + 4)
        })
        .unwrap();
    assert_eq!(&bytes[start..start + video.len()], &video[..]);
    assert!(bytes.ends_with(b"\r\n\r\nx\r\n--b--\r\n"));
}

#[test]
fn test_multipart_missing_file() {
    let mut form = MultipartForm::new();
    let err = form.add_file("file", Path::new("/definitely/not/here.mp4")).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn test_ureq_get_sends_query_and_reads_body() {
    let (base, rx) = one_shot_server(200, "<shows><total>0</total></shows>");
    let transport = UreqTransport::new().with_user_agent("episodic-test");
    let response = transport
        .get(&format!("{}/api/v2/query/shows", base), &params(&[("key", "abc"), ("id", "5,6")]))
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "<shows><total>0</total></shows>");

    let request = rx.recv().unwrap();
    assert!(request.starts_with("GET /api/v2/query/shows?id=5%2C6&key=abc HTTP/1.1\r\n"));
    assert!(request.to_lowercase().contains("user-agent: episodic-test"));
}

#[test]
fn test_ureq_error_status_is_returned() {
    let (base, _rx) = one_shot_server(500, "oops");
    let response = UreqTransport::new().get(&base, &BTreeMap::new()).unwrap();
    assert_eq!(response.status, 500);
    assert_eq!(response.body, "oops");
    assert!(!response.is_success());
}

#[test]
fn test_ureq_post_multipart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("1-0.mp4");
    std::fs::write(&path, b"VIDEO").unwrap();

    let (base, rx) = one_shot_server(201, "");
    let response = UreqTransport::new()
        .post_multipart(
            &format!("{}/upload", base),
            &params(&[("AWSAccessKeyId", "abc")]),
            &[FileField::new("file", &path)],
        )
        .unwrap();
    assert_eq!(response.status, 201);

    let request = rx.recv().unwrap();
    assert!(request.starts_with("POST /upload HTTP/1.1\r\n"));
    assert!(request.to_lowercase().contains("content-type: multipart/form-data; boundary="));
    assert!(request.contains("name=\"AWSAccessKeyId\"\r\n\r\nabc\r\n"));
    assert!(request.contains("filename=\"1-0.mp4\""));
    assert!(request.contains("VIDEO"));
}

#[test]
fn test_ureq_post_multipart_sends_content_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("1-0.mp4");
    std::fs::write(&path, vec![7u8; 100_000]).unwrap();

    let (base, rx) = one_shot_server(200, "");
    UreqTransport::new()
        .post_multipart(&base, &params(&[("key", "k")]), &[FileField::new("file", &path)])
        .unwrap();

    let request = rx.recv().unwrap();
    let lower = request.to_lowercase();
    let head_end = request.find("\r\n\r\n").unwrap() + 4;
    let announced = lower
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap();
    assert!(!lower.contains("transfer-encoding: chunked"));
    assert!(announced > 100_000);
    assert_eq!(request.as_bytes().len() - head_end, announced);
}

#[test]
fn test_slow_upload_outlives_response_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("1-0.mp4");
    std::fs::write(&path, b"VIDEO").unwrap();
    let config = ClientConfig {
        response_timeout_secs: 1,
        ..ClientConfig::default()
    };

    let (base, _rx) = one_shot_server_delayed(201, "", Duration::from_secs(2));
    let response = UreqTransport::from_config(&config)
        .post_multipart(&base, &params(&[("key", "k")]), &[FileField::new("file", &path)])
        .unwrap();
    assert_eq!(response.status, 201);
}

#[test]
fn test_get_gives_up_after_response_timeout() {
    let config = ClientConfig {
        response_timeout_secs: 1,
        ..ClientConfig::default()
    };

    let (base, _rx) = one_shot_server_delayed(200, "<ok/>", Duration::from_secs(3));
    let err = UreqTransport::from_config(&config)
        .get(&base, &BTreeMap::new())
        .unwrap_err();
    assert!(matches!(err, crate::error::Error::Http(_)));
}

#[test]
fn test_response_body_limit_from_config() {
    let config = ClientConfig {
        max_response_bytes: 8,
        ..ClientConfig::default()
    };

    let (base, _rx) = one_shot_server(200, "<shows><total>0</total></shows>");
    let err = UreqTransport::from_config(&config)
        .get(&base, &BTreeMap::new())
        .unwrap_err();
    assert!(matches!(err, crate::error::Error::Http(_)));
}

#[test]
fn test_ureq_unreachable_host() {
    // Bind then drop to get a port with nothing listening
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let err = UreqTransport::new()
        .get(&format!("http://127.0.0.1:{}/", port), &BTreeMap::new())
        .unwrap_err();
    assert!(matches!(err, crate::error::Error::Http(_)));
}
