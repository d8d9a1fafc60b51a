//! Uploader against a local mock endpoint.

mod common;

use std::fs;
use std::time::Duration;

use file_uploader::errors::UploadError;
use file_uploader::fs_ops::Terminal;
use file_uploader::upload::ERROR_BODY_LIMIT;
use file_uploader::{UploadOutcome, Uploader};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[tokio::test]
async fn posts_single_file_part_with_exact_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let td = tempfile::tempdir().unwrap();
    let cfg = common::pipeline_config(td.path(), &common::upload_url(&server));
    let file = td.path().join("a.txt");
    let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
    fs::write(&file, &payload).unwrap();

    let uploader = Uploader::new(&cfg).unwrap();
    let outcome = uploader.upload(&file).await;
    assert!(outcome.is_success(), "got {outcome:?}");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    let ct = req.headers.get("content-type").unwrap().to_str().unwrap();
    assert!(ct.starts_with("multipart/form-data"), "content-type was {ct}");
    assert!(contains(&req.body, b"name=\"file\""));
    assert!(contains(&req.body, b"filename=\"a.txt\""));
    assert!(contains(&req.body, &payload), "file bytes should arrive unchanged");
}

#[tokio::test]
async fn server_error_reports_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
        .mount(&server)
        .await;

    let td = tempfile::tempdir().unwrap();
    let cfg = common::pipeline_config(td.path(), &common::upload_url(&server));
    let file = td.path().join("b.txt");
    fs::write(&file, b"hello").unwrap();

    let outcome = Uploader::new(&cfg).unwrap().upload(&file).await;
    assert_eq!(outcome.terminal(), Terminal::Failed);
    assert!(matches!(outcome, UploadOutcome::TransientFailure(_)));
    let err = outcome.into_error().unwrap();
    let msg = err.to_string();
    assert!(msg.contains("500"), "{msg}");
    assert!(msg.contains("server error"), "{msg}");
}

#[tokio::test]
async fn client_error_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(415).set_body_string("unsupported"))
        .mount(&server)
        .await;

    let td = tempfile::tempdir().unwrap();
    let cfg = common::pipeline_config(td.path(), &common::upload_url(&server));
    let file = td.path().join("c.bin");
    fs::write(&file, b"\x00\x01").unwrap();

    let outcome = Uploader::new(&cfg).unwrap().upload(&file).await;
    match outcome {
        UploadOutcome::PermanentFailure(UploadError::Status { status, body }) => {
            assert_eq!(status, 415);
            assert_eq!(body, "unsupported");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
    // Grab a free port, then close it so nothing is listening.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let td = tempfile::tempdir().unwrap();
    let cfg = common::pipeline_config(td.path(), &format!("http://127.0.0.1:{port}/upload"));
    let file = td.path().join("d.txt");
    fs::write(&file, b"payload").unwrap();

    let outcome = Uploader::new(&cfg).unwrap().upload(&file).await;
    match outcome {
        UploadOutcome::TransientFailure(UploadError::Transport(_)) => {}
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn configured_timeout_aborts_slow_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let td = tempfile::tempdir().unwrap();
    let mut cfg = common::pipeline_config(td.path(), &common::upload_url(&server));
    cfg.upload_timeout = Some(Duration::from_millis(200));
    let file = td.path().join("e.txt");
    fs::write(&file, b"slow").unwrap();

    let outcome = Uploader::new(&cfg).unwrap().upload(&file).await;
    assert!(matches!(outcome, UploadOutcome::TransientFailure(UploadError::Transport(_))));
}

#[tokio::test]
async fn redirect_is_a_failure_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/login"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let td = tempfile::tempdir().unwrap();
    let cfg = common::pipeline_config(td.path(), &common::upload_url(&server));
    let file = td.path().join("f.txt");
    fs::write(&file, b"redirected").unwrap();

    let outcome = Uploader::new(&cfg).unwrap().upload(&file).await;
    match outcome {
        UploadOutcome::PermanentFailure(UploadError::Status { status, .. }) => assert_eq!(status, 302),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn oversized_error_body_is_capped() {
    let server = MockServer::start().await;
    let huge = "x".repeat(256 * 1024);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string(huge))
        .mount(&server)
        .await;

    let td = tempfile::tempdir().unwrap();
    let cfg = common::pipeline_config(td.path(), &common::upload_url(&server));
    let file = td.path().join("g.txt");
    fs::write(&file, b"payload").unwrap();

    let outcome = Uploader::new(&cfg).unwrap().upload(&file).await;
    match outcome {
        UploadOutcome::TransientFailure(UploadError::Status { status, body }) => {
            assert_eq!(status, 503);
            assert!(body.len() < ERROR_BODY_LIMIT + 64, "body kept {} bytes", body.len());
            assert!(body.starts_with("xxxx"));
            assert!(body.ends_with("(truncated)"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn small_error_body_is_kept_whole() {
    let server = MockServer::start().await;
    let exact = "y".repeat(ERROR_BODY_LIMIT);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string(exact.clone()))
        .mount(&server)
        .await;

    let td = tempfile::tempdir().unwrap();
    let cfg = common::pipeline_config(td.path(), &common::upload_url(&server));
    let file = td.path().join("h.txt");
    fs::write(&file, b"payload").unwrap();

    match Uploader::new(&cfg).unwrap().upload(&file).await {
        UploadOutcome::PermanentFailure(UploadError::Status { body, .. }) => assert_eq!(body, exact),
        other => panic!("unexpected {other:?}"),
    }
}
