//! Connection loop behaviour driven over in-memory streams.

use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use grole::routing::BoxError;
use grole::security::RequestLimits;
use grole::{async_fn, Body, Environment, HttpServer, Reply, Request, Response, Router};
use http::StatusCode;
use serde_json::json;

mod common;
use common::{parse_responses, roundtrip, BrokenWriter};

type Env = Environment<String>;

fn server() -> HttpServer<String> {
    let mut router = Router::new();
    router
        .route_sync("/", &["GET"], |_: &Env, _: &Request| {
            Ok::<_, Infallible>("Hello, World!")
        })
        .unwrap();
    router
        .route_sync("/message", &["GET"], |env: &Env, _: &Request| {
            Ok::<_, Infallible>(env.lock().clone())
        })
        .unwrap();
    router
        .route_sync("/message", &["POST"], |env: &Env, req: &Request| {
            *env.lock() = req.text()?.to_string();
            Ok::<_, BoxError>(())
        })
        .unwrap();
    router
        .route_sync("/echo", &["POST", "PUT"], |_: &Env, req: &Request| {
            Ok::<_, Infallible>(req.body.clone())
        })
        .unwrap();
    router
        .route_sync("/query", &["GET"], |_: &Env, req: &Request| {
            Reply::json(&req.query)
        })
        .unwrap();
    router
        .route_sync(r"/users/(?P<id>\d+)", &["GET"], |_: &Env, req: &Request| {
            Ok::<_, Infallible>(json!({ "id": req.named("id"), "first": req.capture(1) }))
        })
        .unwrap();
    router
        .route_sync("/hello world", &["GET"], |_: &Env, req: &Request| {
            Ok::<_, Infallible>(req.location.clone())
        })
        .unwrap();
    router
        .route_sync("/created", &["POST"], |_: &Env, _: &Request| {
            Ok::<_, Infallible>(
                Response::new("made")
                    .with_status(StatusCode::CREATED)
                    .with_header("X-Id", "7")
                    .with_header("Content-Length", "999"),
            )
        })
        .unwrap();
    router
        .route_sync("/fail", &["GET"], |_: &Env, _: &Request| {
            Err::<(), _>(std::io::Error::other("backend exploded"))
        })
        .unwrap();
    router
        .route_sync("/panic", &["GET"], |_: &Env, _: &Request| -> Result<(), Infallible> {
            panic!("handler bug")
        })
        .unwrap();
    router
        .register(
            "/sleep",
            &["GET"],
            async_fn(|env: Arc<Env>, _: Request| async move {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                let message = env.lock().clone();
                Ok::<_, Infallible>(format!("slept: {message}"))
            }),
        )
        .unwrap();
    HttpServer::new(router, "Hello".to_string())
}

fn server_with_limits(limits: RequestLimits) -> HttpServer<String> {
    server().with_limits(limits)
}

#[tokio::test]
async fn hello_world_exact_bytes() {
    let output = roundtrip(&server(), b"GET / HTTP/1.1\r\n\r\n").await;
    let expected = format!(
        "HTTP/1.1 200 OK\r\nServer: grole/{}\r\nContent-Length: 13\r\nContent-Type: text/html\r\n\r\nHello, World!",
        env!("CARGO_PKG_VERSION")
    );
    assert_eq!(String::from_utf8(output).unwrap(), expected);
}

#[tokio::test]
async fn lf_only_line_endings_are_accepted() {
    let output = roundtrip(&server(), b"GET / HTTP/1.1\nHost: x\n\n").await;
    let responses = parse_responses(&output);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].text(), "Hello, World!");
}

#[tokio::test]
async fn sequential_requests_share_connection_and_state() {
    let input = b"POST /message HTTP/1.1\r\nContent-Length: 7\r\n\r\nUpdatedGET /message HTTP/1.1\r\n\r\nGET /sleep HTTP/1.1\r\n\r\n";
    let responses = parse_responses(&roundtrip(&server(), input).await);

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0].code(), 200);
    assert_eq!(responses[0].header("Content-Length"), Some("0"));
    assert_eq!(responses[0].header("Content-Type"), Some("text/plain"));
    assert_eq!(responses[1].text(), "Updated");
    assert_eq!(responses[2].text(), "slept: Updated");
}

#[tokio::test]
async fn body_is_read_by_content_length() {
    let input = b"PUT /echo HTTP/1.1\r\ncontent-length: 5\r\n\r\nhello";
    let responses = parse_responses(&roundtrip(&server(), input).await);
    assert_eq!(responses[0].body, b"hello");
    assert_eq!(responses[0].header("Content-Type"), Some("text/plain"));
}

#[tokio::test]
async fn query_and_captures_reach_handler() {
    let input = b"GET /query?bar=baz&spam=eggs&chips HTTP/1.1\r\n\r\nGET /users/42 HTTP/1.1\r\n\r\n";
    let responses = parse_responses(&roundtrip(&server(), input).await);

    assert_eq!(responses[0].header("Content-Type"), Some("application/json"));
    let query: serde_json::Value = serde_json::from_slice(&responses[0].body).unwrap();
    assert_eq!(query, json!({ "bar": "baz", "spam": "eggs", "chips": null }));

    let user: serde_json::Value = serde_json::from_slice(&responses[1].body).unwrap();
    assert_eq!(user, json!({ "id": "42", "first": "42" }));
}

#[tokio::test]
async fn path_is_percent_decoded_before_matching() {
    let output = roundtrip(&server(), b"GET /hello%20world HTTP/1.1\r\n\r\n").await;
    let responses = parse_responses(&output);
    assert_eq!(responses[0].code(), 200);
    assert_eq!(responses[0].text(), "/hello world");
}

#[tokio::test]
async fn caller_headers_follow_body_headers() {
    let output = roundtrip(&server(), b"POST /created HTTP/1.1\r\n\r\n").await;
    let response = &parse_responses(&output)[0];

    assert_eq!(response.status_line, "HTTP/1.1 201 Created");
    let names: Vec<&str> = response.headers.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, ["Server", "Content-Length", "Content-Type", "X-Id"]);
    assert_eq!(response.header("Content-Length"), Some("4"));
    assert_eq!(response.text(), "made");
}

#[tokio::test]
async fn unknown_route_or_method_is_404() {
    let input = b"GET /nowhere HTTP/1.1\r\n\r\nDELETE / HTTP/1.1\r\n\r\nGET / HTTP/1.1\r\n\r\n";
    let responses = parse_responses(&roundtrip(&server(), input).await);

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0].status_line, "HTTP/1.1 404 Not Found");
    assert_eq!(responses[1].status_line, "HTTP/1.1 404 Not Found");
    assert_eq!(responses[2].code(), 200);
}

#[tokio::test]
async fn handler_error_is_500_and_connection_survives() {
    let input = b"GET /fail HTTP/1.1\r\n\r\nGET /panic HTTP/1.1\r\n\r\nGET / HTTP/1.1\r\n\r\n";
    let responses = parse_responses(&roundtrip(&server(), input).await);

    assert_eq!(responses.len(), 3);
    for response in &responses[..2] {
        assert_eq!(response.status_line, "HTTP/1.1 500 Internal Server Error");
        assert!(response.body.is_empty(), "no diagnostics leak to the client");
    }
    assert_eq!(responses[2].text(), "Hello, World!");
}

#[tokio::test]
async fn malformed_request_gets_400_then_close() {
    for input in [
        &b"GARBAGE\r\n\r\nGET / HTTP/1.1\r\n\r\n"[..],
        b"GET / HTTP/1.1 extra\r\n\r\nGET / HTTP/1.1\r\n\r\n",
        b"GET / HTTP/1.1\r\nNoColonHere\r\n\r\nGET / HTTP/1.1\r\n\r\n",
        b"POST /echo HTTP/1.1\r\nContent-Length: lots\r\n\r\nGET / HTTP/1.1\r\n\r\n",
        b"GET /\xff HTTP/1.1\r\n\r\nGET / HTTP/1.1\r\n\r\n",
    ] {
        let responses = parse_responses(&roundtrip(&server(), input).await);
        assert_eq!(responses.len(), 1, "{:?}", String::from_utf8_lossy(input));
        assert_eq!(responses[0].status_line, "HTTP/1.1 400 Bad Request");
        assert_eq!(responses[0].header("Connection"), Some("close"));
    }
}

#[tokio::test]
async fn oversized_lines_and_headers_get_431() {
    let limits = RequestLimits {
        max_line_bytes: 32,
        max_headers: 2,
        ..RequestLimits::default()
    };

    let long_line = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(64));
    let responses = parse_responses(&roundtrip(&server_with_limits(limits), long_line.as_bytes()).await);
    assert_eq!(responses[0].code(), 431);

    let many = b"GET / HTTP/1.1\r\nA: 1\r\nB: 2\r\nC: 3\r\n\r\n";
    let responses = parse_responses(&roundtrip(&server_with_limits(limits), many).await);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].status_line, "HTTP/1.1 431 Request Header Fields Too Large");
}

#[tokio::test]
async fn oversized_body_gets_413() {
    let limits = RequestLimits {
        max_body_bytes: 4,
        ..RequestLimits::default()
    };
    let input = b"PUT /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
    let responses = parse_responses(&roundtrip(&server_with_limits(limits), input).await);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].code(), 413);
    assert_eq!(responses[0].header("Connection"), Some("close"));
}

#[tokio::test]
async fn truncated_body_ends_connection_silently() {
    let input = b"PUT /echo HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";
    assert!(roundtrip(&server(), input).await.is_empty());
}

#[tokio::test]
async fn immediate_close_produces_nothing() {
    let server = server();
    assert!(roundtrip(&server, b"").await.is_empty());
    assert_eq!(server.tracker().active_count(), 0);
}

#[tokio::test]
async fn write_fault_shuts_connection_down() {
    let (io, shut_down) = BrokenWriter::new(b"GET / HTTP/1.1\r\n\r\nGET / HTTP/1.1\r\n\r\n");
    let server = server();
    server.serve_connection(io, "broken").await;
    assert!(shut_down.load(Ordering::SeqCst));
    assert_eq!(server.tracker().active_count(), 0);
}

#[tokio::test]
async fn chunked_file_body_on_the_wire() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.txt");
    std::fs::write(&path, "foo\n").unwrap();

    let mut router = Router::new();
    router
        .route_sync("/file", &["GET"], move |_: &Environment<()>, _: &Request| {
            Ok::<_, Infallible>(Body::file(&path))
        })
        .unwrap();
    let server = HttpServer::new(router, ());

    let output = roundtrip(&server, b"GET /file HTTP/1.1\r\n\r\n").await;
    let expected = format!(
        "HTTP/1.1 200 OK\r\nServer: grole/{}\r\nTransfer-Encoding: chunked\r\nContent-Type: text/plain\r\n\r\n4\r\nfoo\n\r\n0\r\n\r\n",
        env!("CARGO_PKG_VERSION")
    );
    assert_eq!(String::from_utf8(output).unwrap(), expected);
}

#[tokio::test]
async fn unreadable_file_closes_connection_after_head() {
    let mut router = Router::new();
    router
        .route_sync("/gone", &["GET"], |_: &Environment<()>, _: &Request| {
            Ok::<_, Infallible>(Body::file("/no/such/file.txt"))
        })
        .unwrap();
    let server = HttpServer::new(router, ());

    let output = roundtrip(&server, b"GET /gone HTTP/1.1\r\n\r\nGET /gone HTTP/1.1\r\n\r\n").await;
    let text = String::from_utf8(output).unwrap();
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.ends_with("\r\n\r\n"));
    assert_eq!(text.matches("HTTP/1.1").count(), 1);
}
