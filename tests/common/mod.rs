//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use grole::HttpServer;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};

/// Send `input` over an in-memory connection, close the client's write side
/// and collect everything the server wrote until it closed the connection.
pub async fn roundtrip<S>(server: &HttpServer<S>, input: &[u8]) -> Vec<u8>
where
    S: Send + Sync + 'static,
{
    let (mut client, server_io) = tokio::io::duplex(64 * 1024);
    let server = server.clone();
    let task = tokio::spawn(async move { server.serve_connection(server_io, "duplex").await });

    // The server may hang up before consuming everything.
    let _ = client.write_all(input).await;
    let _ = client.shutdown().await;

    let mut output = Vec::new();
    client.read_to_end(&mut output).await.unwrap();
    task.await.unwrap();
    output
}

/// A response as seen on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn code(&self) -> u16 {
        self.status_line
            .split(' ')
            .nth(1)
            .and_then(|c| c.parse().ok())
            .expect("status code")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.body).expect("utf-8 body")
    }
}

/// Split a stream of back-to-back responses, decoding chunked bodies.
pub fn parse_responses(mut data: &[u8]) -> Vec<RawResponse> {
    let mut responses = Vec::new();
    while !data.is_empty() {
        let (line, rest) = take_line(data);
        data = rest;
        let status_line = line.to_string();

        let mut headers = Vec::new();
        loop {
            let (line, rest) = take_line(data);
            data = rest;
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(": ").expect("header separator");
            headers.push((name.to_string(), value.to_string()));
        }

        let mut response = RawResponse {
            status_line,
            headers,
            body: Vec::new(),
        };
        if response.header("Transfer-Encoding") == Some("chunked") {
            loop {
                let (line, rest) = take_line(data);
                data = rest;
                let size = usize::from_str_radix(line, 16).expect("chunk size");
                if size == 0 {
                    let (trailer, rest) = take_line(data);
                    assert_eq!(trailer, "", "chunked body must end with an empty line");
                    data = rest;
                    break;
                }
                response.body.extend_from_slice(&data[..size]);
                assert_eq!(&data[size..size + 2], b"\r\n");
                data = &data[size + 2..];
            }
        } else {
            let len: usize = response
                .header("Content-Length")
                .expect("Content-Length")
                .parse()
                .unwrap();
            response.body = data[..len].to_vec();
            data = &data[len..];
        }
        responses.push(response);
    }
    responses
}

fn take_line(data: &[u8]) -> (&str, &[u8]) {
    let eol = data
        .windows(2)
        .position(|w| w == b"\r\n")
        .expect("CRLF-terminated line");
    (std::str::from_utf8(&data[..eol]).unwrap(), &data[eol + 2..])
}

/// A transport that yields scripted input and fails every write.
pub struct BrokenWriter {
    input: io::Cursor<Vec<u8>>,
    shut_down: Arc<AtomicBool>,
}

impl BrokenWriter {
    pub fn new(input: &[u8]) -> (Self, Arc<AtomicBool>) {
        let shut_down = Arc::new(AtomicBool::new(false));
        let io = Self {
            input: io::Cursor::new(input.to_vec()),
            shut_down: Arc::clone(&shut_down),
        };
        (io, shut_down)
    }
}

impl AsyncRead for BrokenWriter {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.input).poll_read(cx, buf)
    }
}

impl AsyncWrite for BrokenWriter {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.shut_down.store(true, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}
