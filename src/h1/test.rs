use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::connection::{Connection, ConnectionError};
use super::write::INTERNAL_ERROR_FALLBACK;
use crate::codec::{Codec, Gzip};
use crate::config::Config;
use crate::encoding::Encodings;
use crate::http::{Request, Response, StatusCode};
use crate::service::HttpService;

const RES_A: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 3\r\n\r\n/a:";
const RES_B: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\n/b:hi";

/// Responds with `<url>:<body>`.
fn echo(req: &Request<'_>, res: &mut Response) -> bool {
    let mut body = req.url().to_vec();
    body.push(b':');
    body.extend_from_slice(req.body());
    res.set_body(StatusCode::OK, "text/plain", body);
    false
}

fn large(_: &Request<'_>, res: &mut Response) -> bool {
    res.set_body(StatusCode::OK, "application/octet-stream", vec![b'x'; 1024]);
    false
}

fn small_arena() -> Config {
    Config::new()
        .arena_capacity(256)
        .read_buffer_capacity(64)
        .carry_capacity(64)
        .max_head_size(128)
}

/// Write `chunks` one by one, optionally shut down the write side, and collect everything the
/// server wrote until it closed.
async fn exchange<S: HttpService>(
    config: Config,
    service: S,
    chunks: &[&[u8]],
    shutdown: bool,
) -> Vec<u8> {
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let conn = Connection::new(
        server,
        Arc::new(service),
        Arc::new(config),
        Arc::new(Encodings::default()),
    );
    let task = tokio::spawn(conn.run());

    for chunk in chunks {
        client.write_all(chunk).await.unwrap();
        tokio::task::yield_now().await;
    }
    if shutdown {
        client.shutdown().await.unwrap();
    }

    let mut output = Vec::new();
    client.read_to_end(&mut output).await.unwrap();
    task.await.unwrap().unwrap();
    output
}

#[tokio::test]
async fn test_single_request() {
    let output = exchange(Config::default(), echo, &[&b"GET /a HTTP/1.1\r\n\r\n"[..]], true).await;
    assert_eq!(output, RES_A);
}

#[tokio::test]
async fn test_pipelined_in_one_write() {
    let input = b"GET /a HTTP/1.1\r\n\r\nPOST /b HTTP/1.1\r\nContent-Length: 2\r\n\r\nhi";
    let output = exchange(Config::default(), echo, &[&input[..]], true).await;
    assert_eq!(output, [RES_A, RES_B].concat());
}

#[tokio::test]
async fn test_request_split_across_writes() {
    let chunks: &[&[u8]] = &[
        &b"POST /b HTTP/1.1\r\nCont"[..],
        &b"ent-Length: 2\r\n\r"[..],
        &b"\nh"[..],
        &b"i"[..],
    ];
    let output = exchange(Config::default(), echo, chunks, true).await;
    assert_eq!(output, RES_B);
}

#[tokio::test]
async fn test_small_read_chunk() {
    let input = b"GET /a HTTP/1.1\r\n\r\nPOST /b HTTP/1.1\r\nContent-Length: 2\r\n\r\nhi";
    let output = exchange(Config::new().read_chunk(3), echo, &[&input[..]], true).await;
    assert_eq!(output, [RES_A, RES_B].concat());
}

#[tokio::test]
async fn test_malformed_request() {
    let input = b"GET /\r\n\r\nGET /a HTTP/1.1\r\n\r\n";
    let output = exchange(Config::default(), echo, &[&input[..]], false).await;
    assert_eq!(
        output,
        b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    );
}

#[tokio::test]
async fn test_connection_close() {
    let input = b"GET /a HTTP/1.1\r\nConnection: close\r\n\r\nGET /b HTTP/1.1\r\n\r\n";
    let output = exchange(Config::default(), echo, &[&input[..]], false).await;
    assert_eq!(
        output,
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 3\r\nConnection: close\r\n\r\n/a:"
    );
}

#[tokio::test]
async fn test_http10_version() {
    let output = exchange(Config::default(), echo, &[&b"GET /a HTTP/1.0\r\n\r\n"[..]], true).await;
    assert!(output.starts_with(b"HTTP/1.0 200 OK\r\n"));
}

#[tokio::test]
async fn test_gzip_negotiated() {
    let input = b"GET /a HTTP/1.1\r\nAccept-Encoding: br, gzip, deflate\r\n\r\n";
    let output = exchange(Config::default(), echo, &[&input[..]], true).await;

    let split = output.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
    let (head, body) = (&output[..split], &output[split + 4..]);
    let head = String::from_utf8(head.to_vec()).unwrap();

    assert!(head.contains("\r\nContent-Encoding: gzip"));
    assert!(head.contains(&format!("\r\nContent-Length: {}", body.len())));
    assert_eq!(&Gzip::new().decompress(body).unwrap()[..], b"/a:");
}

#[tokio::test]
async fn test_compression_disabled() {
    let input = b"GET /a HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n";
    let output = exchange(Config::new().compression(false), echo, &[&input[..]], true).await;
    assert_eq!(output, RES_A);
}

#[tokio::test]
async fn test_carry_truncated() {
    let input = b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n";
    let output = exchange(Config::new().carry_capacity(8), echo, &[&input[..]], true).await;
    // only `GET /b H` survives, the peer then closes before the request completes
    assert_eq!(output, RES_A);
}

#[tokio::test]
async fn test_response_out_of_space() {
    let output = exchange(small_arena(), large, &[&b"GET / HTTP/1.1\r\n\r\n"[..]], false).await;
    assert_eq!(output, INTERNAL_ERROR_FALLBACK);
}

#[tokio::test]
async fn test_request_out_of_space() {
    let mut input = b"POST / HTTP/1.1\r\nContent-Length: 1000\r\n\r\n".to_vec();
    input.extend_from_slice(&[b'x'; 300]);
    let output = exchange(small_arena(), echo, &[&input[..]], false).await;
    assert_eq!(
        output,
        b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    );
}

#[tokio::test]
async fn test_request_leaves_room_for_response() {
    fn created(_: &Request<'_>, res: &mut Response) -> bool {
        res.set_empty(StatusCode::CREATED);
        false
    }

    let mut input = b"POST /up HTTP/1.1\r\nContent-Length: 100\r\n\r\n".to_vec();
    input.extend_from_slice(&[b'x'; 100]);
    let output = exchange(small_arena(), created, &[&input[..]], true).await;
    assert_eq!(output, b"HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n");
}

#[tokio::test]
async fn test_write_timeout() {
    let (mut client, server) = tokio::io::duplex(64);
    let config = Config::new().write_timeout(Some(Duration::from_millis(20)));
    let conn = Connection::new(
        server,
        Arc::new(large),
        Arc::new(config),
        Arc::new(Encodings::default()),
    );
    let task = tokio::spawn(conn.run());

    // the response exceeds the pipe and is never read
    client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    assert!(matches!(task.await.unwrap(), Err(ConnectionError::WriteTimeout)));
    drop(client);
}

#[tokio::test]
async fn test_read_timeout() {
    let (_client, server) = tokio::io::duplex(1024);
    let config = Config::new().read_timeout(Some(Duration::from_millis(20)));
    let conn = Connection::new(
        server,
        Arc::new(echo),
        Arc::new(config),
        Arc::new(Encodings::default()),
    );
    assert!(matches!(conn.run().await, Err(ConnectionError::ReadTimeout)));
}

#[tokio::test]
async fn test_async_service() {
    struct Delayed;

    impl HttpService for Delayed {
        async fn call(&self, req: &Request<'_>, res: &mut Response) -> bool {
            tokio::time::sleep(Duration::from_millis(1)).await;
            echo(req, res)
        }
    }

    let output = exchange(Config::default(), Delayed, &[&b"GET /a HTTP/1.1\r\n\r\n"[..]], true).await;
    assert_eq!(output, RES_A);
}
