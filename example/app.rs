use arena_h1::HttpService;
use arena_h1::codec::{Codec, Gzip};
use arena_h1::http::headers::{CONTENT_ENCODING, USER_AGENT};
use arena_h1::http::{Request, Response, StatusCode};
use bytes::Bytes;
use std::path::PathBuf;

use crate::files::{self, FileError};

/// Echo, user agent and file routes.
#[derive(Debug)]
pub struct App {
    directory: PathBuf,
    gzip: Gzip,
}

impl App {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            gzip: Gzip::new(),
        }
    }

    /// Path of `/files/{name}`, `None` if the name can not denote a file in the directory.
    fn file_path(&self, name: &[u8]) -> Option<PathBuf> {
        let name = std::str::from_utf8(name).ok()?;
        if name == "." || name == ".." {
            return None;
        }
        Some(self.directory.join(name))
    }

    async fn route(&self, req: &Request<'_>, res: &mut Response) {
        let segments: Vec<&[u8]> = req
            .url()
            .split(|b| *b == b'/')
            .filter(|s| !s.is_empty())
            .collect();

        let Some(first) = segments.first() else {
            res.set_empty(StatusCode::OK);
            return;
        };

        match (req.method(), *first) {
            (b"POST", b"files") => match segments[..] {
                [_, name] => self.upload(req, name, res).await,
                _ => res.set_empty(StatusCode::INTERNAL_SERVER_ERROR),
            },
            (b"GET", b"files") => match segments[..] {
                [_, name] => self.download(name, res).await,
                _ => res.set_empty(StatusCode::NOT_FOUND),
            },
            (b"GET", b"echo") => match segments[..] {
                [_, text] => res.set_body(
                    StatusCode::OK,
                    "text/plain",
                    Bytes::copy_from_slice(text.trim_ascii()),
                ),
                _ => res.set_empty(StatusCode::NOT_FOUND),
            },
            (b"GET", b"user-agent") => match req.header(USER_AGENT) {
                Some(agent) => res.set_body(
                    StatusCode::OK,
                    "text/plain",
                    Bytes::copy_from_slice(agent.trim_ascii()),
                ),
                None => res.set_empty(StatusCode::BAD_REQUEST),
            },
            _ => res.set_empty(StatusCode::NOT_FOUND),
        }
    }

    async fn download(&self, name: &[u8], res: &mut Response) {
        let Some(path) = self.file_path(name) else {
            return res.set_empty(StatusCode::NOT_FOUND);
        };

        match files::read_file(&path).await {
            Ok(content) => res.set_body(StatusCode::OK, "application/octet-stream", content),
            Err(FileError::NotFound) => res.set_empty(StatusCode::NOT_FOUND),
            Err(err) => {
                log::error!("failed to read {}: {err}", path.display());
                res.set_empty(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }

    async fn upload(&self, req: &Request<'_>, name: &[u8], res: &mut Response) {
        let Some(path) = self.file_path(name) else {
            return res.set_empty(StatusCode::INTERNAL_SERVER_ERROR);
        };

        let gzipped = req
            .header(CONTENT_ENCODING)
            .is_some_and(|value| value.trim_ascii().eq_ignore_ascii_case(b"gzip"));

        let content = if gzipped {
            match self.gzip.decompress(req.body()) {
                Ok(content) => content,
                Err(err) => {
                    log::warn!("failed to decode upload: {err}");
                    return res.set_empty(StatusCode::BAD_REQUEST);
                }
            }
        } else {
            Bytes::copy_from_slice(req.body())
        };

        match files::write_file(&path, &content).await {
            Ok(()) => res.set_empty(StatusCode::CREATED),
            Err(err) => {
                log::error!("failed to write {}: {err}", path.display());
                res.set_empty(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }
}

impl HttpService for App {
    async fn call(&self, req: &Request<'_>, res: &mut Response) -> bool {
        self.route(req, res).await;
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use arena_h1::h1::framer::Framer;
    use arena_h1::http::HeaderMatch;
    use arena_h1::http::headers::{CONTENT_LENGTH, CONTENT_TYPE};

    async fn call(app: &App, input: &[u8]) -> Response {
        let mut framer = Framer::new(16, 4096, HeaderMatch::IgnoreCase);
        assert!(framer.advance(input).is_ok());
        let req = framer.request(input).unwrap();

        let mut res = Response::new();
        assert!(!app.call(&req, &mut res).await);
        res
    }

    fn post(url: &str, headers: &str, body: &[u8]) -> Vec<u8> {
        let mut input =
            format!("POST {url} HTTP/1.1\r\n{headers}Content-Length: {}\r\n\r\n", body.len())
                .into_bytes();
        input.extend_from_slice(body);
        input
    }

    #[tokio::test]
    async fn test_root_and_unknown() {
        let app = App::new(".");

        let res = call(&app, b"GET / HTTP/1.1\r\n\r\n").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get(CONTENT_LENGTH), Some(&b"0"[..]));

        let res = call(&app, b"GET /nothing HTTP/1.1\r\n\r\n").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = call(&app, b"DELETE /files/a HTTP/1.1\r\n\r\n").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_echo() {
        let app = App::new(".");

        let res = call(&app, b"GET /echo/abc HTTP/1.1\r\n\r\n").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get(CONTENT_TYPE), Some(&b"text/plain"[..]));
        assert_eq!(res.headers().get(CONTENT_LENGTH), Some(&b"3"[..]));
        assert_eq!(&res.body()[..], b"abc");

        let res = call(&app, b"GET /echo HTTP/1.1\r\n\r\n").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = call(&app, b"GET /echo/a/b HTTP/1.1\r\n\r\n").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_user_agent() {
        let app = App::new(".");

        let res = call(&app, b"GET /user-agent HTTP/1.1\r\nuser-agent:  curl/8.4.0 \r\n\r\n").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(&res.body()[..], b"curl/8.4.0");

        let res = call(&app, b"GET /user-agent HTTP/1.1\r\n\r\n").await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_files() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(dir.path());

        let res = call(&app, b"GET /files/a.txt HTTP/1.1\r\n\r\n").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = call(&app, &post("/files/a.txt", "", b"stored")).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"stored");

        let res = call(&app, b"GET /files/a.txt HTTP/1.1\r\n\r\n").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(CONTENT_TYPE),
            Some(&b"application/octet-stream"[..])
        );
        assert_eq!(&res.body()[..], b"stored");

        let res = call(&app, b"GET /files/.. HTTP/1.1\r\n\r\n").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = call(&app, b"GET /files HTTP/1.1\r\n\r\n").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = call(&app, &post("/files", "", b"x")).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_upload_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(dir.path());

        let body = Gzip::new().compress(b"decoded").unwrap();
        let res = call(&app, &post("/files/b.txt", "Content-Encoding: gzip\r\n", &body)).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(std::fs::read(dir.path().join("b.txt")).unwrap(), b"decoded");

        let res = call(&app, &post("/files/c.txt", "Content-Encoding: gzip\r\n", b"plain")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(dir.path().join("missing"));

        let res = call(&app, &post("/files/a.txt", "", b"x")).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
