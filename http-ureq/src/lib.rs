#![deny(
    missing_debug_implementations,
    anonymous_parameters,
    keyword_idents,
    macro_use_extern_crate,
    missing_docs,
    non_ascii_idents,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]

//! # fetchkit-ureq
//!
//! ## 基于 Ureq 的 HTTP 传输实现
//!
//! 基于 Ureq 库实现 [`fetchkit_http::HttpCaller`] 接口，仅提供阻塞调用。
//!
//! 4xx / 5xx 状态码会作为正常的 [`fetchkit_http::Response`] 返回，
//! 只有连接失败，超时，TLS 握手失败这类传输层错误才会返回 [`fetchkit_http::ResponseError`]。

mod client;

pub use client::{Client, ClientBuilder};

pub use fetchkit_http as http;
pub use ureq;

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use fetchkit_http::{
        header::{LOCATION, SET_COOKIE},
        HeaderValue, HttpCaller, Method, Request, ResponseErrorKind, StatusCode,
    };
    use futures::channel::oneshot::channel;
    use std::{
        io::{ErrorKind as IoErrorKind, Read, Write},
        net::{SocketAddr, TcpListener},
        thread::{sleep, spawn, JoinHandle},
        time::Duration,
    };
    use tokio::task::spawn_blocking;
    use warp::{
        filters::{body::bytes, method::post},
        header::value as header_value,
        http::Response as WarpResponse,
        path, Filter,
    };

    macro_rules! starts_with_server {
        ($addr:ident, $routes:ident, $code:block) => {{
            let (tx, rx) = channel();
            let ($addr, server) = warp::serve($routes).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
                rx.await.ok();
            });
            let handler = tokio::spawn(server);
            $code?;
            tx.send(()).ok();
            handler.await.ok();
        }};
    }

    /// 只处理一个连接的原始 HTTP 服务器，每段数据写出前先等待指定时长
    fn serve_once(chunks: Vec<(Duration, Vec<u8>)>) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let handle = spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            for (delay, chunk) in chunks {
                sleep(delay);
                if stream.write_all(&chunk).and_then(|_| stream.flush()).is_err() {
                    return;
                }
            }
        });
        Ok((addr, handle))
    }

    fn read_body(response: &mut fetchkit_http::Response) -> anyhow::Result<String> {
        let mut text = String::new();
        if let Some(body) = response.body_mut() {
            body.read_to_string(&mut text)?;
        }
        Ok(text)
    }

    #[tokio::test]
    async fn test_get_with_repeated_response_headers() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let routes = path!("hello").and(header_value("x-fetchkit")).map(|value: HeaderValue| {
            assert_eq!(value, "a, b");
            WarpResponse::builder()
                .header(SET_COOKIE, "a=1")
                .header(SET_COOKIE, "b=2")
                .body("hello world")
                .unwrap()
        });
        starts_with_server!(addr, routes, {
            spawn_blocking(move || {
                let request = Request::builder()
                    .url(format!("http://{}/hello", addr).parse()?)
                    .append_header("x-fetchkit", HeaderValue::from_static("a"))
                    .append_header("x-fetchkit", HeaderValue::from_static("b"))
                    .build();
                let mut response = Client::default().call(&request)?;
                assert_eq!(response.status_code(), StatusCode::OK);
                assert_eq!(response.reason(), Some("OK"));
                assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 2);
                assert_eq!(response.body().and_then(|body| body.content_length()), Some(11));
                assert_eq!(read_body(&mut response)?, "hello world");
                Ok::<_, anyhow::Error>(())
            })
            .await?
        });
        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_is_returned_as_response() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let routes = path!("missing").map(|| {
            WarpResponse::builder()
                .status(404)
                .body("<html>not found</html>")
                .unwrap()
        });
        starts_with_server!(addr, routes, {
            spawn_blocking(move || {
                let request = Request::builder()
                    .url(format!("http://{}/missing", addr).parse()?)
                    .build();
                let mut response = Client::default().call(&request)?;
                assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
                assert_eq!(read_body(&mut response)?, "<html>not found</html>");
                Ok::<_, anyhow::Error>(())
            })
            .await?
        });
        Ok(())
    }

    #[tokio::test]
    async fn test_post_body() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let routes = path!("echo")
            .and(post())
            .and(header_value("content-type"))
            .and(bytes())
            .map(|content_type: HeaderValue, req_body: Bytes| {
                assert_eq!(content_type, "application/x-www-form-urlencoded");
                WarpResponse::builder().body(req_body).unwrap()
            });
        starts_with_server!(addr, routes, {
            spawn_blocking(move || {
                let request = Request::builder()
                    .method(Method::POST)
                    .url(format!("http://{}/echo", addr).parse()?)
                    .append_header(
                        "content-type",
                        HeaderValue::from_static("application/x-www-form-urlencoded"),
                    )
                    .body("name=fetchkit&lang=rust")
                    .build();
                let mut response = Client::default().call(&request)?;
                assert_eq!(response.status_code(), StatusCode::OK);
                assert_eq!(read_body(&mut response)?, "name=fetchkit&lang=rust");
                Ok::<_, anyhow::Error>(())
            })
            .await?
        });
        Ok(())
    }

    #[tokio::test]
    async fn test_redirect_following_is_per_request() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let old = path!("old").map(|| {
            WarpResponse::builder()
                .status(302)
                .header(LOCATION, "/new")
                .body("")
                .unwrap()
        });
        let new = path!("new").map(|| "moved here");
        let routes = old.or(new);
        starts_with_server!(addr, routes, {
            spawn_blocking(move || {
                let client = Client::default();

                let request = Request::builder()
                    .url(format!("http://{}/old", addr).parse()?)
                    .follow_redirects(false)
                    .build();
                let response = client.call(&request)?;
                assert_eq!(response.status_code(), StatusCode::FOUND);
                assert_eq!(response.header(LOCATION).map(|v| v.as_bytes()), Some(&b"/new"[..]));

                let request = Request::builder()
                    .url(format!("http://{}/old", addr).parse()?)
                    .build();
                let mut response = client.call(&request)?;
                assert_eq!(response.status_code(), StatusCode::OK);
                assert_eq!(read_body(&mut response)?, "moved here");
                Ok::<_, anyhow::Error>(())
            })
            .await?
        });
        Ok(())
    }

    #[test]
    fn test_interleaved_response_headers_keep_order() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let (addr, server) = serve_once(vec![(
            Duration::ZERO,
            b"HTTP/1.1 200 OK\r\nSet-Cookie: a=1\r\nX-Trace: t1\r\nSet-Cookie: b=2\r\nX-Trace: t2\r\nSet-Cookie: c=3\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok"
                .to_vec(),
        )])?;
        let request = Request::builder()
            .url(format!("http://{}/headers", addr).parse()?)
            .build();
        let mut response = Client::default().call(&request)?;
        assert_eq!(
            response.headers().get_all(SET_COOKIE).iter().collect::<Vec<_>>(),
            ["a=1", "b=2", "c=3"]
        );
        assert_eq!(
            response.headers().get_all("x-trace").iter().collect::<Vec<_>>(),
            ["t1", "t2"]
        );
        assert_eq!(read_body(&mut response)?, "ok");
        server.join().ok();
        Ok(())
    }

    #[test]
    fn test_timeout_does_not_limit_slow_body() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let mut chunks = vec![(
            Duration::ZERO,
            b"HTTP/1.1 200 OK\r\nContent-Length: 8\r\nConnection: close\r\n\r\n".to_vec(),
        )];
        chunks.extend(b"abcdefgh".iter().map(|byte| (Duration::from_millis(300), vec![*byte])));
        let (addr, server) = serve_once(chunks)?;
        let request = Request::builder()
            .url(format!("http://{}/slow", addr).parse()?)
            .timeout(Duration::from_secs(1))
            .build();
        let mut response = Client::default().call(&request)?;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(read_body(&mut response)?, "abcdefgh");
        server.join().ok();
        Ok(())
    }

    #[test]
    fn test_timeout_limits_stalled_read() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let (addr, _server) = serve_once(vec![
            (
                Duration::ZERO,
                b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\n".to_vec(),
            ),
            (Duration::from_millis(1500), b"late".to_vec()),
        ])?;
        let request = Request::builder()
            .url(format!("http://{}/stalled", addr).parse()?)
            .timeout(Duration::from_millis(300))
            .build();
        let mut response = Client::default().call(&request)?;
        let err = read_body(&mut response).unwrap_err();
        let io_err = err.downcast_ref::<std::io::Error>().map(|err| err.kind());
        assert_eq!(io_err, Some(IoErrorKind::TimedOut));
        Ok(())
    }

    #[test]
    fn test_connection_refused() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0")?;
            listener.local_addr()?
        };
        let request = Request::builder()
            .url(format!("http://{}/nothing", addr).parse()?)
            .build();
        let err = Client::default().call(&request).unwrap_err();
        assert_eq!(err.kind(), ResponseErrorKind::ConnectError);
        assert!(err.url().is_some());
        Ok(())
    }
}
