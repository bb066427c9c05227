use super::InterruptedStreamError;
use anyhow::Error as AnyError;
use assert_impl::assert_impl;
use fetchkit_http::{ResponseError, ResponseErrorKind, StatusCode};
use serde_json::Error as JsonError;
use std::{
    error::Error as StdError,
    fmt::{self, Display},
    io::Error as IoError,
    result,
};
use thiserror::Error as ThisError;

/// 请求执行结果
pub type Result<T> = result::Result<T, Error>;

/// 请求执行错误
#[derive(ThisError, Debug)]
#[non_exhaustive]
pub enum Error {
    /// 构建 HTTP 请求失败
    #[error(transparent)]
    RequestBuild(#[from] RequestBuildError),

    /// 发送 HTTP 请求失败，或在解析响应前被取消
    #[error(transparent)]
    RequestTransport(#[from] RequestTransportError),

    /// 状态码错误
    #[error(transparent)]
    WrongStatus(#[from] WrongStatusError),

    /// 读取响应体时被取消
    #[error(transparent)]
    InterruptedStream(#[from] InterruptedStreamError),

    /// 读取响应体或写入目标时发生 IO 错误
    #[error("response body I/O error: {0}")]
    Io(#[source] IoError),

    /// 解析响应体失败
    #[error("failed to parse response body: {0}")]
    Parse(#[source] JsonError),
}

impl Error {
    /// 是否是被取消导致的错误
    ///
    /// 包括发送请求前后被取消，以及读取响应体时被取消
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::InterruptedStream(_) => true,
            Self::RequestTransport(err) => err.is_cancelled(),
            _ => false,
        }
    }

    /// 状态码错误中的状态码
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::WrongStatus(err) => Some(err.status_code()),
            _ => None,
        }
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        if InterruptedStreamError::is_interrupted(&err) {
            Self::InterruptedStream(InterruptedStreamError)
        } else {
            Self::Io(err)
        }
    }
}

impl From<JsonError> for Error {
    fn from(err: JsonError) -> Self {
        if err.is_io() {
            IoError::from(err).into()
        } else {
            Self::Parse(err)
        }
    }
}

/// 构建 HTTP 请求失败
#[derive(Debug)]
pub struct RequestBuildError {
    url: String,
    error: AnyError,
}

impl RequestBuildError {
    pub(crate) fn new(url: impl Into<String>, err: impl Into<AnyError>) -> Self {
        Self {
            url: url.into(),
            error: err.into(),
        }
    }

    /// 请求 URL
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Display for RequestBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to build request for {}: {}", self.url, self.error)
    }
}

impl StdError for RequestBuildError {
    #[inline]
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.error.as_ref())
    }
}

/// 传输错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportErrorKind {
    /// 发送请求前，或请求返回后被取消
    Cancelled,

    /// HTTP 调用失败
    CallFailed(ResponseErrorKind),

    /// 200 响应没有响应体
    MissingBody,
}

/// 发送 HTTP 请求失败
#[derive(Debug)]
pub struct RequestTransportError {
    url: String,
    kind: TransportErrorKind,
    attempts: usize,
    source: Option<ResponseError>,
}

impl RequestTransportError {
    pub(crate) fn cancelled(url: impl Into<String>, attempts: usize) -> Self {
        Self {
            url: url.into(),
            kind: TransportErrorKind::Cancelled,
            attempts,
            source: None,
        }
    }

    pub(crate) fn call_failed(url: impl Into<String>, attempts: usize, err: ResponseError) -> Self {
        Self {
            url: url.into(),
            kind: TransportErrorKind::CallFailed(err.kind()),
            attempts,
            source: Some(err),
        }
    }

    pub(crate) fn missing_body(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: TransportErrorKind::MissingBody,
            attempts: 1,
            source: None,
        }
    }

    /// 请求 URL
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 传输错误类型
    #[inline]
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// 是否是 TLS 层的错误
    #[inline]
    pub fn is_ssl_error(&self) -> bool {
        self.source.as_ref().map_or(false, ResponseError::is_ssl_error)
    }

    /// 是否是被取消
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.kind == TransportErrorKind::Cancelled
    }

    /// 已经发送 HTTP 请求的次数
    #[inline]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// 传输层返回的原始错误
    #[inline]
    pub fn response_error(&self) -> Option<&ResponseError> {
        self.source.as_ref()
    }
}

impl Display for RequestTransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.source) {
            (TransportErrorKind::Cancelled, _) => write!(f, "request to {} was cancelled", self.url),
            (TransportErrorKind::MissingBody, _) => write!(f, "response from {} has no body", self.url),
            (_, Some(err)) => write!(f, "request to {} failed after {} attempts: {}", self.url, self.attempts, err),
            (_, None) => write!(f, "request to {} failed after {} attempts", self.url, self.attempts),
        }
    }
}

impl StdError for RequestTransportError {
    #[inline]
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|err| err as &(dyn StdError + 'static))
    }
}

/// 状态码错误
///
/// 开启 `any_code` 时会尽力保存响应体，用于展示服务器返回的错误页面
#[derive(ThisError, Debug)]
#[error("unexpected status {status_line} from {url}")]
pub struct WrongStatusError {
    url: String,
    status_code: StatusCode,
    status_line: String,
    body: Option<Vec<u8>>,
}

impl WrongStatusError {
    pub(crate) fn new(url: impl Into<String>, status_code: StatusCode, status_line: String, body: Option<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status_code,
            status_line,
            body,
        }
    }

    /// 请求 URL
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP 状态码
    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// 状态行，格式为 `<状态码> - <原因短语>`
    #[inline]
    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    /// 保存的响应体
    #[inline]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}
