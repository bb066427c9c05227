use anyhow::{Chain, Error as AnyError};
use assert_impl::assert_impl;
use std::{
    error::Error as StdError,
    fmt::{self, Debug, Display},
    io::{Error as IoError, ErrorKind as IoErrorKind},
};

/// HTTP 响应错误类型
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 协议错误，该协议不能支持
    ProtocolError,

    /// 非法的请求 / 响应错误
    InvalidRequestResponse,

    /// 非法的 URL
    InvalidUrl,

    /// 非法的 HTTP 头
    InvalidHeader,

    /// 网络连接失败
    ConnectError,

    /// 代理连接失败
    ProxyError,

    /// DNS 服务器连接失败
    DnsServerError,

    /// 域名解析失败
    UnknownHostError,

    /// 发送失败
    SendError,

    /// 接受失败
    ReceiveError,

    /// 本地 IO 失败
    LocalIoError,

    /// 超时失败
    TimeoutError,

    /// SSL 错误
    SslError,

    /// 重定向次数过多
    TooManyRedirect,

    /// 用户取消
    UserCanceled,

    /// 未知错误
    UnknownError,
}

/// HTTP 响应错误
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    error: AnyError,
    url: Option<String>,
}

impl Error {
    /// 创建 HTTP 响应错误构建器
    #[inline]
    pub fn builder(kind: ErrorKind, err: impl Into<AnyError>) -> ErrorBuilder {
        ErrorBuilder::new(kind, err)
    }

    /// 使用错误信息创建 HTTP 响应错误构建器
    #[inline]
    pub fn builder_with_msg(kind: ErrorKind, msg: impl Display + Debug + Send + Sync + 'static) -> ErrorBuilder {
        ErrorBuilder::new(kind, AnyError::msg(msg))
    }

    /// 获取 HTTP 响应错误类型
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取出错的请求 URL
    #[inline]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// 是否是 SSL 错误
    #[inline]
    pub fn is_ssl_error(&self) -> bool {
        self.kind == ErrorKind::SslError
    }

    /// 遍历错误链，从当前错误的直接原因开始
    #[inline]
    pub fn chain(&self) -> Chain<'_> {
        self.error.chain()
    }

    /// 获取错误链中第一个 IO 错误的类型
    ///
    /// 用于区分连接被重置，管道破裂这类系统调用层面的错误
    pub fn io_error_kind(&self) -> Option<IoErrorKind> {
        self.chain()
            .find_map(|cause| cause.downcast_ref::<IoError>())
            .map(IoError::kind)
    }

    /// 转换为内部错误
    #[inline]
    pub fn into_inner(self) -> AnyError {
        self.error
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}]", self.kind)?;
        if let Some(url) = self.url.as_ref() {
            write!(f, "[{}]", url)?;
        }
        write!(f, " {}", self.error)
    }
}

impl StdError for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.error.as_ref())
    }
}

/// HTTP 响应错误构建器
#[derive(Debug)]
pub struct ErrorBuilder {
    inner: Error,
}

impl ErrorBuilder {
    #[inline]
    fn new(kind: ErrorKind, err: impl Into<AnyError>) -> Self {
        Self {
            inner: Error {
                kind,
                error: err.into(),
                url: None,
            },
        }
    }

    /// 设置出错的请求 URL
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl ToString) -> Self {
        self.inner.url = Some(url.to_string());
        self
    }

    /// 构建 HTTP 响应错误
    #[inline]
    pub fn build(self) -> Error {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_io_error_kind_from_chain() -> Result<()> {
        let err = Error::builder(
            ErrorKind::ReceiveError,
            IoError::new(IoErrorKind::ConnectionReset, "Connection reset by peer"),
        )
        .url("http://localhost/abc")
        .build();
        assert_eq!(err.io_error_kind(), Some(IoErrorKind::ConnectionReset));
        assert_eq!(err.url(), Some("http://localhost/abc"));
        assert!(err.to_string().contains("Connection reset by peer"));

        let wrapped = Error::builder(
            ErrorKind::SendError,
            AnyError::new(IoError::new(IoErrorKind::BrokenPipe, "Broken pipe")).context("write request body"),
        )
        .build();
        assert_eq!(wrapped.io_error_kind(), Some(IoErrorKind::BrokenPipe));

        let plain = Error::builder_with_msg(ErrorKind::UnknownError, "Test Error").build();
        assert_eq!(plain.io_error_kind(), None);
        assert!(!plain.is_ssl_error());
        assert_eq!(plain.to_string(), "[UnknownError] Test Error");
        Ok(())
    }
}
