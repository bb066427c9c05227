use super::ResponseError;
use assert_impl::assert_impl;
use http::{
    header::{HeaderMap, HeaderName, HeaderValue, IntoHeaderName},
    status::StatusCode,
};
use std::{
    fmt::{self, Debug},
    io::{Cursor, Read, Result as IoResult},
    mem::take,
    result,
};

/// HTTP 响应结果
pub type Result = result::Result<Response, ResponseError>;

/// HTTP 响应体
///
/// 读取时直接从网络连接中读取数据，不做任何缓冲，
/// 被丢弃时将释放对应的网络连接
pub struct ResponseBody {
    reader: Box<dyn Read + Send>,
    content_length: Option<u64>,
}

impl ResponseBody {
    /// 通过输入流创建 HTTP 响应体
    ///
    /// `content_length` 为服务器声明的响应体长度，未知则传入 `None`
    #[inline]
    pub fn from_reader(reader: impl Read + Send + 'static, content_length: Option<u64>) -> Self {
        Self {
            reader: Box::new(reader),
            content_length,
        }
    }

    /// 通过二进制数据创建 HTTP 响应体
    #[inline]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let content_length = Some(bytes.len() as u64);
        Self::from_reader(Cursor::new(bytes), content_length)
    }

    /// 服务器声明的响应体长度
    #[inline]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// 获取内部的输入流
    #[inline]
    pub fn into_reader(self) -> Box<dyn Read + Send> {
        self.reader
    }
}

impl Read for ResponseBody {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        self.reader.read(buf)
    }
}

impl Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody")
            .field("content_length", &self.content_length)
            .finish()
    }
}

/// HTTP 响应
///
/// 封装 HTTP 状态行，响应 Headers 和响应体
#[derive(Debug, Default)]
pub struct Response {
    status_code: StatusCode,
    reason: Option<String>,
    headers: HeaderMap,
    body: Option<ResponseBody>,
}

impl Response {
    /// 返回 HTTP 响应构建器
    #[inline]
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    /// HTTP 状态码
    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// HTTP 状态行中的原因短语
    #[inline]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// HTTP Headers
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 修改 HTTP Headers
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// 获取 HTTP 响应 Header，如果有多个同名 Header，则返回第一个
    #[inline]
    pub fn header(&self, header_name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(header_name.as_ref())
    }

    /// HTTP 响应体
    ///
    /// 服务器没有返回响应体时为 `None`
    #[inline]
    pub fn body(&self) -> Option<&ResponseBody> {
        self.body.as_ref()
    }

    /// 修改 HTTP 响应体
    #[inline]
    pub fn body_mut(&mut self) -> Option<&mut ResponseBody> {
        self.body.as_mut()
    }

    /// 取出 HTTP 响应体
    #[inline]
    pub fn take_body(&mut self) -> Option<ResponseBody> {
        self.body.take()
    }

    /// 直接获取 HTTP 响应体
    #[inline]
    pub fn into_body(self) -> Option<ResponseBody> {
        self.body
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
    }
}

/// HTTP 响应构建器
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    inner: Response,
}

impl ResponseBuilder {
    /// 设置 HTTP 状态码
    #[inline]
    pub fn status_code(&mut self, status_code: StatusCode) -> &mut Self {
        self.inner.status_code = status_code;
        self
    }

    /// 设置 HTTP 状态行中的原因短语
    #[inline]
    pub fn reason(&mut self, reason: impl Into<String>) -> &mut Self {
        self.inner.reason = Some(reason.into());
        self
    }

    /// 设置 HTTP Headers
    #[inline]
    pub fn headers(&mut self, headers: HeaderMap) -> &mut Self {
        self.inner.headers = headers;
        self
    }

    /// 追加 HTTP Header
    #[inline]
    pub fn append_header(&mut self, header_name: impl IntoHeaderName, header_value: HeaderValue) -> &mut Self {
        self.inner.headers.append(header_name, header_value);
        self
    }

    /// 设置 HTTP 响应体
    #[inline]
    pub fn body(&mut self, body: ResponseBody) -> &mut Self {
        self.inner.body = Some(body);
        self
    }

    /// 构建 HTTP 响应
    #[inline]
    pub fn build(&mut self) -> Response {
        take(&mut self.inner)
    }
}

/// 解析 Content-Length Header
pub fn parse_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(HeaderName::from_static("content-length"))
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
