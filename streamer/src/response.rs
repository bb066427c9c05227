use super::ProgressReader;
use fetchkit_http::{HeaderMap, HeaderValue, StatusCode};
use log::debug;

/// 响应句柄
///
/// 独占 HTTP 响应及其响应体，响应体已经被 [`ProgressReader`] 包装。
/// 调用 [`ResponseHandle::release`] 或直接丢弃句柄都会关闭响应体，释放对应的网络连接，
/// 释放只会发生一次
#[derive(Debug)]
pub struct ResponseHandle<'a> {
    body: Option<ProgressReader<'a>>,
    url: String,
    status_code: StatusCode,
    status_reason: String,
    headers: HeaderMap,
    location: Option<HeaderValue>,
    content_length: Option<u64>,
}

impl<'a> ResponseHandle<'a> {
    pub(crate) fn new(
        url: String,
        status_code: StatusCode,
        status_reason: String,
        headers: HeaderMap,
        location: Option<HeaderValue>,
        body: Option<ProgressReader<'a>>,
    ) -> Self {
        Self {
            content_length: body.as_ref().and_then(|body| body.content_length()),
            body,
            url,
            status_code,
            status_reason,
            headers,
            location,
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

    /// HTTP 状态行中的原因短语
    ///
    /// 传输层没有提供时，使用状态码的标准原因短语
    #[inline]
    pub fn status_reason(&self) -> &str {
        &self.status_reason
    }

    /// 状态行，格式为 `<状态码> - <原因短语>`
    pub fn status_line(&self) -> String {
        format!("{} - {}", self.status_code.as_u16(), self.status_reason)
    }

    /// HTTP Headers，保留服务器返回的顺序
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 获取 HTTP 响应 Header，如果有多个同名 Header，则返回第一个
    #[inline]
    pub fn header(&self, header_name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(header_name.as_ref())
    }

    /// Location Header，任何状态码都会提供
    #[inline]
    pub fn location(&self) -> Option<&HeaderValue> {
        self.location.as_ref()
    }

    /// 服务器声明的响应体长度
    #[inline]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// 是否是 304 响应
    #[inline]
    pub fn not_modified(&self) -> bool {
        self.status_code == StatusCode::NOT_MODIFIED
    }

    /// 响应体，服务器没有返回响应体时为 `None`
    #[inline]
    pub fn body_mut(&mut self) -> Option<&mut ProgressReader<'a>> {
        self.body.as_mut()
    }

    /// 取出响应体，之后由调用方负责丢弃
    #[inline]
    pub fn take_body(&mut self) -> Option<ProgressReader<'a>> {
        self.body.take()
    }

    /// 释放响应
    #[inline]
    pub fn release(self) {
        drop(self)
    }

    fn close(&mut self) {
        if let Some(body) = self.body.take() {
            debug!("release response body of {}", self.url);
            drop(body);
        }
    }
}

impl Drop for ResponseHandle<'_> {
    #[inline]
    fn drop(&mut self) {
        self.close();
    }
}
