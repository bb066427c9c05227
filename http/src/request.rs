use assert_impl::assert_impl;
use http::{
    header::{HeaderMap, IntoHeaderName},
    method::Method,
    uri::Uri,
    HeaderValue,
};
use std::{mem::take, time::Duration};

/// HTTP 请求
///
/// 封装一次阻塞 HTTP 调用所需的全部信息，由 [`super::HttpCaller`] 执行
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Uri,
    headers: HeaderMap,
    body: Vec<u8>,
    timeout: Option<Duration>,
    follow_redirects: bool,
}

impl Default for Request {
    #[inline]
    fn default() -> Self {
        Self {
            method: Method::GET,
            url: Default::default(),
            headers: Default::default(),
            body: Default::default(),
            timeout: None,
            follow_redirects: true,
        }
    }
}

impl Request {
    /// 创建 HTTP 请求构建器
    #[inline]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// 请求 HTTP 方法
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// 请求 URL
    #[inline]
    pub fn url(&self) -> &Uri {
        &self.url
    }

    /// 请求 HTTP Headers
    ///
    /// 同名 Header 可以出现多次，按照添加顺序排列
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 获取请求 HTTP Header
    #[inline]
    pub fn header(&self, header_name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(header_name.as_ref())
    }

    /// 请求体
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 单次请求的超时时长
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// 是否自动跟随重定向
    #[inline]
    pub fn follow_redirects(&self) -> bool {
        self.follow_redirects
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

/// HTTP 请求构建器
#[derive(Debug, Default)]
pub struct RequestBuilder {
    inner: Request,
}

impl RequestBuilder {
    /// 设置请求 HTTP 方法
    #[inline]
    pub fn method(&mut self, method: Method) -> &mut Self {
        self.inner.method = method;
        self
    }

    /// 设置请求 URL
    #[inline]
    pub fn url(&mut self, url: Uri) -> &mut Self {
        self.inner.url = url;
        self
    }

    /// 设置请求 HTTP Headers
    #[inline]
    pub fn headers(&mut self, headers: HeaderMap) -> &mut Self {
        self.inner.headers = headers;
        self
    }

    /// 追加请求 HTTP Header，不会覆盖已有的同名 Header
    #[inline]
    pub fn append_header(&mut self, header_name: impl IntoHeaderName, header_value: impl Into<HeaderValue>) -> &mut Self {
        self.inner.headers.append(header_name, header_value.into());
        self
    }

    /// 设置请求体
    #[inline]
    pub fn body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.inner.body = body.into();
        self
    }

    /// 设置单次请求的超时时长
    #[inline]
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.inner.timeout = Some(timeout);
        self
    }

    /// 设置是否自动跟随重定向
    #[inline]
    pub fn follow_redirects(&mut self, follow_redirects: bool) -> &mut Self {
        self.inner.follow_redirects = follow_redirects;
        self
    }

    /// 构建 HTTP 请求
    #[inline]
    pub fn build(&mut self) -> Request {
        take(&mut self.inner)
    }
}
