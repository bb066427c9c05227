use fetchkit_http::{HeaderName, HeaderValue};
use std::{mem::take, time::Duration};

/// 请求体
#[derive(Debug, Clone, Default)]
pub struct RequestBody {
    content: Vec<u8>,
    content_type: Option<HeaderValue>,
}

impl RequestBody {
    /// 创建请求体
    #[inline]
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            content_type: None,
        }
    }

    /// 创建带有 Content-Type 的请求体
    #[inline]
    pub fn with_content_type(content: impl Into<Vec<u8>>, content_type: HeaderValue) -> Self {
        Self {
            content: content.into(),
            content_type: Some(content_type),
        }
    }

    /// 请求体内容
    #[inline]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// 请求体的 Content-Type
    #[inline]
    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.content_type.as_ref()
    }
}

/// 请求方法
///
/// 只有 POST 请求携带请求体
#[derive(Debug, Clone)]
pub enum RequestMethod {
    /// GET 请求
    Get,

    /// POST 请求
    Post(RequestBody),
}

impl Default for RequestMethod {
    #[inline]
    fn default() -> Self {
        Self::Get
    }
}

/// 请求描述
///
/// 构建后不可修改。默认为 GET 请求，没有自定义 Header，跟随重定向，启用条件请求
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: RequestMethod,
    headers: Vec<(HeaderName, HeaderValue)>,
    timeout: Option<Duration>,
    follow_redirects: bool,
    conditional_get: bool,
}

impl Default for RequestDescriptor {
    #[inline]
    fn default() -> Self {
        Self {
            method: Default::default(),
            headers: Default::default(),
            timeout: None,
            follow_redirects: true,
            conditional_get: true,
        }
    }
}

impl RequestDescriptor {
    /// 创建请求描述构建器
    #[inline]
    pub fn builder() -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::default()
    }

    /// 请求方法
    #[inline]
    pub fn method(&self) -> &RequestMethod {
        &self.method
    }

    /// 是否是 GET 请求
    #[inline]
    pub fn is_get(&self) -> bool {
        matches!(self.method, RequestMethod::Get)
    }

    /// 自定义 Header，按照添加顺序排列，同名 Header 可以出现多次
    #[inline]
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    /// 单次请求的超时时长
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// 是否跟随重定向
    #[inline]
    pub fn follow_redirects(&self) -> bool {
        self.follow_redirects
    }

    /// 是否启用条件请求
    #[inline]
    pub fn conditional_get(&self) -> bool {
        self.conditional_get
    }
}

/// 请求描述构建器
#[derive(Debug, Default)]
pub struct RequestDescriptorBuilder {
    inner: RequestDescriptor,
}

impl RequestDescriptorBuilder {
    /// 设置为 GET 请求
    #[inline]
    pub fn get(&mut self) -> &mut Self {
        self.inner.method = RequestMethod::Get;
        self
    }

    /// 设置为 POST 请求
    #[inline]
    pub fn post(&mut self, body: RequestBody) -> &mut Self {
        self.inner.method = RequestMethod::Post(body);
        self
    }

    /// 追加自定义 Header
    #[inline]
    pub fn header(&mut self, header_name: HeaderName, header_value: HeaderValue) -> &mut Self {
        self.inner.headers.push((header_name, header_value));
        self
    }

    /// 设置单次请求的超时时长
    #[inline]
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.inner.timeout = Some(timeout);
        self
    }

    /// 设置是否跟随重定向
    #[inline]
    pub fn follow_redirects(&mut self, follow_redirects: bool) -> &mut Self {
        self.inner.follow_redirects = follow_redirects;
        self
    }

    /// 设置是否启用条件请求
    #[inline]
    pub fn conditional_get(&mut self, conditional_get: bool) -> &mut Self {
        self.inner.conditional_get = conditional_get;
        self
    }

    /// 构建请求描述
    #[inline]
    pub fn build(&mut self) -> RequestDescriptor {
        take(&mut self.inner)
    }
}
