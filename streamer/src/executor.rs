use super::{
    CancellationToken, Error, Fetch, ModifiedCache, ProgressReader, ProgressSink, RequestBuildError, RequestDescriptor,
    RequestMethod, RequestTransportError, ResponseHandle, Result, RetryDecision, StreamerConfig,
};
use fetchkit_http::{
    header::{CONTENT_TYPE, IF_MODIFIED_SINCE, LAST_MODIFIED, LOCATION},
    HeaderValue, HttpCaller, Method, Request, Response, StatusCode, Uri,
};
use log::{debug, info, warn};
use std::{mem::take, sync::Arc};

/// 请求执行器
///
/// 持有 HTTP 调用器，共享的 Last-Modified 缓存和配置，克隆后共享同一个缓存
#[derive(Debug, Clone)]
pub struct Streamer {
    caller: Arc<dyn HttpCaller>,
    modified_cache: Arc<ModifiedCache>,
    config: StreamerConfig,
}

impl Streamer {
    /// 使用默认配置创建请求执行器
    #[inline]
    pub fn new(caller: impl HttpCaller + 'static, modified_cache: Arc<ModifiedCache>) -> Self {
        Self::with_config(caller, modified_cache, Default::default())
    }

    /// 使用指定配置创建请求执行器
    #[inline]
    pub fn with_config(
        caller: impl HttpCaller + 'static,
        modified_cache: Arc<ModifiedCache>,
        config: StreamerConfig,
    ) -> Self {
        Self {
            caller: Arc::new(caller),
            modified_cache,
            config,
        }
    }

    /// 获取 Last-Modified 缓存
    #[inline]
    pub fn modified_cache(&self) -> &Arc<ModifiedCache> {
        &self.modified_cache
    }

    /// 获取配置
    #[inline]
    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    /// 删除 URL 对应的 Last-Modified 缓存
    ///
    /// 自行读取 [`ResponseHandle`] 响应体失败时，应当调用该方法
    pub fn remove_from_modified_cache(&self, url: &str) -> Option<HeaderValue> {
        let removed = self.modified_cache.remove(url);
        if removed.is_some() {
            warn!("invalidated last-modified token of {}", url);
        }
        removed
    }

    /// 创建高级请求构建器
    #[inline]
    pub fn fetch(&self, url: impl Into<String>) -> Fetch<'_> {
        Fetch::new(self, url.into())
    }

    /// 执行 HTTP 请求，返回响应句柄
    ///
    /// 传输层错误中，只有被 [`crate::RetryClassifier`] 判定为可以重试的错误才会重试，
    /// 最多发送 [`StreamerConfig::max_attempts`] 次请求。
    /// 每次发送前和请求成功返回后都会检查取消令牌。
    ///
    /// 200 响应中的 Last-Modified 会在响应句柄构建完成后写入缓存
    pub fn execute<'a>(
        &self,
        url: &str,
        descriptor: &RequestDescriptor,
        progress: &'a dyn ProgressSink,
        cancellation: &'a dyn CancellationToken,
    ) -> Result<ResponseHandle<'a>> {
        self.execute_request(url, descriptor, descriptor.conditional_get(), progress, cancellation)
    }

    pub(crate) fn execute_request<'a>(
        &self,
        url: &str,
        descriptor: &RequestDescriptor,
        conditional_get: bool,
        progress: &'a dyn ProgressSink,
        cancellation: &'a dyn CancellationToken,
    ) -> Result<ResponseHandle<'a>> {
        let request = self.build_request(url, descriptor, conditional_get)?;
        let (mut response, attempts) = self.call_with_retry(url, &request, cancellation)?;
        if cancellation.is_cancelled() {
            drop(response);
            return Err(RequestTransportError::cancelled(url, attempts).into());
        }

        let status_code = response.status_code();
        let status_reason = response
            .reason()
            .or_else(|| status_code.canonical_reason())
            .unwrap_or_default()
            .to_owned();
        let token = if status_code == StatusCode::OK {
            response.header(LAST_MODIFIED).cloned()
        } else {
            None
        };
        let location = response.header(LOCATION).cloned();
        let headers = take(response.headers_mut());
        let body = response.take_body().map(|body| {
            if let Some(content_length) = body.content_length() {
                progress.set_maximum(content_length);
            }
            ProgressReader::new(body, progress, cancellation)
        });
        let handle = ResponseHandle::new(url.to_owned(), status_code, status_reason, headers, location, body);

        if let Some(token) = token {
            info!("store last-modified token of {}: {:?}", url, token);
            self.modified_cache.put(url, token);
        }
        Ok(handle)
    }

    fn build_request(&self, url: &str, descriptor: &RequestDescriptor, conditional_get: bool) -> Result<Request> {
        let uri: Uri = url.parse().map_err(|err| RequestBuildError::new(url, err))?;
        if uri.scheme().is_none() || uri.host().is_none() {
            return Err(RequestBuildError::new(url, anyhow::anyhow!("url must be absolute")).into());
        }

        let mut builder = Request::builder();
        builder
            .url(uri)
            .timeout(descriptor.timeout().unwrap_or_else(|| self.config.default_timeout()))
            .follow_redirects(descriptor.follow_redirects());
        match descriptor.method() {
            RequestMethod::Get => {
                builder.method(Method::GET);
            }
            RequestMethod::Post(body) => {
                builder.method(Method::POST).body(body.content());
                if let Some(content_type) = body.content_type() {
                    builder.append_header(CONTENT_TYPE, content_type.to_owned());
                }
            }
        }
        for (header_name, header_value) in descriptor.headers() {
            builder.append_header(header_name.to_owned(), header_value.to_owned());
        }
        if conditional_get && descriptor.is_get() {
            if let Some(token) = self.modified_cache.lookup(url) {
                builder.append_header(IF_MODIFIED_SINCE, token);
            }
        }
        Ok(builder.build())
    }

    fn call_with_retry(
        &self,
        url: &str,
        request: &Request,
        cancellation: &dyn CancellationToken,
    ) -> Result<(Response, usize)> {
        let max_attempts = self.config.max_attempts();
        let mut attempts = 0;
        loop {
            if cancellation.is_cancelled() {
                return Err(RequestTransportError::cancelled(url, attempts).into());
            }
            attempts += 1;
            debug!("dispatch {} {} (attempt {}/{})", request.method(), url, attempts, max_attempts);
            match self.caller.call(request) {
                Ok(response) => return Ok((response, attempts)),
                Err(err) => {
                    warn!("request to {} failed on attempt {}/{}: {}", url, attempts, max_attempts, err);
                    if attempts < max_attempts
                        && self.config.retry_classifier().classify(&err) == RetryDecision::RetryRequest
                    {
                        info!("retry request to {}", url);
                        continue;
                    }
                    return Err(Error::RequestTransport(RequestTransportError::call_failed(url, attempts, err)));
                }
            }
        }
    }
}

#[cfg(feature = "ureq")]
impl Default for Streamer {
    /// 使用 Ureq 客户端和独立的 Last-Modified 缓存创建请求执行器
    #[inline]
    fn default() -> Self {
        Self::new(fetchkit_ureq::Client::default(), Default::default())
    }
}
