use super::{
    cancellation::NeverCancelled, progress::NoProgress, CancellationToken, ProgressReader, ProgressSink,
    RequestDescriptor, RequestTransportError, ResponseHandle, Result, Streamer, WrongStatusError,
};
use fetchkit_http::StatusCode;
use log::{debug, warn};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::io::{copy as io_copy, BufReader, Read, Write};

static DEFAULT_DESCRIPTOR: Lazy<RequestDescriptor> = Lazy::new(RequestDescriptor::default);

/// 高级请求构建器
///
/// 由 [`Streamer::fetch`] 创建。所有读取方法共享同一套状态码策略：
///
/// - 200：读取响应体，读取失败时删除该 URL 的 Last-Modified 缓存
/// - 304：返回 `None`（[`Fetch::download_to`] 除外，下载不使用条件请求）
/// - 其他状态码：返回 [`WrongStatusError`]，开启 `any_code` 时尽力附带响应体
///
/// 无论结果如何，响应句柄都只会被释放一次
#[derive(Debug)]
#[must_use]
pub struct Fetch<'a> {
    streamer: &'a Streamer,
    url: String,
    descriptor: &'a RequestDescriptor,
    progress: &'a dyn ProgressSink,
    cancellation: &'a dyn CancellationToken,
    any_code: bool,
}

impl<'a> Fetch<'a> {
    pub(crate) fn new(streamer: &'a Streamer, url: String) -> Self {
        Self {
            streamer,
            url,
            descriptor: &DEFAULT_DESCRIPTOR,
            progress: &NoProgress,
            cancellation: &NeverCancelled,
            any_code: false,
        }
    }

    /// 设置请求描述，默认为无自定义 Header 的 GET 请求
    #[inline]
    pub fn descriptor(mut self, descriptor: &'a RequestDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// 设置进度接收器
    #[inline]
    pub fn progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// 设置取消令牌
    #[inline]
    pub fn cancellation(mut self, cancellation: &'a dyn CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// 状态码错误时是否保存响应体
    #[inline]
    pub fn any_code(mut self, any_code: bool) -> Self {
        self.any_code = any_code;
        self
    }

    /// 发送请求，直接返回响应句柄，不应用状态码策略
    #[inline]
    pub fn send(self) -> Result<ResponseHandle<'a>> {
        self.streamer
            .execute(&self.url, self.descriptor, self.progress, self.cancellation)
    }

    /// 读取响应体为二进制数据，304 时返回 `None`
    pub fn bytes(self) -> Result<Option<Vec<u8>>> {
        self.consume(true, |body| {
            let mut buf = Vec::new();
            body.read_to_end(&mut buf)?;
            Ok(buf)
        })
    }

    /// 读取响应体为文本，非法的 UTF-8 字符会被替换，304 时返回 `None`
    pub fn text(self) -> Result<Option<String>> {
        Ok(self.bytes()?.map(|bytes| {
            String::from_utf8(bytes).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
        }))
    }

    /// 解析响应体为 JSON 对象，304 时返回 `None`
    #[inline]
    pub fn json_object(self) -> Result<Option<Map<String, Value>>> {
        self.json()
    }

    /// 解析响应体为 JSON 数组，304 时返回 `None`
    #[inline]
    pub fn json_array(self) -> Result<Option<Vec<Value>>> {
        self.json()
    }

    /// 解析响应体为指定类型，304 时返回 `None`
    pub fn json<T: DeserializeOwned>(self) -> Result<Option<T>> {
        self.consume(true, |body| Ok(serde_json::from_reader(BufReader::new(body))?))
    }

    /// 将响应体写入 `writer`，返回写入的字节数
    ///
    /// 下载不发送条件请求，304 被视为状态码错误
    pub fn download_to<W: Write + ?Sized>(self, writer: &mut W) -> Result<u64> {
        self.consume(false, |body| Ok(io_copy(body, writer)?))
            .map(|copied| copied.unwrap_or_default())
    }

    fn consume<T>(
        self,
        conditional_get: bool,
        read: impl FnOnce(&mut ProgressReader<'a>) -> Result<T>,
    ) -> Result<Option<T>> {
        let mut handle = self.streamer.execute_request(
            &self.url,
            self.descriptor,
            conditional_get && self.descriptor.conditional_get(),
            self.progress,
            self.cancellation,
        )?;
        let result = self.handle_response(&mut handle, conditional_get, read);
        if result.is_err() {
            self.streamer.remove_from_modified_cache(&self.url);
        }
        handle.release();
        result
    }

    fn handle_response<T>(
        &self,
        handle: &mut ResponseHandle<'a>,
        allow_not_modified: bool,
        read: impl FnOnce(&mut ProgressReader<'a>) -> Result<T>,
    ) -> Result<Option<T>> {
        if handle.status_code() == StatusCode::OK {
            let body = handle
                .body_mut()
                .ok_or_else(|| RequestTransportError::missing_body(&self.url))?;
            read(body).map(Some)
        } else if allow_not_modified && handle.not_modified() {
            debug!("{} is not modified", self.url);
            Ok(None)
        } else {
            let body = if self.any_code {
                self.capture_body(handle)
            } else {
                None
            };
            Err(WrongStatusError::new(&self.url, handle.status_code(), handle.status_line(), body).into())
        }
    }

    fn capture_body(&self, handle: &mut ResponseHandle<'a>) -> Option<Vec<u8>> {
        let limit = self.streamer.config().body_sample_limit().unwrap_or(u64::MAX);
        let body = handle.body_mut()?;
        let mut sample = Vec::new();
        match body.take(limit).read_to_end(&mut sample) {
            Ok(_) => Some(sample),
            Err(err) => {
                warn!("failed to capture response body of {}: {}", self.url, err);
                None
            }
        }
    }
}
