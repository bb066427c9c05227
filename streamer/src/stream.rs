use super::{CancellationToken, ProgressSink};
use fetchkit_http::ResponseBody;
use std::{
    fmt::{self, Debug},
    io::{Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult},
};
use thiserror::Error;

/// 读取响应体时被取消
///
/// 通过 [`std::io::Error`] 传递，错误类型为 [`std::io::ErrorKind::Other`]，
/// 可以用 [`InterruptedStreamError::is_interrupted`] 从 IO 错误中识别出来
#[derive(Error, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[error("response stream was interrupted by cancellation")]
pub struct InterruptedStreamError;

impl InterruptedStreamError {
    /// 判断 IO 错误是否由取消导致
    pub fn is_interrupted(err: &IoError) -> bool {
        err.get_ref().map_or(false, |inner| inner.is::<Self>())
    }
}

impl From<InterruptedStreamError> for IoError {
    #[inline]
    fn from(err: InterruptedStreamError) -> Self {
        IoError::new(IoErrorKind::Other, err)
    }
}

/// 带有进度和取消功能的响应体
///
/// 每次读取前检查取消令牌，每次读取到数据后向进度接收器报告读取的字节数。
/// 自身不做任何缓冲
pub struct ProgressReader<'a> {
    inner: ResponseBody,
    progress: &'a dyn ProgressSink,
    cancellation: &'a dyn CancellationToken,
}

impl<'a> ProgressReader<'a> {
    pub(crate) fn new(
        inner: ResponseBody,
        progress: &'a dyn ProgressSink,
        cancellation: &'a dyn CancellationToken,
    ) -> Self {
        Self {
            inner,
            progress,
            cancellation,
        }
    }

    /// 服务器声明的响应体长度
    #[inline]
    pub fn content_length(&self) -> Option<u64> {
        self.inner.content_length()
    }
}

impl Read for ProgressReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        if self.cancellation.is_cancelled() {
            return Err(InterruptedStreamError.into());
        }
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.progress.advance(n as u64);
        }
        Ok(n)
    }
}

impl Debug for ProgressReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReader")
            .field("inner", &self.inner)
            .field("progress", &self.progress)
            .field("cancellation", &self.cancellation)
            .finish()
    }
}
