use super::{DefaultRetryClassifier, RetryClassifier};
use std::{fmt::Debug, sync::Arc, time::Duration};
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// 最大尝试次数为 0
    #[error("max attempts must be at least 1")]
    ZeroMaxAttempts,
}

/// 请求执行器配置
#[derive(Debug, Clone)]
pub struct StreamerConfig {
    max_attempts: usize,
    default_timeout: Duration,
    retry_classifier: Arc<dyn RetryClassifier>,
    body_sample_limit: Option<u64>,
}

impl Default for StreamerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_attempts: default::max_attempts(),
            default_timeout: default::default_timeout(),
            retry_classifier: default::retry_classifier(),
            body_sample_limit: None,
        }
    }
}

impl StreamerConfig {
    /// 创建配置构建器
    #[inline]
    pub fn builder() -> StreamerConfigBuilder {
        StreamerConfigBuilder::default()
    }

    /// 单次调用中发送 HTTP 请求的最大次数，包括第一次
    #[inline]
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// 请求描述没有指定超时时长时使用的超时时长
    #[inline]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// 传输错误分类器
    #[inline]
    pub fn retry_classifier(&self) -> &dyn RetryClassifier {
        self.retry_classifier.as_ref()
    }

    /// 状态码错误中保存的响应体的最大长度，`None` 表示不限制
    #[inline]
    pub fn body_sample_limit(&self) -> Option<u64> {
        self.body_sample_limit
    }
}

/// 请求执行器配置构建器
#[derive(Debug, Default)]
pub struct StreamerConfigBuilder {
    inner: StreamerConfig,
}

impl StreamerConfigBuilder {
    /// 设置最大尝试次数
    #[inline]
    pub fn max_attempts(&mut self, max_attempts: usize) -> &mut Self {
        self.inner.max_attempts = max_attempts;
        self
    }

    /// 设置默认超时时长
    #[inline]
    pub fn default_timeout(&mut self, default_timeout: Duration) -> &mut Self {
        self.inner.default_timeout = default_timeout;
        self
    }

    /// 设置传输错误分类器
    #[inline]
    pub fn retry_classifier(&mut self, retry_classifier: impl RetryClassifier + 'static) -> &mut Self {
        self.inner.retry_classifier = Arc::new(retry_classifier);
        self
    }

    /// 设置状态码错误中保存的响应体的最大长度
    #[inline]
    pub fn body_sample_limit(&mut self, body_sample_limit: u64) -> &mut Self {
        self.inner.body_sample_limit = Some(body_sample_limit);
        self
    }

    /// 构建配置
    pub fn build(&mut self) -> Result<StreamerConfig, ConfigError> {
        if self.inner.max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        Ok(self.inner.to_owned())
    }
}

mod default {
    use super::*;

    #[inline]
    pub(super) fn max_attempts() -> usize {
        5
    }

    #[inline]
    pub(super) fn default_timeout() -> Duration {
        Duration::from_secs(30)
    }

    #[inline]
    pub(super) fn retry_classifier() -> Arc<dyn RetryClassifier> {
        Arc::new(DefaultRetryClassifier)
    }
}
