use auto_impl::auto_impl;
use fetchkit_http::{ResponseError, ResponseErrorKind};
use std::{fmt::Debug, io::ErrorKind as IoErrorKind};

/// 重试决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RetryDecision {
    /// 重新发送请求
    RetryRequest,

    /// 不再重试，直接返回错误
    DontRetry,
}

/// 传输错误分类器
///
/// 判断一次传输层错误是否值得立即重试。重试次数由 [`crate::StreamerConfig`] 控制，分类器只负责分类
#[auto_impl(&, Box, Arc)]
pub trait RetryClassifier: Debug + Send + Sync {
    /// 对传输层错误分类
    fn classify(&self, error: &ResponseError) -> RetryDecision;
}

const TRANSIENT_MESSAGES: &[&str] = &["Connection reset by peer", "I/O error during system call, Broken pipe"];

/// 默认的传输错误分类器
///
/// 只重试连接已经失效的错误：连接被对端重置，或写入时管道破裂。
/// 优先根据错误链中的 [`std::io::ErrorKind`] 判断，
/// 传输层没有提供 IO 错误时，再根据错误信息中的关键字判断
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetryClassifier;

impl RetryClassifier for DefaultRetryClassifier {
    fn classify(&self, error: &ResponseError) -> RetryDecision {
        if error.kind() == ResponseErrorKind::UserCanceled {
            return RetryDecision::DontRetry;
        }
        match error.io_error_kind() {
            Some(IoErrorKind::ConnectionReset) | Some(IoErrorKind::BrokenPipe) => RetryDecision::RetryRequest,
            _ if has_transient_message(error) => RetryDecision::RetryRequest,
            _ => RetryDecision::DontRetry,
        }
    }
}

fn has_transient_message(error: &ResponseError) -> bool {
    error.chain().any(|cause| {
        let message = cause.to_string();
        TRANSIENT_MESSAGES.iter().any(|transient| message.contains(transient))
    })
}

/// 从不重试的分类器
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetryClassifier;

impl RetryClassifier for NeverRetryClassifier {
    #[inline]
    fn classify(&self, _error: &ResponseError) -> RetryDecision {
        RetryDecision::DontRetry
    }
}
