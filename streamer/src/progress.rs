use auto_impl::auto_impl;
use once_cell::sync::OnceCell;
use std::{
    fmt::Debug,
    sync::atomic::{AtomicU64, Ordering::Relaxed},
};

/// 下载进度接收器
///
/// 每次请求最多收到一次 [`ProgressSink::set_maximum`]（仅在服务器声明了响应体长度时），
/// 之后每读取到一块响应体数据，都会收到一次 [`ProgressSink::advance`]
#[auto_impl(&, Box, Arc)]
pub trait ProgressSink: Debug + Send + Sync {
    /// 设置进度最大值，即响应体的总长度
    fn set_maximum(&self, maximum: u64);

    /// 增加已读取的字节数
    fn advance(&self, bytes: u64);
}

/// 简单的进度计数器
#[derive(Debug, Default)]
pub struct ProgressCounter {
    maximum: OnceCell<u64>,
    transferred: AtomicU64,
}

impl ProgressCounter {
    /// 创建进度计数器
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 进度最大值
    #[inline]
    pub fn maximum(&self) -> Option<u64> {
        self.maximum.get().copied()
    }

    /// 已读取的字节数
    #[inline]
    pub fn transferred(&self) -> u64 {
        self.transferred.load(Relaxed)
    }
}

impl ProgressSink for ProgressCounter {
    #[inline]
    fn set_maximum(&self, maximum: u64) {
        self.maximum.set(maximum).ok();
    }

    #[inline]
    fn advance(&self, bytes: u64) {
        self.transferred.fetch_add(bytes, Relaxed);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NoProgress;

impl ProgressSink for NoProgress {
    #[inline]
    fn set_maximum(&self, _maximum: u64) {}

    #[inline]
    fn advance(&self, _bytes: u64) {}
}
