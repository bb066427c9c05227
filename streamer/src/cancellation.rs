use auto_impl::auto_impl;
use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering::Relaxed},
        Arc,
    },
};

/// 取消令牌
///
/// 由调用方提供，仅支持轮询。会在以下时机被检查：
///
/// - 每次发送 HTTP 请求之前
/// - HTTP 请求成功返回之后，解析响应之前
/// - 每次读取响应体之前
#[auto_impl(&, Box, Arc)]
pub trait CancellationToken: Debug + Send + Sync {
    /// 当前操作是否已经被取消
    fn is_cancelled(&self) -> bool;
}

/// 基于原子变量的取消标记
///
/// 克隆后的实例共享同一个标记，可以在其他线程中调用 [`CancelFlag::cancel`] 取消正在进行的请求
#[derive(Debug, Default, Clone)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// 创建未取消的标记
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 取消
    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Relaxed);
    }
}

impl CancellationToken for CancelFlag {
    #[inline]
    fn is_cancelled(&self) -> bool {
        self.0.load(Relaxed)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NeverCancelled;

impl CancellationToken for NeverCancelled {
    #[inline]
    fn is_cancelled(&self) -> bool {
        false
    }
}
