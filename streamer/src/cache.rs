use assert_impl::assert_impl;
use fetchkit_http::HeaderValue;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Last-Modified 缓存
///
/// 以请求 URL 为键（不做任何规范化），记录服务器最近一次 200 响应中返回的 Last-Modified 值，
/// 用于后续同一 URL 的条件请求。
///
/// 所有操作都由同一把互斥锁保护，锁只在单次读写期间持有，不会跨越网络 IO。
/// 没有淘汰策略，条目在缓存存活期间一直保留。
///
/// 通常在进程启动时创建一个实例，通过 [`std::sync::Arc`] 注入到各个 [`crate::Streamer`] 中共享
#[derive(Debug, Default)]
pub struct ModifiedCache {
    entries: Mutex<HashMap<String, HeaderValue>>,
}

impl ModifiedCache {
    /// 创建空的 Last-Modified 缓存
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 查询 URL 对应的 Last-Modified 值
    pub fn lookup(&self, url: &str) -> Option<HeaderValue> {
        self.lock().get(url).cloned()
    }

    /// 删除 URL 对应的 Last-Modified 值，返回之前的值
    pub fn remove(&self, url: &str) -> Option<HeaderValue> {
        self.lock().remove(url)
    }

    /// 写入 URL 对应的 Last-Modified 值，返回被覆盖的值
    pub fn put(&self, url: impl Into<String>, token: HeaderValue) -> Option<HeaderValue> {
        self.lock().insert(url.into(), token)
    }

    /// 缓存条目数量
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// 缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // 持锁期间不会 panic，锁中毒时继续使用内部数据
    fn lock(&self) -> MutexGuard<'_, HashMap<String, HeaderValue>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}
