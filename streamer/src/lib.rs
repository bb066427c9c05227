#![deny(
    missing_debug_implementations,
    anonymous_parameters,
    keyword_idents,
    macro_use_extern_crate,
    missing_docs,
    non_ascii_idents,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]

//! # fetchkit-streamer
//!
//! ## 阻塞式 HTTP 请求与流式读取引擎
//!
//! 在不稳定的网络环境下获取网页，JSON 数据和文件：
//!
//! - 根据 [`RequestDescriptor`] 构建 HTTP 请求，对连接被重置这类临时性传输错误做有限次数的重试
//! - 基于 Last-Modified / If-Modified-Since 的条件请求，令牌按 URL 保存在共享的 [`ModifiedCache`] 中
//! - 响应体通过 [`ProgressReader`] 流式读取，支持进度通知和取消
//! - 每个获取到的网络连接都只会被释放一次
//!
//! 具体的 HTTP 传输由 [`fetchkit_http::HttpCaller`] 的实现者负责，
//! 默认启用的 `ureq` 功能提供基于 Ureq 的实现。
//!
//! ### 示例
//!
//! ```no_run
//! use fetchkit_streamer::{CancelFlag, ModifiedCache, ProgressCounter, Streamer};
//! use std::sync::Arc;
//!
//! # fn example() -> fetchkit_streamer::Result<()> {
//! let cache = Arc::new(ModifiedCache::new());
//! let streamer = Streamer::new(fetchkit_ureq::Client::default(), cache);
//! let progress = ProgressCounter::new();
//! let cancel = CancelFlag::new();
//! match streamer
//!     .fetch("https://example.com/feed.json")
//!     .progress(&progress)
//!     .cancellation(&cancel)
//!     .json_object()?
//! {
//!     Some(object) => println!("{} keys", object.len()),
//!     None => println!("not modified"),
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod cancellation;
mod config;
mod descriptor;
mod error;
mod executor;
mod fetch;
mod progress;
mod response;
mod retry;
mod stream;

#[cfg(test)]
mod test_utils;

pub use cache::ModifiedCache;
pub use cancellation::{CancelFlag, CancellationToken};
pub use config::{ConfigError, StreamerConfig, StreamerConfigBuilder};
pub use descriptor::{RequestBody, RequestDescriptor, RequestDescriptorBuilder, RequestMethod};
pub use error::{Error, RequestBuildError, RequestTransportError, Result, TransportErrorKind, WrongStatusError};
pub use executor::Streamer;
pub use fetch::Fetch;
pub use progress::{ProgressCounter, ProgressSink};
pub use response::ResponseHandle;
pub use retry::{DefaultRetryClassifier, NeverRetryClassifier, RetryClassifier, RetryDecision};
pub use stream::{InterruptedStreamError, ProgressReader};

pub use fetchkit_http as http;

#[cfg(feature = "ureq")]
pub use fetchkit_ureq as ureq;
