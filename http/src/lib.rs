#![deny(
    missing_debug_implementations,
    missing_docs,
    anonymous_parameters,
    keyword_idents,
    macro_use_extern_crate,
    non_ascii_idents,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]

//! # fetchkit-http
//!
//! ## HTTP 传输接口
//!
//! 为 `fetchkit-streamer` 提供与具体 HTTP 客户端无关的传输层抽象，
//! 包括传输层请求，传输层响应，传输层错误，以及 [`HttpCaller`] 接口。
//!
//! 连接池，TLS，DNS 解析等细节全部由 [`HttpCaller`] 的实现者负责，
//! 本库只描述一次阻塞的 HTTP 调用所需的数据。

mod error;
mod request;
mod response;

pub use error::{Error as ResponseError, ErrorBuilder as ResponseErrorBuilder, ErrorKind as ResponseErrorKind};
pub use http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    method::Method,
    status::StatusCode,
    uri::Uri,
};
pub use request::{Request, RequestBuilder};
pub use response::{parse_content_length, Response, ResponseBody, ResponseBuilder, Result as ResponseResult};

use auto_impl::auto_impl;
use std::fmt::Debug;

/// HTTP 请求处理接口
///
/// 实现该接口，即可处理所有 FetchKit 发出的 HTTP 请求。
///
/// 对于 4xx / 5xx 这样的状态码，实现者应当返回 [`Response`] 而不是 [`ResponseError`]，
/// 状态码的处理策略由调用方决定。
#[auto_impl(&, Box, Arc)]
pub trait HttpCaller: Debug + Send + Sync {
    /// 阻塞发送 HTTP 请求
    fn call(&self, request: &Request) -> ResponseResult;
}
