use anyhow::Error as AnyError;
use fetchkit_http::{
    parse_content_length, HeaderMap, HeaderName, HeaderValue, HttpCaller, Method, Request,
    Response, ResponseBody, ResponseError, ResponseErrorKind, ResponseResult, StatusCode,
};
use dashmap::DashMap;
use log::debug;
use std::{
    collections::HashMap,
    fmt::Display,
    io::{Error as IoError, ErrorKind as IoErrorKind},
    sync::Arc,
    time::Duration,
};
use ureq::{Agent, AgentBuilder, Error as UreqError, ErrorKind as UreqErrorKind, Request as UreqRequest, Response as UreqResponse};

const DEFAULT_USER_AGENT: &str = concat!("fetchkit-ureq/", env!("CARGO_PKG_VERSION"));
const DEFAULT_MAX_REDIRECTS: u32 = 5;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ureq 客户端
///
/// 内部持有两个 [`Agent`]，一个自动跟随重定向，另一个不跟随，
/// 根据 [`Request::follow_redirects`] 选择。
///
/// 请求设置了超时时长时，该时长被用作连接超时和每次读写的超时，而不是整个请求的期限，
/// 对应的 [`Agent`] 按超时时长缓存
#[derive(Debug, Clone)]
pub struct Client {
    builder: ClientBuilder,
    redirecting: Agent,
    non_redirecting: Agent,
    timed_agents: Arc<DashMap<(Duration, bool), Agent>>,
}

impl Client {
    /// 创建 Ureq 客户端构建器
    #[inline]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    fn agent_for(&self, request: &Request) -> Agent {
        let follow_redirects = request.follow_redirects();
        match request.timeout() {
            Some(timeout) => self
                .timed_agents
                .entry((timeout, follow_redirects))
                .or_insert_with(|| self.builder.make_agent(follow_redirects, Some(timeout)))
                .value()
                .to_owned(),
            None if follow_redirects => self.redirecting.to_owned(),
            None => self.non_redirecting.to_owned(),
        }
    }
}

impl Default for Client {
    #[inline]
    fn default() -> Self {
        ClientBuilder::default().build()
    }
}

/// Ureq 客户端构建器
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    user_agent: String,
    connect_timeout: Duration,
    max_redirects: u32,
}

impl Default for ClientBuilder {
    #[inline]
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl ClientBuilder {
    /// 设置默认的 User-Agent
    ///
    /// 请求中自带 User-Agent 时，以请求中的为准
    #[inline]
    pub fn user_agent(&mut self, user_agent: impl Into<String>) -> &mut Self {
        self.user_agent = user_agent.into();
        self
    }

    /// 设置连接超时时长
    #[inline]
    pub fn connect_timeout(&mut self, connect_timeout: Duration) -> &mut Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// 设置自动跟随重定向的最大次数
    #[inline]
    pub fn max_redirects(&mut self, max_redirects: u32) -> &mut Self {
        self.max_redirects = max_redirects;
        self
    }

    /// 构建 Ureq 客户端
    pub fn build(&self) -> Client {
        Client {
            builder: self.to_owned(),
            redirecting: self.make_agent(true, None),
            non_redirecting: self.make_agent(false, None),
            timed_agents: Default::default(),
        }
    }

    fn make_agent(&self, follow_redirects: bool, timeout: Option<Duration>) -> Agent {
        let mut builder = AgentBuilder::new()
            .user_agent(&self.user_agent)
            .timeout_connect(timeout.unwrap_or(self.connect_timeout))
            .redirects(if follow_redirects { self.max_redirects } else { 0 });
        if let Some(timeout) = timeout {
            builder = builder.timeout_read(timeout).timeout_write(timeout);
        }
        builder.build()
    }
}

impl HttpCaller for Client {
    fn call(&self, request: &Request) -> ResponseResult {
        let ureq_request = make_ureq_request(&self.agent_for(request), request)?;
        debug!("ureq: {} {}", request.method(), request.url());
        let result = if request.body().is_empty() {
            ureq_request.call()
        } else {
            ureq_request.send_bytes(request.body())
        };
        match result {
            Ok(response) => make_response(response, request),
            Err(err) => {
                let kind = err.kind();
                match err {
                    UreqError::Status(_, response) => make_response(response, request),
                    UreqError::Transport(transport) => Err(from_ureq_error(kind, AnyError::new(transport), request)),
                }
            }
        }
    }
}

fn make_ureq_request(agent: &Agent, request: &Request) -> Result<UreqRequest, ResponseError> {
    let mut request_builder = agent.request(request.method().as_str(), &request.url().to_string());
    for header_name in request.headers().keys() {
        request_builder = set_header_for_request_builder(request_builder, request, header_name)?;
    }
    Ok(request_builder)
}

fn set_header_for_request_builder(
    request_builder: UreqRequest,
    request: &Request,
    header_name: &HeaderName,
) -> Result<UreqRequest, ResponseError> {
    let mut values = Vec::new();
    for header_value in request.headers().get_all(header_name) {
        values.push(
            header_value
                .to_str()
                .map_err(|err| convert_header_value_error(request, header_value, &err))?,
        );
    }
    Ok(request_builder.set(header_name.as_str(), &values.join(", ")))
}

fn make_response(response: UreqResponse, request: &Request) -> ResponseResult {
    let status_code = StatusCode::from_u16(response.status())
        .map_err(|err| build_status_code_error(request, response.status(), &err))?;
    let mut headers = HeaderMap::new();
    let mut occurrences = HashMap::<String, usize>::new();
    for header_name_str in response.headers_names() {
        let header_name = HeaderName::from_bytes(header_name_str.as_bytes())
            .map_err(|err| build_header_name_error(request, &header_name_str, &err))?;
        // headers_names 每行返回一次，按出现次数取对应的值以保持原始顺序
        let occurrence = occurrences.entry(header_name_str.to_owned()).or_default();
        if let Some(header_value_str) = response.all(&header_name_str).get(*occurrence) {
            let header_value = HeaderValue::from_bytes(header_value_str.as_bytes())
                .map_err(|err| build_header_value_error(request, header_value_str, &err))?;
            headers.append(header_name, header_value);
        }
        *occurrence += 1;
    }

    let mut response_builder = Response::builder();
    response_builder.status_code(status_code);
    if !response.status_text().is_empty() {
        response_builder.reason(response.status_text());
    }
    if has_body(request.method(), status_code) {
        let content_length = parse_content_length(&headers);
        response_builder.body(ResponseBody::from_reader(response.into_reader(), content_length));
    }
    Ok(response_builder.headers(headers).build())
}

fn has_body(method: &Method, status_code: StatusCode) -> bool {
    *method != Method::HEAD
        && status_code != StatusCode::NO_CONTENT
        && status_code != StatusCode::NOT_MODIFIED
        && !status_code.is_informational()
}

fn build_status_code_error(request: &Request, code: u16, err: &dyn Display) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidRequestResponse,
        format!("invalid status code({}): {}", code, err),
    )
    .url(request.url())
    .build()
}

fn build_header_name_error(request: &Request, header_name: &str, err: &dyn Display) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidHeader,
        format!("invalid header name({}): {}", header_name, err),
    )
    .url(request.url())
    .build()
}

fn build_header_value_error(request: &Request, header_value: &str, err: &dyn Display) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidHeader,
        format!("invalid header value({}): {}", header_value, err),
    )
    .url(request.url())
    .build()
}

fn convert_header_value_error(request: &Request, header_value: &HeaderValue, err: &dyn Display) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidHeader,
        format!("invalid header value({:?}): {}", header_value, err),
    )
    .url(request.url())
    .build()
}

fn from_ureq_error(kind: UreqErrorKind, err: AnyError, request: &Request) -> ResponseError {
    #[allow(unreachable_patterns)]
    let response_error_kind = match kind {
        UreqErrorKind::InvalidUrl => ResponseErrorKind::InvalidUrl,
        UreqErrorKind::UnknownScheme => ResponseErrorKind::InvalidUrl,
        UreqErrorKind::Dns => ResponseErrorKind::UnknownHostError,
        UreqErrorKind::ConnectionFailed => ResponseErrorKind::ConnectError,
        UreqErrorKind::TooManyRedirects => ResponseErrorKind::TooManyRedirect,
        UreqErrorKind::BadStatus => ResponseErrorKind::InvalidRequestResponse,
        UreqErrorKind::BadHeader => ResponseErrorKind::InvalidHeader,
        UreqErrorKind::Io => io_error_kind_of(&err, request),
        UreqErrorKind::InvalidProxyUrl => ResponseErrorKind::ProxyError,
        UreqErrorKind::ProxyConnect => ResponseErrorKind::ProxyError,
        UreqErrorKind::ProxyUnauthorized => ResponseErrorKind::ProxyError,
        UreqErrorKind::HTTP => ResponseErrorKind::InvalidRequestResponse,
        UreqErrorKind::InsecureRequestHttpsOnly => ResponseErrorKind::SslError,
        _ => ResponseErrorKind::UnknownError,
    };
    ResponseError::builder(response_error_kind, err)
        .url(request.url())
        .build()
}

fn io_error_kind_of(err: &AnyError, request: &Request) -> ResponseErrorKind {
    match err
        .chain()
        .find_map(|cause| cause.downcast_ref::<IoError>())
        .map(IoError::kind)
    {
        Some(IoErrorKind::TimedOut) | Some(IoErrorKind::WouldBlock) => ResponseErrorKind::TimeoutError,
        Some(IoErrorKind::InvalidData) if is_https(request) => ResponseErrorKind::SslError,
        Some(IoErrorKind::InvalidData) => ResponseErrorKind::InvalidRequestResponse,
        Some(IoErrorKind::ConnectionRefused) => ResponseErrorKind::ConnectError,
        Some(IoErrorKind::BrokenPipe) => ResponseErrorKind::SendError,
        _ => ResponseErrorKind::ReceiveError,
    }
}

fn is_https(request: &Request) -> bool {
    request.url().scheme_str() == Some("https")
}
