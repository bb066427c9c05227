use fetchkit_http::{
    HeaderName, HeaderValue, HttpCaller, Request, Response, ResponseBody, ResponseError, ResponseErrorKind,
    ResponseResult, StatusCode,
};
use std::{
    collections::VecDeque,
    io::{Cursor, Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult},
    sync::{
        atomic::{AtomicUsize, Ordering::SeqCst},
        Arc, Mutex,
    },
};

/// 统计响应体被丢弃的次数
#[derive(Debug, Default, Clone)]
pub(crate) struct DropCounter(Arc<AtomicUsize>);

impl DropCounter {
    pub(crate) fn count(&self) -> usize {
        self.0.load(SeqCst)
    }
}

/// 被丢弃时计数的响应体，可以模拟读取到一半时连接被重置
#[derive(Debug)]
pub(crate) struct TrackedBody {
    data: Cursor<Vec<u8>>,
    len: u64,
    broken_after: Option<u64>,
    drops: DropCounter,
}

impl TrackedBody {
    pub(crate) fn new(data: Vec<u8>, drops: &DropCounter) -> Self {
        Self {
            len: data.len() as u64,
            data: Cursor::new(data),
            broken_after: None,
            drops: drops.to_owned(),
        }
    }

    pub(crate) fn broken_after(mut self, bytes: u64) -> Self {
        self.broken_after = Some(bytes);
        self
    }

    pub(crate) fn into_response_body(self) -> ResponseBody {
        let len = self.len;
        ResponseBody::from_reader(self, Some(len))
    }
}

impl Read for TrackedBody {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        if let Some(broken_after) = self.broken_after {
            let position = self.data.position();
            if position >= broken_after {
                return Err(IoError::new(IoErrorKind::ConnectionReset, "Connection reset by peer"));
            }
            let allowed = (broken_after - position).min(buf.len() as u64) as usize;
            return self.data.read(&mut buf[..allowed]);
        }
        self.data.read(buf)
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.drops.0.fetch_add(1, SeqCst);
    }
}

/// 预设的一次 HTTP 调用结果
#[derive(Debug)]
pub(crate) enum Step {
    Respond {
        status_code: StatusCode,
        reason: Option<&'static str>,
        headers: Vec<(HeaderName, HeaderValue)>,
        body: Option<TrackedBody>,
    },
    Fail(ResponseError),
}

impl Step {
    pub(crate) fn respond(status_code: u16, body: Option<TrackedBody>) -> Self {
        Self::Respond {
            status_code: StatusCode::from_u16(status_code).unwrap(),
            reason: None,
            headers: Vec::new(),
            body,
        }
    }

    pub(crate) fn header(mut self, name: HeaderName, value: &'static str) -> Self {
        if let Self::Respond { headers, .. } = &mut self {
            headers.push((name, HeaderValue::from_static(value)));
        }
        self
    }

    pub(crate) fn reason(mut self, value: &'static str) -> Self {
        if let Self::Respond { reason, .. } = &mut self {
            *reason = Some(value);
        }
        self
    }

    pub(crate) fn reset() -> Self {
        Self::Fail(
            ResponseError::builder(
                ResponseErrorKind::ReceiveError,
                IoError::new(IoErrorKind::ConnectionReset, "Connection reset by peer"),
            )
            .build(),
        )
    }

    pub(crate) fn fail(kind: ResponseErrorKind, message: &'static str) -> Self {
        Self::Fail(ResponseError::builder_with_msg(kind, message).build())
    }
}

/// 按顺序返回预设结果的 HTTP 调用器，同时记录收到的所有请求
#[derive(Debug, Default)]
pub(crate) struct FakeCaller {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<Request>>,
}

impl FakeCaller {
    pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            requests: Default::default(),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().to_owned()
    }

    pub(crate) fn last_request(&self) -> Option<Request> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl HttpCaller for FakeCaller {
    fn call(&self, request: &Request) -> ResponseResult {
        self.requests.lock().unwrap().push(request.to_owned());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond {
                status_code,
                reason,
                headers,
                body,
            }) => {
                let mut builder = Response::builder();
                builder.status_code(status_code);
                if let Some(reason) = reason {
                    builder.reason(reason);
                }
                for (name, value) in headers {
                    builder.append_header(name, value);
                }
                if let Some(body) = body {
                    builder.body(body.into_response_body());
                }
                Ok(builder.build())
            }
            Some(Step::Fail(err)) => Err(err),
            None => Err(ResponseError::builder_with_msg(ResponseErrorKind::UnknownError, "no scripted response").build()),
        }
    }
}
