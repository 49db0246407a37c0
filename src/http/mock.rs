//! A recording HTTP client for tests.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode};
use snafu::Snafu;

use super::{HttpClient, HttpResponse};

#[derive(Debug, Snafu)]
#[snafu(display("mock transport failure"))]
pub(crate) struct MockError;

impl crate::Error for MockError {
    fn is_retryable(&self) -> bool {
        true
    }
}

type Queue = VecDeque<Result<(StatusCode, Bytes), MockError>>;

/// Replays queued responses in order and records every request it sees.
#[derive(Debug, Default)]
pub(crate) struct MockHttpClient {
    responses: Mutex<Queue>,
    requests: Mutex<Vec<Request<Bytes>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_json(self, status: StatusCode, body: serde_json::Value) -> Self {
        self.respond_raw(status, body.to_string())
    }

    pub fn respond_raw(self, status: StatusCode, body: impl Into<Bytes>) -> Self {
        self.lock_responses().push_back(Ok((status, body.into())));
        self
    }

    pub fn fail(self) -> Self {
        self.lock_responses().push_back(Err(MockError));
        self
    }

    pub fn request_count(&self) -> usize {
        self.lock_requests().len()
    }

    /// Takes the recorded requests, oldest first.
    pub fn take_requests(&self) -> Vec<Request<Bytes>> {
        std::mem::take(&mut *self.lock_requests())
    }

    fn lock_responses(&self) -> MutexGuard<'_, Queue> {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_requests(&self) -> MutexGuard<'_, Vec<Request<Bytes>>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub(crate) struct MockResponse {
    status: StatusCode,
    body: Bytes,
}

impl HttpClient for MockHttpClient {
    type Error = MockError;
    type Response = MockResponse;

    async fn execute(&self, request: Request<Bytes>) -> Result<Self::Response, Self::Error> {
        self.lock_requests().push(request);
        let next = self.lock_responses().pop_front();
        match next {
            Some(Ok((status, body))) => Ok(MockResponse { status, body }),
            Some(Err(err)) => Err(err),
            None => Ok(MockResponse {
                status: StatusCode::NOT_FOUND,
                body: Bytes::from_static(b"no mock response queued"),
            }),
        }
    }
}

impl HttpResponse for MockResponse {
    type Error = MockError;

    fn status(&self) -> StatusCode {
        self.status
    }

    fn headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    async fn body(self) -> Result<Bytes, Self::Error> {
        Ok(self.body)
    }
}

/// Decodes a form-encoded request body into ordered pairs.
pub(crate) fn form_pairs(request: &Request<Bytes>) -> Vec<(String, String)> {
    url::form_urlencoded::parse(request.body())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
