use bytes::Bytes;
use http::{
    HeaderMap, HeaderValue, Method, Request, StatusCode, Uri,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, InvalidHeaderValue},
    uri::InvalidUri,
};
use serde::Serialize;
use serde_json::Value;
use snafu::prelude::*;

use crate::{
    BoxedError, Error as _,
    http::{HttpClient, HttpResponse},
};

/// A provider response: the status it came with and its body parsed as JSON.
///
/// Responses produced by hooks carry `200 OK`.
#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl RawResponse {
    pub fn from_hook(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }
}

/// Errors raised while talking to a provider endpoint.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FetchError {
    /// The configured endpoint URL could not be parsed.
    #[snafu(display("Invalid endpoint URL {url:?}"))]
    InvalidUri {
        /// The offending URL.
        url: String,
        /// The underlying error.
        source: InvalidUri,
    },
    /// The request body could not be encoded.
    #[snafu(display("Failed to encode the request form"))]
    SerializeForm {
        /// The underlying error.
        source: serde_html_form::ser::Error,
    },
    /// A header value could not be constructed.
    #[snafu(display("Invalid header value"))]
    InvalidHeader {
        /// The underlying error.
        source: InvalidHeaderValue,
    },
    /// The HTTP request itself failed.
    #[snafu(display("Failed to make HTTP request"))]
    Request {
        /// The underlying transport error.
        source: BoxedError,
    },
    /// The response body could not be read.
    #[snafu(display("Failed to read response body"))]
    ResponseBody {
        /// The underlying transport error.
        source: BoxedError,
    },
    /// The provider answered with an unsuccessful status and no recognisable error body.
    #[snafu(display("Provider returned status {status}: {body}"))]
    BadStatus {
        /// The status code of the response.
        status: StatusCode,
        /// The response body, lossily decoded.
        body: String,
    },
    /// A successful response body was not JSON.
    #[snafu(display("Failed to parse provider response as JSON"))]
    Deserialize {
        /// The unparseable body.
        body: String,
        /// The underlying error.
        source: serde_json::Error,
    },
    /// A provider hook failed.
    #[snafu(display("Provider hook failed"))]
    Hook {
        /// The error returned by the hook.
        source: BoxedError,
    },
}

impl crate::Error for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Request { source } | Self::ResponseBody { source } | Self::Hook { source } => {
                source.is_retryable()
            }
            Self::BadStatus { status, .. } => status.is_server_error(),
            Self::InvalidUri { .. }
            | Self::SerializeForm { .. }
            | Self::InvalidHeader { .. }
            | Self::Deserialize { .. } => false,
        }
    }
}

impl FetchError {
    /// Fails unless `response` came back with a success status.
    pub(crate) fn check_status(response: &RawResponse) -> Result<(), Self> {
        if response.status.is_success() {
            Ok(())
        } else {
            BadStatusSnafu {
                status: response.status,
                body: response.body.to_string(),
            }
            .fail()
        }
    }
}

/// Issues a form-encoded `POST` and reads back a JSON body.
pub(crate) async fn post_form<C: HttpClient, F: Serialize>(
    http_client: &C,
    url: &str,
    form: &F,
) -> Result<RawResponse, FetchError> {
    let body = serde_html_form::to_string(form).context(SerializeFormSnafu)?;

    let (mut parts, ()) = Request::new(()).into_parts();
    parts.method = Method::POST;
    parts.uri = parse_uri(url)?;
    parts.headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    parts
        .headers
        .insert(ACCEPT, HeaderValue::from_static("application/json"));

    execute(http_client, Request::from_parts(parts, body.into())).await
}

/// Issues a `GET` authenticated with a bearer token and reads back a JSON body.
pub(crate) async fn get_json<C: HttpClient>(
    http_client: &C,
    url: &str,
    bearer: &str,
) -> Result<RawResponse, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {bearer}")).context(InvalidHeaderSnafu)?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let (mut parts, ()) = Request::new(()).into_parts();
    parts.uri = parse_uri(url)?;
    parts.headers = headers;

    execute(http_client, Request::from_parts(parts, Bytes::new())).await
}

fn parse_uri(url: &str) -> Result<Uri, FetchError> {
    url.parse::<Uri>().context(InvalidUriSnafu { url })
}

async fn execute<C: HttpClient>(
    http_client: &C,
    request: Request<Bytes>,
) -> Result<RawResponse, FetchError> {
    let response = http_client
        .execute(request)
        .await
        .map_err(BoxedError::from_err)
        .context(RequestSnafu)?;
    let status = response.status();
    let body = response
        .body()
        .await
        .map_err(BoxedError::from_err)
        .context(ResponseBodySnafu)?;

    match serde_json::from_slice::<Value>(&body) {
        Ok(body) => Ok(RawResponse { status, body }),
        Err(_) if !status.is_success() => BadStatusSnafu {
            status,
            body: String::from_utf8_lossy(&body),
        }
        .fail(),
        Err(source) => Err(FetchError::Deserialize {
            body: String::from_utf8_lossy(&body).into_owned(),
            source,
        }),
    }
}
