//! Provider error envelopes.
//!
//! Many providers answer failures with `200 OK` and a body of the form
//! `{"code": <non-zero>, "message": "..."}`; token endpoints following RFC 6749
//! §5.2 answer with `{"error": "...", "error_description": "..."}` instead.

use serde_json::Value;

use crate::field;

/// The envelope code providers use for an expired authorization code.
pub const CODE_EXPIRED: i64 = 5_003_002;

/// A `code`/`message` error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    /// Reads the envelope out of `body`, if its `code` is non-zero.
    pub fn from_body(body: &Value) -> Option<Self> {
        let code = field::int(body, "code");
        (code != 0).then(|| Self {
            code,
            message: field::string(body, "message"),
        })
    }

    pub fn is_code_expired(&self) -> bool {
        self.code == CODE_EXPIRED
    }
}

/// An RFC 6749 §5.2 error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OAuth2Error {
    pub error: String,
    pub description: String,
}

impl OAuth2Error {
    pub fn from_body(body: &Value) -> Option<Self> {
        let error = body.get("error").and_then(Value::as_str)?;
        (!error.is_empty()).then(|| Self {
            error: error.to_owned(),
            description: field::string(body, "error_description"),
        })
    }
}
