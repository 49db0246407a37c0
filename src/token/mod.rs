//! Tokens obtained from a provider.

mod access_token;
mod refresh_token;

use std::{
    fmt,
    time::{Duration, SystemTime},
};

use secrecy::ExposeSecret as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use access_token::AccessToken;
pub use refresh_token::RefreshToken;

use crate::{config::TokenFieldPaths, field};

/// The result of a successful code exchange or refresh.
///
/// `Debug` output lists only the top-level keys of [`Token::raw`], which usually
/// repeats the tokens in plain text.
#[derive(Clone, Serialize, Deserialize)]
pub struct Token {
    /// The access token.
    pub access_token: AccessToken,
    /// The refresh token, if the provider issued one.
    pub refresh_token: Option<RefreshToken>,
    /// Number of seconds until token expiry; zero when the provider did not say.
    pub expires_in: u64,
    /// The token type, empty when the provider did not say.
    pub token_type: String,
    /// A synthetic field which is set to the received time.
    #[serde(skip, default = "SystemTime::now")]
    pub received_at: SystemTime,
    /// The provider's full token response.
    ///
    /// Some providers key their profile lookup on values that only appear here.
    pub raw: Value,
}

impl Token {
    /// Extracts a token from a provider response using the configured field paths.
    #[must_use]
    pub fn from_response(raw: Value, paths: &TokenFieldPaths) -> Self {
        let refresh_token = field::string(&raw, &paths.refresh_token);

        Self {
            access_token: field::string(&raw, &paths.access_token).into(),
            refresh_token: (!refresh_token.is_empty()).then(|| refresh_token.into()),
            expires_in: u64::try_from(field::int(&raw, &paths.expires_in)).unwrap_or_default(),
            token_type: field::string(&raw, &paths.token_type),
            received_at: SystemTime::now(),
            raw,
        }
    }

    /// Returns the refresh token as a string, empty if none was issued.
    #[must_use]
    pub fn refresh_token_str(&self) -> &str {
        self.refresh_token
            .as_ref()
            .map_or("", |token| token.expose_secret())
    }

    /// Reads a provider-specific value out of the raw token response.
    #[must_use]
    pub fn raw_string(&self, path: &str) -> String {
        field::string(&self.raw, path)
    }

    /// Returns `true` if the access token has expired.
    ///
    /// `default_expires_in` is used when the provider gave no lifetime, and
    /// `expires_margin` treats tokens as expired slightly early.
    #[must_use]
    pub fn is_expired(&self, default_expires_in: Duration, expires_margin: Duration) -> bool {
        let expires_in = if self.expires_in == 0 {
            default_expires_in
        } else {
            Duration::from_secs(self.expires_in)
        };

        let Some(expires_at) = self.received_at.checked_add(expires_in) else {
            return false;
        };
        SystemTime::now()
            .checked_add(expires_margin)
            .is_none_or(|now| now >= expires_at)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &self.access_token)
            .field("refresh_token", &self.refresh_token)
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("received_at", &self.received_at)
            .field("raw", &field::keys(&self.raw))
            .finish()
    }
}
