//! The client engine: the three-call login protocol over one provider.
//!
//! ```rust,no_run
//! # async fn run(config: oauth2_generic::config::ProviderConfig) -> Result<(), snafu::Whatever> {
//! use oauth2_generic::client::Client;
//! use snafu::ResultExt as _;
//!
//! let client = Client::new(config, reqwest::Client::new()).whatever_context("bad config")?;
//!
//! // Step 1: send the user to the provider.
//! let login_url = client.authorize("a1b2c3");
//!
//! // Step 2: the provider redirects back with `code` and `state`.
//! let (user, token) = client
//!     .callback("code-from-redirect", "a1b2c3")
//!     .await
//!     .whatever_context("login failed")?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use snafu::prelude::*;
use tracing::debug;

use crate::{
    Error as _,
    config::{ConfigError, ProviderConfig},
    exchange::{self, TokenExchangeError},
    http::HttpClient,
    token::Token,
    user::{self, User, UserFetchError},
};

/// A login attempt could not be completed.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CallbackError {
    /// The redirect carried no code or no state.
    #[snafu(display("Callback is missing the authorization code or state"))]
    InvalidCallback,
    /// The authorization code could not be exchanged.
    #[snafu(display("Failed to exchange the authorization code"))]
    TokenExchange {
        /// The underlying error.
        source: TokenExchangeError,
    },
    /// A token was issued but the profile could not be fetched.
    #[snafu(display("Failed to fetch the user profile"))]
    UserFetch {
        /// The underlying error.
        source: UserFetchError,
        /// The token that was issued. It remains usable for retrying the profile fetch.
        token: Box<Token>,
    },
}

impl CallbackError {
    /// The token obtained before the failure, if any.
    #[must_use]
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::UserFetch { token, .. } => Some(token.as_ref()),
            Self::InvalidCallback | Self::TokenExchange { .. } => None,
        }
    }

    /// Consumes the error, returning the token obtained before the failure, if any.
    #[must_use]
    pub fn into_token(self) -> Option<Token> {
        match self {
            Self::UserFetch { token, .. } => Some(*token),
            Self::InvalidCallback | Self::TokenExchange { .. } => None,
        }
    }

    /// Returns `true` if the provider reported the authorization code as expired.
    #[must_use]
    pub fn is_code_expired(&self) -> bool {
        matches!(self, Self::TokenExchange { source } if source.is_code_expired())
    }
}

impl crate::Error for CallbackError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidCallback => false,
            Self::TokenExchange { source } => source.is_retryable(),
            Self::UserFetch { source, .. } => source.is_retryable(),
        }
    }
}

/// A login client for one provider.
///
/// Holds no per-login state: the caller round-trips `state` through the provider
/// and keeps whatever [`Token`] and [`User`] it receives. A `Client` may be shared
/// across concurrent logins.
#[derive(Debug, Clone)]
pub struct Client<C: HttpClient> {
    config: Arc<ProviderConfig>,
    http_client: C,
}

impl<C: HttpClient> Client<C> {
    /// Defaults and validates `config`, then builds a client over `http_client`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] naming the first required
    /// member that is empty.
    pub fn new(mut config: ProviderConfig, http_client: C) -> Result<Self, ConfigError> {
        config.apply_defaults();
        config.validate()?;

        debug!(provider = %config.name, "client configured");
        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }

    /// Builds a client from a shared configuration, such as one held by a
    /// [`ProviderRegistry`](crate::registry::ProviderRegistry).
    ///
    /// # Errors
    ///
    /// As for [`Client::new`].
    pub fn from_shared(config: Arc<ProviderConfig>, http_client: C) -> Result<Self, ConfigError> {
        Self::new(Arc::unwrap_or_clone(config), http_client)
    }

    /// The defaulted, validated configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// The URL to send the user to in order to log in.
    ///
    /// An empty `state` is replaced by [`DEFAULT_STATE`](crate::config::DEFAULT_STATE).
    #[must_use]
    pub fn authorize(&self, state: &str) -> String {
        self.config.login_url(state)
    }

    /// Calls `handler` with the login URL.
    pub fn authorize_with<R>(&self, state: &str, handler: impl FnOnce(String) -> R) -> R {
        handler(self.authorize(state))
    }

    /// Completes a login from the `code` and `state` the provider redirected back with.
    ///
    /// # Errors
    ///
    /// * [`CallbackError::InvalidCallback`] if `code` or `state` is empty. No request is made.
    /// * [`CallbackError::TokenExchange`] if the code could not be exchanged.
    /// * [`CallbackError::UserFetch`] if the profile could not be fetched. The issued
    ///   token is attached.
    pub async fn callback(&self, code: &str, state: &str) -> Result<(User, Token), CallbackError> {
        ensure!(!code.is_empty() && !state.is_empty(), InvalidCallbackSnafu);

        let token = exchange::exchange_code(&self.http_client, &self.config, code, state)
            .await
            .context(TokenExchangeSnafu)?;

        match user::resolve_user(&self.http_client, &self.config, &token, code).await {
            Ok(user) => {
                debug!(provider = %self.config.name, user_id = %user.id, "login completed");
                Ok((user, token))
            }
            Err(source) => Err(CallbackError::UserFetch {
                source,
                token: Box::new(token),
            }),
        }
    }

    /// Completes a login and hands the outcome to `handler`.
    ///
    /// `handler` receives `(user, token, None)` on success, `(None, None, error)` when
    /// no token was issued, and `(None, token, error)` when only the profile fetch
    /// failed.
    pub async fn callback_with<R>(
        &self,
        code: &str,
        state: &str,
        handler: impl FnOnce(Option<User>, Option<Token>, Option<CallbackError>) -> R,
    ) -> R {
        match self.callback(code, state).await {
            Ok((user, token)) => handler(Some(user), Some(token), None),
            Err(err) => {
                let token = err.token().cloned();
                handler(None, token, Some(err))
            }
        }
    }

    /// The logout URL, or an empty string if the provider has no logout support.
    #[must_use]
    pub fn logout(&self) -> String {
        self.config.logout_url()
    }

    /// Calls `handler` with the logout URL, which may be empty.
    pub fn logout_with<R>(&self, handler: impl FnOnce(String) -> R) -> R {
        handler(self.logout())
    }

    /// The registration URL, or an empty string if the provider has no registration support.
    #[must_use]
    pub fn register(&self) -> String {
        self.config.register_url()
    }

    /// Calls `handler` with the registration URL, which may be empty.
    pub fn register_with<R>(&self, handler: impl FnOnce(String) -> R) -> R {
        handler(self.register())
    }

    /// Trades a refresh token for a new token.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenExchangeError`] if the provider rejects the refresh token or
    /// the request fails.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Token, TokenExchangeError> {
        exchange::refresh_token(&self.http_client, &self.config, refresh_token).await
    }
}
