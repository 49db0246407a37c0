//! Override hooks for providers that cannot be expressed as plain templates.
//!
//! Each hook replaces exactly one generic protocol step. A provider that needs
//! e.g. an app-level token before the user token implements
//! [`TokenResponseFetcher`] and leaves every other step generic.
//!
//! The URL builders are implemented for plain closures:
//!
//! ```rust
//! use oauth2_generic::config::ProviderConfig;
//!
//! let config = ProviderConfig::builder()
//!     .authorize_url("https://login.example.com/authorize")
//!     .build()
//!     .with_login_url_builder(|config: &ProviderConfig, state: &str| {
//!         format!("{}#state={state}", config.authorize_url)
//!     });
//! ```
//!
//! The fetchers are asynchronous and own their transport; implement them on a
//! type holding whatever HTTP client they need.

use std::{fmt, pin::Pin, sync::Arc};

use serde_json::Value;

use crate::{BoxedError, config::ProviderConfig, token::Token};

/// An owned, boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Builds the login (authorize) URL for a provider.
pub trait LoginUrlBuilder: Send + Sync {
    /// Returns the URL to which the user is sent. `state` is never empty.
    fn login_url(&self, config: &ProviderConfig, state: &str) -> String;
}

impl<F> LoginUrlBuilder for F
where
    F: Fn(&ProviderConfig, &str) -> String + Send + Sync,
{
    fn login_url(&self, config: &ProviderConfig, state: &str) -> String {
        self(config, state)
    }
}

/// Builds the logout URL for a provider.
pub trait LogoutUrlBuilder: Send + Sync {
    /// Returns the logout URL, or an empty string if logout is unsupported.
    fn logout_url(&self, config: &ProviderConfig) -> String;
}

impl<F> LogoutUrlBuilder for F
where
    F: Fn(&ProviderConfig) -> String + Send + Sync,
{
    fn logout_url(&self, config: &ProviderConfig) -> String {
        self(config)
    }
}

/// Builds the registration URL for a provider.
pub trait RegisterUrlBuilder: Send + Sync {
    /// Returns the registration URL, or an empty string if registration is unsupported.
    fn register_url(&self, config: &ProviderConfig) -> String;
}

impl<F> RegisterUrlBuilder for F
where
    F: Fn(&ProviderConfig) -> String + Send + Sync,
{
    fn register_url(&self, config: &ProviderConfig) -> String {
        self(config)
    }
}

/// Fetches the raw token response for an authorization code.
///
/// The implementation owns request construction entirely, including any
/// preliminary calls. The returned body is inspected for a provider error
/// envelope and then read through the configured token field paths.
pub trait TokenResponseFetcher: Send + Sync {
    /// Exchanges `code` for a token response body.
    fn fetch_token_response<'a>(
        &'a self,
        config: &'a ProviderConfig,
        code: &'a str,
        state: &'a str,
    ) -> BoxFuture<'a, Result<Value, BoxedError>>;
}

/// Fetches the raw user-info response.
///
/// `token.raw` holds the full token response for providers which key the profile
/// lookup on something other than the access token, and `code` is the original
/// authorization code for providers which key it on that.
pub trait UserResponseFetcher: Send + Sync {
    /// Fetches the profile body.
    fn fetch_user_response<'a>(
        &'a self,
        config: &'a ProviderConfig,
        token: &'a Token,
        code: &'a str,
    ) -> BoxFuture<'a, Result<Value, BoxedError>>;
}

/// Fetches the raw token response for a refresh token.
pub trait RefreshResponseFetcher: Send + Sync {
    /// Trades `refresh_token` for a new token response body.
    fn fetch_refresh_response<'a>(
        &'a self,
        config: &'a ProviderConfig,
        refresh_token: &'a str,
    ) -> BoxFuture<'a, Result<Value, BoxedError>>;
}

/// The set of hooks attached to a configuration.
#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub login_url: Option<Arc<dyn LoginUrlBuilder>>,
    pub logout_url: Option<Arc<dyn LogoutUrlBuilder>>,
    pub register_url: Option<Arc<dyn RegisterUrlBuilder>>,
    pub token_response: Option<Arc<dyn TokenResponseFetcher>>,
    pub user_response: Option<Arc<dyn UserResponseFetcher>>,
    pub refresh_response: Option<Arc<dyn RefreshResponseFetcher>>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = [
            ("login_url", self.login_url.is_some()),
            ("logout_url", self.logout_url.is_some()),
            ("register_url", self.register_url.is_some()),
            ("token_response", self.token_response.is_some()),
            ("user_response", self.user_response.is_some()),
            ("refresh_response", self.refresh_response.is_some()),
        ];
        f.debug_list()
            .entries(set.iter().filter(|(_, present)| *present).map(|(name, _)| name))
            .finish()
    }
}
