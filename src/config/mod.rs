//! Provider configuration.
//!
//! A [`ProviderConfig`] describes one identity provider entirely as data: its
//! endpoints, how it spells the `OAuth2` parameters, where its responses keep
//! the token and profile fields, and optional [hooks] for steps which cannot be
//! expressed as template substitution.
//!
//! Configurations are built once (by a provider adapter, from a file, or via the
//! [registry](crate::registry)), defaulted and validated when a
//! [`Client`](crate::client::Client) is built, and read-only thereafter.

mod error;
pub mod hooks;
mod names;

use std::sync::Arc;

use bon::Builder;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use url::form_urlencoded::byte_serialize;

pub use error::{ConfigError, RequiredField};
pub use names::{ProfileFieldPaths, RequestParameterNames, TokenFieldPaths};

use crate::config::{
    error::MissingRequiredFieldSnafu,
    hooks::{
        Hooks, LoginUrlBuilder, LogoutUrlBuilder, RefreshResponseFetcher, RegisterUrlBuilder,
        TokenResponseFetcher, UserResponseFetcher,
    },
};

/// The state substituted when the caller supplies none.
pub const DEFAULT_STATE: &str = "anything";

/// The scope requested when the configuration names none.
pub const DEFAULT_SCOPE: &str = "openid";

fn empty_secret() -> SecretString {
    SecretString::from("")
}

/// The description of one identity provider.
///
/// # Examples
///
/// ```rust
/// use oauth2_generic::config::{ProviderConfig, TokenFieldPaths};
///
/// let mut config = ProviderConfig::builder()
///     .name("Feishu")
///     .authorize_url("https://open.feishu.cn/open-apis/authen/v1/index")
///     .token_url("https://open.feishu.cn/open-apis/authen/v1/access_token")
///     .user_info_url("https://open.feishu.cn/open-apis/authen/v1/user_info")
///     .client_id("cli_123")
///     .client_secret("secret")
///     .redirect_uri("https://app.example.com/login/callback")
///     .token_fields(
///         TokenFieldPaths::builder()
///             .access_token("data.access_token")
///             .refresh_token("data.refresh_token")
///             .build(),
///     )
///     .build();
///
/// config.apply_defaults();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Builder, Deserialize)]
pub struct ProviderConfig {
    /// Display label of the provider.
    #[builder(into, default)]
    #[serde(default)]
    pub name: String,

    /// The authorization endpoint.
    #[builder(into, default)]
    #[serde(default)]
    pub authorize_url: String,

    /// The token endpoint.
    #[builder(into, default)]
    #[serde(default)]
    pub token_url: String,

    /// The user-info endpoint.
    #[builder(into, default)]
    #[serde(default)]
    pub user_info_url: String,

    /// The token endpoint used for refreshing, if different from `token_url`.
    #[builder(into, default)]
    #[serde(default)]
    pub refresh_token_url: String,

    /// The logout endpoint, empty if the provider has none.
    #[builder(into, default)]
    #[serde(default)]
    pub logout_url: String,

    /// The registration endpoint, empty if the provider has none.
    #[builder(into, default)]
    #[serde(default)]
    pub register_url: String,

    /// The callback URL registered with the provider.
    #[builder(into, default)]
    #[serde(default)]
    pub redirect_uri: String,

    /// Space-separated scopes. [`DEFAULT_SCOPE`] is requested when empty.
    #[builder(into, default)]
    #[serde(default)]
    pub scope: String,

    /// The client ID.
    #[builder(into, default)]
    #[serde(default)]
    pub client_id: String,

    /// The client secret.
    #[builder(into, default = empty_secret())]
    #[serde(default = "empty_secret")]
    pub client_secret: SecretString,

    /// Authorization request parameter names.
    #[builder(default)]
    #[serde(default)]
    pub request_names: RequestParameterNames,

    /// Token response field paths.
    #[builder(default)]
    #[serde(default)]
    pub token_fields: TokenFieldPaths,

    /// User-info response field paths.
    #[builder(default)]
    #[serde(default)]
    pub profile_fields: ProfileFieldPaths,

    #[builder(skip)]
    #[serde(skip)]
    pub(crate) hooks: Hooks,
}

impl ProviderConfig {
    /// Fills every empty parameter name and field path with its conventional default.
    ///
    /// Idempotent. Endpoints and credentials are left untouched.
    pub fn apply_defaults(&mut self) {
        self.request_names.apply_defaults();
        self.token_fields.apply_defaults();
        self.profile_fields.apply_defaults();
    }

    /// Checks that the required members are non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] naming the first empty
    /// member in [`RequiredField::CHECK_ORDER`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        match RequiredField::CHECK_ORDER
            .into_iter()
            .find(|field| self.required(*field).is_empty())
        {
            Some(field) => MissingRequiredFieldSnafu { field }.fail(),
            None => Ok(()),
        }
    }

    fn required(&self, field: RequiredField) -> &str {
        match field {
            RequiredField::AuthorizeUrl => &self.authorize_url,
            RequiredField::TokenUrl => &self.token_url,
            RequiredField::UserInfoUrl => &self.user_info_url,
            RequiredField::RedirectUri => &self.redirect_uri,
            RequiredField::ClientId => &self.client_id,
            RequiredField::ClientSecret => self.client_secret.expose_secret(),
        }
    }

    /// Replaces the generic login URL with `builder`.
    #[must_use]
    pub fn with_login_url_builder(mut self, builder: impl LoginUrlBuilder + 'static) -> Self {
        self.hooks.login_url = Some(Arc::new(builder));
        self
    }

    /// Replaces the generic logout URL with `builder`.
    #[must_use]
    pub fn with_logout_url_builder(mut self, builder: impl LogoutUrlBuilder + 'static) -> Self {
        self.hooks.logout_url = Some(Arc::new(builder));
        self
    }

    /// Replaces the generic registration URL with `builder`.
    #[must_use]
    pub fn with_register_url_builder(
        mut self,
        builder: impl RegisterUrlBuilder + 'static,
    ) -> Self {
        self.hooks.register_url = Some(Arc::new(builder));
        self
    }

    /// Replaces the generic code exchange request with `fetcher`.
    #[must_use]
    pub fn with_token_response_fetcher(
        mut self,
        fetcher: impl TokenResponseFetcher + 'static,
    ) -> Self {
        self.hooks.token_response = Some(Arc::new(fetcher));
        self
    }

    /// Replaces the generic user-info request with `fetcher`.
    #[must_use]
    pub fn with_user_response_fetcher(
        mut self,
        fetcher: impl UserResponseFetcher + 'static,
    ) -> Self {
        self.hooks.user_response = Some(Arc::new(fetcher));
        self
    }

    /// Replaces the generic refresh request with `fetcher`.
    #[must_use]
    pub fn with_refresh_response_fetcher(
        mut self,
        fetcher: impl RefreshResponseFetcher + 'static,
    ) -> Self {
        self.hooks.refresh_response = Some(Arc::new(fetcher));
        self
    }

    /// The login URL for `state`, which defaults to [`DEFAULT_STATE`] when empty.
    ///
    /// A configured [`LoginUrlBuilder`] is used verbatim. Otherwise the
    /// authorization endpoint is extended with the client ID, redirect URI,
    /// `code` response type, scope and state, named per [`RequestParameterNames`].
    /// Parameters are appended with `&` when the endpoint already has a query
    /// (e.g. `?tenant=acme`), and with `?` otherwise.
    #[must_use]
    pub fn login_url(&self, state: &str) -> String {
        let state = if state.is_empty() { DEFAULT_STATE } else { state };

        if let Some(builder) = &self.hooks.login_url {
            return builder.login_url(self, state);
        }

        let scope = if self.scope.is_empty() {
            DEFAULT_SCOPE
        } else {
            &self.scope
        };
        let names = &self.request_names;

        format!(
            "{}{}={}&{}={}&{}=code&{}={}&{}={}",
            with_query_separator(&self.authorize_url),
            names.client_id,
            self.client_id,
            names.redirect_uri,
            escape(&self.redirect_uri),
            names.response_type,
            names.scope,
            escape(scope),
            names.state,
            escape(state),
        )
    }

    /// The logout URL, or an empty string when the provider has no logout endpoint.
    ///
    /// As for [`ProviderConfig::login_url`], an existing query on the endpoint is kept
    /// and extended with `&`.
    #[must_use]
    pub fn logout_url(&self) -> String {
        if let Some(builder) = &self.hooks.logout_url {
            return builder.logout_url(self);
        }

        if self.logout_url.is_empty() {
            return String::new();
        }

        format!(
            "{}{}={}&{}={}",
            with_query_separator(&self.logout_url),
            self.request_names.client_id,
            self.client_id,
            self.request_names.redirect_uri,
            escape(&self.redirect_uri),
        )
    }

    /// The registration URL, or an empty string when the provider has no registration endpoint.
    ///
    /// An existing query on the endpoint is extended with `&`.
    #[must_use]
    pub fn register_url(&self) -> String {
        if let Some(builder) = &self.hooks.register_url {
            return builder.register_url(self);
        }

        if self.register_url.is_empty() {
            return String::new();
        }

        format!(
            "{}{}={}",
            with_query_separator(&self.register_url),
            self.request_names.client_id,
            self.client_id,
        )
    }

    /// The endpoint used for refresh requests.
    #[must_use]
    pub fn effective_refresh_token_url(&self) -> &str {
        if self.refresh_token_url.is_empty() {
            &self.token_url
        } else {
            &self.refresh_token_url
        }
    }
}

/// Percent-encodes a query component.
#[must_use]
pub fn escape(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

fn with_query_separator(endpoint: &str) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}")
}
