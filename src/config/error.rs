use std::fmt;

use snafu::Snafu;

/// A configuration member which must be non-empty before a client can be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredField {
    /// The authorization endpoint.
    AuthorizeUrl,
    /// The token endpoint.
    TokenUrl,
    /// The user-info endpoint.
    UserInfoUrl,
    /// The redirect URI registered with the provider.
    RedirectUri,
    /// The client ID.
    ClientId,
    /// The client secret.
    ClientSecret,
}

impl RequiredField {
    /// The order in which required fields are checked. The first missing one is reported.
    pub const CHECK_ORDER: [Self; 6] = [
        Self::AuthorizeUrl,
        Self::TokenUrl,
        Self::UserInfoUrl,
        Self::RedirectUri,
        Self::ClientId,
        Self::ClientSecret,
    ];

    /// The configuration key of this field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizeUrl => "authorize_url",
            Self::TokenUrl => "token_url",
            Self::UserInfoUrl => "user_info_url",
            Self::RedirectUri => "redirect_uri",
            Self::ClientId => "client_id",
            Self::ClientSecret => "client_secret",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The provider configuration is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum ConfigError {
    /// A required member is empty.
    #[snafu(display("Provider configuration is missing required field {field}"))]
    MissingRequiredField {
        /// The first missing field, in [`RequiredField::CHECK_ORDER`].
        field: RequiredField,
    },
}

impl ConfigError {
    /// The field that was reported missing.
    #[must_use]
    pub fn field(&self) -> RequiredField {
        match self {
            Self::MissingRequiredField { field } => *field,
        }
    }
}

impl crate::Error for ConfigError {
    fn is_retryable(&self) -> bool {
        false
    }
}
