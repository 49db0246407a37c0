//! User resolution: fetching the profile behind a [`Token`] and mapping it onto a [`User`].

use secrecy::ExposeSecret as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::prelude::*;
use tracing::{debug, trace, warn};

use crate::{
    Error as _,
    config::{ProfileFieldPaths, ProviderConfig},
    envelope::ProviderError,
    field,
    http::{FetchError, HookSnafu, HttpClient, RawResponse, get_json},
    token::Token,
};

/// The canonical user record.
///
/// Every member is empty when the provider's response does not carry it at the
/// configured path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The provider's stable identifier for the user.
    pub id: String,
    /// The user's email address.
    pub email: String,
    /// The user's login name.
    pub username: String,
    /// The user's display name.
    pub nickname: String,
    /// URL of the user's avatar.
    pub avatar: String,
    /// URL of the user's profile page.
    pub homepage: String,
    /// Group memberships, in provider order.
    pub groups: Vec<String>,
    /// Granted permissions, in provider order.
    pub permissions: Vec<String>,
}

impl User {
    /// Maps a profile response onto a user through `paths`.
    #[must_use]
    pub fn from_response(body: &Value, paths: &ProfileFieldPaths) -> Self {
        Self {
            id: field::string(body, &paths.id),
            email: field::string(body, &paths.email),
            username: field::string(body, &paths.username),
            nickname: field::string(body, &paths.nickname),
            avatar: field::string(body, &paths.avatar),
            homepage: field::string(body, &paths.homepage),
            groups: field::strings(body, &paths.groups),
            permissions: field::strings(body, &paths.permissions),
        }
    }
}

/// The user profile could not be obtained.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum UserFetchError {
    /// The provider answered with a non-zero error code.
    #[snafu(display("Provider rejected the user-info request ({code}): {message}"))]
    Rejected {
        /// The provider's error code.
        code: i64,
        /// The provider's message.
        message: String,
    },
    /// The user-info endpoint could not be reached or answered unintelligibly.
    #[snafu(display("Failed to fetch the user-info response"))]
    Fetch {
        /// The underlying error.
        source: FetchError,
    },
}

impl crate::Error for UserFetchError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Rejected { .. } => false,
            Self::Fetch { source } => source.is_retryable(),
        }
    }
}

/// Fetches the profile for `token` and maps it onto a [`User`].
///
/// A configured [`UserResponseFetcher`](crate::config::hooks::UserResponseFetcher)
/// receives the token (with its raw response) and the original authorization code;
/// otherwise the user-info endpoint is called with the access token as a bearer
/// credential.
///
/// # Errors
///
/// Returns [`UserFetchError::Rejected`] if the response carries a non-zero error
/// code, or [`UserFetchError::Fetch`] if the request fails.
pub async fn resolve_user<C: HttpClient>(
    http_client: &C,
    config: &ProviderConfig,
    token: &Token,
    code: &str,
) -> Result<User, UserFetchError> {
    debug!(provider = %config.name, "fetching user profile");

    let response = match &config.hooks.user_response {
        Some(fetcher) => fetcher
            .fetch_user_response(config, token, code)
            .await
            .map(RawResponse::from_hook)
            .context(HookSnafu),
        None => {
            get_json(
                http_client,
                &config.user_info_url,
                token.access_token.expose_secret(),
            )
            .await
        }
    }
    .context(FetchSnafu)?;

    trace!(
        provider = %config.name,
        status = %response.status,
        keys = ?field::keys(&response.body),
        "user-info response received"
    );

    if let Some(ProviderError { code, message }) = ProviderError::from_body(&response.body) {
        warn!(provider = %config.name, code, reason = %message, "provider rejected user-info request");
        return RejectedSnafu { code, message }.fail();
    }

    FetchError::check_status(&response).context(FetchSnafu)?;

    Ok(User::from_response(&response.body, &config.profile_fields))
}
