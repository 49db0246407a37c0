//! Token exchange: trading an authorization code, or a refresh token, for a [`Token`].

use secrecy::ExposeSecret as _;
use serde::Serialize;
use snafu::prelude::*;
use tracing::{debug, trace, warn};

use crate::{
    Error as _,
    config::ProviderConfig,
    envelope::{OAuth2Error, ProviderError},
    field,
    http::{FetchError, HookSnafu, HttpClient, RawResponse, post_form},
    token::Token,
};

/// The provider did not issue a token.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TokenExchangeError {
    /// The authorization code has expired. The user should restart the login.
    #[snafu(display("Authorization code is expired: {message}"))]
    CodeExpired {
        /// The provider's message.
        message: String,
    },
    /// The provider answered with a non-zero error code.
    #[snafu(display("Provider rejected the token request ({code}): {message}"))]
    Rejected {
        /// The provider's error code.
        code: i64,
        /// The provider's message.
        message: String,
    },
    /// The provider answered with a standard `OAuth2` error response.
    #[snafu(display("Provider returned OAuth2 error {error}: {description}"))]
    OAuth2 {
        /// The `error` code, e.g. `invalid_grant`.
        error: String,
        /// The `error_description`, empty if absent.
        description: String,
    },
    /// The token endpoint could not be reached or answered unintelligibly.
    #[snafu(display("Failed to fetch the token response"))]
    Fetch {
        /// The underlying error.
        source: FetchError,
    },
}

impl TokenExchangeError {
    /// Returns `true` if the provider reported the authorization code as expired.
    #[must_use]
    pub fn is_code_expired(&self) -> bool {
        matches!(self, Self::CodeExpired { .. })
    }
}

impl crate::Error for TokenExchangeError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { source } => source.is_retryable(),
            Self::CodeExpired { .. } | Self::Rejected { .. } | Self::OAuth2 { .. } => false,
        }
    }
}

#[derive(Serialize)]
struct CodeExchangeForm<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
    redirect_uri: &'a str,
    code: &'a str,
    state: &'a str,
}

#[derive(Serialize)]
struct RefreshForm<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
    refresh_token: &'a str,
}

/// Exchanges an authorization code for a token.
///
/// A configured [`TokenResponseFetcher`](crate::config::hooks::TokenResponseFetcher)
/// replaces the request entirely; otherwise the code is posted to the token endpoint
/// as a form. Either way the response is checked for a provider error envelope before
/// the token fields are read through [`TokenFieldPaths`](crate::config::TokenFieldPaths).
///
/// # Errors
///
/// Returns [`TokenExchangeError::CodeExpired`] if the provider reports the code as
/// expired, another [`TokenExchangeError`] if the provider rejects the code or the
/// request fails.
pub async fn exchange_code<C: HttpClient>(
    http_client: &C,
    config: &ProviderConfig,
    code: &str,
    state: &str,
) -> Result<Token, TokenExchangeError> {
    debug!(provider = %config.name, "exchanging authorization code");

    let response = match &config.hooks.token_response {
        Some(fetcher) => fetcher
            .fetch_token_response(config, code, state)
            .await
            .map(RawResponse::from_hook)
            .context(HookSnafu),
        None => {
            let form = CodeExchangeForm {
                client_id: &config.client_id,
                client_secret: config.client_secret.expose_secret(),
                grant_type: "authorization_code",
                redirect_uri: &config.redirect_uri,
                code,
                state,
            };
            post_form(http_client, &config.token_url, &form).await
        }
    }
    .context(FetchSnafu)?;

    token_from_response(config, response)
}

/// Trades a refresh token for a new token.
///
/// Uses the configured
/// [`RefreshResponseFetcher`](crate::config::hooks::RefreshResponseFetcher) if any,
/// otherwise posts to [`ProviderConfig::effective_refresh_token_url`]. The response is
/// handled exactly as for [`exchange_code`].
///
/// Providers that do not rotate refresh tokens leave [`Token::refresh_token`] empty
/// on the result; keep the previous one in that case.
///
/// # Errors
///
/// Returns a [`TokenExchangeError`] if the provider rejects the refresh token or the
/// request fails.
pub async fn refresh_token<C: HttpClient>(
    http_client: &C,
    config: &ProviderConfig,
    refresh_token: &str,
) -> Result<Token, TokenExchangeError> {
    debug!(provider = %config.name, "refreshing token");

    let response = match &config.hooks.refresh_response {
        Some(fetcher) => fetcher
            .fetch_refresh_response(config, refresh_token)
            .await
            .map(RawResponse::from_hook)
            .context(HookSnafu),
        None => {
            let form = RefreshForm {
                client_id: &config.client_id,
                client_secret: config.client_secret.expose_secret(),
                grant_type: "refresh_token",
                refresh_token,
            };
            post_form(http_client, config.effective_refresh_token_url(), &form).await
        }
    }
    .context(FetchSnafu)?;

    token_from_response(config, response)
}

fn token_from_response(
    config: &ProviderConfig,
    response: RawResponse,
) -> Result<Token, TokenExchangeError> {
    trace!(
        provider = %config.name,
        status = %response.status,
        keys = ?field::keys(&response.body),
        "token response received"
    );

    if let Some(err) = ProviderError::from_body(&response.body) {
        warn!(provider = %config.name, code = err.code, reason = %err.message, "provider rejected token request");
        return if err.is_code_expired() {
            CodeExpiredSnafu {
                message: err.message,
            }
            .fail()
        } else {
            RejectedSnafu {
                code: err.code,
                message: err.message,
            }
            .fail()
        };
    }

    if let Some(OAuth2Error { error, description }) = OAuth2Error::from_body(&response.body) {
        warn!(provider = %config.name, %error, "provider returned an OAuth2 error");
        return OAuth2Snafu { error, description }.fail();
    }

    FetchError::check_status(&response).context(FetchSnafu)?;

    let token = Token::from_response(response.body, &config.token_fields);
    if token.access_token.is_empty() {
        warn!(
            provider = %config.name,
            path = %config.token_fields.access_token,
            "token response carries no access token"
        );
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use http::{Method, StatusCode};
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret as _;
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        BoxedError, Error as _,
        config::{
            TokenFieldPaths,
            hooks::{BoxFuture, RefreshResponseFetcher, TokenResponseFetcher},
        },
        http::mock::{MockHttpClient, form_pairs},
    };

    fn config() -> ProviderConfig {
        let mut config = ProviderConfig::builder()
            .name("Example")
            .authorize_url("https://login.example.com/authorize")
            .token_url("https://login.example.com/token")
            .user_info_url("https://login.example.com/user")
            .redirect_uri("https://abc.com/login/callback")
            .client_id("CLIENT_ID")
            .client_secret("CLIENT_SECRET")
            .build();
        config.apply_defaults();
        config
    }

    #[tokio::test]
    async fn generic_exchange_posts_form_and_extracts_token() {
        let client = MockHttpClient::new().respond_json(
            StatusCode::OK,
            json!({
                "access_token": "A",
                "refresh_token": "R",
                "expires_in": 3600,
                "token_type": "bearer"
            }),
        );

        let token = exchange_code(&client, &config(), "CODE", "xyz123")
            .await
            .unwrap();

        assert_eq!(token.access_token.expose_secret(), "A");
        assert_eq!(token.refresh_token_str(), "R");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.raw["access_token"], "A");

        let requests = client.take_requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri(), "https://login.example.com/token");
        assert_eq!(
            request.headers()["content-type"],
            "application/x-www-form-urlencoded"
        );
        assert_eq!(request.headers()["accept"], "application/json");

        let pairs = form_pairs(request);
        let expected: Vec<(String, String)> = [
            ("client_id", "CLIENT_ID"),
            ("client_secret", "CLIENT_SECRET"),
            ("grant_type", "authorization_code"),
            ("redirect_uri", "https://abc.com/login/callback"),
            ("code", "CODE"),
            ("state", "xyz123"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        assert_eq!(pairs, expected);
    }

    #[tokio::test]
    async fn nested_field_paths_and_missing_fields() {
        let mut config = config();
        config.token_fields = TokenFieldPaths::builder()
            .access_token("data.access_token")
            .expires_in("data.expire")
            .build();
        config.apply_defaults();

        let client = MockHttpClient::new().respond_json(
            StatusCode::OK,
            json!({"code": 0, "data": {"access_token": "nested", "expire": "7200"}}),
        );

        let token = exchange_code(&client, &config, "CODE", "s").await.unwrap();
        assert_eq!(token.access_token.expose_secret(), "nested");
        assert_eq!(token.expires_in, 7200);
        assert!(token.refresh_token.is_none());
        assert_eq!(token.token_type, "");
    }

    #[tokio::test]
    async fn expired_code_is_distinguishable() {
        let client = MockHttpClient::new().respond_json(
            StatusCode::OK,
            json!({"code": 5_003_002, "message": "code expired"}),
        );

        let err = exchange_code(&client, &config(), "CODE", "s")
            .await
            .unwrap_err();
        assert!(err.is_code_expired());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Authorization code is expired: code expired");
    }

    #[tokio::test]
    async fn non_zero_code_is_rejected() {
        let client = MockHttpClient::new().respond_json(
            StatusCode::BAD_REQUEST,
            json!({"code": 20024, "message": "invalid app secret"}),
        );

        let err = exchange_code(&client, &config(), "CODE", "s")
            .await
            .unwrap_err();
        assert!(!err.is_code_expired());
        assert!(matches!(
            err,
            TokenExchangeError::Rejected { code: 20024, ref message } if message == "invalid app secret"
        ));
    }

    #[tokio::test]
    async fn oauth2_error_body_is_rejected() {
        let client = MockHttpClient::new().respond_json(
            StatusCode::OK,
            json!({"error": "bad_verification_code", "error_description": "incorrect or expired"}),
        );

        let err = exchange_code(&client, &config(), "CODE", "s")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TokenExchangeError::OAuth2 { ref error, .. } if error == "bad_verification_code"
        ));
    }

    #[tokio::test]
    async fn bad_status_without_envelope() {
        let client =
            MockHttpClient::new().respond_raw(StatusCode::SERVICE_UNAVAILABLE, "upstream down");

        let err = exchange_code(&client, &config(), "CODE", "s")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TokenExchangeError::Fetch {
                source: FetchError::BadStatus { status, .. }
            } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn non_json_success_body_fails_to_deserialize() {
        let client = MockHttpClient::new().respond_raw(StatusCode::OK, "access_token=A&scope=x");

        let err = exchange_code(&client, &config(), "CODE", "s")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TokenExchangeError::Fetch {
                source: FetchError::Deserialize { .. }
            }
        ));
    }

    #[tokio::test]
    async fn transport_failure_preserves_retryability() {
        let client = MockHttpClient::new().fail();

        let err = exchange_code(&client, &config(), "CODE", "s")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TokenExchangeError::Fetch {
                source: FetchError::Request { .. }
            }
        ));
        assert!(err.is_retryable());
    }

    struct AppTokenFirst {
        calls: Arc<AtomicUsize>,
        response: Value,
    }

    impl TokenResponseFetcher for AppTokenFirst {
        fn fetch_token_response<'a>(
            &'a self,
            config: &'a ProviderConfig,
            code: &'a str,
            _state: &'a str,
        ) -> BoxFuture<'a, Result<Value, BoxedError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if code == "bad" {
                    return Err(BoxedError::msg("app token unavailable"));
                }
                let mut response = self.response.clone();
                response["app_id"] = Value::String(config.client_id.clone());
                Ok(response)
            })
        }
    }

    #[tokio::test]
    async fn hook_replaces_generic_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = config().with_token_response_fetcher(AppTokenFirst {
            calls: calls.clone(),
            response: json!({"code": 0, "access_token": "from-hook"}),
        });
        let client = MockHttpClient::new();

        let token = exchange_code(&client, &config, "CODE", "s").await.unwrap();

        assert_eq!(token.access_token.expose_secret(), "from-hook");
        assert_eq!(token.raw_string("app_id"), "CLIENT_ID");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn hook_responses_get_the_envelope_check() {
        let config = config().with_token_response_fetcher(AppTokenFirst {
            calls: Arc::default(),
            response: json!({"code": 5_003_002, "message": "expired"}),
        });

        let err = exchange_code(&MockHttpClient::new(), &config, "CODE", "s")
            .await
            .unwrap_err();
        assert!(err.is_code_expired());
    }

    #[tokio::test]
    async fn hook_errors_are_wrapped() {
        let config = config().with_token_response_fetcher(AppTokenFirst {
            calls: Arc::default(),
            response: Value::Null,
        });

        let err = exchange_code(&MockHttpClient::new(), &config, "bad", "s")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TokenExchangeError::Fetch {
                source: FetchError::Hook { .. }
            }
        ));
    }

    #[tokio::test]
    async fn refresh_posts_to_refresh_endpoint() {
        let mut config = config();
        config.refresh_token_url = "https://login.example.com/refresh".to_owned();
        let client = MockHttpClient::new().respond_json(
            StatusCode::OK,
            json!({"access_token": "A2", "refresh_token": "R2", "expires_in": 60}),
        );

        let token = refresh_token(&client, &config, "R1").await.unwrap();
        assert_eq!(token.access_token.expose_secret(), "A2");
        assert_eq!(token.refresh_token_str(), "R2");

        let requests = client.take_requests();
        assert_eq!(requests[0].uri(), "https://login.example.com/refresh");
        let pairs = form_pairs(&requests[0]);
        assert!(pairs.contains(&("grant_type".to_owned(), "refresh_token".to_owned())));
        assert!(pairs.contains(&("refresh_token".to_owned(), "R1".to_owned())));
        assert!(pairs.contains(&("client_secret".to_owned(), "CLIENT_SECRET".to_owned())));
    }

    /// Answers refreshes from a canned body, recording the refresh token it saw.
    struct CannedRefresh {
        seen: Arc<std::sync::Mutex<Vec<String>>>,
        response: Value,
    }

    impl RefreshResponseFetcher for CannedRefresh {
        fn fetch_refresh_response<'a>(
            &'a self,
            _config: &'a ProviderConfig,
            refresh_token: &'a str,
        ) -> BoxFuture<'a, Result<Value, BoxedError>> {
            Box::pin(async move {
                self.seen.lock().unwrap().push(refresh_token.to_owned());
                Ok(self.response.clone())
            })
        }
    }

    #[tokio::test]
    async fn refresh_hook_replaces_generic_request() {
        let seen: Arc<std::sync::Mutex<Vec<String>>> = Arc::default();
        let config = config().with_refresh_response_fetcher(CannedRefresh {
            seen: Arc::clone(&seen),
            response: json!({"code": 0, "access_token": "A2"}),
        });
        let client = MockHttpClient::new();

        let token = refresh_token(&client, &config, "R1").await.unwrap();

        assert_eq!(token.access_token.expose_secret(), "A2");
        assert_eq!(*seen.lock().unwrap(), vec!["R1"]);
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn refresh_hook_responses_get_the_envelope_check() {
        let config = config().with_refresh_response_fetcher(CannedRefresh {
            seen: Arc::default(),
            response: json!({"code": 20037, "message": "refresh token expired"}),
        });
        let client = MockHttpClient::new();

        let err = refresh_token(&client, &config, "R1").await.unwrap_err();

        assert!(matches!(
            err,
            TokenExchangeError::Rejected { code: 20037, ref message } if message == "refresh token expired"
        ));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn refresh_falls_back_to_token_endpoint() {
        let client =
            MockHttpClient::new().respond_json(StatusCode::OK, json!({"access_token": "A2"}));

        refresh_token(&client, &config(), "R1").await.unwrap();
        assert_eq!(
            client.take_requests()[0].uri(),
            "https://login.example.com/token"
        );
    }
}
