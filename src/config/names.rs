//! Provider-specific spellings of protocol parameters and response fields.
//!
//! Every member left empty is filled with the `OAuth2` convention by
//! `apply_defaults`, so a provider only spells out where it deviates.

use bon::Builder;
use serde::Deserialize;

fn default_if_empty(value: &mut String, default: &str) {
    if value.is_empty() {
        default.clone_into(value);
    }
}

/// Query parameter names used in the authorization request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder, Deserialize)]
#[serde(default)]
pub struct RequestParameterNames {
    /// Name of the client ID parameter. Default `client_id`.
    #[builder(into, default)]
    pub client_id: String,
    /// Name of the client secret parameter. Default `client_secret`.
    #[builder(into, default)]
    pub client_secret: String,
    /// Name of the redirect URI parameter. Default `redirect_uri`.
    #[builder(into, default)]
    pub redirect_uri: String,
    /// Name of the response type parameter. Default `response_type`.
    #[builder(into, default)]
    pub response_type: String,
    /// Name of the scope parameter. Default `scope`.
    #[builder(into, default)]
    pub scope: String,
    /// Name of the state parameter. Default `state`.
    #[builder(into, default)]
    pub state: String,
}

impl RequestParameterNames {
    /// Fills every empty name with its conventional default.
    pub fn apply_defaults(&mut self) {
        default_if_empty(&mut self.client_id, "client_id");
        default_if_empty(&mut self.client_secret, "client_secret");
        default_if_empty(&mut self.redirect_uri, "redirect_uri");
        default_if_empty(&mut self.response_type, "response_type");
        default_if_empty(&mut self.scope, "scope");
        default_if_empty(&mut self.state, "state");
    }
}

/// Field paths into the token response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder, Deserialize)]
#[serde(default)]
pub struct TokenFieldPaths {
    /// Path of the access token. Default `access_token`.
    #[builder(into, default)]
    pub access_token: String,
    /// Path of the refresh token. Default `refresh_token`.
    #[builder(into, default)]
    pub refresh_token: String,
    /// Path of the lifetime in seconds. Default `expires_in`.
    #[builder(into, default)]
    pub expires_in: String,
    /// Path of the token type. Default `token_type`.
    #[builder(into, default)]
    pub token_type: String,
}

impl TokenFieldPaths {
    /// Fills every empty path with its conventional default.
    pub fn apply_defaults(&mut self) {
        default_if_empty(&mut self.access_token, "access_token");
        default_if_empty(&mut self.refresh_token, "refresh_token");
        default_if_empty(&mut self.expires_in, "expires_in");
        default_if_empty(&mut self.token_type, "token_type");
    }
}

/// Field paths into the user-info response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder, Deserialize)]
#[serde(default)]
pub struct ProfileFieldPaths {
    /// Path of the stable user identifier. Default `id`.
    #[builder(into, default)]
    pub id: String,
    /// Path of the email address. Default `email`.
    #[builder(into, default)]
    pub email: String,
    /// Path of the login name. Default `username`.
    #[builder(into, default)]
    pub username: String,
    /// Path of the display name. Default `nickname`.
    #[builder(into, default)]
    pub nickname: String,
    /// Path of the avatar URL. Default `avatar`.
    #[builder(into, default)]
    pub avatar: String,
    /// Path of the homepage URL. Default `homepage`.
    #[builder(into, default)]
    pub homepage: String,
    /// Path of the permission list. Default `permissions`.
    #[builder(into, default)]
    pub permissions: String,
    /// Path of the group list. Default `groups`.
    #[builder(into, default)]
    pub groups: String,
}

impl ProfileFieldPaths {
    /// Fills every empty path with its conventional default.
    pub fn apply_defaults(&mut self) {
        default_if_empty(&mut self.id, "id");
        default_if_empty(&mut self.email, "email");
        default_if_empty(&mut self.username, "username");
        default_if_empty(&mut self.nickname, "nickname");
        default_if_empty(&mut self.avatar, "avatar");
        default_if_empty(&mut self.homepage, "homepage");
        default_if_empty(&mut self.permissions, "permissions");
        default_if_empty(&mut self.groups, "groups");
    }
}
