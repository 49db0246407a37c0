use secrecy::{ExposeSecret, SecretString, zeroize::Zeroize};
use serde::{Deserialize, Serialize};

/// An `OAuth2` access token.
///
/// May be empty when a provider's token response did not carry one at the
/// configured path.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// Returns true if the provider gave no access token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }
}

impl Serialize for AccessToken {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.expose_secret())
    }
}

impl Zeroize for AccessToken {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl From<&str> for AccessToken {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl ExposeSecret<str> for AccessToken {
    fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}
