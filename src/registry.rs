//! A name-keyed table of provider configurations.
//!
//! Build one [`ProviderRegistry`] at startup, register every provider the
//! deployment supports, and share it (e.g. in an `Arc` or application state)
//! with the request handlers that pick a provider by name.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use snafu::prelude::*;
use tracing::debug;

use crate::{
    client::Client,
    config::{ConfigError, ProviderConfig},
    http::HttpClient,
};

/// A registry operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RegistryError {
    /// The provider name was empty.
    #[snafu(display("Provider name must not be empty"))]
    EmptyProviderName,
    /// A provider is already registered under this name.
    #[snafu(display("Provider {name:?} is already registered"))]
    ProviderAlreadyRegistered {
        /// The name in use.
        name: String,
    },
    /// No provider is registered under this name.
    #[snafu(display("Provider {name:?} is not registered"))]
    ProviderNotFound {
        /// The name looked up.
        name: String,
    },
    /// The registered configuration cannot be used to build a client.
    #[snafu(display("Provider {name:?} is misconfigured"))]
    InvalidConfig {
        /// The provider's name.
        name: String,
        /// The underlying error.
        source: ConfigError,
    },
}

impl crate::Error for RegistryError {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Provider configurations by name.
///
/// Safe to share between threads; registration and lookup may race freely.
/// Entries are never removed.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: DashMap<String, Arc<ProviderConfig>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `config` under `name`.
    ///
    /// An empty [`ProviderConfig::name`] is set to `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyProviderName`] if `name` is empty and
    /// [`RegistryError::ProviderAlreadyRegistered`] if it is taken.
    pub fn register(
        &self,
        name: impl Into<String>,
        mut config: ProviderConfig,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        ensure!(!name.is_empty(), EmptyProviderNameSnafu);

        match self.providers.entry(name) {
            Entry::Occupied(entry) => ProviderAlreadyRegisteredSnafu {
                name: entry.key().clone(),
            }
            .fail(),
            Entry::Vacant(entry) => {
                if config.name.is_empty() {
                    config.name.clone_from(entry.key());
                }
                debug!(provider = %entry.key(), "provider registered");
                entry.insert(Arc::new(config));
                Ok(())
            }
        }
    }

    /// Looks up the configuration registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyProviderName`] if `name` is empty and
    /// [`RegistryError::ProviderNotFound`] if nothing is registered under it.
    pub fn get(&self, name: &str) -> Result<Arc<ProviderConfig>, RegistryError> {
        ensure!(!name.is_empty(), EmptyProviderNameSnafu);

        self.providers
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .context(ProviderNotFoundSnafu { name })
    }

    /// Builds a [`Client`] for the provider registered under `name`.
    ///
    /// # Errors
    ///
    /// As for [`ProviderRegistry::get`], plus [`RegistryError::InvalidConfig`] if
    /// the configuration does not validate.
    pub fn client<C: HttpClient>(
        &self,
        name: &str,
        http_client: C,
    ) -> Result<Client<C>, RegistryError> {
        let config = self.get(name)?;
        Client::from_shared(config, http_client).context(InvalidConfigSnafu { name })
    }

    /// Returns `true` if a provider is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// The registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    /// The number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{config::RequiredField, http::mock::MockHttpClient};

    fn config() -> ProviderConfig {
        ProviderConfig::builder()
            .authorize_url("https://login.example.com/authorize")
            .token_url("https://login.example.com/token")
            .user_info_url("https://login.example.com/user")
            .redirect_uri("https://abc.com/login/callback")
            .client_id("CLIENT_ID")
            .client_secret("CLIENT_SECRET")
            .build()
    }

    #[test]
    fn register_then_get() {
        let registry = ProviderRegistry::new();
        registry.register("p", config()).unwrap();

        let stored = registry.get("p").unwrap();
        assert_eq!(stored.name, "p");
        assert_eq!(stored.client_id, "CLIENT_ID");
        assert!(registry.contains("p"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn explicit_name_is_kept() {
        let registry = ProviderRegistry::new();
        let mut config = config();
        config.name = "GitHub".to_owned();
        registry.register("github", config).unwrap();

        assert_eq!(registry.get("github").unwrap().name, "GitHub");
    }

    #[test]
    fn duplicate_registration_fails() {
        let registry = ProviderRegistry::new();
        registry.register("p", config()).unwrap();

        let mut replacement = config();
        replacement.client_id = "OTHER".to_owned();
        assert_eq!(
            registry.register("p", replacement),
            Err(RegistryError::ProviderAlreadyRegistered {
                name: "p".to_owned()
            })
        );
        assert_eq!(registry.get("p").unwrap().client_id, "CLIENT_ID");
    }

    #[test]
    fn empty_and_missing_names() {
        let registry = ProviderRegistry::new();
        assert_eq!(
            registry.register("", config()),
            Err(RegistryError::EmptyProviderName)
        );
        assert_eq!(registry.get("").unwrap_err(), RegistryError::EmptyProviderName);
        assert_eq!(
            registry.get("missing").unwrap_err(),
            RegistryError::ProviderNotFound {
                name: "missing".to_owned()
            }
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn names_are_sorted() {
        let registry = ProviderRegistry::new();
        for name in ["slack", "github", "dingtalk"] {
            registry.register(name, config()).unwrap();
        }
        assert_eq!(registry.names(), vec!["dingtalk", "github", "slack"]);
    }

    #[test]
    fn client_builds_from_registered_config() {
        let registry = ProviderRegistry::new();
        registry.register("p", config()).unwrap();

        let client = registry.client("p", MockHttpClient::new()).unwrap();
        assert_eq!(client.config().name, "p");
        assert!(client.authorize("s").contains("state=s"));
    }

    #[test]
    fn client_reports_invalid_config() {
        let registry = ProviderRegistry::new();
        let mut config = config();
        config.redirect_uri.clear();
        registry.register("p", config).unwrap();

        let err = registry.client("p", MockHttpClient::new()).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InvalidConfig { ref source, .. }
                if source.field() == RequiredField::RedirectUri
        ));
    }

    #[test]
    fn concurrent_registration_admits_one_winner_per_name() {
        let registry = Arc::new(ProviderRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let shared = registry.register("shared", config()).is_ok();
                    registry.register(format!("p{i}"), config()).unwrap();
                    shared
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(registry.len(), 9);
        for i in 0..8 {
            assert!(registry.get(&format!("p{i}")).is_ok());
        }
    }
}
