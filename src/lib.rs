//! Implements a generic `OAuth2` authorization-code login client.

#![forbid(unsafe_code)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod config;
mod envelope;
mod error;
pub mod exchange;
pub mod field;
pub mod http;
pub mod registry;
pub mod token;
pub mod user;

pub use client::{CallbackError, Client};
pub use config::ProviderConfig;
pub use envelope::CODE_EXPIRED;
pub use error::{BoxedError, Error};
pub use registry::{ProviderRegistry, RegistryError};
pub use token::Token;
pub use user::User;

/// Documentation
pub mod _documentation {
    #[doc = include_str!("../README.md")]
    mod readme {}
}

/// Re-export of parts of the `secrecy` crate.
pub mod secrecy {
    pub use ::secrecy::{ExposeSecret, SecretString};
}

pub use bytes::Bytes;
