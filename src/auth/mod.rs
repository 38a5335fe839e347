//! Identity session
//!
//! Authentication is a single async call resolving to exactly one tagged
//! outcome: a bearer token or a structured [`AuthError`]. There is no retry,
//! no refresh, and no timeout; an unresponsive provider stalls the caller.

pub mod cognito;
pub mod mock;

use crate::error::AuthError;
use std::future::Future;

pub use cognito::CognitoProvider;
pub use mock::{MockIdentityProvider, ProviderCall};

/// The single tagged outcome of an authentication attempt
pub type AuthOutcome = std::result::Result<BearerToken, AuthError>;

/// Username and password presented to the identity provider
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// A non-empty access token issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wraps a raw token string
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Malformed`] when the token is empty.
    pub fn new(raw: impl Into<String>) -> std::result::Result<Self, AuthError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(AuthError::Malformed("empty access token".to_string()));
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Identity providers that can exchange credentials for a bearer token
///
/// Implementations must fold every failure mode into the returned
/// [`AuthOutcome`]; the call never panics.
pub trait IdentityProvider: Send + Sync {
    fn authenticate<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> impl Future<Output = AuthOutcome> + Send + 'a;
}

/// Session wrapper around an identity provider
///
/// One session performs at most one successful token exchange for the
/// process lifetime; callers wanting retry must call again themselves.
pub struct AuthSession<P> {
    provider: P,
}

impl<P: IdentityProvider> AuthSession<P> {
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Exchanges credentials for a bearer token
    ///
    /// Resolves exactly once. A success always carries a non-empty token;
    /// every failure is a structured [`AuthError`] value.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`AuthError`] unchanged.
    pub async fn authenticate(&self, credentials: &Credentials) -> AuthOutcome {
        self.provider.authenticate(credentials).await
    }
}
