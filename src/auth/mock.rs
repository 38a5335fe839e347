//! Mock identity provider for testing
//!
//! Records every authentication attempt and answers with a configured
//! outcome, so session and orchestrator tests run without a real user pool.

use crate::auth::{AuthOutcome, BearerToken, Credentials, IdentityProvider};
use crate::error::AuthError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Mock identity provider
#[derive(Clone)]
pub struct MockIdentityProvider {
    state: Arc<MockState>,
}

struct MockState {
    /// Recorded authentication attempts for verification
    calls: Mutex<Vec<ProviderCall>>,
    /// Configured outcome for authenticate calls
    outcome: RwLock<AuthOutcome>,
}

/// Record of one authentication attempt
#[derive(Debug, Clone)]
pub struct ProviderCall {
    pub username: String,
    pub password: String,
}

impl MockIdentityProvider {
    /// Creates a mock that issues the given token
    #[must_use]
    pub fn issuing(token: &str) -> Self {
        Self::with_outcome(BearerToken::new(token))
    }

    /// Creates a mock that rejects every attempt
    #[must_use]
    pub fn rejecting(kind: &str, message: &str) -> Self {
        Self::with_outcome(Err(AuthError::Rejected {
            kind: kind.to_string(),
            message: message.to_string(),
        }))
    }

    /// Creates a mock with an explicit outcome
    #[must_use]
    pub fn with_outcome(outcome: AuthOutcome) -> Self {
        Self {
            state: Arc::new(MockState {
                calls: Mutex::new(Vec::new()),
                outcome: RwLock::new(outcome),
            }),
        }
    }

    /// Replaces the configured outcome
    pub async fn set_outcome(&self, outcome: AuthOutcome) {
        *self.state.outcome.write().await = outcome;
    }

    /// Gets all recorded authentication attempts
    pub async fn calls(&self) -> Vec<ProviderCall> {
        self.state.calls.lock().await.clone()
    }

    /// Number of recorded authentication attempts
    pub async fn call_count(&self) -> usize {
        self.state.calls.lock().await.len()
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn authenticate<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> impl Future<Output = AuthOutcome> + Send + 'a {
        async move {
            self.state.calls.lock().await.push(ProviderCall {
                username: credentials.username.clone(),
                password: credentials.password.clone(),
            });

            self.state.outcome.read().await.clone()
        }
    }
}
