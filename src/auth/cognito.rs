//! Cognito identity provider
//!
//! Performs the `InitiateAuth` round trip with the `USER_PASSWORD_AUTH`
//! flow against the pool's regional endpoint. One request, one outcome;
//! challenge flows (MFA, forced password change) are not negotiated and
//! surface as malformed-response errors.

use crate::auth::{AuthOutcome, BearerToken, Credentials, IdentityProvider};
use crate::config::UserPool;
use crate::constants::cognito;
use crate::error::{AuthError, Result, SensorError};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Identity provider backed by a Cognito user pool
pub struct CognitoProvider {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
}

impl CognitoProvider {
    /// Creates a provider for the pool's regional endpoint
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(pool: &UserPool, client_id: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(pool.endpoint(), client_id)
    }

    /// Creates a provider against an explicit endpoint URL
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn with_endpoint(endpoint: impl Into<String>, client_id: impl Into<String>) -> Result<Self> {
        // No request timeout: an unresponsive provider stalls the caller
        // until it answers or the connection drops.
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SensorError::Auth(AuthError::Request(format!("HTTP client: {e}"))))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            client_id: client_id.into(),
        })
    }
}

impl IdentityProvider for CognitoProvider {
    fn authenticate<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> impl Future<Output = AuthOutcome> + Send + 'a {
        async move {
            let request = InitiateAuthRequest {
                auth_flow: cognito::AUTH_FLOW,
                client_id: &self.client_id,
                auth_parameters: AuthParameters {
                    username: &credentials.username,
                    password: &credentials.password,
                },
            };
            let body = serde_json::to_vec(&request)
                .map_err(|e| AuthError::Request(format!("failed to encode request: {e}")))?;

            let response = self
                .http
                .post(&self.endpoint)
                .header(reqwest::header::CONTENT_TYPE, cognito::CONTENT_TYPE)
                .header("X-Amz-Target", cognito::INITIATE_AUTH_TARGET)
                .body(body)
                .send()
                .await
                .map_err(|e| AuthError::Request(e.to_string()))?;

            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| AuthError::Request(e.to_string()))?;

            if status.is_success() {
                decode_token(&text)
            } else {
                Err(decode_failure(status.as_u16(), &text))
            }
        }
    }
}

#[derive(Serialize)]
struct InitiateAuthRequest<'a> {
    #[serde(rename = "AuthFlow")]
    auth_flow: &'static str,
    #[serde(rename = "ClientId")]
    client_id: &'a str,
    #[serde(rename = "AuthParameters")]
    auth_parameters: AuthParameters<'a>,
}

#[derive(Serialize)]
struct AuthParameters<'a> {
    #[serde(rename = "USERNAME")]
    username: &'a str,
    #[serde(rename = "PASSWORD")]
    password: &'a str,
}

#[derive(Deserialize)]
struct InitiateAuthResponse {
    #[serde(rename = "AuthenticationResult")]
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Deserialize)]
struct AuthenticationResult {
    #[serde(rename = "AccessToken")]
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct ProviderFailure {
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(rename = "message", alias = "Message")]
    message: Option<String>,
}

fn decode_token(body: &str) -> AuthOutcome {
    let response: InitiateAuthResponse =
        serde_json::from_str(body).map_err(|e| AuthError::Malformed(e.to_string()))?;
    let token = response
        .authentication_result
        .and_then(|result| result.access_token)
        .ok_or_else(|| AuthError::Malformed("response carried no access token".to_string()))?;
    BearerToken::new(token)
}

fn decode_failure(status: u16, body: &str) -> AuthError {
    match serde_json::from_str::<ProviderFailure>(body) {
        Ok(failure) => AuthError::Rejected {
            kind: failure.kind.unwrap_or_else(|| format!("HTTP {status}")),
            message: failure.message.unwrap_or_default(),
        },
        Err(_) => AuthError::Malformed(format!("HTTP {status}: {body}")),
    }
}
