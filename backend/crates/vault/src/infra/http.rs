//! HTTP Token Refresher
//!
//! `TokenRefresher` implementation calling the refresh endpoint with the
//! current credential as a bearer token. Used in client-cache deployments
//! that talk to the API directly.

use serde::Deserialize;

use kernel::token::CredentialToken;

use crate::domain::repository::TokenRefresher;
use crate::error::{VaultError, VaultResult};

/// Refresh endpoint response body
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    token: String,
}

/// Refreshes credentials over HTTP
#[derive(Clone)]
pub struct HttpTokenRefresher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTokenRefresher {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, current: &CredentialToken) -> VaultResult<CredentialToken> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(current.raw())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VaultError::RefreshFailed(format!(
                "refresh endpoint returned {}",
                response.status()
            )));
        }

        let body: RefreshResponse = response.json().await?;
        Ok(CredentialToken::parse(&body.token)?)
    }
}
