//! Earthdata bearer tokens for the JPL archive.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use sst_common::{SstError, SstResult};

pub const EARTHDATA_TOKEN: &str = "EARTHDATA_TOKEN";
pub const EARTHDATA_USERNAME: &str = "EARTHDATA_USERNAME";
pub const EARTHDATA_PASSWORD: &str = "EARTHDATA_PASSWORD";

/// Earthdata Login endpoint that returns an existing token or creates one.
pub const EARTHDATA_TOKEN_URL: &str = "https://urs.earthdata.nasa.gov/api/users/find_or_create_token";

/// Supplies the bearer token sent with remote source requests.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn bearer_token(&self) -> SstResult<String>;
}

/// `Authorization` header for a bearer token.
pub fn bearer_headers(token: &str) -> Vec<(String, String)> {
    vec![("Authorization".to_string(), format!("Bearer {}", token))]
}

/// A fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn bearer_token(&self) -> SstResult<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Earthdata credentials: a token, or a username and password exchanged for
/// one on first use. Missing configuration is reported when a token is
/// needed, not at construction, so runs against local input need none.
pub struct EarthdataCredentials {
    token: Option<String>,
    username: Option<String>,
    password: Option<String>,
    token_url: String,
    client: Client,
    exchanged: OnceCell<String>,
}

impl EarthdataCredentials {
    pub fn new(token: Option<String>, username: Option<String>, password: Option<String>) -> Self {
        Self {
            token,
            username,
            password,
            token_url: EARTHDATA_TOKEN_URL.to_string(),
            client: Client::new(),
            exchanged: OnceCell::new(),
        }
    }

    pub fn from_env() -> Self {
        let var = |key: &str| env::var(key).ok().filter(|v| !v.is_empty());
        Self::new(
            var(EARTHDATA_TOKEN),
            var(EARTHDATA_USERNAME),
            var(EARTHDATA_PASSWORD),
        )
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Check that enough is configured to obtain a token.
    pub fn validate(&self) -> SstResult<()> {
        if self.token.is_none() && self.password.is_none() {
            return Err(SstError::Configuration(format!(
                "Please set one of {} or {} environment variables",
                EARTHDATA_TOKEN, EARTHDATA_PASSWORD
            )));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(SstError::Configuration(format!(
                "Please set {} environment variable",
                EARTHDATA_USERNAME
            )));
        }
        Ok(())
    }

    async fn exchange(&self, username: &str, password: &str) -> SstResult<String> {
        info!(username = %username, "Exchanging Earthdata credentials for a token");

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(|e| SstError::Authentication(format!("Earthdata login request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SstError::Authentication(format!(
                "Failed to authenticate with Earthdata: HTTP {}",
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            SstError::Authentication(format!("Unexpected Earthdata token response: {}", e))
        })?;
        debug!("Obtained Earthdata token");
        Ok(token.access_token)
    }
}

#[async_trait]
impl CredentialProvider for EarthdataCredentials {
    async fn bearer_token(&self) -> SstResult<String> {
        self.validate()?;

        if let Some(token) = &self.token {
            return Ok(token.clone());
        }

        // validate() guarantees both are present here
        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            return Err(SstError::missing_config(EARTHDATA_USERNAME));
        };
        self.exchanged
            .get_or_try_init(|| self.exchange(username, password))
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_configured() {
        let creds = EarthdataCredentials::new(None, None, None);
        let err = creds.validate().unwrap_err();
        assert!(matches!(err, SstError::Configuration(_)));
        assert!(err.to_string().contains("EARTHDATA_TOKEN"));
    }

    #[test]
    fn test_password_needs_username() {
        let creds = EarthdataCredentials::new(None, None, Some("pw".into()));
        let err = creds.validate().unwrap_err();
        assert!(err.to_string().contains("EARTHDATA_USERNAME"));
    }

    #[tokio::test]
    async fn test_token_used_directly() {
        let creds = EarthdataCredentials::new(Some("abc".into()), None, None);
        assert_eq!(creds.bearer_token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_failed_exchange_is_authentication_error() {
        let creds = EarthdataCredentials::new(None, Some("user".into()), Some("pw".into()))
            .with_token_url("http://127.0.0.1:9/token");
        let err = creds.bearer_token().await.unwrap_err();
        assert!(matches!(err, SstError::Authentication(_)));
    }

    #[test]
    fn test_bearer_header() {
        assert_eq!(
            bearer_headers("t"),
            vec![("Authorization".to_string(), "Bearer t".to_string())]
        );
    }
}
