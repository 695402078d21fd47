//! HTTP client for the document store API.
//!
//! Two collaborator endpoints: the credential exchange that issues bearer
//! tokens, and the bulk fetch that returns the full catalog snapshot.
//!
//! Authentication failures are deliberately opaque. Whether the password was
//! wrong or the transport fell over, the caller sees one invalid-credentials
//! error; no detail from the transport is trusted or surfaced. The
//! underlying cause goes to the debug log only.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;
use crate::models::Document;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Thin wrapper over a configured `reqwest` client.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Exchange form-encoded credentials for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let response = match self
            .http
            .post(self.endpoint("token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "token request failed");
                bail!("invalid credentials");
            }
        };
        if !response.status().is_success() {
            debug!(status = %response.status(), "token request rejected");
            bail!("invalid credentials");
        }
        match response.json::<TokenResponse>().await {
            Ok(body) => Ok(body.access_token),
            Err(err) => {
                debug!(error = %err, "token response did not decode");
                bail!("invalid credentials");
            }
        }
    }

    /// Fetch the full catalog snapshot.
    pub async fn fetch_documents(&self, token: &str) -> Result<Vec<Document>> {
        let response = self
            .http
            .get(self.endpoint("documents"))
            .bearer_auth(token)
            .send()
            .await
            .context("requesting document catalog")?;
        if !response.status().is_success() {
            bail!(
                "document catalog request failed with status {}",
                response.status()
            );
        }
        response
            .json::<Vec<Document>>()
            .await
            .context("decoding document catalog")
    }
}
