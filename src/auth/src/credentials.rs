// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::build_errors::Error as BuilderError;
use crate::constants::{
    DEFAULT_TIMEOUT, DEFAULT_TOKEN_LIFETIME, IAM_CREDENTIALS_URL, OAUTH2_TOKEN_URL, STS_TOKEN_URL,
};
use crate::errors::CredentialsError;
use crate::strategy::FederationInputs;
use crate::token::Token;
use crate::{BuildResult, Result};
use serde_json::Value;
use std::time::Duration;

pub mod impersonated;
pub(crate) mod internal;
pub mod service_account;
pub mod user_account;

/// The remote and local token exchanges used to resolve registry credentials.
///
/// The resolver only depends on this trait. [GoogleExchange] implements it
/// with calls to the Google Cloud token endpoints, tests substitute mocks.
#[async_trait::async_trait]
pub trait CredentialExchange: std::fmt::Debug + Send + Sync {
    /// Exchanges the CI identity token for a federated token.
    async fn exchange_federated_token(&self, federation: &FederationInputs) -> Result<Token>;

    /// Uses a federated token to obtain an access token for a service account.
    async fn exchange_access_token(
        &self,
        federated_token: &str,
        service_account_email: &str,
    ) -> Result<Token>;

    /// Exchanges a credentials JSON for an OAuth2 access token with `scope`.
    async fn exchange_oauth_token(&self, credentials_json: &str, scope: &str) -> Result<Token>;
}

/// Exchanges credentials with the Google Cloud token endpoints.
///
/// All requests share one HTTP client. Requests time out after
/// [DEFAULT_TIMEOUT] unless configured otherwise with [Builder::with_timeout].
#[derive(Clone, Debug)]
pub struct GoogleExchange {
    client: reqwest::Client,
    sts_url: String,
    iam_credentials_url: String,
    oauth2_token_url: String,
    lifetime: Duration,
}

#[async_trait::async_trait]
impl CredentialExchange for GoogleExchange {
    async fn exchange_federated_token(&self, federation: &FederationInputs) -> Result<Token> {
        let req = internal::sts_exchange::ExchangeTokenRequest::federation(
            &self.sts_url,
            federation,
        );
        internal::sts_exchange::STSHandler::new(self.client.clone())
            .exchange_token(req)
            .await
    }

    async fn exchange_access_token(
        &self,
        federated_token: &str,
        service_account_email: &str,
    ) -> Result<Token> {
        let url = impersonated::generate_access_token_url(
            &self.iam_credentials_url,
            service_account_email,
        );
        impersonated::generate_access_token(
            &self.client,
            &url,
            federated_token,
            vec![crate::constants::CLOUD_PLATFORM_SCOPE.to_string()],
            self.lifetime,
        )
        .await
    }

    async fn exchange_oauth_token(&self, credentials_json: &str, scope: &str) -> Result<Token> {
        let credentials = parse_credentials(credentials_json)
            .map_err(|e| CredentialsError::from_source(false, e))?;
        match credentials {
            CredentialsFile::ServiceAccount(key) => {
                service_account::exchange(&self.client, &key, scope, &self.oauth2_token_url).await
            }
            CredentialsFile::AuthorizedUser(user) => {
                user_account::exchange(&self.client, &user, scope, &self.oauth2_token_url).await
            }
        }
    }
}

/// A builder for [GoogleExchange].
///
/// # Example
/// ```
/// # use gcr_auth::credentials::Builder;
/// # use std::time::Duration;
/// let exchange = Builder::new()
///     .with_timeout(Duration::from_secs(10))
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct Builder {
    sts_url: String,
    iam_credentials_url: String,
    oauth2_token_url: String,
    lifetime: Duration,
    timeout: Duration,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            sts_url: STS_TOKEN_URL.to_string(),
            iam_credentials_url: IAM_CREDENTIALS_URL.to_string(),
            oauth2_token_url: OAUTH2_TOKEN_URL.to_string(),
            lifetime: DEFAULT_TOKEN_LIFETIME,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the Security Token Service endpoint.
    pub fn with_sts_url<S: Into<String>>(mut self, v: S) -> Self {
        self.sts_url = v.into();
        self
    }

    /// Overrides the IAM Credentials service root, e.g.
    /// `https://iamcredentials.googleapis.com`.
    pub fn with_iam_credentials_url<S: Into<String>>(mut self, v: S) -> Self {
        self.iam_credentials_url = v.into();
        self
    }

    /// Overrides the OAuth2 token endpoint used when the credentials JSON does
    /// not include a `token_uri`.
    pub fn with_oauth2_token_url<S: Into<String>>(mut self, v: S) -> Self {
        self.oauth2_token_url = v.into();
        self
    }

    /// Sets the requested lifetime for impersonated access tokens.
    pub fn with_lifetime(mut self, v: Duration) -> Self {
        self.lifetime = v;
        self
    }

    /// Sets the timeout for each HTTP request.
    pub fn with_timeout(mut self, v: Duration) -> Self {
        self.timeout = v;
        self
    }

    pub fn build(self) -> BuildResult<GoogleExchange> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(BuilderError::transport)?;
        Ok(GoogleExchange {
            client,
            sts_url: self.sts_url,
            iam_credentials_url: self.iam_credentials_url,
            oauth2_token_url: self.oauth2_token_url,
            lifetime: self.lifetime,
        })
    }
}

/// The credentials JSON formats accepted for the local exchange.
#[derive(Debug)]
pub(crate) enum CredentialsFile {
    ServiceAccount(service_account::ServiceAccountKey),
    AuthorizedUser(user_account::AuthorizedUser),
}

pub(crate) fn parse_credentials(json: &str) -> BuildResult<CredentialsFile> {
    let js = serde_json::from_str::<Value>(json).map_err(BuilderError::parsing)?;
    let cred_type = js
        .get("type")
        .ok_or_else(|| BuilderError::parsing("no `type` field found."))?
        .as_str()
        .ok_or_else(|| BuilderError::parsing("`type` field is not a string."))?;
    match cred_type {
        "service_account" => serde_json::from_value(js)
            .map(CredentialsFile::ServiceAccount)
            .map_err(BuilderError::parsing),
        "authorized_user" => serde_json::from_value(js)
            .map(CredentialsFile::AuthorizedUser)
            .map_err(BuilderError::parsing),
        _ => Err(BuilderError::unknown_type(format!(
            "Invalid or unsupported credentials type found in JSON: {cred_type}"
        ))),
    }
}
