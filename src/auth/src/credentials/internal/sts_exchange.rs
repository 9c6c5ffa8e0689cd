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

use crate::Result;
use crate::constants::{
    ACCESS_TOKEN_TYPE, CLOUD_PLATFORM_SCOPE, ID_TOKEN_TYPE, TOKEN_EXCHANGE_GRANT_TYPE,
};
use crate::errors;
use crate::strategy::FederationInputs;
use crate::token::{Token, expires_in};
use serde::Deserialize;
use std::collections::HashMap;

const MSG: &str = "failed to exchange the subject token";

/// Handles OAuth2 Secure Token Service (STS) exchange.
/// Reference: https://datatracker.ietf.org/doc/html/rfc8693
pub(crate) struct STSHandler {
    client: reqwest::Client,
}

impl STSHandler {
    pub(crate) fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// performs an oauth2 token exchange with the provided [ExchangeTokenRequest] information.
    pub(crate) async fn exchange_token(&self, req: ExchangeTokenRequest) -> Result<Token> {
        let mut params: HashMap<&str, String> = HashMap::new();

        params.insert("grant_type", TOKEN_EXCHANGE_GRANT_TYPE.to_string());
        params.insert("requested_token_type", ACCESS_TOKEN_TYPE.to_string());

        params.insert("subject_token", req.subject_token);
        params.insert("subject_token_type", req.subject_token_type);

        if !req.scope.is_empty() {
            params.insert("scope", req.scope.join(" "));
        }
        if let Some(audience) = req.audience {
            params.insert("audience", audience);
        }

        let response = self.execute(&req.url, params).await?;
        tracing::debug!("issued token type: {:?}", response.issued_token_type);
        let expires_at = response.expires_in.and_then(expires_in);
        Ok(Token {
            token: response.access_token,
            token_type: response.token_type,
            expires_at,
        })
    }

    async fn execute(&self, url: &str, params: HashMap<&str, String>) -> Result<TokenResponse> {
        tracing::debug!("requesting token from {url}");
        let response = self
            .client
            .post(url)
            .form(&params)
            .send()
            .await
            .map_err(|e| errors::from_http_error(e, MSG))?;

        if !response.status().is_success() {
            return Err(errors::from_http_response(response, MSG).await);
        }
        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| errors::from_http_error(e, MSG))
    }
}

/// TokenResponse is used to decode the remote server response during
/// an oauth2 token exchange.
#[derive(Deserialize, Default, PartialEq, Debug)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    issued_token_type: Option<String>,
    token_type: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Information required to perform an oauth2 token exchange with the provided endpoint.
#[derive(Default)]
pub(crate) struct ExchangeTokenRequest {
    url: String,
    subject_token: String,
    subject_token_type: String,
    audience: Option<String>,
    scope: Vec<String>,
}

impl ExchangeTokenRequest {
    /// The request exchanging a CI identity token through a workload identity
    /// pool provider.
    pub(crate) fn federation(url: &str, federation: &FederationInputs) -> Self {
        Self {
            url: url.to_string(),
            subject_token: federation.identity_token.clone(),
            subject_token_type: ID_TOKEN_TYPE.to_string(),
            audience: Some(federation.audience()),
            scope: vec![CLOUD_PLATFORM_SCOPE.to_string()],
        }
    }
}
