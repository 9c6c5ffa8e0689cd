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

//! [Service account impersonation] with a federated token.
//!
//! The federated token returned by the Security Token Service has limited
//! permissions. It is presented to the IAM Credentials API to obtain an access
//! token for a service account the workload identity pool is allowed to
//! impersonate.
//!
//! [Service account impersonation]: https://cloud.google.com/iam/docs/service-account-impersonation

use crate::Result;
use crate::errors;
use crate::token::Token;
use http::header::AUTHORIZATION;
use std::time::{Duration, Instant};
use time::OffsetDateTime;

const MSG: &str = "failed to generate an access token for the service account";

#[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
struct GenerateAccessTokenRequest {
    scope: Vec<String>,
    lifetime: String,
}

#[derive(serde::Deserialize)]
struct GenerateAccessTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "expireTime")]
    expire_time: String,
}

/// The `generateAccessToken` URL for `service_account_email`.
pub fn generate_access_token_url(root: &str, service_account_email: &str) -> String {
    format!(
        "{}/v1/projects/-/serviceAccounts/{service_account_email}:generateAccessToken",
        root.trim_end_matches('/')
    )
}

pub(crate) async fn generate_access_token(
    client: &reqwest::Client,
    url: &str,
    federated_token: &str,
    scopes: Vec<String>,
    lifetime: Duration,
) -> Result<Token> {
    let body = GenerateAccessTokenRequest {
        scope: scopes,
        lifetime: format!("{}s", lifetime.as_secs_f64()),
    };

    tracing::debug!("requesting impersonated access token from {url}");
    let response = client
        .post(url)
        .header(AUTHORIZATION, format!("Bearer {federated_token}"))
        .json(&body)
        .send()
        .await
        .map_err(|e| errors::from_http_error(e, MSG))?;

    if !response.status().is_success() {
        return Err(errors::from_http_response(response, MSG).await);
    }

    let token_response = response
        .json::<GenerateAccessTokenResponse>()
        .await
        .map_err(|e| errors::from_http_error(e, MSG))?;

    let parsed_dt = OffsetDateTime::parse(
        &token_response.expire_time,
        &time::format_description::well_known::Rfc3339,
    )
    .map_err(errors::non_retryable)?;

    // A token that already expired, or an expiration time in the past due to
    // clock skew, is reported as expiring now.
    let remaining = Duration::try_from(parsed_dt - OffsetDateTime::now_utc()).unwrap_or_default();
    Ok(Token::bearer(
        token_response.access_token,
        Instant::now().checked_add(remaining),
    ))
}
