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

//! [User Account] credentials exchanged with a refresh token.
//!
//! An `authorized_user` credentials JSON, as created by
//! `gcloud auth application-default login`, holds an OAuth2 client and a
//! refresh token. The plugin uses the [refresh token grant] to obtain a single
//! access token.
//!
//! [User Account]: https://cloud.google.com/docs/authentication#user-accounts
//! [refresh token grant]: https://datatracker.ietf.org/doc/html/rfc6749#section-6

use crate::Result;
use crate::constants::REFRESH_TOKEN_GRANT_TYPE;
use crate::errors::{self, CredentialsError};
use crate::token::{Token, expires_in};

const MSG: &str = "failed to refresh user access token";

/// The fields of an `authorized_user` credentials JSON.
#[derive(Clone, PartialEq, serde::Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub quota_project_id: Option<String>,
}

impl std::fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[censored]")
            .field("refresh_token", &"[censored]")
            .field("token_uri", &self.token_uri)
            .field("quota_project_id", &self.quota_project_id)
            .finish()
    }
}

#[derive(serde::Serialize)]
struct Oauth2RefreshRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
    scope: &'a str,
}

#[derive(serde::Deserialize)]
struct Oauth2RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    token_type: String,
}

/// Exchanges the refresh token for an access token with `scope`.
///
/// The request goes to the user's `token_uri`, or `default_token_uri` when
/// the credentials do not have one.
pub(crate) async fn exchange(
    client: &reqwest::Client,
    user: &AuthorizedUser,
    scope: &str,
    default_token_uri: &str,
) -> Result<Token> {
    let token_uri = user.token_uri.as_deref().unwrap_or(default_token_uri);
    let req = Oauth2RefreshRequest {
        grant_type: REFRESH_TOKEN_GRANT_TYPE,
        client_id: &user.client_id,
        client_secret: &user.client_secret,
        refresh_token: &user.refresh_token,
        scope,
    };

    tracing::debug!("refreshing user access token at {token_uri}");
    let response = client
        .post(token_uri)
        .form(&req)
        .send()
        .await
        .map_err(|e| errors::from_http_error(e, MSG))?;
    if !response.status().is_success() {
        return Err(errors::from_http_response(response, MSG).await);
    }
    let response = response
        .json::<Oauth2RefreshResponse>()
        .await
        .map_err(|e| CredentialsError::new(false, MSG, e))?;
    Ok(Token {
        token: response.access_token,
        token_type: response.token_type,
        expires_at: response.expires_in.and_then(expires_in),
    })
}
