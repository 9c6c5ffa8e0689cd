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

//! Static credentials: a service account key or a legacy token.
//!
//! The secret may be base64 encoded. Without the workload identity flag the
//! (decoded) secret is the registry password, paired with the
//! [JSON_KEY_USERNAME] identity. With the flag the secret is a credentials
//! JSON, exchanged for an OAuth2 access token used as the password of the
//! [ACCESS_TOKEN_USERNAME] identity.

use crate::constants::{ACCESS_TOKEN_USERNAME, CLOUD_PLATFORM_SCOPE, JSON_KEY_USERNAME};
use crate::credentials::CredentialExchange;
use crate::errors::ResolveError;
use crate::resolver::RegistryCredential;
use crate::strategy::StaticInputs;
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{GeneralPurpose, general_purpose};

// Standard alphabet with padding, ignoring non-zero bits after the last
// decoded byte.
const SECRET_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    general_purpose::PAD.with_decode_allow_trailing_bits(true),
);

/// Decodes a base64 encoded secret.
///
/// Secrets that are not valid base64, or that do not decode to UTF-8 text, are
/// returned unchanged. Line breaks are ignored while decoding, they are common
/// in secrets produced by `base64` without `-w0`.
pub fn decode_secret(secret: &str) -> String {
    let compact: String = secret.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    match SECRET_ENGINE.decode(compact.as_bytes()) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(decoded) => {
                tracing::debug!("using base64 decoded secret");
                decoded
            }
            Err(_) => {
                tracing::debug!("base64 secret is not UTF-8, using it verbatim");
                secret.to_string()
            }
        },
        Err(_) => {
            tracing::debug!("secret is not base64 encoded, using it verbatim");
            secret.to_string()
        }
    }
}

/// Resolves the registry credential for static inputs.
///
/// An OAuth2 exchange failure is returned as [ResolveError::OAuthExchange].
/// An empty secret without the workload identity flag resolves to
/// [RegistryCredential::Anonymous].
pub async fn resolve(
    inputs: &StaticInputs,
    exchange: &dyn CredentialExchange,
) -> Result<RegistryCredential, ResolveError> {
    let secret = decode_secret(&inputs.secret);
    if inputs.workload_identity {
        tracing::debug!("exchanging credentials JSON for an access token");
        let token = exchange
            .exchange_oauth_token(&secret, CLOUD_PLATFORM_SCOPE)
            .await
            .map_err(|source| ResolveError::OAuthExchange { source })?;
        return Ok(RegistryCredential::UsernamePassword {
            username: ACCESS_TOKEN_USERNAME.to_string(),
            password: token.token,
        });
    }
    if secret.is_empty() {
        tracing::warn!("no registry credentials configured, the build tool runs without them");
        return Ok(RegistryCredential::Anonymous);
    }
    Ok(RegistryCredential::UsernamePassword {
        username: JSON_KEY_USERNAME.to_string(),
        password: secret,
    })
}
