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

//! Workload Identity Federation.
//!
//! The CI identity token is exchanged for a federated token, and the federated
//! token is used to impersonate a service account. The two steps run in order,
//! once, without retries. A failure in either step is reported with the
//! (non-secret) inputs used, the caller must not fall back to static
//! credentials.

use crate::credentials::CredentialExchange;
use crate::errors::ResolveError;
use crate::strategy::FederationInputs;
use crate::token::Token;

/// Runs both exchanges and returns the impersonated access token.
pub async fn exchange(
    federation: &FederationInputs,
    exchange: &dyn CredentialExchange,
) -> Result<Token, ResolveError> {
    tracing::debug!(
        "exchanging OIDC token with provider {}",
        federation.audience()
    );
    let federated = exchange
        .exchange_federated_token(federation)
        .await
        .map_err(|source| ResolveError::Federation {
            project_number: federation.project_number.clone(),
            pool_id: federation.pool_id.clone(),
            provider_id: federation.provider_id.clone(),
            service_account_email: federation.service_account_email.clone(),
            source,
        })?;

    tracing::debug!(
        "impersonating service account {}",
        federation.service_account_email
    );
    let token = exchange
        .exchange_access_token(&federated.token, &federation.service_account_email)
        .await
        .map_err(|source| ResolveError::Impersonation {
            service_account_email: federation.service_account_email.clone(),
            source,
        })?;
    tracing::debug!("received access token for {}", federation.service_account_email);
    Ok(token)
}
