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

//! Resolve the registry configuration for one invocation.
//!
//! [resolve] runs the whole pipeline: select the strategy, obtain the
//! credential, and normalize the repository. The result is built once and
//! never modified afterwards.

use crate::build_errors::Error as BuilderError;
use crate::constants::inputs;
use crate::credentials::CredentialExchange;
use crate::errors::ResolveError;
use crate::federation;
use crate::inputs::Inputs;
use crate::repository::Repository;
use crate::static_credentials;
use crate::strategy::{self, Strategy};

/// The credential presented to the registry.
///
/// The variants are exclusive: an access token is never published together
/// with a username and password.
#[derive(Clone, PartialEq)]
pub enum RegistryCredential {
    /// An impersonated access token, from Workload Identity Federation.
    AccessToken(String),
    /// A username and password, from static credentials.
    UsernamePassword { username: String, password: String },
    /// No credentials were configured.
    Anonymous,
}

impl std::fmt::Debug for RegistryCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessToken(_) => f.debug_tuple("AccessToken").field(&"[censored]").finish(),
            Self::UsernamePassword { username, .. } => f
                .debug_struct("UsernamePassword")
                .field("username", username)
                .field("password", &"[censored]")
                .finish(),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// The resolved registry configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfig {
    pub repository: Repository,
    pub credential: RegistryCredential,
    /// The workload identity flag of the static strategy, `false` with
    /// federation.
    pub workload_identity: bool,
}

impl ResolvedConfig {
    pub fn repo(&self) -> &str {
        &self.repository.repo
    }

    pub fn registry(&self) -> &str {
        &self.repository.registry
    }

    /// The registry username, empty unless static credentials are used.
    pub fn username(&self) -> &str {
        match &self.credential {
            RegistryCredential::UsernamePassword { username, .. } => username,
            _ => "",
        }
    }

    /// The registry password, empty unless static credentials are used.
    pub fn password(&self) -> &str {
        match &self.credential {
            RegistryCredential::UsernamePassword { password, .. } => password,
            _ => "",
        }
    }

    /// The impersonated access token, empty unless federation is used.
    pub fn access_token(&self) -> &str {
        match &self.credential {
            RegistryCredential::AccessToken(token) => token,
            _ => "",
        }
    }
}

/// Resolves the registry configuration from `inputs`.
///
/// The repository is validated before any exchange is attempted. Exchange
/// failures on either strategy are returned as errors, there is no fallback
/// from federation to static credentials.
///
/// # Example
/// ```
/// # use gcr_auth::inputs::Inputs;
/// # use gcr_auth::resolver::resolve;
/// # async fn sample() -> Result<(), Box<dyn std::error::Error>> {
/// let inputs = Inputs::from_iter([("PLUGIN_REPO", "myorg/app"), ("PLUGIN_JSON_KEY", "secret")]);
/// let exchange = gcr_auth::credentials::Builder::new().build()?;
/// let config = resolve(&inputs, &exchange).await?;
/// assert_eq!(config.repo(), "gcr.io/myorg/app");
/// assert_eq!(config.username(), "_json_key");
/// # Ok(()) }
/// ```
pub async fn resolve(
    inputs: &Inputs,
    exchange: &dyn CredentialExchange,
) -> Result<ResolvedConfig, ResolveError> {
    let repo = inputs.lookup(&[inputs::REPO]);
    if repo.is_empty() {
        return Err(BuilderError::missing_field(inputs::REPO).into());
    }

    let selection = strategy::select(inputs);
    if !selection.partial.is_empty() {
        tracing::warn!(
            "incomplete workload identity federation configuration, using static credentials (present: {})",
            selection.partial.join(", ")
        );
    }
    let (credential, workload_identity) = match selection.strategy {
        Strategy::Federated(federation) => {
            tracing::info!(
                "using workload identity federation for {}",
                federation.service_account_email
            );
            let token = federation::exchange(&federation, exchange).await?;
            (RegistryCredential::AccessToken(token.token), false)
        }
        Strategy::Static(credentials) => {
            tracing::info!(
                "using static credentials (workload_identity={})",
                credentials.workload_identity
            );
            let credential = static_credentials::resolve(&credentials, exchange).await?;
            (credential, credentials.workload_identity)
        }
    };

    let repository = Repository::normalize(&repo, &inputs.lookup(&[inputs::REGISTRY]));
    Ok(ResolvedConfig {
        repository,
        credential,
        workload_identity,
    })
}
