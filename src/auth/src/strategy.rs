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

//! Choose between Workload Identity Federation and static credentials.
//!
//! Federation is selected only when all five federation inputs are present.
//! A partial federation configuration falls back to static credentials, the
//! [Selection] reports which inputs were present so callers can warn about it.

use crate::constants::inputs;
use crate::inputs::Inputs;

/// The inputs used by Workload Identity Federation.
#[derive(Clone, Default, PartialEq)]
pub struct FederationInputs {
    /// The OIDC token issued by the CI system.
    pub identity_token: String,
    /// The number (not the id) of the project hosting the identity pool.
    pub project_number: String,
    pub pool_id: String,
    pub provider_id: String,
    /// The service account impersonated with the federated token.
    pub service_account_email: String,
}

impl FederationInputs {
    pub fn from_inputs(inputs: &Inputs) -> Self {
        Self {
            identity_token: inputs.lookup(&[inputs::OIDC_TOKEN_ID]),
            project_number: inputs.lookup(&[inputs::PROJECT_NUMBER]),
            pool_id: inputs.lookup(&[inputs::POOL_ID]),
            provider_id: inputs.lookup(&[inputs::PROVIDER_ID]),
            service_account_email: inputs.lookup(&[inputs::SERVICE_ACCOUNT_EMAIL]),
        }
    }

    fn fields(&self) -> [(&'static str, &str); 5] {
        [
            (inputs::OIDC_TOKEN_ID, &self.identity_token),
            (inputs::PROJECT_NUMBER, &self.project_number),
            (inputs::POOL_ID, &self.pool_id),
            (inputs::PROVIDER_ID, &self.provider_id),
            (inputs::SERVICE_ACCOUNT_EMAIL, &self.service_account_email),
        ]
    }

    /// Returns `true` if all five inputs are non-empty.
    pub fn is_complete(&self) -> bool {
        self.fields().iter().all(|(_, v)| !v.is_empty())
    }

    /// The names of the inputs with a non-empty value.
    pub fn present(&self) -> Vec<&'static str> {
        self.fields()
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(name, _)| *name)
            .collect()
    }

    /// The STS audience, the full resource name of the identity provider.
    pub fn audience(&self) -> String {
        format!(
            "//iam.googleapis.com/projects/{}/locations/global/workloadIdentityPools/{}/providers/{}",
            self.project_number, self.pool_id, self.provider_id
        )
    }
}

impl std::fmt::Debug for FederationInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederationInputs")
            .field("identity_token", &"[censored]")
            .field("project_number", &self.project_number)
            .field("pool_id", &self.pool_id)
            .field("provider_id", &self.provider_id)
            .field("service_account_email", &self.service_account_email)
            .finish()
    }
}

/// The inputs used with static credentials.
#[derive(Clone, Default, PartialEq)]
pub struct StaticInputs {
    /// The JSON key or legacy token, possibly base64 encoded.
    pub secret: String,
    /// If set, the secret is a credentials JSON exchanged for an access token.
    pub workload_identity: bool,
}

impl StaticInputs {
    pub fn from_inputs(inputs: &Inputs) -> Self {
        Self {
            secret: inputs.lookup(&inputs::JSON_KEY),
            workload_identity: inputs.lookup_bool(&[inputs::WORKLOAD_IDENTITY], false),
        }
    }
}

impl std::fmt::Debug for StaticInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticInputs")
            .field("secret", &"[censored]")
            .field("workload_identity", &self.workload_identity)
            .finish()
    }
}

/// The credential strategy for one invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum Strategy {
    Federated(FederationInputs),
    Static(StaticInputs),
}

/// The result of [select].
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub strategy: Strategy,
    /// The federation inputs that were present when federation was not
    /// selected. Empty when federation was selected or not configured at all.
    pub partial: Vec<&'static str>,
}

/// Selects the credential strategy.
pub fn select(inputs: &Inputs) -> Selection {
    let federation = FederationInputs::from_inputs(inputs);
    if federation.is_complete() {
        return Selection {
            strategy: Strategy::Federated(federation),
            partial: Vec::new(),
        };
    }
    Selection {
        partial: federation.present(),
        strategy: Strategy::Static(StaticInputs::from_inputs(inputs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn federation_inputs() -> Inputs {
        Inputs::from_iter([
            (inputs::OIDC_TOKEN_ID, "test-id-token"),
            (inputs::PROJECT_NUMBER, "123456"),
            (inputs::POOL_ID, "test-pool"),
            (inputs::PROVIDER_ID, "test-provider"),
            (inputs::SERVICE_ACCOUNT_EMAIL, "sa@test-project.iam.gserviceaccount.com"),
        ])
    }

    #[test]
    fn all_present_selects_federation() {
        let selection = select(&federation_inputs());
        assert!(selection.partial.is_empty(), "{selection:?}");
        let Strategy::Federated(federation) = selection.strategy else {
            panic!("expected federation, got {selection:?}");
        };
        assert_eq!(federation.identity_token, "test-id-token");
        assert_eq!(federation.project_number, "123456");
        assert_eq!(
            federation.service_account_email,
            "sa@test-project.iam.gserviceaccount.com"
        );
    }

    #[test_case(inputs::OIDC_TOKEN_ID)]
    #[test_case(inputs::PROJECT_NUMBER)]
    #[test_case(inputs::POOL_ID)]
    #[test_case(inputs::PROVIDER_ID)]
    #[test_case(inputs::SERVICE_ACCOUNT_EMAIL)]
    fn any_missing_selects_static(missing: &str) {
        let inputs = federation_inputs().with(missing, "");
        let selection = select(&inputs);
        assert!(
            matches!(selection.strategy, Strategy::Static(_)),
            "{selection:?}"
        );
        assert_eq!(selection.partial.len(), 4, "{selection:?}");
        assert!(!selection.partial.contains(&missing), "{selection:?}");
    }

    #[test]
    fn nothing_present_is_not_partial() {
        let inputs = Inputs::from_iter([(inputs::REPO, "test-repo")]);
        let selection = select(&inputs);
        assert!(selection.partial.is_empty(), "{selection:?}");
        assert_eq!(
            selection.strategy,
            Strategy::Static(StaticInputs::default())
        );
    }

    #[test]
    fn static_inputs() {
        let inputs = Inputs::from_iter([
            ("GOOGLE_CREDENTIALS", "from-google-credentials"),
            ("TOKEN", "from-token"),
            (inputs::WORKLOAD_IDENTITY, "true"),
        ]);
        let got = StaticInputs::from_inputs(&inputs);
        assert_eq!(got.secret, "from-google-credentials");
        assert!(got.workload_identity);

        let inputs = inputs.with(inputs::WORKLOAD_IDENTITY, "not-a-bool");
        assert!(!StaticInputs::from_inputs(&inputs).workload_identity);
    }

    #[test]
    fn audience() {
        let Strategy::Federated(federation) = select(&federation_inputs()).strategy else {
            panic!("expected federation");
        };
        assert_eq!(
            federation.audience(),
            "//iam.googleapis.com/projects/123456/locations/global/workloadIdentityPools/test-pool/providers/test-provider"
        );
    }

    #[test]
    fn debug_censors_secrets() {
        let Strategy::Federated(federation) = select(&federation_inputs()).strategy else {
            panic!("expected federation");
        };
        let got = format!("{federation:?}");
        assert!(!got.contains("test-id-token"), "{got}");
        assert!(got.contains("test-pool"), "{got}");

        let got = format!(
            "{:?}",
            StaticInputs {
                secret: "super-secret".to_string(),
                workload_identity: true,
            }
        );
        assert!(!got.contains("super-secret"), "{got}");
    }
}
