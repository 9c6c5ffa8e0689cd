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

//! The variables handed to the downstream build tool.
//!
//! A [Publication] is computed from a [ResolvedConfig]. It lists the variables
//! to set, and the credential variables of the other mode, which must be
//! removed so a stale value is never used. The library never modifies the
//! process environment, the caller applies the publication to the child
//! process.

use crate::constants::{REGISTRY_TYPE, outputs};
use crate::resolver::{RegistryCredential, ResolvedConfig};

/// The variables to publish.
#[derive(Clone, PartialEq)]
pub struct Publication {
    vars: Vec<(&'static str, String)>,
    cleared: Vec<&'static str>,
}

impl Publication {
    /// The variables to set, in publication order.
    pub fn vars(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.vars.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// The variables to remove.
    pub fn cleared(&self) -> &[&'static str] {
        &self.cleared
    }

    /// Returns the value published for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl From<&ResolvedConfig> for Publication {
    fn from(config: &ResolvedConfig) -> Self {
        let (mut vars, cleared) = match &config.credential {
            RegistryCredential::AccessToken(token) => (
                vec![(outputs::ACCESS_TOKEN, token.clone())],
                vec![outputs::DOCKER_USERNAME, outputs::DOCKER_PASSWORD],
            ),
            RegistryCredential::UsernamePassword { username, password } => (
                vec![
                    (outputs::DOCKER_USERNAME, username.clone()),
                    (outputs::DOCKER_PASSWORD, password.clone()),
                ],
                vec![outputs::ACCESS_TOKEN],
            ),
            RegistryCredential::Anonymous => (
                Vec::new(),
                vec![
                    outputs::ACCESS_TOKEN,
                    outputs::DOCKER_USERNAME,
                    outputs::DOCKER_PASSWORD,
                ],
            ),
        };
        vars.push((outputs::REPO, config.repo().to_string()));
        vars.push((outputs::REGISTRY, config.registry().to_string()));
        vars.push((outputs::REGISTRY_TYPE, REGISTRY_TYPE.to_string()));
        Self { vars, cleared }
    }
}

const SECRETS: [&str; 2] = [outputs::ACCESS_TOKEN, outputs::DOCKER_PASSWORD];

impl std::fmt::Debug for Publication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let vars = self
            .vars
            .iter()
            .map(|(k, v)| {
                let v = if SECRETS.contains(k) { "[censored]" } else { v.as_str() };
                (*k, v)
            })
            .collect::<Vec<_>>();
        f.debug_struct("Publication")
            .field("vars", &vars)
            .field("cleared", &self.cleared)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Repository;

    fn config(credential: RegistryCredential) -> ResolvedConfig {
        ResolvedConfig {
            repository: Repository::normalize("myorg/app", ""),
            credential,
            workload_identity: false,
        }
    }

    #[test]
    fn access_token() {
        let publication =
            Publication::from(&config(RegistryCredential::AccessToken("test-access-token".into())));
        assert_eq!(
            publication.vars().collect::<Vec<_>>(),
            vec![
                ("ACCESS_TOKEN", "test-access-token"),
                ("PLUGIN_REPO", "gcr.io/myorg/app"),
                ("PLUGIN_REGISTRY", "gcr.io"),
                ("PLUGIN_REGISTRY_TYPE", "GCR"),
            ]
        );
        assert_eq!(publication.cleared(), &["DOCKER_USERNAME", "DOCKER_PASSWORD"]);
        assert_eq!(publication.get("DOCKER_USERNAME"), None);
    }

    #[test]
    fn username_password() {
        let publication = Publication::from(&config(RegistryCredential::UsernamePassword {
            username: "_json_key".into(),
            password: "test-secret".into(),
        }));
        assert_eq!(publication.get("DOCKER_USERNAME"), Some("_json_key"));
        assert_eq!(publication.get("DOCKER_PASSWORD"), Some("test-secret"));
        assert_eq!(publication.get("ACCESS_TOKEN"), None);
        assert_eq!(publication.get("PLUGIN_REGISTRY_TYPE"), Some("GCR"));
        assert_eq!(publication.cleared(), &["ACCESS_TOKEN"]);
    }

    #[test]
    fn anonymous() {
        let publication = Publication::from(&config(RegistryCredential::Anonymous));
        let names = publication.vars().map(|(k, _)| k).collect::<Vec<_>>();
        assert_eq!(names, vec!["PLUGIN_REPO", "PLUGIN_REGISTRY", "PLUGIN_REGISTRY_TYPE"]);
        assert_eq!(publication.cleared().len(), 3);
    }

    #[test]
    fn debug_censors_secrets() {
        let publication = Publication::from(&config(RegistryCredential::UsernamePassword {
            username: "_json_key".into(),
            password: "test-secret".into(),
        }));
        let fmt = format!("{publication:?}");
        assert!(fmt.contains("_json_key"), "{fmt}");
        assert!(fmt.contains("gcr.io/myorg/app"), "{fmt}");
        assert!(!fmt.contains("test-secret"), "{fmt}");
    }
}
