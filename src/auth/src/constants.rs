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

//! Fixed identities, scopes, endpoints and variable names.

use std::time::Duration;

/// The registry used when the `PLUGIN_REGISTRY` input is empty.
pub const DEFAULT_REGISTRY: &str = "gcr.io";
/// The registry type tag published for the downstream build tool.
pub const REGISTRY_TYPE: &str = "GCR";
/// The username used with a service account JSON key as the password.
pub const JSON_KEY_USERNAME: &str = "_json_key";
/// The username used with an OAuth2 access token as the password.
pub const ACCESS_TOKEN_USERNAME: &str = "oauth2accesstoken";
/// The only scope requested for registry access tokens.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

pub const STS_TOKEN_URL: &str = "https://sts.googleapis.com/v1/token";
pub const IAM_CREDENTIALS_URL: &str = "https://iamcredentials.googleapis.com";
pub const OAUTH2_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Token Exchange OAuth Grant Type
pub(crate) const TOKEN_EXCHANGE_GRANT_TYPE: &str =
    "urn:ietf:params:oauth:grant-type:token-exchange";
/// JWT Bearer OAuth Grant Type, used with service account assertions.
pub(crate) const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub(crate) const REFRESH_TOKEN_GRANT_TYPE: &str = "refresh_token";
/// Access Token Oauth Token Type
pub(crate) const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";
/// OIDC ID Token OAuth Token Type
pub(crate) const ID_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:id_token";

pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Names of the inputs read by the plugin.
pub mod inputs {
    pub const OIDC_TOKEN_ID: &str = "PLUGIN_OIDC_TOKEN_ID";
    pub const PROJECT_NUMBER: &str = "PLUGIN_PROJECT_NUMBER";
    pub const POOL_ID: &str = "PLUGIN_POOL_ID";
    pub const PROVIDER_ID: &str = "PLUGIN_PROVIDER_ID";
    pub const SERVICE_ACCOUNT_EMAIL: &str = "PLUGIN_SERVICE_ACCOUNT_EMAIL";
    pub const REPO: &str = "PLUGIN_REPO";
    pub const REGISTRY: &str = "PLUGIN_REGISTRY";
    pub const WORKLOAD_IDENTITY: &str = "PLUGIN_WORKLOAD_IDENTITY";
    pub const ENV_FILE: &str = "PLUGIN_ENV_FILE";

    /// The secret aliases, in priority order.
    pub const JSON_KEY: [&str; 4] = [
        "PLUGIN_JSON_KEY",
        "GCR_JSON_KEY",
        "GOOGLE_CREDENTIALS",
        "TOKEN",
    ];
}

/// Names of the variables published for the downstream build tool.
pub mod outputs {
    pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
    pub const DOCKER_USERNAME: &str = "DOCKER_USERNAME";
    pub const DOCKER_PASSWORD: &str = "DOCKER_PASSWORD";
    pub const REPO: &str = "PLUGIN_REPO";
    pub const REGISTRY: &str = "PLUGIN_REGISTRY";
    pub const REGISTRY_TYPE: &str = "PLUGIN_REGISTRY_TYPE";
}
