// Copyright 2025 Google LLC
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

//! Container Registry credentials for image build plugins.
//!
//! This crate decides how an image build step authenticates against Google
//! Container Registry (or Artifact Registry), obtains the credential, and
//! describes the environment handed to the downstream build tool.
//!
//! Two strategies are supported:
//!
//! * [Workload Identity Federation]: an OIDC token issued by the CI system is
//!   exchanged with the Security Token Service for a federated token, which is
//!   then used to impersonate a service account. Any failure on this path is
//!   fatal.
//! * Static credentials: a (possibly base64 encoded) service account key or
//!   legacy token. When the workload identity flag is set the key is exchanged
//!   locally for an OAuth2 access token.
//!
//! The pipeline is explicit: an [inputs::Inputs] snapshot is passed to
//! [resolver::resolve], which returns a [resolver::ResolvedConfig]. The
//! [publish::Publication] built from it lists the variables consumed by the
//! build tool.
//!
//! ```
//! # use gcr_auth::inputs::Inputs;
//! # use gcr_auth::publish::Publication;
//! # use gcr_auth::resolver::resolve;
//! # async fn sample() -> Result<(), Box<dyn std::error::Error>> {
//! let inputs = Inputs::from_env();
//! let exchange = gcr_auth::credentials::Builder::new().build()?;
//! let config = resolve(&inputs, &exchange).await?;
//! for (name, value) in Publication::from(&config).vars() {
//!     println!("{name} has {} bytes", value.len());
//! }
//! # Ok(()) }
//! ```
//!
//! [Workload Identity Federation]: https://cloud.google.com/iam/docs/workload-identity-federation

pub mod build_errors;
pub mod constants;
pub mod errors;

/// Types and functions to exchange identities for Google Cloud access tokens.
pub mod credentials;

pub mod federation;
pub mod inputs;
pub mod publish;
pub mod repository;
pub mod resolver;
pub mod static_credentials;
pub mod strategy;

/// Types and functions to work with auth [Tokens].
///
/// [Tokens]: https://cloud.google.com/docs/authentication#token
pub mod token;

/// A `Result` alias where the `Err` case is
/// `gcr_auth::errors::CredentialsError`.
pub type Result<T> = std::result::Result<T, crate::errors::CredentialsError>;

/// A `Result` alias where the `Err` case is `gcr_auth::build_errors::Error`.
pub type BuildResult<T> = std::result::Result<T, crate::build_errors::Error>;
