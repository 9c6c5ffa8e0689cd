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

//! Errors returned while exchanging credentials and resolving the plugin
//! configuration.

use http::StatusCode;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter, Result};
use std::sync::Arc;

/// Represents an error obtaining a token from a remote or local exchange.
///
/// The error records whether the failure is transient. Transient errors
/// (timeouts, server errors, throttling) may succeed on a later run; the
/// plugin itself never retries within one invocation.
#[derive(Clone, Debug)]
pub struct CredentialsError {
    is_transient: bool,
    message: Option<String>,
    source: Option<Arc<dyn Error + Send + Sync>>,
}

impl CredentialsError {
    /// Creates a new `CredentialsError` from a message and a source.
    pub fn new<M, S>(is_transient: bool, message: M, source: S) -> Self
    where
        M: Into<String>,
        S: Error + Send + Sync + 'static,
    {
        CredentialsError {
            is_transient,
            message: Some(message.into()),
            source: Some(Arc::new(source)),
        }
    }

    /// Creates a new `CredentialsError` from a message only.
    pub fn from_msg<T: Into<String>>(is_transient: bool, message: T) -> Self {
        CredentialsError {
            is_transient,
            message: Some(message.into()),
            source: None,
        }
    }

    /// Creates a new `CredentialsError` wrapping `source`.
    pub fn from_source<T: Error + Send + Sync + 'static>(is_transient: bool, source: T) -> Self {
        CredentialsError {
            is_transient,
            message: None,
            source: Some(Arc::new(source)),
        }
    }

    /// Returns `true` if a later attempt with the same inputs may succeed.
    pub fn is_transient(&self) -> bool {
        self.is_transient
    }
}

impl std::error::Error for CredentialsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

const TRANSIENT_MSG: &str = "but future attempts may succeed";
const PERMANENT_MSG: &str = "and future attempts will not succeed";

impl Display for CredentialsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let msg = if self.is_transient {
            TRANSIENT_MSG
        } else {
            PERMANENT_MSG
        };
        match (&self.message, &self.source) {
            (Some(m), Some(s)) => write!(f, "cannot create access token, {msg}, {m}: {s}"),
            (Some(m), None) => write!(f, "cannot create access token, {msg}, {m}"),
            (None, Some(s)) => write!(f, "cannot create access token, {msg}, source: {s}"),
            (None, None) => write!(f, "cannot create access token, {msg}"),
        }
    }
}

pub(crate) fn is_retryable(c: StatusCode) -> bool {
    // Server errors do not indicate that there is anything wrong with our
    // request, a later attempt may succeed.
    c.is_server_error()
        || matches!(
            c,
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS
        )
}

pub(crate) fn from_http_error(err: reqwest::Error, msg: &str) -> CredentialsError {
    let transient = !(err.is_builder() || err.is_decode());
    CredentialsError::new(transient, msg, err)
}

pub(crate) async fn from_http_response(response: reqwest::Response, msg: &str) -> CredentialsError {
    let status = response.status();
    let transient = is_retryable(status);
    match response.text().await {
        Ok(body) => CredentialsError::from_msg(
            transient,
            format!("{msg}, failed with status {status}, body=<{body}>"),
        ),
        Err(e) => CredentialsError::new(transient, format!("{msg}, failed with status {status}"), e),
    }
}

pub(crate) fn non_retryable<T: Error + Send + Sync + 'static>(source: T) -> CredentialsError {
    CredentialsError::from_source(false, source)
}

pub(crate) fn non_retryable_from_str<T: Into<String>>(message: T) -> CredentialsError {
    CredentialsError::from_msg(false, message)
}

/// The failures that stop the plugin before the build tool is started.
///
/// The variants never include secret values: identity tokens, keys and
/// access tokens are left out of every message.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// The configuration could not be loaded or is incomplete.
    #[error("invalid plugin configuration: {0}")]
    Config(#[from] crate::build_errors::Error),

    /// The identity token could not be exchanged for a federated token.
    #[error(
        "cannot exchange the OIDC token for a federated token (project_number={project_number}, pool_id={pool_id}, provider_id={provider_id}, service_account_email={service_account_email}): {source}"
    )]
    Federation {
        project_number: String,
        pool_id: String,
        provider_id: String,
        service_account_email: String,
        #[source]
        source: CredentialsError,
    },

    /// The federated token could not be used to impersonate the service account.
    #[error(
        "cannot impersonate service account {service_account_email} with the federated token: {source}"
    )]
    Impersonation {
        service_account_email: String,
        #[source]
        source: CredentialsError,
    },

    /// The static service account key could not be exchanged for an access token.
    #[error("cannot exchange the JSON key for an OAuth2 access token: {source}")]
    OAuthExchange {
        #[source]
        source: CredentialsError,
    },
}
