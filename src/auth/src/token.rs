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

//! Types and functions to work with auth [Tokens].
//!
//! [Tokens]: https://cloud.google.com/docs/authentication#token

use std::time::{Duration, Instant};

/// Represents an auth token.
#[derive(Clone, PartialEq)]
pub struct Token {
    /// The actual token string.
    ///
    /// This is the value published for the build tool, and the value used in
    /// the `Authorization:` header of follow-up exchanges.
    pub token: String,

    /// The type of the token.
    ///
    /// The most common type is `"Bearer"`.
    pub token_type: String,

    /// The instant at which the token expires.
    ///
    /// If `None`, the expiration is unknown. The plugin never refreshes
    /// tokens, this value is informational only.
    pub expires_at: Option<Instant>,
}

impl Token {
    pub(crate) fn bearer<T: Into<String>>(token: T, expires_at: Option<Instant>) -> Self {
        Self {
            token: token.into(),
            token_type: "Bearer".to_string(),
            expires_at,
        }
    }
}

/// The instant `secs` seconds from now, `None` if it cannot be represented.
pub(crate) fn expires_in(secs: u64) -> Option<Instant> {
    Instant::now().checked_add(Duration::from_secs(secs))
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("token", &"[censored]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
