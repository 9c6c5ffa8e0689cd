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

//! Fully qualified repository names.
//!
//! The registry defaults to [DEFAULT_REGISTRY]. A repository that does not
//! start with the registry is joined under it.
//!
//! The check is a textual prefix match, not a host boundary check. With the
//! `gcr.io` registry a repository named `gcr.iox/app` is left unchanged.

use crate::constants::DEFAULT_REGISTRY;

/// A registry and a repository under it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    pub registry: String,
    pub repo: String,
}

impl Repository {
    /// Applies the registry default and qualifies `repo` with the registry.
    ///
    /// # Example
    /// ```
    /// # use gcr_auth::repository::Repository;
    /// let r = Repository::normalize("myorg/app", "");
    /// assert_eq!(r.registry, "gcr.io");
    /// assert_eq!(r.repo, "gcr.io/myorg/app");
    /// ```
    pub fn normalize(repo: &str, registry: &str) -> Self {
        let registry = normalize_registry(registry);
        let repo = if repo.starts_with(registry.as_str()) {
            repo.to_string()
        } else {
            let joined = join(&registry, repo);
            tracing::debug!("qualified repository {repo} as {joined}");
            joined
        };
        Self { registry, repo }
    }
}

/// Returns `registry`, or [DEFAULT_REGISTRY] if it is empty.
pub fn normalize_registry(registry: &str) -> String {
    if registry.is_empty() {
        DEFAULT_REGISTRY.to_string()
    } else {
        registry.to_string()
    }
}

/// Joins two slash separated paths and cleans the result.
///
/// Empty and `.` segments are dropped, `..` removes the preceding segment.
/// A `..` that cannot be resolved is kept, unless the path is rooted.
fn join(base: &str, path: &str) -> String {
    let rooted = base.starts_with('/') || (base.is_empty() && path.starts_with('/'));
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ if !rooted => segments.push(".."),
                _ => {}
            },
            s => segments.push(s),
        }
    }
    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn default_registry() {
        let got = Repository::normalize("myorg/app", "");
        assert_eq!(
            got,
            Repository {
                registry: "gcr.io".to_string(),
                repo: "gcr.io/myorg/app".to_string(),
            }
        );
    }

    #[test]
    fn already_qualified() {
        let got = Repository::normalize("gcr.io/myorg/app", "gcr.io");
        assert_eq!(got.registry, "gcr.io");
        assert_eq!(got.repo, "gcr.io/myorg/app");
    }

    #[test_case("myorg/app", "us.gcr.io", "us.gcr.io/myorg/app")]
    #[test_case("myorg/app", "europe-docker.pkg.dev/", "europe-docker.pkg.dev/myorg/app")]
    #[test_case("/myorg//app/", "gcr.io", "gcr.io/myorg/app")]
    #[test_case("./myorg/./app", "gcr.io", "gcr.io/myorg/app")]
    #[test_case("myorg/../app", "gcr.io", "gcr.io/app")]
    #[test_case("../app", "gcr.io", "app")]
    #[test_case("../../app", "gcr.io", "../app")]
    fn qualified(repo: &str, registry: &str, want: &str) {
        assert_eq!(Repository::normalize(repo, registry).repo, want);
    }

    #[test_case("myorg/app", "")]
    #[test_case("myorg/app", "gcr.io")]
    #[test_case("gcr.io/myorg/app", "gcr.io")]
    #[test_case("myorg//app", "us.gcr.io")]
    #[test_case("app", "us-docker.pkg.dev/my-project")]
    fn idempotent(repo: &str, registry: &str) {
        let once = Repository::normalize(repo, registry);
        let twice = Repository::normalize(&once.repo, &once.registry);
        assert_eq!(once, twice);
    }

    #[test]
    fn prefix_is_textual() {
        let got = Repository::normalize("gcr.iox/app", "gcr.io");
        assert_eq!(got.repo, "gcr.iox/app");
    }

    #[test_case("", "", ".")]
    #[test_case("/", "..", "/")]
    #[test_case("/a", "../../b", "/b")]
    #[test_case("a", "", "a")]
    #[test_case("a/b", "c/", "a/b/c")]
    fn join_cleans(base: &str, path: &str, want: &str) {
        assert_eq!(join(base, path), want);
    }
}
