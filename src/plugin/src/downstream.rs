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

//! Starts the buildx plugin with the published variables.

use anyhow::Context;
use gcr_auth::publish::Publication;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// Runs `program` to completion and returns its exit code.
///
/// The child inherits this process' environment and standard streams. The
/// `env_file_vars` are added to that environment. Then the cleared variables
/// are removed and the published variables are set, both take precedence
/// over the env-file.
pub async fn run(
    program: &str,
    args: &[String],
    env_file_vars: &[(String, String)],
    publication: &Publication,
) -> anyhow::Result<u8> {
    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::inherit());
    command.envs(env_file_vars.iter().map(|(k, v)| (k, v)));
    for name in publication.cleared() {
        command.env_remove(name);
    }
    command.envs(publication.vars());

    tracing::info!("starting {program}");
    let status = command
        .status()
        .await
        .with_context(|| format!("cannot start {program}"))?;
    if !status.success() {
        tracing::warn!("{program} finished with {status}");
    }
    Ok(exit_code(status))
}

// Signals have no exit code, report them as a generic failure.
fn exit_code(status: ExitStatus) -> u8 {
    status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use gcr_auth::repository::Repository;
    use gcr_auth::resolver::{RegistryCredential, ResolvedConfig};
    use scoped_env::ScopedEnv;

    type TestResult = anyhow::Result<()>;

    fn publication(credential: RegistryCredential) -> Publication {
        Publication::from(&ResolvedConfig {
            repository: Repository::normalize("myorg/app", ""),
            credential,
            workload_identity: false,
        })
    }

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn exit_codes() -> TestResult {
        let p = publication(RegistryCredential::Anonymous);
        assert_eq!(run("sh", &sh("exit 0"), &[], &p).await?, 0);
        assert_eq!(run("sh", &sh("exit 7"), &[], &p).await?, 7);
        assert_eq!(run("sh", &sh("kill -9 $$"), &[], &p).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_program() {
        let p = publication(RegistryCredential::Anonymous);
        let err = run("/this/program/does/not/exist", &[], &[], &p)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cannot start"), "{err}");
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn access_token_environment() -> TestResult {
        let _e1 = ScopedEnv::set("DOCKER_USERNAME", "stale-username");
        let _e2 = ScopedEnv::set("DOCKER_PASSWORD", "stale-password");
        let p = publication(RegistryCredential::AccessToken("test-access-token".into()));
        let script = r#"test "$ACCESS_TOKEN" = test-access-token \
            && test -z "${DOCKER_USERNAME+set}" \
            && test -z "${DOCKER_PASSWORD+set}" \
            && test "$PLUGIN_REPO" = gcr.io/myorg/app \
            && test "$PLUGIN_REGISTRY" = gcr.io \
            && test "$PLUGIN_REGISTRY_TYPE" = GCR"#;
        assert_eq!(run("sh", &sh(script), &[], &p).await?, 0);
        Ok(())
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn username_password_environment() -> TestResult {
        let _e = ScopedEnv::set("ACCESS_TOKEN", "stale-token");
        let p = publication(RegistryCredential::UsernamePassword {
            username: "_json_key".into(),
            password: "test-secret".into(),
        });
        let script = r#"test "$DOCKER_USERNAME" = _json_key \
            && test "$DOCKER_PASSWORD" = test-secret \
            && test -z "${ACCESS_TOKEN+set}""#;
        assert_eq!(run("sh", &sh(script), &[], &p).await?, 0);
        Ok(())
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn env_file_environment() -> TestResult {
        let _e = ScopedEnv::remove("PLUGIN_TAGS");
        let p = publication(RegistryCredential::AccessToken("test-access-token".into()));
        let env_file_vars = [
            ("PLUGIN_TAGS".to_string(), "v1".to_string()),
            ("PLUGIN_REPO".to_string(), "myorg/from-file".to_string()),
            ("DOCKER_PASSWORD".to_string(), "from-file".to_string()),
        ];
        let script = r#"test "$PLUGIN_TAGS" = v1 \
            && test "$PLUGIN_REPO" = gcr.io/myorg/app \
            && test -z "${DOCKER_PASSWORD+set}""#;
        assert_eq!(run("sh", &sh(script), &env_file_vars, &p).await?, 0);
        Ok(())
    }
}
