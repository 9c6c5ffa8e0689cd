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

//! The plugin inputs.
//!
//! The plugin is configured through environment variables. Several logical
//! inputs have more than one name, for compatibility with older versions of
//! the plugin. The first name with a non-empty value wins.

use crate::BuildResult;
use crate::build_errors::Error as BuilderError;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

/// A snapshot of the variables used to configure the plugin.
///
/// The snapshot is taken once, at startup. The optional env-file is layered
/// under it, without modifying the process environment. The variables taken
/// from the env-file are also kept apart, see [Inputs::env_file_vars].
#[derive(Clone, Default, PartialEq)]
pub struct Inputs {
    vars: HashMap<String, String>,
    env_file_vars: Vec<(String, String)>,
}

impl Inputs {
    /// Captures the process environment.
    ///
    /// Variables whose name or value is not valid Unicode are ignored.
    pub fn from_env() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Loads `KEY=VALUE` pairs from an env-file.
    ///
    /// Variables already present in the snapshot take precedence over the
    /// values in the file. Any problem opening or parsing the file is an
    /// error, the caller should not continue with a partial configuration.
    pub fn with_env_file<P: AsRef<Path>>(mut self, path: P) -> BuildResult<Self> {
        let path = path.as_ref();
        let iter = dotenvy::from_path_iter(path).map_err(BuilderError::loading)?;
        let mut loaded = 0_usize;
        for item in iter {
            let (key, value) = item.map_err(BuilderError::loading)?;
            loaded += 1;
            if let Entry::Vacant(e) = self.vars.entry(key.clone()) {
                e.insert(value.clone());
                self.env_file_vars.push((key, value));
            }
        }
        tracing::debug!(
            "loaded {loaded} variables from env-file {}, {} not already set",
            path.display(),
            self.env_file_vars.len()
        );
        Ok(self)
    }

    /// The variables taken from env-files, in file order.
    ///
    /// Only variables that were not already set are included. The build tool
    /// needs them in its environment, they are not part of the process
    /// environment.
    pub fn env_file_vars(&self) -> &[(String, String)] {
        &self.env_file_vars
    }

    /// Sets a single variable, replacing any previous value.
    pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Returns the value of the first name with a non-empty value.
    ///
    /// Returns an empty string if none of the names has a value.
    pub fn lookup(&self, names: &[&str]) -> String {
        names
            .iter()
            .filter_map(|name| self.vars.get(*name))
            .find(|v| !v.is_empty())
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the boolean value of the first name with a non-empty value.
    ///
    /// Returns `default` if there is no value or it cannot be parsed.
    pub fn lookup_bool(&self, names: &[&str], default: bool) -> bool {
        parse_bool(&self.lookup(names)).unwrap_or(default)
    }
}

impl<K, V> FromIterator<(K, V)> for Inputs
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            env_file_vars: Vec::new(),
        }
    }
}

impl std::fmt::Debug for Inputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self.vars.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("Inputs")
            .field("names", &names)
            .field("values", &"[censored]")
            .finish()
    }
}

/// Parses the boolean spellings accepted by the plugin.
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoped_env::ScopedEnv;
    use std::io::Write;
    use test_case::test_case;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn lookup_first_non_empty() {
        let inputs = Inputs::from_iter([
            ("PLUGIN_JSON_KEY", ""),
            ("GCR_JSON_KEY", "from-gcr"),
            ("TOKEN", "from-token"),
        ]);
        let got = inputs.lookup(&crate::constants::inputs::JSON_KEY);
        assert_eq!(got, "from-gcr");
    }

    #[test]
    fn lookup_priority_order() {
        let inputs = Inputs::from_iter([("PLUGIN_JSON_KEY", "dedicated"), ("TOKEN", "generic")]);
        assert_eq!(inputs.lookup(&["PLUGIN_JSON_KEY", "TOKEN"]), "dedicated");
        assert_eq!(inputs.lookup(&["TOKEN", "PLUGIN_JSON_KEY"]), "generic");
    }

    #[test]
    fn lookup_missing() {
        let inputs = Inputs::from_iter([("UNRELATED", "value")]);
        assert_eq!(inputs.lookup(&["PLUGIN_REPO"]), "");
        assert_eq!(inputs.lookup(&[]), "");
    }

    #[test_case("1", true)]
    #[test_case("t", true)]
    #[test_case("TRUE", true)]
    #[test_case("True", true)]
    #[test_case("0", false)]
    #[test_case("F", false)]
    #[test_case("false", false)]
    fn parse_bool_accepted(input: &str, want: bool) {
        assert_eq!(parse_bool(input), Some(want));
    }

    #[test_case(""; "empty")]
    #[test_case("yes"; "yes")]
    #[test_case("tRuE"; "mixed case")]
    #[test_case("2"; "number")]
    fn parse_bool_rejected(input: &str) {
        assert_eq!(parse_bool(input), None);
        let inputs = Inputs::default().with("FLAG", input);
        assert!(!inputs.lookup_bool(&["FLAG"], false));
        assert!(inputs.lookup_bool(&["FLAG"], true));
    }

    #[test]
    fn env_file_does_not_override() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "PLUGIN_REPO=from-file")?;
        writeln!(file, "PLUGIN_REGISTRY=us.gcr.io")?;
        writeln!(file, "# comment")?;
        writeln!(file, "PLUGIN_JSON_KEY=\"quoted value\"")?;

        let inputs = Inputs::default()
            .with("PLUGIN_REPO", "from-env")
            .with_env_file(file.path())?;
        assert_eq!(inputs.lookup(&["PLUGIN_REPO"]), "from-env");
        assert_eq!(inputs.lookup(&["PLUGIN_REGISTRY"]), "us.gcr.io");
        assert_eq!(inputs.lookup(&["PLUGIN_JSON_KEY"]), "quoted value");
        Ok(())
    }

    #[test]
    fn env_file_vars_exclude_overridden() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "PLUGIN_REPO=from-file")?;
        writeln!(file, "PLUGIN_TAGS=v1")?;
        writeln!(file, "PLUGIN_DOCKERFILE=docker/Dockerfile")?;
        writeln!(file, "PLUGIN_TAGS=v2")?;

        let inputs = Inputs::default()
            .with("PLUGIN_REPO", "from-env")
            .with_env_file(file.path())?;
        let want = [
            ("PLUGIN_TAGS".to_string(), "v1".to_string()),
            ("PLUGIN_DOCKERFILE".to_string(), "docker/Dockerfile".to_string()),
        ];
        assert_eq!(inputs.env_file_vars(), &want);
        assert_eq!(inputs.lookup(&["PLUGIN_TAGS"]), "v1");
        Ok(())
    }

    #[test]
    fn env_file_vars_empty_without_file() {
        let inputs = Inputs::from_iter([("PLUGIN_REPO", "myorg/app")]);
        assert!(inputs.env_file_vars().is_empty(), "{inputs:?}");
    }

    #[test]
    fn env_file_missing() {
        let err = Inputs::default()
            .with_env_file("/this/env/file/does/not/exist.env")
            .unwrap_err();
        assert!(err.is_loading(), "{err:?}");
    }

    #[test]
    fn env_file_malformed() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "NOT A VALID LINE")?;
        let err = Inputs::default().with_env_file(file.path()).unwrap_err();
        assert!(err.is_loading(), "{err:?}");
        Ok(())
    }

    #[test]
    #[serial_test::serial]
    fn from_env() {
        let _e1 = ScopedEnv::set("PLUGIN_REPO", "test-only-repo");
        let _e2 = ScopedEnv::remove("PLUGIN_REGISTRY");
        let inputs = Inputs::from_env();
        assert_eq!(inputs.lookup(&["PLUGIN_REPO"]), "test-only-repo");
        assert_eq!(inputs.lookup(&["PLUGIN_REGISTRY"]), "");
    }

    #[test]
    fn debug_censors_values() {
        let inputs = Inputs::default().with("PLUGIN_JSON_KEY", "super-secret-value");
        let got = format!("{inputs:?}");
        assert!(got.contains("PLUGIN_JSON_KEY"), "{got}");
        assert!(!got.contains("super-secret-value"), "{got}");
    }
}
