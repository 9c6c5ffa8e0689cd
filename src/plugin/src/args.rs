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

use clap::builder::{BoolishValueParser, PathBufValueParser, TypedValueParser};
use clap::{Arg, Command, Parser};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

const DESCRIPTION: &str = concat!(
    "Resolves Google Container Registry credentials and starts the buildx plugin.",
    " Credentials come from Workload Identity Federation when all the federation",
    " inputs are set, otherwise from a service account JSON key or token.",
    " The plugin inputs are read from the environment, the flags below only",
    " configure this wrapper."
);

/// Resolves registry credentials and runs the image build.
#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = DESCRIPTION)]
pub struct Args {
    /// Load additional inputs from this env-file.
    ///
    /// Variables already set in the environment take precedence over the
    /// values in the file. A missing or malformed file is an error.
    #[arg(
        long,
        env = "PLUGIN_ENV_FILE",
        value_parser = EmptyAsDefault::new(PathBufValueParser::new(), PathBuf::new())
    )]
    env_file: Option<PathBuf>,

    /// The buildx plugin started with the resolved credentials.
    #[arg(long, env = "PLUGIN_BUILDX_PLUGIN", default_value = "drone-docker-buildx")]
    pub buildx_plugin: String,

    /// The maximum level for log messages.
    #[arg(
        long,
        env = "PLUGIN_LOG_LEVEL",
        default_value_t = tracing::Level::INFO,
        value_parser = EmptyAsDefault::new(parse_level, tracing::Level::INFO)
    )]
    pub log_level: tracing::Level,

    /// Resolve the credentials and log the result, without starting the
    /// buildx plugin.
    #[arg(
        long,
        env = "PLUGIN_DRY_RUN",
        value_parser = EmptyAsDefault::new(BoolishValueParser::new(), false)
    )]
    pub dry_run: bool,

    /// Arguments passed to the buildx plugin.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Args {
    /// The env-file to load, if any.
    pub fn env_file(&self) -> Option<&Path> {
        self.env_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

fn parse_level(value: &str) -> Result<tracing::Level, String> {
    value.parse::<tracing::Level>().map_err(|e| e.to_string())
}

/// Parses an empty value as `default`, other values with `inner`.
///
/// Drone sets unused settings to empty strings, they mean "not set".
#[derive(Clone)]
struct EmptyAsDefault<P, T> {
    inner: P,
    default: T,
}

impl<P, T> EmptyAsDefault<P, T> {
    fn new(inner: P, default: T) -> Self {
        Self { inner, default }
    }
}

impl<P, T> TypedValueParser for EmptyAsDefault<P, T>
where
    P: TypedValueParser<Value = T>,
    T: Clone + Send + Sync + 'static,
{
    type Value = T;

    fn parse_ref(
        &self,
        cmd: &Command,
        arg: Option<&Arg>,
        value: &OsStr,
    ) -> Result<Self::Value, clap::Error> {
        if value.is_empty() {
            return Ok(self.default.clone());
        }
        self.inner.parse_ref(cmd, arg, value)
    }
}
