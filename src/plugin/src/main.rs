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

//! A Drone plugin that builds images with buildx and pushes them to Google
//! Container Registry.
//!
//! The plugin resolves the registry credentials, then starts the buildx
//! plugin with the credentials in its environment. The exit code of the
//! buildx plugin is the exit code of this program.

mod args;
mod downstream;

use args::Args;
use clap::Parser;
use gcr_auth::credentials::Builder;
use gcr_auth::inputs::Inputs;
use gcr_auth::publish::Publication;
use gcr_auth::resolver::resolve;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    enable_tracing(args.log_level);
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    // Fails if a provider is already installed, which is fine.
    let _ = rustls::crypto::CryptoProvider::install_default(
        rustls::crypto::aws_lc_rs::default_provider(),
    );

    let mut inputs = Inputs::from_env();
    if let Some(path) = args.env_file() {
        inputs = inputs.with_env_file(path)?;
    }
    tracing::debug!("{inputs:?}");

    let exchange = Builder::new().build()?;
    let config = resolve(&inputs, &exchange).await?;
    let publication = Publication::from(&config);
    if args.dry_run {
        tracing::info!(
            "dry run, not starting {}: {publication:?}",
            args.buildx_plugin
        );
        return Ok(ExitCode::SUCCESS);
    }
    let code = downstream::run(
        &args.buildx_plugin,
        &args.args,
        inputs.env_file_vars(),
        &publication,
    )
    .await?;
    Ok(ExitCode::from(code))
}

fn enable_tracing(level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_level(true)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    // Only fails if a global subscriber is already set.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
