// This file is part of the tf-provider-google project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::env;

use anyhow::Result;
use tf_provider::serve;
use tf_provider_google::GoogleProvider;
use tracing_subscriber::EnvFilter;

/// Log to stderr, where Terraform collects plugin logs
///
/// `PLUGIN_LOG_FILE` is handled by the plugin server itself.
fn init_logging() {
    if env::var_os("PLUGIN_LOG_FILE").is_some() {
        return;
    }
    let Some(level) = ["TF_LOG_PROVIDER", "TF_LOG"]
        .iter()
        .find_map(|name| env::var(name).ok().filter(|level| !level.is_empty()))
    else {
        return;
    };
    let directive = match level.to_ascii_lowercase().as_str() {
        "trace" | "json" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" => "error",
        "off" => return,
        _ => "info",
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_ansi(false)
        .with_writer(std::io::stderr);
    let result = if level.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(err) = result {
        eprintln!("Could not initialize logging: {err}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging();
    serve("google", GoogleProvider::default()).await
}
