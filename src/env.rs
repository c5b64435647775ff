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

//! Environment variable fallback chains
//!
//! Every provider attribute that is not set in the configuration block is
//! looked up in an ordered list of environment variables: the first variable
//! holding a non-empty value wins.

use std::collections::{BTreeMap, HashMap};

pub const CREDENTIALS_ENV_VARS: &[&str] = &[
    "GOOGLE_CREDENTIALS",
    "GOOGLE_CLOUD_KEYFILE_JSON",
    "GCLOUD_KEYFILE_JSON",
];
/// Only consulted by application default credentials discovery
pub const APPLICATION_CREDENTIALS_ENV_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ACCESS_TOKEN_ENV_VARS: &[&str] = &["GOOGLE_OAUTH_ACCESS_TOKEN"];
pub const PROJECT_ENV_VARS: &[&str] = &[
    "GOOGLE_PROJECT",
    "GOOGLE_CLOUD_PROJECT",
    "GCLOUD_PROJECT",
    "CLOUDSDK_CORE_PROJECT",
];
pub const BILLING_PROJECT_ENV_VARS: &[&str] = &["GOOGLE_BILLING_PROJECT"];
pub const REGION_ENV_VARS: &[&str] = &["GOOGLE_REGION", "GCLOUD_REGION", "CLOUDSDK_COMPUTE_REGION"];
pub const ZONE_ENV_VARS: &[&str] = &["GOOGLE_ZONE", "GCLOUD_ZONE", "CLOUDSDK_COMPUTE_ZONE"];
pub const IMPERSONATE_ENV_VARS: &[&str] = &["GOOGLE_IMPERSONATE_SERVICE_ACCOUNT"];
pub const USER_PROJECT_OVERRIDE_ENV_VAR: &str = "USER_PROJECT_OVERRIDE";
pub const REQUEST_REASON_ENV_VARS: &[&str] = &["CLOUDSDK_CORE_REQUEST_REASON"];
pub const USER_AGENT_EXTENSION_ENV_VAR: &str = "GOOGLE_TERRAFORM_USERAGENT_EXTENSION";
pub const APPEND_USER_AGENT_ENV_VAR: &str = "TF_APPEND_USER_AGENT";
pub const METADATA_HOST_ENV_VAR: &str = "GCE_METADATA_HOST";
pub const CLOUDSDK_CONFIG_ENV_VAR: &str = "CLOUDSDK_CONFIG";

/// Read-only view over a set of environment variables
///
/// Lookups go through this trait so that resolution can be exercised against
/// a plain map instead of the process environment.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the running process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl EnvSource for HashMap<&'static str, &'static str> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).map(|value| value.to_string())
    }
}

/// First non-empty value among `names`, in list order
pub fn multi_env_search(env: &dyn EnvSource, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env.var(name))
        .find(|value| !value.is_empty())
}

/// Boolean parsing with the spellings accepted by `gcloud` and Go tooling
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
