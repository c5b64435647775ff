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

use crate::utils::static_regex;

pub const DEFAULT_UNIVERSE_DOMAIN: &str = "googleapis.com";

/// A Google API whose base path can be overridden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Service {
    /// Prefix of the `<name>_custom_endpoint` provider attribute
    pub name: &'static str,
    /// Name of the base path inside URL templates, eg: `{{ComputeBasePath}}`
    pub base_path_name: &'static str,
    /// Default base path in the `googleapis.com` universe
    pub default_base_path: &'static str,
    pub env_var: &'static str,
}

impl Service {
    pub fn attribute_name(&self) -> String {
        format!("{}_custom_endpoint", self.name)
    }

    /// Default base path with `googleapis.com` replaced by `universe_domain`
    pub fn base_path_in(&self, universe_domain: &str) -> String {
        self.default_base_path
            .replace(DEFAULT_UNIVERSE_DOMAIN, universe_domain)
    }
}

macro_rules! service {
    ($name:literal, $base_path_name:literal, $default:literal, $env:literal) => {
        Service {
            name: $name,
            base_path_name: $base_path_name,
            default_base_path: $default,
            env_var: $env,
        }
    };
}

pub const SERVICES: &[Service] = &[
    service!("compute", "ComputeBasePath", "https://compute.googleapis.com/compute/v1/", "GOOGLE_COMPUTE_CUSTOM_ENDPOINT"),
    service!("container", "ContainerBasePath", "https://container.googleapis.com/v1/", "GOOGLE_CONTAINER_CUSTOM_ENDPOINT"),
    service!("storage", "StorageBasePath", "https://storage.googleapis.com/storage/v1/", "GOOGLE_STORAGE_CUSTOM_ENDPOINT"),
    service!("resource_manager", "ResourceManagerBasePath", "https://cloudresourcemanager.googleapis.com/v1/", "GOOGLE_RESOURCE_MANAGER_CUSTOM_ENDPOINT"),
    service!("iam", "IAMBasePath", "https://iam.googleapis.com/v1/", "GOOGLE_IAM_CUSTOM_ENDPOINT"),
    service!("iam_credentials", "IAMCredentialsBasePath", "https://iamcredentials.googleapis.com/v1/", "GOOGLE_IAM_CREDENTIALS_CUSTOM_ENDPOINT"),
    service!("cloud_run", "CloudRunBasePath", "https://{{region}}-run.googleapis.com/", "GOOGLE_CLOUD_RUN_CUSTOM_ENDPOINT"),
    service!("pubsub", "PubsubBasePath", "https://pubsub.googleapis.com/v1/", "GOOGLE_PUBSUB_CUSTOM_ENDPOINT"),
    service!("service_usage", "ServiceUsageBasePath", "https://serviceusage.googleapis.com/v1/", "GOOGLE_SERVICE_USAGE_CUSTOM_ENDPOINT"),
    service!("sql", "SQLBasePath", "https://sqladmin.googleapis.com/sql/v1beta4/", "GOOGLE_SQL_CUSTOM_ENDPOINT"),
    service!("dns", "DNSBasePath", "https://dns.googleapis.com/dns/v1/", "GOOGLE_DNS_CUSTOM_ENDPOINT"),
];

pub fn service(name: &str) -> Option<&'static Service> {
    SERVICES.iter().find(|service| service.name == name)
}

/// Custom endpoints must be absolute http(s) URLs ending with `/`
pub fn is_valid_custom_endpoint(endpoint: &str) -> bool {
    static_regex!(r"^https?://.+/$").is_match(endpoint)
}

/// Strip the trailing version segment of a base path
///
/// `https://compute.googleapis.com/compute/v1/` becomes
/// `https://compute.googleapis.com/compute/`.
pub fn remove_base_path_version(base_path: &str) -> String {
    let trimmed = base_path.strip_suffix('/').unwrap_or(base_path);
    match trimmed.rfind('/') {
        Some(idx) => format!("{}/", &trimmed[..idx]),
        None => base_path.to_string(),
    }
}
