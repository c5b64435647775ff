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

//! Provider configuration
//!
//! [`ProviderConfig`] mirrors the provider block as sent by Terraform.
//! [`Config`] is the read-only record resolved from it once per plugin
//! process: a value set in the block wins over the environment, which wins
//! over the built-in default.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tf_provider::value::{self, Value, ValueBool, ValueList, ValueMap, ValueString};

use crate::env::{self, multi_env_search, parse_bool, EnvSource};
use crate::error::ConfigError;
use crate::self_link::get_resource_name_from_self_link;
use crate::utils::{known_map, known_strings, ValueStringExt};

mod duration;
mod endpoints;
mod validate;

pub use duration::{format_duration, parse_duration, parse_signed_duration, SignedDuration};
pub use endpoints::{
    is_valid_custom_endpoint, remove_base_path_version, service, Service,
    DEFAULT_UNIVERSE_DOMAIN, SERVICES,
};
pub use validate::{validate_credentials, validate_provider_config};

pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/userinfo.email",
];
pub const DEFAULT_REQUEST_TIMEOUT: &str = "120s";
pub const DEFAULT_BATCH_SEND_AFTER: &str = "10s";

pub const CREATION_ONLY: &str = "CREATION_ONLY";
pub const PROACTIVE: &str = "PROACTIVE";
pub const ATTRIBUTION_STRATEGIES: &[&str] = &[CREATION_ONLY, PROACTIVE];

/// Provider block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub credentials: ValueString<'a>,
    pub access_token: ValueString<'a>,
    pub impersonate_service_account: ValueString<'a>,
    pub impersonate_service_account_delegates: ValueList<ValueString<'a>>,
    pub project: ValueString<'a>,
    pub billing_project: ValueString<'a>,
    pub region: ValueString<'a>,
    pub zone: ValueString<'a>,
    pub scopes: ValueList<ValueString<'a>>,
    pub user_project_override: ValueBool,
    pub request_timeout: ValueString<'a>,
    pub request_reason: ValueString<'a>,
    pub universe_domain: ValueString<'a>,
    pub default_labels: ValueMap<'a, ValueString<'a>>,
    pub add_terraform_attribution_label: ValueBool,
    pub terraform_attribution_label_addition_strategy: ValueString<'a>,
    pub compute_custom_endpoint: ValueString<'a>,
    pub container_custom_endpoint: ValueString<'a>,
    pub storage_custom_endpoint: ValueString<'a>,
    pub resource_manager_custom_endpoint: ValueString<'a>,
    pub iam_custom_endpoint: ValueString<'a>,
    pub iam_credentials_custom_endpoint: ValueString<'a>,
    pub cloud_run_custom_endpoint: ValueString<'a>,
    pub pubsub_custom_endpoint: ValueString<'a>,
    pub service_usage_custom_endpoint: ValueString<'a>,
    pub sql_custom_endpoint: ValueString<'a>,
    pub dns_custom_endpoint: ValueString<'a>,
    #[serde(with = "value::serde_as_vec")]
    pub batching: Value<BatchingBlock<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub external_credentials_hcp_terraform: Value<ExternalCredentialsBlock<'a>>,
}

/// HCP Terraform workload identity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalCredentialsBlock<'a> {
    #[serde(borrow = "'a")]
    pub audience: ValueString<'a>,
    pub service_account_email: ValueString<'a>,
    pub identity_token: ValueString<'a>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchingBlock<'a> {
    #[serde(borrow = "'a")]
    pub send_after: ValueString<'a>,
    pub enable_batching: ValueBool,
}

impl<'a> ProviderConfig<'a> {
    /// `<service>_custom_endpoint` attribute of a service
    pub fn custom_endpoint(&self, service: &str) -> Option<&ValueString<'a>> {
        Some(match service {
            "compute" => &self.compute_custom_endpoint,
            "container" => &self.container_custom_endpoint,
            "storage" => &self.storage_custom_endpoint,
            "resource_manager" => &self.resource_manager_custom_endpoint,
            "iam" => &self.iam_custom_endpoint,
            "iam_credentials" => &self.iam_credentials_custom_endpoint,
            "cloud_run" => &self.cloud_run_custom_endpoint,
            "pubsub" => &self.pubsub_custom_endpoint,
            "service_usage" => &self.service_usage_custom_endpoint,
            "sql" => &self.sql_custom_endpoint,
            "dns" => &self.dns_custom_endpoint,
            _ => return None,
        })
    }
}

/// Which resources get the `goog-terraform-provisioned` label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum AttributionStrategy {
    /// Only resources created after the label was enabled
    #[default]
    CreationOnly,
    /// Every resource on its next update
    Proactive,
}

impl AttributionStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            CREATION_ONLY => Some(Self::CreationOnly),
            PROACTIVE => Some(Self::Proactive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreationOnly => CREATION_ONLY,
            Self::Proactive => PROACTIVE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batching {
    pub send_after: Duration,
    pub enable_batching: bool,
}

impl Default for Batching {
    fn default() -> Self {
        Self {
            send_after: Duration::from_secs(10),
            enable_batching: true,
        }
    }
}

/// Workload identity federation settings, with the STS endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct ExternalCredentials {
    pub audience: String,
    pub service_account_email: String,
    pub identity_token: String,
    pub token_url: String,
}

impl std::fmt::Debug for ExternalCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalCredentials")
            .field("audience", &self.audience)
            .field("service_account_email", &self.service_account_email)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

/// Resolved provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub credentials: Option<String>,
    pub access_token: Option<String>,
    pub external_credentials: Option<ExternalCredentials>,
    pub impersonate_service_account: Option<String>,
    pub impersonate_service_account_delegates: Vec<String>,
    pub project: Option<String>,
    pub billing_project: Option<String>,
    pub region: Option<String>,
    pub zone: Option<String>,
    pub scopes: Vec<String>,
    pub user_project_override: bool,
    pub request_timeout: Duration,
    pub request_reason: Option<String>,
    pub universe_domain: String,
    pub default_labels: BTreeMap<String, String>,
    pub add_terraform_attribution_label: bool,
    pub terraform_attribution_label_addition_strategy: AttributionStrategy,
    pub batching: Batching,
    /// Base path of every known service, keyed by service name
    pub base_paths: BTreeMap<&'static str, String>,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: None,
            access_token: None,
            external_credentials: None,
            impersonate_service_account: None,
            impersonate_service_account_delegates: Vec::new(),
            project: None,
            billing_project: None,
            region: None,
            zone: None,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            user_project_override: false,
            request_timeout: Duration::from_secs(120),
            request_reason: None,
            universe_domain: DEFAULT_UNIVERSE_DOMAIN.to_string(),
            default_labels: BTreeMap::new(),
            add_terraform_attribution_label: true,
            terraform_attribution_label_addition_strategy: AttributionStrategy::CreationOnly,
            batching: Batching::default(),
            base_paths: default_base_paths(DEFAULT_UNIVERSE_DOMAIN),
            user_agent: String::new(),
        }
    }
}

fn default_base_paths(universe_domain: &str) -> BTreeMap<&'static str, String> {
    SERVICES
        .iter()
        .map(|service| (service.name, service.base_path_in(universe_domain)))
        .collect()
}

/// Block value if set and non-empty, otherwise the first non-empty variable
fn string_or_env(value: &ValueString, env: &dyn EnvSource, names: &[&str]) -> Option<String> {
    match value.non_empty() {
        Some(value) => Some(value.to_string()),
        None => multi_env_search(env, names),
    }
}

fn duration_or_default(
    value: &ValueString,
    field: &'static str,
    default: &str,
) -> Result<Duration, ConfigError> {
    let raw = value.non_empty().unwrap_or(default);
    parse_duration(raw).map_err(|source| ConfigError::InvalidDuration {
        field,
        value: raw.to_string(),
        source,
    })
}

impl Config {
    /// Resolve the provider block against the environment
    pub fn resolve(block: &ProviderConfig, env: &dyn EnvSource) -> Result<Self, ConfigError> {
        let universe_domain = block
            .universe_domain
            .non_empty()
            .unwrap_or(DEFAULT_UNIVERSE_DOMAIN)
            .to_string();

        let mut credentials = block.credentials.non_empty().map(str::to_string);
        let mut access_token = block.access_token.non_empty().map(str::to_string);
        let external_credentials = match &block.external_credentials_hcp_terraform {
            Value::Value(external) => Some(ExternalCredentials {
                audience: external.audience.non_empty().unwrap_or_default().to_string(),
                service_account_email: external.service_account_email.non_empty().unwrap_or_default().to_string(),
                identity_token: external.identity_token.non_empty().unwrap_or_default().to_string(),
                token_url: format!("https://sts.{universe_domain}/v1/token"),
            }),
            _ => None,
        };
        // Environment credentials are only considered when nothing is configured
        if credentials.is_none() && access_token.is_none() && external_credentials.is_none() {
            credentials = multi_env_search(env, env::CREDENTIALS_ENV_VARS);
            access_token = multi_env_search(env, env::ACCESS_TOKEN_ENV_VARS);
        }

        let region = string_or_env(&block.region, env, env::REGION_ENV_VARS)
            .map(|region| get_resource_name_from_self_link(&region).to_string());
        let zone = string_or_env(&block.zone, env, env::ZONE_ENV_VARS)
            .map(|zone| get_resource_name_from_self_link(&zone).to_string());

        let mut scopes = known_strings(&block.scopes);
        if scopes.is_empty() {
            scopes = DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect();
        }

        let user_project_override = match block.user_project_override {
            Value::Value(b) => b,
            _ => match env.var(env::USER_PROJECT_OVERRIDE_ENV_VAR) {
                Some(s) if !s.is_empty() => parse_bool(&s)
                    .ok_or(ConfigError::InvalidBoolEnv(env::USER_PROJECT_OVERRIDE_ENV_VAR))?,
                _ => false,
            },
        };

        let request_timeout = duration_or_default(
            &block.request_timeout,
            "request_timeout",
            DEFAULT_REQUEST_TIMEOUT,
        )?;

        let batching = match &block.batching {
            Value::Value(batching) => Batching {
                send_after: duration_or_default(
                    &batching.send_after,
                    "batching.send_after",
                    DEFAULT_BATCH_SEND_AFTER,
                )?,
                enable_batching: batching.enable_batching.unwrap_or(true),
            },
            _ => Batching::default(),
        };

        let strategy = match block.terraform_attribution_label_addition_strategy.non_empty() {
            Some(s) => AttributionStrategy::parse(s).ok_or_else(|| ConfigError::InvalidEnum {
                field: "terraform_attribution_label_addition_strategy",
                value: s.to_string(),
                allowed: ATTRIBUTION_STRATEGIES,
            })?,
            None => AttributionStrategy::default(),
        };

        let mut base_paths = BTreeMap::new();
        for service in SERVICES {
            let endpoint = match block.custom_endpoint(service.name).and_then(|v| v.non_empty()) {
                Some(endpoint) => Some(endpoint.to_string()),
                None => multi_env_search(env, &[service.env_var]),
            };
            let base_path = match endpoint {
                Some(endpoint) if is_valid_custom_endpoint(&endpoint) => endpoint,
                Some(endpoint) => {
                    return Err(ConfigError::InvalidEndpoint {
                        field: service.attribute_name(),
                        value: endpoint,
                    })
                }
                None => service.base_path_in(&universe_domain),
            };
            base_paths.insert(service.name, base_path);
        }

        Ok(Self {
            credentials,
            access_token,
            external_credentials,
            impersonate_service_account: string_or_env(
                &block.impersonate_service_account,
                env,
                env::IMPERSONATE_ENV_VARS,
            ),
            impersonate_service_account_delegates: known_strings(
                &block.impersonate_service_account_delegates,
            ),
            project: string_or_env(&block.project, env, env::PROJECT_ENV_VARS),
            billing_project: string_or_env(&block.billing_project, env, env::BILLING_PROJECT_ENV_VARS),
            region,
            zone,
            scopes,
            user_project_override,
            request_timeout,
            request_reason: string_or_env(&block.request_reason, env, env::REQUEST_REASON_ENV_VARS),
            universe_domain,
            default_labels: known_map(&block.default_labels),
            add_terraform_attribution_label: block.add_terraform_attribution_label.unwrap_or(true),
            terraform_attribution_label_addition_strategy: strategy,
            batching,
            base_paths,
            user_agent: String::new(),
        })
    }

    /// Base path of a service, eg: `base_path("compute")`
    pub fn base_path(&self, service: &str) -> Option<&str> {
        self.base_paths.get(service).map(String::as_str)
    }

    /// Endpoint of the OpenID Connect userinfo API
    pub fn userinfo_url(&self) -> String {
        format!("https://openidconnect.{}/v1/userinfo", self.universe_domain)
    }

    /// Look a field up by its template name, eg: `Project` or `ComputeBasePath`
    ///
    /// Used by URL templates for variables that are not resource fields.
    pub fn field_by_name(&self, name: &str) -> Option<String> {
        match name {
            "Project" => self.project.clone(),
            "BillingProject" => self.billing_project.clone(),
            "Region" => self.region.clone(),
            "Zone" => self.zone.clone(),
            "UniverseDomain" => Some(self.universe_domain.clone()),
            "UserAgent" => Some(self.user_agent.clone()),
            _ => SERVICES
                .iter()
                .find(|service| service.base_path_name == name)
                .and_then(|service| self.base_path(service.name))
                .map(str::to_string),
        }
    }
}
