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

use tf_provider::value::{Value, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::auth::expand_home;
use crate::error::{report_at, AuthError};
use crate::utils::ValueStringExt;

use super::{is_valid_custom_endpoint, parse_duration, ProviderConfig, ATTRIBUTION_STRATEGIES, SERVICES};

/// Credentials are either empty, a path to an existing file, or JSON
pub fn validate_credentials(credentials: &str) -> Result<(), AuthError> {
    if credentials.is_empty() || expand_home(credentials).exists() {
        return Ok(());
    }
    serde_json::from_str::<serde_json::Value>(credentials)?;
    Ok(())
}

fn validate_non_empty(diags: &mut Diagnostics, name: &'static str, value: &ValueString) {
    if let Value::Value(s) = value {
        if s.is_empty() {
            diags.error(
                "Invalid attribute value",
                format!("expected a non-empty string for `{name}`"),
                AttributePath::new(name),
            );
        }
    }
}

fn validate_duration(diags: &mut Diagnostics, path: AttributePath, value: &ValueString) {
    if let Value::Value(s) = value {
        if let Err(err) = parse_duration(s) {
            report_at(diags, "Invalid duration", &err, path);
        }
    }
}

/// Check the provider block before it is used to configure the provider
///
/// Unknown values are skipped: they are validated again once known.
pub fn validate_provider_config(config: &ProviderConfig, diags: &mut Diagnostics) -> Option<()> {
    if let Value::Value(credentials) = &config.credentials {
        if let Err(err) = validate_credentials(credentials) {
            report_at(
                diags,
                "Invalid credentials",
                &err,
                AttributePath::new("credentials"),
            );
        }
    }
    if config.credentials.non_empty().is_some() && config.access_token.non_empty().is_some() {
        diags.error(
            "Conflicting configuration arguments",
            "\"credentials\": conflicts with access_token",
            AttributePath::new("credentials"),
        );
    }

    if let Value::Value(external) = &config.external_credentials_hcp_terraform {
        let path = AttributePath::new("external_credentials_hcp_terraform").index(0);
        for (other, value) in [
            ("credentials", &config.credentials),
            ("access_token", &config.access_token),
        ] {
            if value.non_empty().is_some() {
                diags.error(
                    "Conflicting configuration arguments",
                    format!("\"external_credentials_hcp_terraform\": conflicts with {other}"),
                    AttributePath::new("external_credentials_hcp_terraform"),
                );
            }
        }
        for (name, value) in [
            ("audience", &external.audience),
            ("service_account_email", &external.service_account_email),
            ("identity_token", &external.identity_token),
        ] {
            match value {
                Value::Value(s) if s.is_empty() => diags.error(
                    "Invalid attribute value",
                    format!("{name} was set to ``"),
                    path.clone().attribute(name),
                ),
                Value::Null => diags.error(
                    "Missing required argument",
                    format!("The argument \"{name}\" is required, but no definition was found."),
                    path.clone().attribute(name),
                ),
                _ => (),
            }
        }
    }

    validate_non_empty(diags, "project", &config.project);
    validate_non_empty(diags, "billing_project", &config.billing_project);
    validate_non_empty(diags, "region", &config.region);
    validate_non_empty(diags, "zone", &config.zone);

    validate_duration(
        diags,
        AttributePath::new("request_timeout"),
        &config.request_timeout,
    );
    if let Value::Value(batching) = &config.batching {
        validate_duration(
            diags,
            AttributePath::new("batching").index(0).attribute("send_after"),
            &batching.send_after,
        );
    }

    if let Value::Value(strategy) = &config.terraform_attribution_label_addition_strategy {
        if !ATTRIBUTION_STRATEGIES.contains(&&**strategy) {
            diags.error(
                "Invalid attribute value",
                format!(
                    "expected terraform_attribution_label_addition_strategy to be one of {ATTRIBUTION_STRATEGIES:?}, got {strategy}"
                ),
                AttributePath::new("terraform_attribution_label_addition_strategy"),
            );
        }
    }

    for service in SERVICES {
        if let Some(Value::Value(endpoint)) = config.custom_endpoint(service.name) {
            if !endpoint.is_empty() && !is_valid_custom_endpoint(endpoint) {
                diags.error(
                    "Invalid custom endpoint",
                    format!("{endpoint:?} is not an http(s) URL ending with a slash"),
                    AttributePath::new(service.attribute_name()),
                );
            }
        }
    }

    if let Value::Value(scopes) = &config.scopes {
        for (i, scope) in scopes.iter().enumerate() {
            if let Value::Value(scope) = scope {
                if scope.is_empty() {
                    diags.error_short(
                        "`scopes` should not contain empty strings",
                        AttributePath::new("scopes").index(i as i64),
                    );
                }
            }
        }
    }

    if diags.errors.len() == 0 {
        Some(())
    } else {
        None
    }
}
