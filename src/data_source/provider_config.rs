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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{AttributeType, Block, Description, Schema};
use tf_provider::value::{Value, ValueBool, ValueEmpty, ValueList, ValueMap, ValueString};
use tf_provider::{map, DataSource, Diagnostics};

use crate::config::format_duration;
use crate::provider::{provider_state, SharedState};
use crate::utils::{to_value_list, to_value_map, to_value_string};

use super::{computed, computed_sensitive};

/// `google_provider_config`: every resolved setting of the provider
#[derive(Debug, Clone)]
pub struct ProviderConfigDataSource {
    state: SharedState,
}

impl ProviderConfigDataSource {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfigState<'a> {
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
}

#[async_trait]
impl DataSource for ProviderConfigDataSource {
    type State<'a> = ProviderConfigState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        let string_list = || AttributeType::List(AttributeType::String.into());
        Some(Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "credentials" => computed_sensitive(AttributeType::String, "Credentials given to the provider"),
                    "access_token" => computed_sensitive(AttributeType::String, "Access token given to the provider"),
                    "impersonate_service_account" => computed(AttributeType::String, "Impersonated service account"),
                    "impersonate_service_account_delegates" => computed(string_list(), "Delegation chain of the impersonated service account"),
                    "project" => computed(AttributeType::String, "Default project"),
                    "billing_project" => computed(AttributeType::String, "Billing project"),
                    "region" => computed(AttributeType::String, "Default region"),
                    "zone" => computed(AttributeType::String, "Default zone"),
                    "scopes" => computed(string_list(), "OAuth 2.0 scopes of the access tokens"),
                    "user_project_override" => computed(AttributeType::Bool, "Whether the resource project is billed for quota"),
                    "request_timeout" => computed(AttributeType::String, "Timeout of each HTTP request"),
                    "request_reason" => computed(AttributeType::String, "Reason sent for audit logs"),
                    "universe_domain" => computed(AttributeType::String, "Universe domain of the Google APIs"),
                    "default_labels" => computed(AttributeType::Map(AttributeType::String.into()), "Labels added to every resource"),
                    "add_terraform_attribution_label" => computed(AttributeType::Bool, "Whether the attribution label is added"),
                    "terraform_attribution_label_addition_strategy" => computed(AttributeType::String, "When the attribution label is added"),
                },
                description: Description::plain("Resolved configuration of the google provider"),
                ..Default::default()
            },
        })
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let state = provider_state(&self.state, diags).await?;
        let resolved = &state.config;

        let mut output = config;
        output.credentials = to_value_string(resolved.credentials.as_deref());
        output.access_token = to_value_string(resolved.access_token.as_deref());
        output.impersonate_service_account =
            to_value_string(resolved.impersonate_service_account.as_deref());
        output.impersonate_service_account_delegates =
            to_value_list(&resolved.impersonate_service_account_delegates);
        output.project = to_value_string(resolved.project.as_deref());
        output.billing_project = to_value_string(resolved.billing_project.as_deref());
        output.region = to_value_string(resolved.region.as_deref());
        output.zone = to_value_string(resolved.zone.as_deref());
        output.scopes = to_value_list(&resolved.scopes);
        output.user_project_override = Value::Value(resolved.user_project_override);
        output.request_timeout = Value::Value(format_duration(resolved.request_timeout).into());
        output.request_reason = to_value_string(resolved.request_reason.as_deref());
        output.universe_domain = Value::Value(resolved.universe_domain.clone().into());
        output.default_labels = to_value_map(&resolved.default_labels);
        output.add_terraform_attribution_label =
            Value::Value(resolved.add_terraform_attribution_label);
        output.terraform_attribution_label_addition_strategy = Value::Value(
            resolved
                .terraform_attribution_label_addition_strategy
                .as_str()
                .into(),
        );

        Some(output)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::{AttributionStrategy, Config};
    use crate::data_source::test_utils::configured;

    use super::*;

    #[tokio::test]
    async fn exposes_resolved_settings() {
        let config = Config {
            project: Some("my-project".to_string()),
            access_token: Some("ya29.secret".to_string()),
            request_timeout: Duration::from_secs(90),
            terraform_attribution_label_addition_strategy: AttributionStrategy::Proactive,
            ..Default::default()
        };
        let data_source = ProviderConfigDataSource::new(configured(config));
        let mut diags = Diagnostics::default();
        let state = data_source
            .read(&mut diags, Default::default(), Default::default())
            .await
            .unwrap();

        assert!(diags.errors.is_empty());
        assert_eq!(state.project.as_str(), "my-project");
        assert_eq!(state.access_token.as_str(), "ya29.secret");
        assert_eq!(state.credentials, Value::Null);
        assert_eq!(state.request_timeout.as_str(), "90s");
        assert_eq!(state.universe_domain.as_str(), "googleapis.com");
        assert_eq!(
            state.terraform_attribution_label_addition_strategy.as_str(),
            "PROACTIVE"
        );
        assert_eq!(state.add_terraform_attribution_label, Value::Value(true));
    }

    #[tokio::test]
    async fn unconfigured_provider() {
        let data_source = ProviderConfigDataSource::new(Default::default());
        let mut diags = Diagnostics::default();
        let state = data_source
            .read(&mut diags, Default::default(), Default::default())
            .await;
        assert!(state.is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn secrets_are_sensitive() {
        let schema = ProviderConfigDataSource::new(Default::default())
            .schema(&mut Diagnostics::default())
            .unwrap();
        assert!(schema.block.attributes["credentials"].sensitive);
        assert!(schema.block.attributes["access_token"].sensitive);
        assert!(!schema.block.attributes["project"].sensitive);
    }
}
