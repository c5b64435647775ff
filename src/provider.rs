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

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};
use tf_provider::value::ValueEmpty;
use tf_provider::{map, Diagnostics, DynamicDataSource, DynamicFunction, Provider};
use tokio::sync::RwLock;

use crate::auth::credentials_from_config;
use crate::config::{
    validate_provider_config, Config, ProviderConfig, ATTRIBUTION_STRATEGIES,
    DEFAULT_BATCH_SEND_AFTER, DEFAULT_REQUEST_TIMEOUT, SERVICES,
};
use crate::data_source::{
    ClientConfigDataSource, ClientOpenidUserinfoDataSource, ProviderConfigDataSource,
};
use crate::env::{EnvSource, ProcessEnv};
use crate::error::report;
use crate::functions::{IdFunction, RegionFromZone};
use crate::transport::{current_user_email, user_agent, Client};

/// Everything a configured provider shares with its data sources
#[derive(Debug)]
pub struct ProviderState {
    pub config: Config,
    pub client: Client,
}

/// Filled by [`GoogleProvider::configure`], read by the data sources
pub type SharedState = Arc<RwLock<Option<Arc<ProviderState>>>>;

/// Get the state of a configured provider
pub(crate) async fn provider_state(
    state: &SharedState,
    diags: &mut Diagnostics,
) -> Option<Arc<ProviderState>> {
    let state = state.read().await.clone();
    if state.is_none() {
        diags.root_error(
            "Provider is not configured",
            "The google provider must be configured before reading data sources",
        );
    }
    state
}

/// Terraform provider for Google Cloud
#[derive(Clone)]
pub struct GoogleProvider {
    state: SharedState,
    env: Arc<dyn EnvSource>,
}

impl Default for GoogleProvider {
    fn default() -> Self {
        Self::with_env(ProcessEnv)
    }
}

impl Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl GoogleProvider {
    /// Provider resolving its configuration against `env` instead of the process environment
    pub fn with_env<E: EnvSource + 'static>(env: E) -> Self {
        Self {
            state: Default::default(),
            env: Arc::new(env),
        }
    }

    /// State shared with the data sources
    pub fn state(&self) -> &SharedState {
        &self.state
    }
}

fn string_attribute<T: ToString>(description: T) -> Attribute {
    Attribute {
        attr_type: AttributeType::String,
        description: Description::markdown(description),
        constraint: AttributeConstraint::Optional,
        ..Default::default()
    }
}

fn provider_attributes() -> HashMap<String, Attribute> {
    let mut attributes: HashMap<String, Attribute> = map! {
        "credentials" => Attribute {
            sensitive: true,
            ..string_attribute("Path or content of a service account or user credentials JSON file")
        },
        "access_token" => Attribute {
            sensitive: true,
            ..string_attribute("Temporary OAuth 2.0 access token, conflicts with `credentials`")
        },
        "impersonate_service_account" => string_attribute("Service account used to make requests on behalf of the credentials"),
        "impersonate_service_account_delegates" => Attribute {
            attr_type: AttributeType::List(AttributeType::String.into()),
            ..string_attribute("Delegation chain for the impersonated service account")
        },
        "project" => string_attribute("Default project of the resources"),
        "billing_project" => string_attribute("Project billed for quota, used with `user_project_override`"),
        "region" => string_attribute("Default region of the resources"),
        "zone" => string_attribute("Default zone of the resources"),
        "scopes" => Attribute {
            attr_type: AttributeType::List(AttributeType::String.into()),
            ..string_attribute("OAuth 2.0 scopes requested for the access tokens")
        },
        "user_project_override" => Attribute {
            attr_type: AttributeType::Bool,
            ..string_attribute("Bill the resource project (or `billing_project`) for quota instead of the credentials project")
        },
        "request_timeout" => string_attribute(format!(
            "Timeout of each HTTP request, `{DEFAULT_REQUEST_TIMEOUT}` by default"
        )),
        "request_reason" => string_attribute("Reason sent in the `X-Goog-Request-Reason` header for audit logs"),
        "universe_domain" => string_attribute("Universe domain of the Google APIs, `googleapis.com` by default"),
        "default_labels" => Attribute {
            attr_type: AttributeType::Map(AttributeType::String.into()),
            ..string_attribute("Labels added to every resource supporting labels")
        },
        "add_terraform_attribution_label" => Attribute {
            attr_type: AttributeType::Bool,
            ..string_attribute("Add the `goog-terraform-provisioned` label to the resources")
        },
        "terraform_attribution_label_addition_strategy" => string_attribute(format!(
            "When to add the attribution label, one of {ATTRIBUTION_STRATEGIES:?}"
        )),
    };
    attributes.extend(SERVICES.iter().map(|service| {
        (
            service.attribute_name(),
            string_attribute(format!(
                "Base path of the {} API, `{}` by default",
                service.name, service.default_base_path
            )),
        )
    }));
    attributes
}

#[async_trait]
impl Provider for GoogleProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: provider_attributes(),
                blocks: map! {
                    "batching" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "send_after" => string_attribute(format!(
                                "Time to wait before sending a batch of requests, `{DEFAULT_BATCH_SEND_AFTER}` by default"
                            )),
                            "enable_batching" => Attribute {
                                attr_type: AttributeType::Bool,
                                ..string_attribute("Group compatible requests together")
                            },
                        },
                        description: Description::plain("Request batching"),
                        ..Default::default()
                    }),
                    "external_credentials_hcp_terraform" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "audience" => Attribute {
                                constraint: AttributeConstraint::Required,
                                ..string_attribute("Full resource name of the workload identity pool provider")
                            },
                            "service_account_email" => Attribute {
                                constraint: AttributeConstraint::Required,
                                ..string_attribute("Service account impersonated with the federated token")
                            },
                            "identity_token" => Attribute {
                                constraint: AttributeConstraint::Required,
                                sensitive: true,
                                ..string_attribute("Workload identity token issued by HCP Terraform")
                            },
                        },
                        description: Description::markdown(
                            "HCP Terraform workload identity, conflicts with `credentials` and `access_token`",
                        ),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Manage Google Cloud Platform resources"),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        validate_provider_config(&config, diags)
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let env = self.env.as_ref();
        let mut config = match Config::resolve(&config, env) {
            Ok(config) => config,
            Err(err) => {
                report(diags, "Invalid provider configuration", &err);
                return None;
            }
        };
        config.user_agent = user_agent(
            &terraform_version,
            env!("CARGO_PKG_VERSION"),
            None,
            env,
        );

        let http = match reqwest::Client::builder().build() {
            Ok(http) => http,
            Err(err) => {
                report(diags, "Could not create the HTTP client", &err);
                return None;
            }
        };
        let credentials = match credentials_from_config(&config, env, &http, false).await {
            Ok(credentials) => credentials,
            Err(err) => {
                report(diags, "Could not load the Google credentials", &err);
                return None;
            }
        };
        tracing::info!(
            "Configured google provider with {} credentials, project {:?}",
            credentials.kind,
            config.project
        );

        let client = Client::new(&config, credentials, http);
        if tracing::enabled!(tracing::Level::DEBUG) {
            match current_user_email(&client, &config).await {
                Ok(email) => tracing::debug!("Terraform is using this identity: {email}"),
                Err(err) => tracing::debug!("Could not get the identity in use: {err}"),
            }
        }

        *self.state.write().await = Some(Arc::new(ProviderState { config, client }));
        Some(())
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        Some(map! {
            "provider_config" => ProviderConfigDataSource::new(self.state.clone()),
            "client_config" => ClientConfigDataSource::new(self.state.clone()),
            "client_openid_userinfo" => ClientOpenidUserinfoDataSource::new(self.state.clone()),
        })
    }

    fn get_functions(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicFunction>>> {
        Some(map! {
            "project_from_id" => IdFunction::Project,
            "region_from_id" => IdFunction::Region,
            "zone_from_id" => IdFunction::Zone,
            "location_from_id" => IdFunction::Location,
            "name_from_id" => IdFunction::Name,
            "region_from_zone" => RegionFromZone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_lists_every_setting() {
        let schema = GoogleProvider::default()
            .schema(&mut Diagnostics::default())
            .unwrap();
        let attributes = &schema.block.attributes;
        assert!(attributes["credentials"].sensitive);
        assert!(attributes["access_token"].sensitive);
        assert!(!attributes["project"].sensitive);
        for service in SERVICES {
            assert!(attributes.contains_key(&service.attribute_name()));
        }
        assert!(schema.block.blocks.contains_key("batching"));
        match &schema.block.blocks["external_credentials_hcp_terraform"] {
            NestedBlock::Optional(block) => {
                assert!(block.attributes["identity_token"].sensitive);
                assert_eq!(block.attributes.len(), 3);
            }
            _ => panic!("external_credentials_hcp_terraform should be an optional block"),
        }
    }

    #[tokio::test]
    async fn configure_with_access_token() {
        let env: HashMap<String, String> = [(
            "GOOGLE_REGION".to_string(),
            "europe-west1".to_string(),
        )]
        .into();
        let provider = GoogleProvider::with_env(env);
        let config = ProviderConfig {
            access_token: "ya29.token".into(),
            project: "my-project".into(),
            ..Default::default()
        };

        let mut diags = Diagnostics::default();
        let configured = provider
            .configure(&mut diags, "1.7.0".to_string(), config)
            .await;
        assert!(configured.is_some(), "{diags:?}");

        let state = provider.state().read().await.clone().unwrap();
        assert_eq!(state.config.project.as_deref(), Some("my-project"));
        assert_eq!(state.config.region.as_deref(), Some("europe-west1"));
        assert!(state.config.user_agent.starts_with("Terraform/1.7.0 "));
        assert_eq!(state.client.credentials().kind, "access_token");
        assert_eq!(state.client.access_token().await.unwrap().token, "ya29.token");
    }

    #[tokio::test]
    async fn configure_reports_invalid_settings() {
        let env: HashMap<String, String> =
            [("USER_PROJECT_OVERRIDE".to_string(), "maybe".to_string())].into();
        let provider = GoogleProvider::with_env(env);
        let config = ProviderConfig {
            access_token: "ya29.token".into(),
            ..Default::default()
        };

        let mut diags = Diagnostics::default();
        let configured = provider
            .configure(&mut diags, "1.7.0".to_string(), config)
            .await;
        assert!(configured.is_none());
        assert_eq!(diags.errors.len(), 1);
        assert!(provider.state().read().await.is_none());
    }

    #[test]
    fn registered_names() {
        let provider = GoogleProvider::default();
        let mut diags = Diagnostics::default();
        let data_sources = provider.get_data_sources(&mut diags).unwrap();
        let mut names: Vec<_> = data_sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            ["client_config", "client_openid_userinfo", "provider_config"]
        );
        assert_eq!(provider.get_functions(&mut diags).unwrap().len(), 6);
    }
}
