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
use tf_provider::value::{Value, ValueEmpty, ValueMap, ValueString};
use tf_provider::{map, DataSource, Diagnostics};

use crate::error::report;
use crate::provider::{provider_state, SharedState};
use crate::utils::{to_value_map, to_value_string};

use super::{computed, computed_sensitive};

/// `google_client_config`: project, location and access token of the provider
#[derive(Debug, Clone)]
pub struct ClientConfigDataSource {
    state: SharedState,
}

impl ClientConfigDataSource {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfigState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub project: ValueString<'a>,
    pub region: ValueString<'a>,
    pub zone: ValueString<'a>,
    pub access_token: ValueString<'a>,
    pub default_labels: ValueMap<'a, ValueString<'a>>,
}

#[async_trait]
impl DataSource for ClientConfigDataSource {
    type State<'a> = ClientConfigState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => computed(AttributeType::String, "`projects/{project}/regions/{region}/zones/{zone}`"),
                    "project" => computed(AttributeType::String, "Default project of the provider"),
                    "region" => computed(AttributeType::String, "Default region of the provider"),
                    "zone" => computed(AttributeType::String, "Default zone of the provider"),
                    "access_token" => computed_sensitive(AttributeType::String, "OAuth 2.0 access token of the provider credentials"),
                    "default_labels" => computed(AttributeType::Map(AttributeType::String.into()), "Default labels of the provider"),
                },
                description: Description::plain("Configuration of the google provider client"),
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

        let token = match state.client.access_token().await {
            Ok(token) => token,
            Err(err) => {
                report(diags, "Could not get an access token", &err);
                return None;
            }
        };

        let mut output = config;
        output.id = Value::Value(
            format!(
                "projects/{}/regions/{}/zones/{}",
                resolved.project.as_deref().unwrap_or_default(),
                resolved.region.as_deref().unwrap_or_default(),
                resolved.zone.as_deref().unwrap_or_default(),
            )
            .into(),
        );
        output.project = to_value_string(resolved.project.as_deref());
        output.region = to_value_string(resolved.region.as_deref());
        output.zone = to_value_string(resolved.zone.as_deref());
        output.access_token = Value::Value(token.token.into());
        output.default_labels = to_value_map(&resolved.default_labels);

        Some(output)
    }
}
