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
use tf_provider::value::{Value, ValueEmpty, ValueString};
use tf_provider::{map, DataSource, Diagnostics};

use crate::error::report;
use crate::provider::{provider_state, SharedState};
use crate::transport::current_user_email;

use super::computed;

/// `google_client_openid_userinfo`: email of the identity used by the provider
#[derive(Debug, Clone)]
pub struct ClientOpenidUserinfoDataSource {
    state: SharedState,
}

impl ClientOpenidUserinfoDataSource {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientOpenidUserinfoState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub email: ValueString<'a>,
}

#[async_trait]
impl DataSource for ClientOpenidUserinfoDataSource {
    type State<'a> = ClientOpenidUserinfoState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => computed(AttributeType::String, "Email of the identity"),
                    "email" => computed(AttributeType::String, "Email of the identity"),
                },
                description: Description::plain(
                    "OpenID Connect userinfo of the credentials used by the provider",
                ),
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

        let email = match current_user_email(&state.client, &state.config).await {
            Ok(email) => email,
            Err(err) => {
                report(diags, "Could not get the identity email", &err);
                return None;
            }
        };

        let mut output = config;
        output.id = Value::Value(email.clone().into());
        output.email = Value::Value(email.into());

        Some(output)
    }
}
