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

//! Data sources exposing the configured provider
//!
//! They hold a clone of the provider [`SharedState`](crate::provider::SharedState):
//! data sources are registered before the provider is configured.

mod client_config;
mod client_openid_userinfo;
mod provider_config;

pub use client_config::{ClientConfigDataSource, ClientConfigState};
pub use client_openid_userinfo::{ClientOpenidUserinfoDataSource, ClientOpenidUserinfoState};
pub use provider_config::{ProviderConfigDataSource, ProviderConfigState};

use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Description};

fn computed(attr_type: AttributeType, description: &'static str) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint: AttributeConstraint::Computed,
        ..Default::default()
    }
}

fn computed_sensitive(attr_type: AttributeType, description: &'static str) -> Attribute {
    Attribute {
        sensitive: true,
        ..computed(attr_type, description)
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::sync::Arc;

    use crate::auth::{Credentials, StaticTokenSource};
    use crate::config::Config;
    use crate::provider::{ProviderState, SharedState};
    use crate::transport::Client;

    /// State of a provider configured with a static access token
    pub fn configured(config: Config) -> SharedState {
        let credentials = Credentials {
            source: Arc::new(StaticTokenSource::new("ya29.test-token")),
            kind: "access_token",
        };
        let client = Client::new(&config, credentials, reqwest::Client::new());
        Arc::new(tokio::sync::RwLock::new(Some(Arc::new(ProviderState {
            config,
            client,
        }))))
    }
}
