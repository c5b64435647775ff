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

use std::time::Duration;

use async_trait::async_trait;

use crate::env::{EnvSource, METADATA_HOST_ENV_VAR};
use crate::error::AuthError;

use super::{fetch_token, AccessToken, TokenSource};

const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default service account of a Compute Engine instance
#[derive(Debug, Clone)]
pub struct MetadataTokenSource {
    http: reqwest::Client,
    base_url: String,
    /// The host was given explicitly with `GCE_METADATA_HOST`
    explicit: bool,
    scopes: Vec<String>,
}

impl MetadataTokenSource {
    pub fn new(env: &dyn EnvSource, scopes: &[String], http: reqwest::Client) -> Self {
        let host = env.var(METADATA_HOST_ENV_VAR).filter(|h| !h.is_empty());
        let explicit = host.is_some();
        let host = host.unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string());
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{host}")
        };
        Self {
            http,
            base_url,
            explicit,
            scopes: scopes.to_vec(),
        }
    }

    pub fn token_url(&self) -> String {
        format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token",
            self.base_url
        )
    }

    /// Whether a metadata server answers
    pub async fn is_available(&self) -> bool {
        if self.explicit {
            return true;
        }
        let probe = self
            .http
            .get(format!("{}/computeMetadata/v1/", self.base_url))
            .header("Metadata-Flavor", "Google")
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;
        match probe {
            Ok(response) => response
                .headers()
                .get("Metadata-Flavor")
                .is_some_and(|flavor| flavor == "Google"),
            Err(err) => {
                tracing::debug!("GCE metadata server is not reachable: {err}");
                false
            }
        }
    }
}

#[async_trait]
impl TokenSource for MetadataTokenSource {
    async fn token(&self) -> Result<AccessToken, AuthError> {
        let mut request = self
            .http
            .get(self.token_url())
            .header("Metadata-Flavor", "Google");
        if !self.scopes.is_empty() {
            request = request.query(&[("scopes", self.scopes.join(","))]);
        }
        fetch_token(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn metadata_host() {
        let env: HashMap<String, String> = HashMap::new();
        let source = MetadataTokenSource::new(&env, &[], reqwest::Client::new());
        assert_eq!(
            source.token_url(),
            "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token"
        );
        assert!(!source.explicit);

        let env: HashMap<String, String> =
            [(METADATA_HOST_ENV_VAR.to_string(), "127.0.0.1:8080".to_string())].into();
        let source = MetadataTokenSource::new(&env, &[], reqwest::Client::new());
        assert_eq!(
            source.token_url(),
            "http://127.0.0.1:8080/computeMetadata/v1/instance/service-accounts/default/token"
        );
        assert!(source.explicit);
    }
}
