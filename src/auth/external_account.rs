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

use crate::config::ExternalCredentials;
use crate::error::AuthError;

use super::{fetch_token, AccessToken, TokenSource};

pub const TOKEN_EXCHANGE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
pub const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";
pub const JWT_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:jwt";

const STS_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Federated token for an HCP Terraform workload identity token
///
/// The identity token is exchanged at the Security Token Service. The
/// federated token is then used to impersonate the service account.
pub struct ExternalAccountTokenSource {
    http: reqwest::Client,
    audience: String,
    identity_token: String,
    token_url: String,
}

impl std::fmt::Debug for ExternalAccountTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalAccountTokenSource")
            .field("audience", &self.audience)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl ExternalAccountTokenSource {
    pub fn new(credentials: &ExternalCredentials, http: reqwest::Client) -> Self {
        Self {
            http,
            audience: credentials.audience.clone(),
            identity_token: credentials.identity_token.clone(),
            token_url: credentials.token_url.clone(),
        }
    }
}

#[async_trait]
impl TokenSource for ExternalAccountTokenSource {
    async fn token(&self) -> Result<AccessToken, AuthError> {
        tracing::debug!("Exchanging identity token at {}", self.token_url);
        fetch_token(self.http.post(&self.token_url).form(&[
            ("grant_type", TOKEN_EXCHANGE_GRANT_TYPE),
            ("audience", self.audience.as_str()),
            ("scope", STS_SCOPE),
            ("requested_token_type", ACCESS_TOKEN_TYPE),
            ("subject_token", self.identity_token.as_str()),
            ("subject_token_type", JWT_TOKEN_TYPE),
        ]))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_token_is_redacted() {
        let source = ExternalAccountTokenSource::new(
            &ExternalCredentials {
                audience: "//iam.googleapis.com/projects/1/locations/global/workloadIdentityPools/p/providers/hcp".to_string(),
                service_account_email: "sa@p.iam.gserviceaccount.com".to_string(),
                identity_token: "eyJhbGciOiJSUzI1NiJ9.secret".to_string(),
                token_url: "https://sts.googleapis.com/v1/token".to_string(),
            },
            reqwest::Client::new(),
        );
        let debug = format!("{source:?}");
        assert!(debug.contains("workloadIdentityPools"));
        assert!(!debug.contains("secret"));
    }
}
