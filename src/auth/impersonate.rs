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

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::Config;
use crate::error::AuthError;

use super::{AccessToken, TokenSource};

const TOKEN_LIFETIME: &str = "3600s";

/// Tokens of another service account, obtained with the IAM Credentials API
#[derive(Debug)]
pub struct ImpersonatedTokenSource {
    base: Arc<dyn TokenSource>,
    http: reqwest::Client,
    url: String,
    delegates: Vec<String>,
    scopes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GenerateAccessTokenRequest<'a> {
    delegates: &'a [String],
    scope: &'a [String],
    lifetime: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAccessTokenResponse {
    access_token: String,
    expire_time: String,
}

fn account_name(account: &str) -> String {
    if account.starts_with("projects/") {
        account.to_string()
    } else {
        format!("projects/-/serviceAccounts/{account}")
    }
}

impl ImpersonatedTokenSource {
    /// Impersonate `target` with the tokens of `base`
    pub fn new(
        base: Arc<dyn TokenSource>,
        config: &Config,
        target: &str,
        http: reqwest::Client,
    ) -> Self {
        let base_path = config
            .base_path("iam_credentials")
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!("https://iamcredentials.{}/v1/", config.universe_domain)
            });
        Self {
            base,
            http,
            url: format!("{base_path}{}:generateAccessToken", account_name(target)),
            delegates: config
                .impersonate_service_account_delegates
                .iter()
                .map(|delegate| account_name(delegate))
                .collect(),
            scopes: config.scopes.clone(),
        }
    }

    /// Call `generateAccessToken` directly, without a delegation chain
    pub fn without_delegates(mut self) -> Self {
        self.delegates.clear();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TokenSource for ImpersonatedTokenSource {
    async fn token(&self) -> Result<AccessToken, AuthError> {
        let base = self.base.token().await?;
        tracing::debug!("Generating impersonated token with {}", self.url);
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&base.token)
            .json(&GenerateAccessTokenRequest {
                delegates: &self.delegates,
                scope: &self.scopes,
                lifetime: TOKEN_LIFETIME,
            })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }
        let token: GenerateAccessTokenResponse = serde_json::from_str(&body)?;
        let expiry = OffsetDateTime::parse(&token.expire_time, &Rfc3339)
            .map_err(|_| AuthError::InvalidExpiry(token.expire_time.clone()))?;
        Ok(AccessToken {
            token: token.access_token,
            expiry: Some(expiry),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::StaticTokenSource;
    use super::*;

    #[test]
    fn generate_access_token_url() {
        let config = Config {
            impersonate_service_account_delegates: vec![
                "a@p.iam.gserviceaccount.com".to_string(),
                "projects/-/serviceAccounts/b@p.iam.gserviceaccount.com".to_string(),
            ],
            ..Default::default()
        };
        let source = ImpersonatedTokenSource::new(
            Arc::new(StaticTokenSource::new("base")),
            &config,
            "target@p.iam.gserviceaccount.com",
            reqwest::Client::new(),
        );
        assert_eq!(
            source.url(),
            "https://iamcredentials.googleapis.com/v1/projects/-/serviceAccounts/target@p.iam.gserviceaccount.com:generateAccessToken"
        );
        assert_eq!(
            source.delegates,
            vec![
                "projects/-/serviceAccounts/a@p.iam.gserviceaccount.com",
                "projects/-/serviceAccounts/b@p.iam.gserviceaccount.com",
            ]
        );
    }
}
