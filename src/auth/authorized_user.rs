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

use crate::error::AuthError;

use super::{fetch_token, AccessToken, CredentialsFile, TokenSource, DEFAULT_TOKEN_URI};

/// User credentials from `gcloud auth application-default login`
pub struct AuthorizedUserTokenSource {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token_uri: String,
}

impl std::fmt::Debug for AuthorizedUserTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserTokenSource")
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl AuthorizedUserTokenSource {
    pub fn new(file: &CredentialsFile, http: reqwest::Client) -> Result<Self, AuthError> {
        let field = |value: &Option<String>, name| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or(AuthError::MissingField(name))
        };
        Ok(Self {
            http,
            client_id: field(&file.client_id, "client_id")?,
            client_secret: field(&file.client_secret, "client_secret")?,
            refresh_token: field(&file.refresh_token, "refresh_token")?,
            token_uri: field(&file.token_uri, "token_uri")
                .unwrap_or_else(|_| DEFAULT_TOKEN_URI.to_string()),
        })
    }
}

#[async_trait]
impl TokenSource for AuthorizedUserTokenSource {
    async fn token(&self) -> Result<AccessToken, AuthError> {
        tracing::debug!("Refreshing user token from {}", self.token_uri);
        fetch_token(self.http.post(&self.token_uri).form(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
        ]))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields() {
        let mut file = CredentialsFile {
            kind: "authorized_user".to_string(),
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            AuthorizedUserTokenSource::new(&file, reqwest::Client::new()),
            Err(AuthError::MissingField("refresh_token"))
        ));

        file.refresh_token = Some("refresh".to_string());
        let source = AuthorizedUserTokenSource::new(&file, reqwest::Client::new()).unwrap();
        assert_eq!(source.token_uri, DEFAULT_TOKEN_URI);
        assert!(!format!("{source:?}").contains("refresh"));
    }
}
