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
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use time::OffsetDateTime;

use crate::error::AuthError;

use super::{fetch_token, AccessToken, CredentialsFile, TokenSource, DEFAULT_TOKEN_URI};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME: i64 = 3600;

/// Service account key, exchanged for tokens with a signed JWT
pub struct ServiceAccountTokenSource {
    http: reqwest::Client,
    client_email: String,
    private_key_id: Option<String>,
    key: EncodingKey,
    token_uri: String,
    scopes: Vec<String>,
}

impl std::fmt::Debug for ServiceAccountTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountTokenSource")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Parse the `private_key` of a service account key
pub fn parse_private_key(private_key: &str) -> Result<EncodingKey, AuthError> {
    let block = pem::parse(private_key).map_err(|err| AuthError::InvalidPrivateKey(err.to_string()))?;
    match block.tag() {
        "PRIVATE KEY" | "RSA PRIVATE KEY" => (),
        tag => {
            return Err(AuthError::InvalidPrivateKey(format!(
                "unexpected PEM block {tag:?}"
            )))
        }
    }
    Ok(EncodingKey::from_rsa_pem(private_key.as_bytes())?)
}

impl ServiceAccountTokenSource {
    pub fn new(
        file: &CredentialsFile,
        scopes: &[String],
        http: reqwest::Client,
    ) -> Result<Self, AuthError> {
        let client_email = file
            .client_email
            .clone()
            .ok_or(AuthError::MissingField("client_email"))?;
        let private_key = file
            .private_key
            .as_deref()
            .ok_or(AuthError::MissingField("private_key"))?;
        Ok(Self {
            http,
            client_email,
            private_key_id: file.private_key_id.clone(),
            key: parse_private_key(private_key)?,
            token_uri: file
                .token_uri
                .clone()
                .filter(|uri| !uri.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            scopes: scopes.to_vec(),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Signed assertion for the token endpoint
    fn assertion(&self, now: OffsetDateTime) -> Result<String, AuthError> {
        let iat = now.unix_timestamp();
        let claims = Claims {
            iss: &self.client_email,
            scope: self.scopes.join(" "),
            aud: &self.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME,
        };
        let header = Header {
            kid: self.private_key_id.clone(),
            ..Header::new(Algorithm::RS256)
        };
        Ok(jsonwebtoken::encode(&header, &claims, &self.key)?)
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn token(&self) -> Result<AccessToken, AuthError> {
        let assertion = self.assertion(OffsetDateTime::now_utc())?;
        tracing::debug!(
            "Requesting token for service account {} from {}",
            self.client_email,
            self.token_uri
        );
        fetch_token(
            self.http
                .post(&self.token_uri)
                .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())]),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_private_key() {
        let file = CredentialsFile {
            kind: "service_account".to_string(),
            client_email: Some("sa@p.iam.gserviceaccount.com".to_string()),
            private_key: Some("not a key".to_string()),
            ..Default::default()
        };
        let err = ServiceAccountTokenSource::new(&file, &[], reqwest::Client::new()).unwrap_err();
        assert!(matches!(err, AuthError::InvalidPrivateKey(_)), "{err}");
    }

    #[test]
    fn missing_fields() {
        let file = CredentialsFile {
            kind: "service_account".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ServiceAccountTokenSource::new(&file, &[], reqwest::Client::new()),
            Err(AuthError::MissingField("client_email"))
        ));
    }

    #[test]
    fn unexpected_pem_block() {
        let certificate = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";
        assert!(matches!(
            parse_private_key(certificate),
            Err(AuthError::InvalidPrivateKey(msg)) if msg.contains("CERTIFICATE")
        ));
    }
}
