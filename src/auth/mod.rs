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

//! Credentials and OAuth2 access tokens
//!
//! Credentials are picked with the following precedence:
//! 1. `access_token`,
//! 2. `credentials` (JSON key or path to it),
//! 3. `external_credentials_hcp_terraform` (workload identity federation),
//! 4. application default credentials: `GOOGLE_APPLICATION_CREDENTIALS`,
//!    then the gcloud well-known file, then the GCE metadata server.
//!
//! When `impersonate_service_account` is set, tokens of the selected
//! credentials are exchanged for tokens of the impersonated account.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::env::{EnvSource, APPLICATION_CREDENTIALS_ENV_VAR, CLOUDSDK_CONFIG_ENV_VAR};
use crate::error::AuthError;

mod authorized_user;
mod external_account;
mod impersonate;
mod metadata;
mod service_account;

pub use authorized_user::AuthorizedUserTokenSource;
pub use external_account::ExternalAccountTokenSource;
pub use impersonate::ImpersonatedTokenSource;
pub use metadata::MetadataTokenSource;
pub use service_account::ServiceAccountTokenSource;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens are refreshed this long before they expire
pub const REFRESH_MARGIN: time::Duration = time::Duration::seconds(60);

const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

/// OAuth2 bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// `None` for tokens that never expire, like a static `access_token`
    pub expiry: Option<OffsetDateTime>,
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl AccessToken {
    /// Whether the token expires within `margin` from now
    pub fn expires_within(&self, margin: time::Duration) -> bool {
        match self.expiry {
            Some(expiry) => expiry - margin <= OffsetDateTime::now_utc(),
            None => false,
        }
    }
}

/// Source of access tokens
#[async_trait]
pub trait TokenSource: Send + Sync + Debug {
    async fn token(&self) -> Result<AccessToken, AuthError>;
}

/// Token given directly in the provider configuration
#[derive(Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Debug for StaticTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticTokenSource")
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self) -> Result<AccessToken, AuthError> {
        Ok(AccessToken {
            token: self.token.clone(),
            expiry: None,
        })
    }
}

/// Reuse the token of another source until it is about to expire
#[derive(Debug)]
pub struct CachingTokenSource {
    inner: Arc<dyn TokenSource>,
    cached: Mutex<Option<AccessToken>>,
}

impl CachingTokenSource {
    pub fn new(inner: Arc<dyn TokenSource>) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TokenSource for CachingTokenSource {
    async fn token(&self) -> Result<AccessToken, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if !token.expires_within(REFRESH_MARGIN) {
                return Ok(token.clone());
            }
        }
        tracing::debug!("Refreshing access token");
        let token = self.inner.token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Contents of the file at `value` if it exists, otherwise `value` itself
///
/// The boolean is true when `value` was a path.
pub fn path_or_contents(value: &str) -> Result<(String, bool), AuthError> {
    let path = expand_home(value);
    if value.is_empty() || !path.exists() {
        return Ok((value.to_string(), false));
    }
    let contents = std::fs::read_to_string(&path).map_err(|source| AuthError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok((contents, true))
}

/// JSON credentials: a service account key or gcloud user credentials
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsFile {
    #[serde(rename = "type")]
    pub kind: String,
    pub project_id: Option<String>,
    pub client_email: Option<String>,
    pub private_key: Option<String>,
    pub private_key_id: Option<String>,
    pub token_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub universe_domain: Option<String>,
}

impl CredentialsFile {
    pub fn parse(json: &str) -> Result<Self, AuthError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Universe domain of the credentials, `googleapis.com` when unset
    pub fn universe_domain(&self) -> &str {
        self.universe_domain
            .as_deref()
            .filter(|domain| !domain.is_empty())
            .unwrap_or(crate::config::DEFAULT_UNIVERSE_DOMAIN)
    }

    /// Token source for these credentials
    pub fn token_source(
        &self,
        scopes: &[String],
        http: &reqwest::Client,
    ) -> Result<Arc<dyn TokenSource>, AuthError> {
        match self.kind.as_str() {
            "service_account" => Ok(Arc::new(ServiceAccountTokenSource::new(
                self,
                scopes,
                http.clone(),
            )?)),
            "authorized_user" => Ok(Arc::new(AuthorizedUserTokenSource::new(
                self,
                http.clone(),
            )?)),
            other => Err(AuthError::UnsupportedCredentialsType(other.to_string())),
        }
    }
}

/// Token source selected for the provider, with a description for logs
#[derive(Debug, Clone)]
pub struct Credentials {
    pub source: Arc<dyn TokenSource>,
    pub kind: &'static str,
}

impl Credentials {
    pub async fn token(&self) -> Result<AccessToken, AuthError> {
        self.source.token().await
    }
}

/// Select credentials from the provider configuration
///
/// With `initial_only`, impersonation is not applied: the credentials are
/// the ones used to call the IAM Credentials API.
pub async fn credentials_from_config(
    config: &Config,
    env: &dyn EnvSource,
    http: &reqwest::Client,
    initial_only: bool,
) -> Result<Credentials, AuthError> {
    let (source, kind): (Arc<dyn TokenSource>, &'static str) =
        if let Some(token) = config.access_token.as_deref().filter(|t| !t.is_empty()) {
            tracing::info!("Authenticating using configured Google JSON 'access_token'...");
            (Arc::new(StaticTokenSource::new(token)), "access_token")
        } else if let Some(credentials) = config.credentials.as_deref().filter(|c| !c.is_empty()) {
            tracing::info!("Authenticating using configured Google JSON 'credentials'...");
            let (contents, _) = path_or_contents(credentials)?;
            (json_source(&contents, config, http)?, "credentials")
        } else if let Some(external) = &config.external_credentials {
            tracing::info!("Authenticating using configured 'external_credentials_hcp_terraform'...");
            let federated: Arc<dyn TokenSource> =
                Arc::new(ExternalAccountTokenSource::new(external, http.clone()));
            if initial_only {
                (federated, "external credentials")
            } else {
                let impersonated = ImpersonatedTokenSource::new(
                    federated,
                    config,
                    &external.service_account_email,
                    http.clone(),
                )
                .without_delegates();
                (Arc::new(impersonated), "external credentials")
            }
        } else {
            tracing::info!("Authenticating using DefaultClient...");
            application_default(config, env, http).await?
        };

    let source = match config.impersonate_service_account.as_deref() {
        Some(target) if !initial_only && !target.is_empty() => {
            tracing::info!("Impersonating service account {target}");
            Arc::new(ImpersonatedTokenSource::new(
                source,
                config,
                target,
                http.clone(),
            )) as Arc<dyn TokenSource>
        }
        _ => source,
    };

    Ok(Credentials {
        source: Arc::new(CachingTokenSource::new(source)),
        kind,
    })
}

fn json_source(
    contents: &str,
    config: &Config,
    http: &reqwest::Client,
) -> Result<Arc<dyn TokenSource>, AuthError> {
    let file = CredentialsFile::parse(contents)?;
    if file.universe_domain() != config.universe_domain {
        return Err(AuthError::UniverseDomainMismatch {
            credentials: file.universe_domain().to_string(),
            provider: config.universe_domain.clone(),
        });
    }
    file.token_source(&config.scopes, http)
}

/// Path of the credentials file written by `gcloud auth application-default login`
pub fn well_known_file(env: &dyn EnvSource) -> Option<PathBuf> {
    if let Some(dir) = env.var(CLOUDSDK_CONFIG_ENV_VAR).filter(|d| !d.is_empty()) {
        return Some(Path::new(&dir).join(WELL_KNOWN_FILE));
    }
    let dir = if cfg!(windows) {
        dirs::config_dir()?.join("gcloud")
    } else {
        dirs::home_dir()?.join(".config").join("gcloud")
    };
    Some(dir.join(WELL_KNOWN_FILE))
}

async fn application_default(
    config: &Config,
    env: &dyn EnvSource,
    http: &reqwest::Client,
) -> Result<(Arc<dyn TokenSource>, &'static str), AuthError> {
    if let Some(path) = env
        .var(APPLICATION_CREDENTIALS_ENV_VAR)
        .filter(|p| !p.is_empty())
    {
        tracing::debug!("Loading credentials from {APPLICATION_CREDENTIALS_ENV_VAR}={path}");
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| AuthError::Io { path, source })?;
        return Ok((json_source(&contents, config, http)?, "application default credentials"));
    }

    if let Some(path) = well_known_file(env) {
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!("Loading credentials from {}", path.display());
            let contents =
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| AuthError::Io {
                        path: path.display().to_string(),
                        source,
                    })?;
            return Ok((json_source(&contents, config, http)?, "gcloud credentials"));
        }
    }

    let metadata = MetadataTokenSource::new(env, &config.scopes, http.clone());
    if metadata.is_available().await {
        tracing::debug!("Using the GCE metadata server");
        return Ok((Arc::new(metadata), "compute engine metadata"));
    }

    Err(AuthError::NoDefaultCredentials)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Send an OAuth2 token request and parse the response
pub(crate) async fn fetch_token(request: reqwest::RequestBuilder) -> Result<AccessToken, AuthError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(AuthError::TokenEndpoint {
            status: status.as_u16(),
            body,
        });
    }
    let token: TokenResponse = serde_json::from_str(&body)?;
    Ok(AccessToken {
        token: token.access_token,
        expiry: token
            .expires_in
            .map(|secs| OffsetDateTime::now_utc() + time::Duration::seconds(secs)),
    })
}
