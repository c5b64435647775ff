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

//! Authenticated HTTP client for Google APIs

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde_json::Value as Json;
use url::Url;

use crate::auth::{AccessToken, Credentials};
use crate::config::Config;
use crate::env::{EnvSource, APPEND_USER_AGENT_ENV_VAR, USER_AGENT_EXTENSION_ENV_VAR};
use crate::error::{ApiError, TransportError};

mod retry;

pub use retry::{
    is_common_retryable_code, is_connection_error, is_operation_in_progress, is_rate_limit_error,
    retry, retry_reason, Backoff, RetryPredicate, DEFAULT_RETRY_PREDICATES, DEFAULT_RETRY_TIMEOUT,
};

pub const REQUEST_REASON_HEADER: &str = "X-Goog-Request-Reason";
pub const USER_PROJECT_HEADER: &str = "X-Goog-User-Project";

/// User agent sent with every request
///
/// `TF_APPEND_USER_AGENT` then `GOOGLE_TERRAFORM_USERAGENT_EXTENSION` are
/// appended when set, then the name of the calling module if any.
pub fn user_agent(
    terraform_version: &str,
    provider_version: &str,
    module_name: Option<&str>,
    env: &dyn EnvSource,
) -> String {
    let mut ua = format!(
        "Terraform/{terraform_version} (+https://www.terraform.io) tf-provider terraform-provider-google/{provider_version}"
    );
    for name in [APPEND_USER_AGENT_ENV_VAR, USER_AGENT_EXTENSION_ENV_VAR] {
        if let Some(extension) = env
            .var(name)
            .map(|ext| ext.trim().to_string())
            .filter(|ext| !ext.is_empty())
        {
            ua.push(' ');
            ua.push_str(&extension);
        }
    }
    if let Some(module) = module_name.map(str::trim).filter(|m| !m.is_empty()) {
        ua.push(' ');
        ua.push_str(module);
    }
    ua
}

/// Request sent by [`Client::send_request`]
#[derive(Debug, Clone)]
pub struct RequestOptions<'a> {
    pub method: Method,
    pub url: &'a str,
    pub body: Option<&'a Json>,
    /// Project billed for the request, overrides the provider billing project
    pub user_project: Option<&'a str>,
    /// Time spent retrying, [`DEFAULT_RETRY_TIMEOUT`] when unset
    pub timeout: Option<Duration>,
    /// Errors retried in addition to [`DEFAULT_RETRY_PREDICATES`]
    pub retry_predicates: &'a [RetryPredicate],
}

impl<'a> RequestOptions<'a> {
    pub fn new(method: Method, url: &'a str) -> Self {
        Self {
            method,
            url,
            body: None,
            user_project: None,
            timeout: None,
            retry_predicates: &[],
        }
    }

    pub fn body(self, body: &'a Json) -> Self {
        Self {
            body: Some(body),
            ..self
        }
    }

    pub fn user_project(self, project: &'a str) -> Self {
        Self {
            user_project: Some(project),
            ..self
        }
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    pub fn retry_predicates(self, predicates: &'a [RetryPredicate]) -> Self {
        Self {
            retry_predicates: predicates,
            ..self
        }
    }
}

/// HTTP client shared by every data source of a configured provider
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    credentials: Credentials,
    user_agent: String,
    request_timeout: Duration,
    request_reason: Option<String>,
    billing_project: Option<String>,
    backoff: Backoff,
}

impl Client {
    pub fn new(config: &Config, credentials: Credentials, http: reqwest::Client) -> Self {
        Self {
            http,
            credentials,
            user_agent: config.user_agent.clone(),
            request_timeout: config.request_timeout,
            request_reason: config.request_reason.clone().filter(|r| !r.is_empty()),
            billing_project: config
                .billing_project
                .clone()
                .filter(|p| config.user_project_override && !p.is_empty()),
            backoff: Backoff::default(),
        }
    }

    /// Use another backoff between retries
    pub fn with_backoff(self, backoff: Backoff) -> Self {
        Self { backoff, ..self }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Current access token of the provider credentials
    pub async fn access_token(&self) -> Result<AccessToken, TransportError> {
        Ok(self.credentials.token().await?)
    }

    /// Send a JSON request, retrying transient errors
    ///
    /// An empty response body is returned as an empty object.
    pub async fn send_request(&self, options: RequestOptions<'_>) -> Result<Json, TransportError> {
        let mut url = Url::parse(options.url)?;
        if !url.query_pairs().any(|(key, _)| key == "alt") {
            url.query_pairs_mut().append_pair("alt", "json");
        }
        let user_project = options
            .user_project
            .or(self.billing_project.as_deref())
            .filter(|p| !p.is_empty());

        let url = &url;
        let method = &options.method;
        let body = options.body;
        retry(
            options.timeout.unwrap_or(DEFAULT_RETRY_TIMEOUT),
            self.backoff,
            options.retry_predicates,
            move || self.send_once(method, url, body, user_project),
        )
        .await
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Json>,
        user_project: Option<&str>,
    ) -> Result<Json, TransportError> {
        let token = self.credentials.token().await?;
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .timeout(self.request_timeout)
            .header(USER_AGENT, &self.user_agent)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&token.token);
        if let Some(reason) = &self.request_reason {
            request = request.header(REQUEST_REASON_HEADER, reason);
        }
        if let Some(project) = user_project {
            request = request.header(USER_PROJECT_HEADER, project);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!("{method} {url}");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::trace!("{method} {url} returned {status}: {text}");

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &text).into());
        }
        if text.trim().is_empty() {
            Ok(Json::Object(Default::default()))
        } else {
            Ok(serde_json::from_str(&text)?)
        }
    }
}

/// Email of the identity behind the provider credentials
pub async fn current_user_email(client: &Client, config: &Config) -> Result<String, TransportError> {
    let url = config.userinfo_url();
    let response = client
        .send_request(RequestOptions::new(Method::GET, &url))
        .await?;
    response
        .get("email")
        .and_then(Json::as_str)
        .map(str::to_string)
        .ok_or(TransportError::MissingField("email"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn user_agent_extension() {
        let env: HashMap<String, String> = HashMap::new();
        assert_eq!(
            user_agent("1.5.0", "0.1.0", None, &env),
            "Terraform/1.5.0 (+https://www.terraform.io) tf-provider terraform-provider-google/0.1.0"
        );

        let env: HashMap<String, String> =
            [(USER_AGENT_EXTENSION_ENV_VAR.to_string(), " my-ext/1.0 ".to_string())].into();
        assert_eq!(
            user_agent("1.5.0", "0.1.0", Some("blueprints/terraform/network"), &env),
            "Terraform/1.5.0 (+https://www.terraform.io) tf-provider terraform-provider-google/0.1.0 my-ext/1.0 blueprints/terraform/network"
        );

        let env: HashMap<String, String> = [
            (APPEND_USER_AGENT_ENV_VAR.to_string(), "tfc/run".to_string()),
            (USER_AGENT_EXTENSION_ENV_VAR.to_string(), "my-ext/1.0".to_string()),
        ]
        .into();
        assert_eq!(
            user_agent("1.5.0", "0.1.0", None, &env),
            "Terraform/1.5.0 (+https://www.terraform.io) tf-provider terraform-provider-google/0.1.0 tfc/run my-ext/1.0"
        );
    }

    #[test]
    fn request_options() {
        let body = serde_json::json!({"name": "n"});
        let options = RequestOptions::new(Method::POST, "https://example.com/")
            .body(&body)
            .user_project("billing")
            .timeout(Duration::from_secs(1));
        assert_eq!(options.body, Some(&body));
        assert_eq!(options.user_project, Some("billing"));
        assert_eq!(options.timeout, Some(Duration::from_secs(1)));
        assert!(options.retry_predicates.is_empty());
    }
}
