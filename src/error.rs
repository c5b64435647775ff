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

use std::fmt::Display;

use serde::Deserialize;
use thiserror::Error;

use tf_provider::{AttributePath, Diagnostics};

/// Errors raised while turning the provider block into a [`Config`](crate::config::Config)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error parsing environment variable `{0}` into bool")]
    InvalidBoolEnv(&'static str),
    #[error("invalid duration {value:?} for `{field}`")]
    InvalidDuration {
        field: &'static str,
        value: String,
        #[source]
        source: DurationError,
    },
    #[error("expected {field} to be one of {allowed:?}, got {value:?}")]
    InvalidEnum {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },
    #[error("invalid custom endpoint {value:?} for `{field}`: expected an http(s) URL ending with a slash")]
    InvalidEndpoint { field: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("time: invalid duration {0:?}")]
    Invalid(String),
    #[error("time: missing unit in duration {0:?}")]
    MissingUnit(String),
    #[error("time: unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },
    #[error("time: invalid duration {0:?}: negative durations are not allowed")]
    Negative(String),
}

/// Errors raised while looking up project, region, zone or resource ids
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{0}: required field is not set")]
    MissingField(String),
    #[error("Cannot determine region: set in this resource, or set provider-level 'region' or 'zone'.")]
    CannotDetermineRegion,
    #[error("Cannot determine zone: set in this resource, or set provider-level zone.")]
    CannotDetermineZone,
    #[error("Cannot determine location: set in this resource, or set provider-level 'region' or 'zone'.")]
    CannotDetermineLocation,
    #[error("A zone must be specified")]
    ZoneRequired,
    #[error("The {kind} field for resource {resource_type} cannot be empty")]
    EmptyField {
        kind: &'static str,
        resource_type: String,
    },
    #[error("Invalid field format. Got '{got}', expected format '{expected}'")]
    InvalidFieldFormat { got: String, expected: String },
    #[error("String was not a self link: {0}")]
    NotASelfLink(String),
    #[error("value {0} was not a self link")]
    NotALocationalSelfLink(String),
    #[error("Recursive substitution detected")]
    RecursiveSubstitution,
}

/// Attribute value rejected by a validator of [`validation`](crate::validation)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Errors raised while loading credentials or fetching access tokens
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON credentials are not valid: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unsupported credentials type {0:?}")]
    UnsupportedCredentialsType(String),
    #[error("credentials are missing the `{0}` field")]
    MissingField(&'static str),
    #[error("private_key is not a valid PEM block: {0}")]
    InvalidPrivateKey(String),
    #[error("cannot sign token request: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },
    #[error("invalid token expiry {0:?}")]
    InvalidExpiry(String),
    #[error("the universe domain configured in credentials ({credentials}) does not match the universe domain of the provider ({provider})")]
    UniverseDomainMismatch { credentials: String, provider: String },
    #[error("Attempted to load application default credentials since neither `credentials` nor `access_token` was set in the provider block.  No credentials loaded. To use your gcloud credentials, run 'gcloud auth application-default login'")]
    NoDefaultCredentials,
}

/// Error returned by a Google API
///
/// Parsed from the `{"error": {...}}` envelope when the body is JSON,
/// otherwise the raw body is kept as the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
    /// Canonical status name, eg: `NOT_FOUND`
    pub status: String,
    /// `reason` of each entry in `errors` and `details`
    pub reasons: Vec<String>,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    code: u16,
    message: String,
    status: String,
    errors: Vec<ErrorItem>,
    details: Vec<ErrorItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorItem {
    reason: Option<String>,
}

impl ApiError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: String::new(),
            reasons: Vec::new(),
            body: String::new(),
        }
    }

    pub fn from_response(code: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(ErrorEnvelope { error }) => Self {
                code: if error.code == 0 { code } else { error.code },
                message: error.message,
                status: error.status,
                reasons: error
                    .errors
                    .into_iter()
                    .chain(error.details)
                    .filter_map(|item| item.reason)
                    .collect(),
                body: body.to_string(),
            },
            Err(_) => Self {
                message: body.trim().to_string(),
                body: body.to_string(),
                ..Self::new(code, "")
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code == 404
    }

    pub fn is_conflict(&self) -> bool {
        self.code == 409 || self.code == 412
    }

    pub fn is_failed_precondition(&self) -> bool {
        (self.code == 400 && self.message.contains("Precondition check failed"))
            || self.status == "FAILED_PRECONDITION"
    }

    pub fn has_reason(&self, reason: &str) -> bool {
        self.reasons.iter().any(|r| r == reason)
    }

    /// Transient error worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self.code, 429 | 500 | 502 | 503)
            || (self.code == 403 && self.is_rate_limited())
            || (self.code == 409 && self.is_operation_in_progress())
    }

    /// Quota or rate limit exceeded
    pub fn is_rate_limited(&self) -> bool {
        ["rateLimitExceeded", "userRateLimitExceeded", "RATE_LIMIT_EXCEEDED"]
            .iter()
            .any(|reason| self.has_reason(reason))
            || (self.message.contains("Quota exceeded") && self.message.contains("per minute"))
    }

    /// Another operation is running on the resource
    pub fn is_operation_in_progress(&self) -> bool {
        self.has_reason("operationInProgress") || self.body.contains("operationInProgress")
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "googleapi: Error {}: {}", self.code, self.message)?;
        if !self.reasons.is_empty() {
            write!(f, ", {}", self.reasons.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Errors raised by [`Client::send_request`](crate::transport::Client::send_request)
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("response is missing the `{0}` field")]
    MissingField(&'static str),
    #[error("retry deadline of {0:?} exceeded, last error: {1}")]
    DeadlineExceeded(std::time::Duration, Box<TransportError>),
}

impl TransportError {
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            TransportError::Api(err) => Some(err),
            TransportError::DeadlineExceeded(_, err) => err.api_error(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_not_found)
    }

    pub fn is_conflict(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_conflict)
    }

    pub fn is_failed_precondition(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_failed_precondition)
    }
}

/// 404 error for a resource whose absence was detected without an API call
pub fn fake_404(resource_type: &str, name: &str) -> TransportError {
    ApiError::new(404, format!("{resource_type} object {name} not found")).into()
}

/// Handle an error from a read or update call
///
/// A 404 means the resource is gone: no diagnostic is emitted and `Some(())`
/// tells the caller to clear its state. Any other error is reported.
pub fn handle_not_found(
    err: &TransportError,
    resource: &str,
    diags: &mut Diagnostics,
) -> Option<()> {
    if err.is_not_found() {
        tracing::warn!("Removing {resource} because it's gone");
        Some(())
    } else {
        diags.root_error(
            format!("Error when reading or editing {resource}"),
            err.to_string(),
        );
        None
    }
}

/// Report an error as a diagnostic on the whole configuration
pub(crate) fn report<E: std::error::Error>(diags: &mut Diagnostics, summary: &'static str, err: &E) {
    diags.root_error(summary, err.to_string());
}

/// Report an error as a diagnostic on a single attribute
pub(crate) fn report_at<E: std::error::Error>(
    diags: &mut Diagnostics,
    summary: &'static str,
    err: &E,
    attribute: AttributePath,
) {
    diags.error(summary, err.to_string(), attribute);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_envelope() {
        let body = r#"{
            "error": {
                "code": 403,
                "message": "Quota exceeded for quota metric",
                "status": "PERMISSION_DENIED",
                "errors": [{"reason": "rateLimitExceeded", "message": "Quota exceeded"}],
                "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "RATE_LIMIT_EXCEEDED"}]
            }
        }"#;
        let err = ApiError::from_response(403, body);
        assert_eq!(err.code, 403);
        assert_eq!(err.status, "PERMISSION_DENIED");
        assert_eq!(err.reasons, vec!["rateLimitExceeded", "RATE_LIMIT_EXCEEDED"]);
        assert!(err.has_reason("rateLimitExceeded"));
        assert_eq!(
            err.to_string(),
            "googleapi: Error 403: Quota exceeded for quota metric, rateLimitExceeded, RATE_LIMIT_EXCEEDED"
        );
    }

    #[test]
    fn non_json_body_is_the_message() {
        let err = ApiError::from_response(502, "Bad Gateway\n");
        assert_eq!(err.code, 502);
        assert_eq!(err.message, "Bad Gateway");
        assert!(err.reasons.is_empty());
    }

    #[test]
    fn classification() {
        assert!(ApiError::new(404, "").is_not_found());
        assert!(ApiError::new(409, "").is_conflict());
        assert!(ApiError::new(412, "").is_conflict());
        assert!(!ApiError::new(400, "").is_conflict());
        assert!(ApiError::new(400, "Precondition check failed.").is_failed_precondition());
        assert!(!ApiError::new(400, "Invalid value").is_failed_precondition());
    }

    #[test]
    fn retryable_errors() {
        for code in [429, 500, 502, 503] {
            assert!(ApiError::new(code, "").is_retryable(), "{code}");
        }
        assert!(!ApiError::new(403, "forbidden").is_retryable());
        assert!(!ApiError::new(404, "").is_retryable());
        assert!(ApiError::from_response(
            403,
            r#"{"error":{"code":403,"message":"slow down","errors":[{"reason":"rateLimitExceeded"}]}}"#
        )
        .is_retryable());
        assert!(ApiError::new(403, "Quota exceeded for quota metric 'Queries' per minute").is_retryable());
        assert!(ApiError::from_response(
            409,
            r#"{"error":{"code":409,"message":"busy","errors":[{"reason":"operationInProgress"}]}}"#
        )
        .is_retryable());
        assert!(!ApiError::new(409, "already exists").is_retryable());
    }

    #[test]
    fn fake_404_is_not_found() {
        let err = fake_404("instance", "my-instance");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "googleapi: Error 404: instance object my-instance not found"
        );
    }

    #[test]
    fn not_found_clears_state() {
        let mut diags = Diagnostics::default();
        let gone = handle_not_found(&fake_404("network", "default"), "Network \"default\"", &mut diags);
        assert_eq!(gone, Some(()));
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn other_errors_are_reported() {
        let mut diags = Diagnostics::default();
        let err: TransportError = ApiError::new(409, "already exists").into();
        assert_eq!(handle_not_found(&err, "Network \"default\"", &mut diags), None);
        assert_eq!(diags.errors.len(), 1);
    }
}
