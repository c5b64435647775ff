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

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::error::TransportError;

/// Tells if an error is transient, and why
pub type RetryPredicate = fn(&TransportError) -> Option<&'static str>;

/// Default time spent retrying a request
pub const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_secs(5 * 60);

pub const DEFAULT_RETRY_PREDICATES: &[RetryPredicate] = &[
    is_connection_error,
    is_common_retryable_code,
    is_rate_limit_error,
    is_operation_in_progress,
];

pub fn is_connection_error(err: &TransportError) -> Option<&'static str> {
    match err {
        TransportError::Http(err) | TransportError::Auth(crate::error::AuthError::Http(err))
            if err.is_connect() || err.is_timeout() =>
        {
            Some("connection error")
        }
        _ => None,
    }
}

pub fn is_common_retryable_code(err: &TransportError) -> Option<&'static str> {
    match err.api_error()?.code {
        429 => Some("too many requests"),
        500 | 502 | 503 => Some("server error"),
        _ => None,
    }
}

pub fn is_rate_limit_error(err: &TransportError) -> Option<&'static str> {
    let err = err.api_error()?;
    (err.code == 403 && err.is_rate_limited()).then_some("rate limit exceeded")
}

pub fn is_operation_in_progress(err: &TransportError) -> Option<&'static str> {
    let err = err.api_error()?;
    (err.code == 409 && err.is_operation_in_progress()).then_some("operation in progress")
}

/// Reason to retry `err`, if any of the predicates matches
pub fn retry_reason(err: &TransportError, extra: &[RetryPredicate]) -> Option<&'static str> {
    DEFAULT_RETRY_PREDICATES
        .iter()
        .chain(extra)
        .find_map(|predicate| predicate(err))
}

/// Exponential backoff with random jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
        }
    }
}

impl Backoff {
    /// Delay before the retry number `attempt` (starting at 0)
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self
            .initial
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
            .min(self.max);
        let jitter_ms = (base.as_millis() / 2) as u64;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        } else {
            Duration::ZERO
        };
        base + jitter
    }
}

/// Call `f` until it succeeds, fails with a permanent error, or `timeout` elapses
pub async fn retry<T, F, Fut>(
    timeout: Duration,
    backoff: Backoff,
    predicates: &[RetryPredicate],
    mut f: F,
) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let start = Instant::now();
    let mut attempt = 0;
    loop {
        let err = match f().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        let Some(reason) = retry_reason(&err, predicates) else {
            return Err(err);
        };
        let delay = backoff.delay(attempt);
        if start.elapsed() + delay > timeout {
            return Err(TransportError::DeadlineExceeded(timeout, Box::new(err)));
        }
        tracing::debug!("Retrying request after {delay:?}, {reason}: {err}");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
