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

use crate::error::DurationError;

const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_scale(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3600 * NANOS_PER_SEC,
        _ => return None,
    })
}

/// Duration that may be negative, as accepted by the Go duration syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignedDuration {
    pub negative: bool,
    pub magnitude: Duration,
}

impl SignedDuration {
    pub fn is_negative(&self) -> bool {
        self.negative && !self.magnitude.is_zero()
    }
}

/// Parse a duration like `"1h30m"`, `"-1.5s"` or `"300ms"`
///
/// An optional sign followed by a sequence of decimal numbers, each with an
/// optional fraction and a mandatory unit suffix. `"0"` is the only value
/// allowed without a unit. `-0s` and `0s` are equal.
pub fn parse_signed_duration(input: &str) -> Result<SignedDuration, DurationError> {
    let invalid = || DurationError::Invalid(input.to_string());

    let (negative, mut s) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    if s == "0" {
        return Ok(SignedDuration::default());
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !s.is_empty() {
        let int_len = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (int_part, mut rest) = s.split_at(int_len);

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            (frac_part, rest) = after_dot.split_at(frac_len);
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (unit, remaining) = rest.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let scale = unit_scale(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let int: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let mut value = int.checked_mul(scale).ok_or_else(invalid)?;

        let mut digit_scale = scale;
        for digit in frac_part.bytes() {
            digit_scale /= 10;
            if digit_scale == 0 {
                break;
            }
            value += (digit - b'0') as u128 * digit_scale;
        }

        total = total.checked_add(value).ok_or_else(invalid)?;
        s = remaining;
    }

    if total > i64::MAX as u128 {
        return Err(invalid());
    }

    Ok(SignedDuration {
        negative: negative && total != 0,
        magnitude: Duration::new(
            (total / NANOS_PER_SEC) as u64,
            (total % NANOS_PER_SEC) as u32,
        ),
    })
}

/// Parse a duration that must be zero or positive
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let duration = parse_signed_duration(input)?;
    if duration.is_negative() {
        return Err(DurationError::Negative(input.to_string()));
    }
    Ok(duration.magnitude)
}

/// Render a duration in seconds, eg: `"120s"` or `"1.5s"`
pub fn format_duration(duration: Duration) -> String {
    format!("{}s", duration.as_secs_f64())
}
