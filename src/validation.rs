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

//! Attribute validators
//!
//! Every validator takes the attribute name `key` and its value, and returns
//! a [`ValidationError`] describing the problem. Use [`check`] to turn the
//! result into a diagnostic.

use std::net::IpAddr;

use base64::Engine;
use regex::Regex;
use tf_provider::{AttributePath, Diagnostics};

use crate::config::parse_signed_duration;
use crate::error::ValidationError;
use crate::utils::static_regex;

pub type ValidationResult = Result<(), ValidationError>;

pub const GCE_NAME_REGEX: &str = r"^(?:[a-z](?:[-a-z0-9]{0,61}[a-z0-9])?)$";
pub const PROJECT_REGEX: &str = r"(?:(?:[-a-z0-9]{1,63}\.)*(?:[a-z](?:[-a-z0-9]{0,61}[a-z0-9])?):)?(?:[0-9]{1,19}|(?:[a-z0-9](?:[-a-z0-9]{0,61}[a-z0-9])?))";

/// Report a failed validation on `attribute`, returns whether it passed
pub fn check(diags: &mut Diagnostics, attribute: AttributePath, result: ValidationResult) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            diags.error("Invalid attribute value", err.0, attribute);
            false
        }
    }
}

fn matches(key: &str, value: &str, re: &Regex) -> ValidationResult {
    if re.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError(format!(
            "{key:?} ({value:?}) doesn't match regexp {:?}",
            re.as_str()
        )))
    }
}

/// Name of a compute resource: lowercase RFC 1035 label of 1 to 63 chars
pub fn validate_gce_name(key: &str, value: &str) -> ValidationResult {
    matches(key, value, static_regex!(r"^(?:[a-z](?:[-a-z0-9]{0,61}[a-z0-9])?)$"))
}

/// RFC 1035 name between `min` and `max` characters
pub fn validate_rfc1035_name(min: usize, max: usize) -> impl Fn(&str, &str) -> ValidationResult {
    move |key, value| {
        if min < 2 || max < min {
            return Err(ValidationError(format!(
                "{key:?} has an invalid length range [{min}, {max}]: the minimum is 2"
            )));
        }
        let pattern = format!(r"^[a-z](?:[-a-z0-9]{{{},{}}}[a-z0-9])$", min - 2, max - 2);
        match Regex::new(&pattern) {
            Ok(re) => matches(key, value, &re),
            Err(err) => Err(ValidationError(err.to_string())),
        }
    }
}

/// Project id, possibly prefixed by a domain (`example.com:my-project`)
pub fn validate_project_id(key: &str, value: &str) -> ValidationResult {
    let re = static_regex!(r"^(?:(?:[-a-z0-9]{1,63}\.)*(?:[a-z](?:[-a-z0-9]{0,61}[a-z0-9])?):)?(?:[0-9]{1,19}|(?:[a-z0-9](?:[-a-z0-9]{0,61}[a-z0-9])?))$");
    if re.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError(format!(
            "{key:?} ({value:?}) doesn't match regexp \"^{PROJECT_REGEX}$\""
        )))
    }
}

/// Duration in the `300ms`, `-1.5h` or `2h45m` syntax
pub fn validate_duration(key: &str, value: &str) -> ValidationResult {
    parse_signed_duration(value)
        .map(|_| ())
        .map_err(|err| ValidationError(format!("{key:?} cannot be parsed as a duration: {err}")))
}

/// Duration that is zero or positive
pub fn validate_non_negative_duration(key: &str, value: &str) -> ValidationResult {
    match parse_signed_duration(value) {
        Ok(duration) if duration.is_negative() => Err(ValidationError(format!(
            "{key:?} must be greater than or equal to 0"
        ))),
        _ => validate_duration(key, value),
    }
}

/// IPv4 or IPv6 CIDR range, eg: `10.0.0.0/8`
pub fn validate_ip_cidr_range(key: &str, value: &str) -> ValidationResult {
    let invalid = || ValidationError(format!("{key:?} is not a valid IP CIDR range: {value}"));
    let (ip, prefix) = value.split_once('/').ok_or_else(invalid)?;
    let ip: IpAddr = ip.parse().map_err(|_| invalid())?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let max = if ip.is_ipv4() { 32 } else { 128 };
    match prefix.parse::<u32>() {
        Ok(prefix) if prefix <= max => Ok(()),
        _ => Err(invalid()),
    }
}

/// Standard base64 with padding
pub fn validate_base64(key: &str, value: &str) -> ValidationResult {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map(|_| ())
        .map_err(|_| ValidationError(format!("{key:?}: {value:?} is not a valid base64 string")))
}

/// Value among a fixed list
pub fn validate_enum<'a>(allowed: &'a [&'a str]) -> impl Fn(&str, &str) -> ValidationResult + 'a {
    move |key, value| {
        if allowed.contains(&value) {
            Ok(())
        } else {
            Err(ValidationError(format!(
                "expected {key} to be one of {allowed:?}, got {value}"
            )))
        }
    }
}

pub fn validate_non_empty_string(key: &str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        Err(ValidationError(format!(
            "expected a non-empty string for `{key}`"
        )))
    } else {
        Ok(())
    }
}

/// Name of a Cloud Storage bucket
///
/// IP addresses and close misspellings of "google" are not checked.
pub fn check_gcs_name(name: &str) -> ValidationResult {
    let re = static_regex!(r"^[a-z0-9][a-z0-9_.-]{1,220}[a-z0-9]$");
    if !re.is_match(name) {
        return Err(ValidationError(format!(
            "{name} does not match regex {}",
            re.as_str()
        )));
    }
    if name.split('.').any(|part| part.len() > 63) {
        return Err(ValidationError(format!(
            "{name} has a dot-separated part longer than 63 characters"
        )));
    }
    if name.starts_with("goog") {
        return Err(ValidationError(format!("{name} cannot start with goog")));
    }
    if name.contains("google") {
        return Err(ValidationError(format!("{name} cannot contain google")));
    }
    Ok(())
}

/// Policy document of a `google_iam_policy` data source
pub fn check_google_iam_policy(policy: &str) -> ValidationResult {
    if policy.contains("\"description\":\"\"") {
        return Err(ValidationError(format!(
            "found an empty description field (should be omitted) in google_iam_policy data source: {policy}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gce_name() {
        let longest = format!("a{}", "b".repeat(62));
        let too_long = format!("a{}", "b".repeat(63));
        for ok in ["a", "abc", "a-b-c", "a1", longest.as_str()] {
            assert!(validate_gce_name("name", ok).is_ok(), "{ok}");
        }
        for bad in ["", "1a", "a-", "A", "a_b", too_long.as_str()] {
            assert!(validate_gce_name("name", bad).is_err(), "{bad}");
        }
        assert_eq!(
            validate_gce_name("name", "Abc").unwrap_err().to_string(),
            format!("\"name\" (\"Abc\") doesn't match regexp {GCE_NAME_REGEX:?}")
        );
    }

    #[test]
    fn rfc1035_name() {
        let validate = validate_rfc1035_name(2, 5);
        assert!(validate("id", "ab").is_ok());
        assert!(validate("id", "a-b-c").is_ok());
        assert!(validate("id", "a").is_err());
        assert!(validate("id", "abcdef").is_err());
        assert!(validate("id", "ab-").is_err());
        assert!(validate_rfc1035_name(1, 5)("id", "ab").is_err());
        assert!(validate_rfc1035_name(5, 4)("id", "abcde").is_err());
    }

    #[test]
    fn project_id() {
        for ok in ["my-project", "example.com:my-project", "123456789012"] {
            assert!(validate_project_id("project", ok).is_ok(), "{ok}");
        }
        for bad in ["My-Project", "my_project", "-project", "project-"] {
            assert!(validate_project_id("project", bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn durations() {
        assert!(validate_duration("ttl", "300ms").is_ok());
        assert!(validate_duration("ttl", "2h45m").is_ok());
        assert!(validate_duration("ttl", "5").is_err());
        assert!(validate_duration("ttl", "-1m").is_ok());
        assert!(validate_non_negative_duration("ttl", "-0s").is_ok());
        assert!(validate_non_negative_duration("ttl", "0s").is_ok());
        assert!(validate_non_negative_duration("ttl", "1.5h").is_ok());
        assert_eq!(
            validate_non_negative_duration("ttl", "-1s")
                .unwrap_err()
                .to_string(),
            "\"ttl\" must be greater than or equal to 0"
        );
    }

    #[test]
    fn cidr_ranges() {
        for ok in ["10.0.0.0/8", "192.168.1.0/24", "0.0.0.0/0", "2001:db8::/32"] {
            assert!(validate_ip_cidr_range("range", ok).is_ok(), "{ok}");
        }
        for bad in ["10.0.0.0", "10.0.0.0/33", "2001:db8::/129", "abc/8", "10.0.0.0/", "10.0.0.0/+8"] {
            assert!(validate_ip_cidr_range("range", bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn base64() {
        assert!(validate_base64("data", "aGVsbG8=").is_ok());
        assert!(validate_base64("data", "").is_ok());
        assert!(validate_base64("data", "not base64!").is_err());
    }

    #[test]
    fn enums() {
        let validate = validate_enum(&["A", "B"]);
        assert!(validate("mode", "A").is_ok());
        assert_eq!(
            validate("mode", "C").unwrap_err().to_string(),
            "expected mode to be one of [\"A\", \"B\"], got C"
        );
    }

    #[test]
    fn non_empty() {
        assert!(validate_non_empty_string("project", "p").is_ok());
        assert!(validate_non_empty_string("project", "").is_err());
        assert!(validate_non_empty_string("project", "  ").is_err());
    }

    #[test]
    fn gcs_names() {
        assert!(check_gcs_name("my-bucket").is_ok());
        assert!(check_gcs_name("my.bucket_1").is_ok());
        assert!(check_gcs_name("ab").is_err());
        assert!(check_gcs_name("My-Bucket").is_err());
        assert!(check_gcs_name("goog-bucket").is_err());
        assert!(check_gcs_name("my-google-bucket").is_err());
        assert!(check_gcs_name(&format!("{}.b", "a".repeat(64))).is_err());
    }

    #[test]
    fn iam_policy() {
        assert!(check_google_iam_policy(r#"{"bindings":[{"role":"roles/viewer"}]}"#).is_ok());
        assert!(check_google_iam_policy(r#"{"condition":{"description":""}}"#).is_err());
    }

    #[test]
    fn diagnostics() {
        let mut diags = Diagnostics::default();
        assert!(check(&mut diags, AttributePath::new("name"), validate_gce_name("name", "ok")));
        assert!(diags.errors.is_empty());
        assert!(!check(&mut diags, AttributePath::new("name"), validate_gce_name("name", "NOK")));
        assert_eq!(diags.errors.len(), 1);
    }
}
