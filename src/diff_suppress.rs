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

//! Diff suppression
//!
//! Each function tells whether the `old` value stored in the state and the
//! `new` value from the configuration are the same for the API, in which
//! case no change should be planned.

use std::net::IpAddr;

use serde_json::Value as Json;
use time::format_description::well_known::Rfc3339;
use time::parsing::Parsable;
use time::OffsetDateTime;

use crate::config::parse_signed_duration;
use crate::utils::static_regex;

pub use crate::self_link::{compare_resource_names, compare_self_link_or_resource_name};

pub fn case_diff_suppress(old: &str, new: &str) -> bool {
    old.to_uppercase() == new.to_uppercase()
}

/// Durations with the same value, eg: `60s` and `60.0s`
pub fn duration_diff_suppress(old: &str, new: &str) -> bool {
    match (parse_signed_duration(old), parse_signed_duration(new)) {
        (Ok(old), Ok(new)) => old == new,
        _ => false,
    }
}

fn split_ip(value: &str) -> (Option<IpAddr>, Option<&str>) {
    match value.split_once('/') {
        Some((ip, mask)) => (ip.parse().ok(), Some(mask)),
        None => (value.parse().ok(), None),
    }
}

/// Internal IP addresses, optionally with a netmask
///
/// IPv6 addresses are compared in their canonical form. A netmask only
/// matters when both sides have one. An address in the state is kept when the
/// configuration names an address resource instead.
pub fn internal_ip_diff_suppress(old: &str, new: &str) -> bool {
    let (old_ip, old_mask) = split_ip(old);
    let (new_ip, new_mask) = split_ip(new);
    match (old_ip, new_ip) {
        (Some(old_ip), Some(new_ip)) => {
            old_ip == new_ip
                && match (old_mask, new_mask) {
                    (Some(old_mask), Some(new_mask)) => old_mask == new_mask,
                    _ => true,
                }
        }
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Values differing only by a trailing slash
pub fn last_slash_diff_suppress(old: &str, new: &str) -> bool {
    old.strip_suffix('/').unwrap_or(old) == new.strip_suffix('/').unwrap_or(new)
}

/// Domain names differing only by the final dot
pub fn absolute_domain_suppress(old: &str, new: &str) -> bool {
    old == new.trim_end_matches('.') || new == old.trim_end_matches('.')
}

/// An unset value and the API default are the same
pub fn empty_or_default_string_suppress(default: &str) -> impl Fn(&str, &str) -> bool + '_ {
    move |old, new| (old.is_empty() && new == default) || (new.is_empty() && old == default)
}

/// Project numbers and ids are interchangeable in `projects/...` paths
pub fn project_number_diff_suppress(old: &str, new: &str) -> bool {
    let old = static_regex!(r"projects/\d+").replace_all(old, "projects/equal");
    let new = static_regex!(r"projects/[^/]+").replace_all(new, "projects/equal");
    old == new
}

/// Timestamps in the given format describing the same instant
pub fn timestamp_diff_suppress<F: Parsable + ?Sized>(
    format: &F,
) -> impl Fn(&str, &str) -> bool + '_ {
    move |old, new| {
        match (
            OffsetDateTime::parse(old, format),
            OffsetDateTime::parse(new, format),
        ) {
            (Ok(old), Ok(new)) => old == new,
            _ => false,
        }
    }
}

/// RFC 3339 timestamps describing the same instant
pub fn rfc3339_diff_suppress(old: &str, new: &str) -> bool {
    timestamp_diff_suppress(&Rfc3339)(old, new)
}

/// Zero value of the JSON representation of a field
fn is_empty_value(value: &Json) -> bool {
    match value {
        Json::Null => true,
        Json::Bool(b) => !b,
        Json::Number(n) => n.as_f64() == Some(0.0),
        Json::String(s) => s.is_empty(),
        Json::Array(a) => a.is_empty(),
        Json::Object(o) => o.is_empty(),
    }
}

/// A nested block that is absent and one whose fields are all empty
///
/// `key` is the count key of the block (ending with `.#`), `old` and `new`
/// are the counts, and `old_value` and `new_value` the lists of block values.
pub fn empty_or_unset_block_diff_suppress(
    key: &str,
    old: &str,
    new: &str,
    old_value: &Json,
    new_value: &Json,
) -> bool {
    if !key.ends_with(".#") {
        return false;
    }
    let list = match (old, new) {
        ("0", "1") => new_value,
        ("1", "0") => old_value,
        _ => return false,
    };
    match list.as_array().and_then(|list| list.first()) {
        Some(Json::Object(contents)) => contents.values().all(is_empty_value),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn case() {
        assert!(case_diff_suppress("abc", "ABC"));
        assert!(case_diff_suppress("ABC", "ABC"));
        assert!(!case_diff_suppress("abc", "abd"));
    }

    #[test]
    fn duration() {
        assert!(duration_diff_suppress("60s", "60.0s"));
        assert!(duration_diff_suppress("1m", "60s"));
        assert!(!duration_diff_suppress("60s", "61s"));
        assert!(!duration_diff_suppress("60s", "abc"));
        assert!(duration_diff_suppress("-1s", "-1.0s"));
        assert!(duration_diff_suppress("-0s", "0"));
        assert!(!duration_diff_suppress("-1s", "1s"));
    }

    #[test]
    fn internal_ip() {
        let cases = [
            ("2001:db8::1", "2001:db8::1", true),
            ("2001:db8::1/96", "2001:db8::1/96", true),
            ("2001:db8:0:0:0:0:0:1/96", "2001:db8::1", true),
            ("2001:db8::1", "2001:db8:0:0:0:0:0:1/96", true),
            ("2001:db8::1/96", "projects/p/regions/r/addresses/a", true),
            ("2001:db8::1/96", "2001:db8::1/97", false),
            ("projects/p/regions/r/addresses/a", "2001:db8::1", false),
            ("2001:db8::1", "2001:db8::2", false),
            ("10.0.0.1", "10.0.0.1", true),
            ("10.0.0.1", "10.0.0.1/24", true),
            ("1.2.3.4/24", "1.2.3.5/25", false),
            ("projects/p/regions/r/addresses/a", "projects/p/regions/r/addresses/b", false),
            ("projects/p/regions/r/addresses/a", "projects/p/regions/r/addresses/a", false),
        ];
        for (old, new, expected) in cases {
            assert_eq!(internal_ip_diff_suppress(old, new), expected, "{old} vs {new}");
        }
    }

    #[test]
    fn last_slash() {
        assert!(last_slash_diff_suppress("https://example.com/", "https://example.com"));
        assert!(last_slash_diff_suppress("https://example.com", "https://example.com/"));
        assert!(last_slash_diff_suppress("a", "a"));
        assert!(!last_slash_diff_suppress("https://example.com/", "https://example.org/"));
    }

    #[test]
    fn absolute_domain() {
        assert!(absolute_domain_suppress("example.com.", "example.com"));
        assert!(absolute_domain_suppress("example.com", "example.com."));
        assert!(!absolute_domain_suppress("example.com", "example.org."));
    }

    #[test]
    fn empty_or_default() {
        let suppress = empty_or_default_string_suppress("default");
        assert!(suppress("", "default"));
        assert!(suppress("default", ""));
        assert!(!suppress("", "other"));
        assert!(!suppress("other", "default"));
    }

    #[test]
    fn project_number() {
        assert!(project_number_diff_suppress(
            "projects/123456/topics/t",
            "projects/my-project/topics/t"
        ));
        assert!(!project_number_diff_suppress(
            "projects/123456/topics/t",
            "projects/my-project/topics/u"
        ));
    }

    #[test]
    fn rfc3339() {
        assert!(rfc3339_diff_suppress(
            "2024-01-01T00:00:00Z",
            "2024-01-01T01:00:00+01:00"
        ));
        assert!(!rfc3339_diff_suppress("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z"));
        assert!(!rfc3339_diff_suppress("yesterday", "yesterday"));
    }

    #[test]
    fn custom_timestamp_format() {
        let format = time::format_description::parse(
            "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory]:[offset_minute]",
        )
        .unwrap();
        let suppress = timestamp_diff_suppress(&format[..]);
        assert!(suppress("2024-01-01 00:00:00 +00:00", "2024-01-01 02:00:00 +02:00"));
        assert!(!suppress("2024-01-01 00:00:00 +00:00", "2024-01-01 00:00:01 +00:00"));
    }

    #[test]
    fn empty_or_unset_block() {
        let defined_empty = json!([{"network_tags": []}]);
        assert!(empty_or_unset_block_diff_suppress(
            "block.#",
            "1",
            "0",
            &defined_empty,
            &Json::Null
        ));
        assert!(empty_or_unset_block_diff_suppress(
            "block.#",
            "0",
            "1",
            &Json::Null,
            &defined_empty
        ));

        let nested_nil = json!([{"network_tags": [{"tags": null}]}]);
        assert!(!empty_or_unset_block_diff_suppress(
            "block.#",
            "0",
            "1",
            &Json::Null,
            &nested_nil
        ));

        assert!(!empty_or_unset_block_diff_suppress(
            "block.0.field",
            "1",
            "0",
            &defined_empty,
            &Json::Null
        ));
        assert!(!empty_or_unset_block_diff_suppress(
            "block.#",
            "1",
            "1",
            &defined_empty,
            &defined_empty
        ));
        assert!(!empty_or_unset_block_diff_suppress(
            "block.#",
            "0",
            "1",
            &Json::Null,
            &json!([])
        ));
    }
}
