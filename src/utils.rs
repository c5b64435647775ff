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

use std::collections::BTreeMap;

use tf_provider::value::{Value, ValueList, ValueMap, ValueString};

/// Compile a regex literal once and return a `&'static Regex`
macro_rules! static_regex {
    ($re:literal) => {{
        static RE: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
        RE.get_or_init(|| ::regex::Regex::new($re).expect("invalid regex literal"))
    }};
}
pub(crate) use static_regex;

pub(crate) trait ValueStringExt {
    /// Content of a known and non-empty string
    fn non_empty(&self) -> Option<&str>;
}

impl ValueStringExt for ValueString<'_> {
    fn non_empty(&self) -> Option<&str> {
        match self {
            Value::Value(s) if !s.is_empty() => Some(s.as_ref()),
            _ => None,
        }
    }
}

/// Known and non-empty elements of a string list
pub(crate) fn known_strings(list: &Value<Vec<ValueString<'_>>>) -> Vec<String> {
    list.iter()
        .flatten()
        .filter_map(|s| s.non_empty())
        .map(str::to_string)
        .collect()
}

/// Known entries of a string map, null and unknown entries are skipped
pub(crate) fn known_map(map: &ValueMap<'_, ValueString<'_>>) -> BTreeMap<String, String> {
    map.iter()
        .flatten()
        .filter_map(|(k, v)| match v {
            Value::Value(v) => Some((k.to_string(), v.to_string())),
            _ => None,
        })
        .collect()
}

/// Convert an owned map into a map usable in a data source state
pub(crate) fn to_value_map<'a>(map: &BTreeMap<String, String>) -> ValueMap<'a, ValueString<'a>> {
    Value::Value(
        map.iter()
            .map(|(k, v)| (k.clone().into(), v.clone().into()))
            .collect(),
    )
}

/// Convert owned strings into a list usable in a data source state
pub(crate) fn to_value_list<'a>(list: &[String]) -> ValueList<ValueString<'a>> {
    Value::Value(list.iter().map(|s| s.clone().into()).collect())
}

/// Convert an optional string into a state value, `None` becomes null
pub(crate) fn to_value_string<'a>(value: Option<&str>) -> ValueString<'a> {
    match value {
        Some(value) => Value::Value(value.to_string().into()),
        None => Value::Null,
    }
}
