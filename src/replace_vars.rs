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

//! URL and id templates
//!
//! `{{name}}` placeholders are replaced by, in order: the special variables
//! `project`, `project_id_or_project`, `region`, `zone` and `location`, a
//! field of the resource, or a field of the provider configuration such as
//! `{{ComputeBasePath}}`. `{{%name}}` path-escapes the resource field.
//! Replaced values may contain placeholders themselves.

use regex::Captures;
use url::Url;

use crate::config::Config;
use crate::error::ResolveError;
use crate::location::{get_location, get_project, get_region, get_zone, ResourceData};
use crate::self_link::get_resource_name_from_self_link;
use crate::utils::static_regex;

const MAX_DEPTH: usize = 10;

/// Expand a URL template
pub fn replace_vars(
    d: &dyn ResourceData,
    config: &Config,
    template: &str,
) -> Result<String, ResolveError> {
    replace_vars_recursive(d, config, template, false, 0)
}

/// Expand an id template: self links found in fields are shortened to names
pub fn replace_vars_for_id(
    d: &dyn ResourceData,
    config: &Config,
    template: &str,
) -> Result<String, ResolveError> {
    replace_vars_recursive(d, config, template, true, 0)
}

fn replace_vars_recursive(
    d: &dyn ResourceData,
    config: &Config,
    template: &str,
    shorten: bool,
    depth: usize,
) -> Result<String, ResolveError> {
    if depth > MAX_DEPTH {
        return Err(ResolveError::RecursiveSubstitution);
    }

    let re = static_regex!(r"\{\{([%A-Za-z0-9_]+)\}\}");
    let replacements = Replacements::new(d, config, template)?;
    let replaced = re
        .replace_all(template, |caps: &Captures| {
            replacements.get(d, config, &caps[1], shorten)
        })
        .into_owned();

    if re.is_match(&replaced) {
        replace_vars_recursive(d, config, &replaced, shorten, depth + 1)
    } else {
        Ok(replaced)
    }
}

/// Special variables, only computed when the template needs them
#[derive(Debug, Default)]
struct Replacements {
    project: String,
    project_id: String,
    region: String,
    zone: String,
    location: String,
}

impl Replacements {
    fn new(d: &dyn ResourceData, config: &Config, template: &str) -> Result<Self, ResolveError> {
        let mut replacements = Self::default();
        if template.contains("{{project}}") {
            replacements.project = get_project(d, config)?;
        }
        if template.contains("{{project_id_or_project}}") {
            replacements.project_id = d.get("project_id").unwrap_or_default();
            if replacements.project_id.is_empty() {
                replacements.project = get_project(d, config)?;
            }
        }
        if template.contains("{{region}}") {
            replacements.region = get_region(d, config)?;
        }
        if template.contains("{{zone}}") {
            replacements.zone = get_zone(d, config)?;
        }
        if template.contains("{{location}}") {
            replacements.location = get_location(d, config)?;
        }
        Ok(replacements)
    }

    fn get(&self, d: &dyn ResourceData, config: &Config, name: &str, shorten: bool) -> String {
        match name {
            "project" => return self.project.clone(),
            "project_id_or_project" if !self.project_id.is_empty() => {
                return self.project_id.clone()
            }
            "project_id_or_project" => return self.project.clone(),
            "region" => return self.region.clone(),
            "zone" => return self.zone.clone(),
            "location" => return self.location.clone(),
            _ => (),
        }

        if let Some(field) = name.strip_prefix('%') {
            if let Some(value) = d.get_raw(field) {
                return path_escape(&value);
            }
        } else if let Some(value) = d.get_raw(name) {
            return if shorten {
                get_resource_name_from_self_link(&value).to_string()
            } else {
                value
            };
        }

        config.field_by_name(name).unwrap_or_default()
    }
}

/// Escape a value so it can be used as a single URL path segment
fn path_escape(value: &str) -> String {
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return value.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(value);
    }
    url.path().trim_start_matches('/').to_string()
}
