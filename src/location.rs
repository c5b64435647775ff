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

//! Project, region, zone and location of a resource
//!
//! Values set on the resource win over the provider configuration.

use std::collections::{BTreeMap, HashMap};

use crate::config::Config;
use crate::error::ResolveError;
use crate::self_link::{get_region_from_zone, get_resource_name_from_self_link};

/// Read access to the fields of a resource
pub trait ResourceData {
    /// Raw value of a field, `Some("")` if it is set to an empty string
    fn get_raw(&self, key: &str) -> Option<String>;

    /// Value of a field that is set and non-empty
    fn get(&self, key: &str) -> Option<String> {
        self.get_raw(key).filter(|value| !value.is_empty())
    }
}

impl ResourceData for HashMap<&str, &str> {
    fn get_raw(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|value| value.to_string())
    }
}

impl ResourceData for HashMap<String, String> {
    fn get_raw(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl ResourceData for BTreeMap<String, String> {
    fn get_raw(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

/// Scalars of a JSON object, as found in a resource state
impl ResourceData for serde_json::Map<String, serde_json::Value> {
    fn get_raw(&self, key: &str) -> Option<String> {
        match serde_json::Map::get(self, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Project of the resource, or of the provider
pub fn get_project(d: &dyn ResourceData, config: &Config) -> Result<String, ResolveError> {
    get_project_from_schema("project", d, config)
}

/// Project read from a custom field, or of the provider
pub fn get_project_from_schema(
    project_field: &str,
    d: &dyn ResourceData,
    config: &Config,
) -> Result<String, ResolveError> {
    if !project_field.is_empty() {
        if let Some(project) = d.get(project_field) {
            return Ok(project);
        }
    }
    match &config.project {
        Some(project) if !project.is_empty() => Ok(project.clone()),
        _ => Err(ResolveError::MissingField(project_field.to_string())),
    }
}

/// Project to bill requests to: the billing project if set, else `None`
pub fn get_billing_project(d: &dyn ResourceData, config: &Config) -> Option<String> {
    d.get("billing_project")
        .or_else(|| config.billing_project.clone())
        .filter(|project| !project.is_empty())
}

/// Zone of the resource, or of the provider
pub fn get_zone(d: &dyn ResourceData, config: &Config) -> Result<String, ResolveError> {
    if let Some(zone) = d.get("zone") {
        return Ok(get_resource_name_from_self_link(&zone).to_string());
    }
    match config.zone.as_deref() {
        Some(zone) if !zone.is_empty() => Ok(get_resource_name_from_self_link(zone).to_string()),
        _ => Err(ResolveError::CannotDetermineZone),
    }
}

/// Region of the resource, or of the provider
pub fn get_region(d: &dyn ResourceData, config: &Config) -> Result<String, ResolveError> {
    get_region_from_schema("region", "zone", d, config)
}

/// Region looked up from custom region and zone fields
///
/// Priority: resource region, region of the resource zone, provider region,
/// region of the provider zone.
pub fn get_region_from_schema(
    region_field: &str,
    zone_field: &str,
    d: &dyn ResourceData,
    config: &Config,
) -> Result<String, ResolveError> {
    if let Some(region) = d.get(region_field) {
        return Ok(get_resource_name_from_self_link(&region).to_string());
    }
    if let Some(zone) = d.get(zone_field) {
        return Ok(get_region_from_zone(get_resource_name_from_self_link(&zone)));
    }
    if let Some(region) = config.region.as_deref().filter(|r| !r.is_empty()) {
        return Ok(get_resource_name_from_self_link(region).to_string());
    }
    if let Some(zone) = config.zone.as_deref().filter(|z| !z.is_empty()) {
        return Ok(get_region_from_zone(get_resource_name_from_self_link(zone)));
    }
    Err(ResolveError::CannotDetermineRegion)
}

/// Location of the resource
///
/// Priority: resource location, region, zone, then provider region and zone.
pub fn get_location(d: &dyn ResourceData, config: &Config) -> Result<String, ResolveError> {
    ["location", "region", "zone"]
        .into_iter()
        .find_map(|field| d.get(field))
        .or_else(|| config.region.clone().filter(|r| !r.is_empty()))
        .or_else(|| config.zone.clone().filter(|z| !z.is_empty()))
        .map(|location| get_resource_name_from_self_link(&location).to_string())
        .ok_or(ResolveError::CannotDetermineLocation)
}
