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

//! Self links and resource ids
//!
//! A self link is the full URL of a resource, eg:
//! `https://www.googleapis.com/compute/v1/projects/my-project/zones/us-central1-a/instances/vm`.
//! Its relative path starts at `projects/`.

use url::Url;

use crate::config::Config;
use crate::error::ResolveError;
use crate::location::{get_project, ResourceData};
use crate::utils::static_regex;

/// Part of a self link starting at `projects/`
pub fn get_relative_path(self_link: &str) -> Result<String, ResolveError> {
    match self_link.split_once("projects/") {
        Some((_, rest)) => Ok(format!("projects/{rest}")),
        None => Err(ResolveError::NotASelfLink(self_link.to_string())),
    }
}

/// Last segment of a self link, or the input itself if it has no `/`
pub fn get_resource_name_from_self_link(self_link: &str) -> &str {
    match self_link.rsplit_once('/') {
        Some((_, name)) => name,
        None => self_link,
    }
}

/// Rewrite the compute API version of a self link to `v1`
pub fn convert_self_link_to_v1(self_link: &str) -> String {
    static_regex!(r"/compute/[a-zA-Z0-9]*/projects/")
        .replace_all(self_link, "/compute/v1/projects/")
        .into_owned()
}

/// Both values name the same resource, whatever the form
pub fn compare_resource_names(old: &str, new: &str) -> bool {
    get_resource_name_from_self_link(old) == get_resource_name_from_self_link(new)
}

/// Both values are self links with the same relative path
pub fn compare_self_link_relative_paths(old: &str, new: &str) -> bool {
    match (get_relative_path(old), get_relative_path(new)) {
        (Ok(old), Ok(new)) => old == new,
        _ => false,
    }
}

/// `old` is a self link, `new` is either a self link or a bare name
pub fn compare_self_link_or_resource_name(old: &str, new: &str) -> bool {
    if !new.contains('/') && get_resource_name_from_self_link(old) == new {
        return true;
    }
    compare_self_link_relative_paths(old, new)
}

/// Project, location and name of a zonal or regional self link
pub fn get_locational_resource_properties_from_self_link(
    self_link: &str,
) -> Result<(String, String, String), ResolveError> {
    let path = match Url::parse(self_link) {
        Ok(url) => url.path().to_string(),
        Err(_) => self_link.to_string(),
    };
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() < 9 {
        return Err(ResolveError::NotALocationalSelfLink(self_link.to_string()));
    }
    Ok((
        parts[4].to_string(),
        parts[6].to_string(),
        parts[8].to_string(),
    ))
}

/// Region of a compute region self link, or the input if it is not one
pub fn get_region_from_region_self_link(self_link: &str) -> String {
    static_regex!(r"/compute/[a-zA-Z0-9]*/projects/[a-zA-Z0-9-]*/regions/([a-zA-Z0-9-]*)")
        .captures(self_link)
        .and_then(|caps| caps.get(1))
        .map(|region| region.as_str())
        .filter(|region| !region.is_empty())
        .unwrap_or(self_link)
        .to_string()
}

/// Region of any regional resource link, or the input if there is none
pub fn get_region_from_regional_self_link(self_link: &str) -> String {
    static_regex!(r"projects/[a-zA-Z0-9-]*/(?:locations|regions)/([a-zA-Z0-9-]*)")
        .captures(self_link)
        .and_then(|caps| caps.get(1))
        .map(|region| region.as_str())
        .filter(|region| !region.is_empty())
        .unwrap_or(self_link)
        .to_string()
}

/// Region of a zone, eg: `us-central1` for `us-central1-f`
pub fn get_region_from_zone(zone: &str) -> String {
    match zone.len() {
        len if len > 2 => zone.get(..len - 2).unwrap_or_default().to_string(),
        _ => String::new(),
    }
}

/// Elements to add and to remove to go from `from` to `to`
///
/// Elements are matched with [`compare_self_link_or_resource_name`].
pub fn calc_add_remove(from: &[String], to: &[String]) -> (Vec<String>, Vec<String>) {
    let add = to
        .iter()
        .filter(|u| !from.iter().any(|v| compare_self_link_or_resource_name(v, u)))
        .cloned()
        .collect();
    let remove = from
        .iter()
        .filter(|u| !to.iter().any(|v| compare_self_link_or_resource_name(u, v)))
        .cloned()
        .collect();
    (add, remove)
}

/// Fully qualified name of a service account
///
/// Accepts a full name, an email, or an account id in the resource project.
pub fn service_account_fqn(
    service_account: &str,
    d: &dyn ResourceData,
    config: &Config,
) -> Result<String, ResolveError> {
    if service_account.starts_with("projects/") {
        return Ok(service_account.to_string());
    }
    if service_account.contains('@') {
        return Ok(format!("projects/-/serviceAccounts/{service_account}"));
    }
    let project = get_project(d, config)?;
    Ok(format!(
        "projects/-/serviceAccounts/{service_account}@{project}.iam.gserviceaccount.com"
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const INSTANCE: &str =
        "https://www.googleapis.com/compute/v1/projects/my-project/zones/us-central1-a/instances/vm";

    #[test]
    fn relative_path() {
        assert_eq!(
            get_relative_path(INSTANCE).unwrap(),
            "projects/my-project/zones/us-central1-a/instances/vm"
        );
        assert_eq!(
            get_relative_path("vm").unwrap_err().to_string(),
            "String was not a self link: vm"
        );
    }

    #[test]
    fn resource_name() {
        assert_eq!(get_resource_name_from_self_link(INSTANCE), "vm");
        assert_eq!(get_resource_name_from_self_link("vm"), "vm");
        assert_eq!(get_resource_name_from_self_link("zones/"), "");
    }

    #[test]
    fn v1_conversion() {
        assert_eq!(
            convert_self_link_to_v1(
                "https://www.googleapis.com/compute/beta/projects/my-project/global/networks/default"
            ),
            "https://www.googleapis.com/compute/v1/projects/my-project/global/networks/default"
        );
        assert_eq!(convert_self_link_to_v1(INSTANCE), INSTANCE);
    }

    #[test]
    fn comparisons() {
        assert!(compare_self_link_or_resource_name(INSTANCE, "vm"));
        assert!(!compare_self_link_or_resource_name(INSTANCE, "other"));
        assert!(compare_self_link_or_resource_name(
            INSTANCE,
            "projects/my-project/zones/us-central1-a/instances/vm"
        ));
        assert!(compare_self_link_or_resource_name(
            INSTANCE,
            "https://compute.googleapis.com/compute/beta/projects/my-project/zones/us-central1-a/instances/vm"
        ));
        assert!(!compare_self_link_or_resource_name(
            INSTANCE,
            "zones/us-central1-a/instances/vm"
        ));
        assert!(!compare_self_link_relative_paths("vm", "vm"));
        assert!(compare_resource_names(INSTANCE, "vm"));
    }

    #[test]
    fn locational_properties() {
        assert_eq!(
            get_locational_resource_properties_from_self_link(INSTANCE).unwrap(),
            (
                "my-project".to_string(),
                "us-central1-a".to_string(),
                "vm".to_string()
            )
        );
        assert_eq!(
            get_locational_resource_properties_from_self_link("projects/p/zones/z/instances/vm")
                .unwrap_err()
                .to_string(),
            "value projects/p/zones/z/instances/vm was not a self link"
        );
    }

    #[test]
    fn regions() {
        assert_eq!(
            get_region_from_region_self_link(
                "https://www.googleapis.com/compute/v1/projects/my-project/regions/us-central1"
            ),
            "us-central1"
        );
        assert_eq!(get_region_from_region_self_link("us-central1"), "us-central1");
        assert_eq!(
            get_region_from_regional_self_link("projects/my-project/locations/europe-west1/keyRings/k"),
            "europe-west1"
        );
        assert_eq!(
            get_region_from_regional_self_link("projects/my-project/regions/asia-east1/subnetworks/s"),
            "asia-east1"
        );
        assert_eq!(get_region_from_zone("us-central1-f"), "us-central1");
        assert_eq!(get_region_from_zone("resource-zone-a"), "resource-zone");
        assert_eq!(get_region_from_zone("a"), "");
    }

    #[test]
    fn add_remove() {
        let from = vec![
            "https://www.googleapis.com/compute/v1/projects/p/global/networks/a".to_string(),
            "https://www.googleapis.com/compute/v1/projects/p/global/networks/b".to_string(),
        ];
        let to = vec!["b".to_string(), "c".to_string()];
        let (add, remove) = calc_add_remove(&from, &to);
        assert_eq!(add, vec!["c"]);
        assert_eq!(remove, vec![from[0].clone()]);
    }

    #[test]
    fn service_accounts() {
        let config = Config {
            project: Some("provider-project".to_string()),
            ..Default::default()
        };
        let d: HashMap<&str, &str> = HashMap::new();
        assert_eq!(
            service_account_fqn("projects/p/serviceAccounts/sa@p.iam.gserviceaccount.com", &d, &config)
                .unwrap(),
            "projects/p/serviceAccounts/sa@p.iam.gserviceaccount.com"
        );
        assert_eq!(
            service_account_fqn("sa@p.iam.gserviceaccount.com", &d, &config).unwrap(),
            "projects/-/serviceAccounts/sa@p.iam.gserviceaccount.com"
        );
        assert_eq!(
            service_account_fqn("sa", &d, &config).unwrap(),
            "projects/-/serviceAccounts/sa@provider-project.iam.gserviceaccount.com"
        );
    }
}
