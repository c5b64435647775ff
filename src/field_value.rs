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

//! Fields referencing another resource
//!
//! A reference can be given as a full URL, a relative link
//! (`projects/p/zones/z/instances/i`), a partial link (`zones/z/instances/i`)
//! or a bare name. Missing parts are taken from the resource, then from the
//! provider configuration.

use regex::Regex;

use crate::config::Config;
use crate::error::ResolveError;
use crate::location::{get_project_from_schema, get_region_from_schema, ResourceData};
use crate::self_link::get_resource_name_from_self_link;

fn captures(pattern: String, value: &str) -> Option<Vec<String>> {
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(value)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect(),
    )
}

fn global_link(resource_type: &str) -> String {
    format!("projects/(.+)/global/{}/(.+)", regex::escape(resource_type))
}

fn zonal_link(resource_type: &str) -> String {
    format!("projects/(.+)/zones/(.+)/{}/(.+)", regex::escape(resource_type))
}

fn zonal_partial_link(resource_type: &str) -> String {
    format!("zones/(.+)/{}/(.+)", regex::escape(resource_type))
}

fn regional_link(resource_type: &str) -> String {
    format!("projects/(.+)/regions/(.+)/{}/(.+)", regex::escape(resource_type))
}

fn regional_partial_link(resource_type: &str) -> String {
    format!("regions/(.+)/{}/(.+)", regex::escape(resource_type))
}

fn project_link(resource_type: &str) -> String {
    format!("projects/(.+)/{}/(.+)", regex::escape(resource_type))
}

fn organization_link(resource_type: &str) -> String {
    format!("organizations/(.+)/{}/(.+)", regex::escape(resource_type))
}

/// Reference to a global resource: `projects/{project}/global/{type}/{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalFieldValue {
    pub project: String,
    pub name: String,
    pub resource_type: String,
}

impl GlobalFieldValue {
    pub fn relative_link(&self) -> String {
        if self.name.is_empty() {
            return String::new();
        }
        format!(
            "projects/{}/global/{}/{}",
            self.project, self.resource_type, self.name
        )
    }

    pub fn parse(
        resource_type: &str,
        field_value: &str,
        project_field: &str,
        d: &dyn ResourceData,
        config: &Config,
        is_empty_valid: bool,
    ) -> Result<Self, ResolveError> {
        if field_value.is_empty() {
            return empty_field("global", resource_type, is_empty_valid).map(|()| Self {
                project: String::new(),
                name: String::new(),
                resource_type: resource_type.to_string(),
            });
        }

        if let Some(parts) = captures(global_link(resource_type), field_value) {
            return Ok(Self {
                project: parts[0].clone(),
                name: parts[1].clone(),
                resource_type: resource_type.to_string(),
            });
        }

        Ok(Self {
            project: get_project_from_schema(project_field, d, config)?,
            name: get_resource_name_from_self_link(field_value).to_string(),
            resource_type: resource_type.to_string(),
        })
    }
}

/// Reference to a zonal resource: `projects/{project}/zones/{zone}/{type}/{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZonalFieldValue {
    pub project: String,
    pub zone: String,
    pub name: String,
    pub resource_type: String,
}

impl ZonalFieldValue {
    pub fn relative_link(&self) -> String {
        if self.name.is_empty() {
            return String::new();
        }
        format!(
            "projects/{}/zones/{}/{}/{}",
            self.project, self.zone, self.resource_type, self.name
        )
    }

    /// `zone_field` empty means the zone must be part of the value
    #[allow(clippy::too_many_arguments)]
    pub fn parse(
        resource_type: &str,
        field_value: &str,
        project_field: &str,
        zone_field: &str,
        d: &dyn ResourceData,
        config: &Config,
        is_empty_valid: bool,
    ) -> Result<Self, ResolveError> {
        let resource_type_owned = resource_type.to_string();
        if field_value.is_empty() {
            return empty_field("zonal", resource_type, is_empty_valid).map(|()| Self {
                project: String::new(),
                zone: String::new(),
                name: String::new(),
                resource_type: resource_type_owned,
            });
        }

        if let Some(parts) = captures(zonal_link(resource_type), field_value) {
            return Ok(Self {
                project: parts[0].clone(),
                zone: parts[1].clone(),
                name: parts[2].clone(),
                resource_type: resource_type_owned,
            });
        }

        let project = get_project_from_schema(project_field, d, config)?;

        if let Some(parts) = captures(zonal_partial_link(resource_type), field_value) {
            return Ok(Self {
                project,
                zone: parts[0].clone(),
                name: parts[1].clone(),
                resource_type: resource_type_owned,
            });
        }

        if zone_field.is_empty() {
            return Err(ResolveError::InvalidFieldFormat {
                got: field_value.to_string(),
                expected: format!("projects/{{project}}/zones/{{zone}}/{resource_type}/{{name}}"),
            });
        }

        let zone = match d.get(zone_field) {
            Some(zone) => zone,
            None => config
                .zone
                .clone()
                .filter(|zone| !zone.is_empty())
                .ok_or(ResolveError::ZoneRequired)?,
        };

        Ok(Self {
            project,
            zone,
            name: get_resource_name_from_self_link(field_value).to_string(),
            resource_type: resource_type_owned,
        })
    }
}

/// Reference to a regional resource: `projects/{project}/regions/{region}/{type}/{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionalFieldValue {
    pub project: String,
    pub region: String,
    pub name: String,
    pub resource_type: String,
}

impl RegionalFieldValue {
    pub fn relative_link(&self) -> String {
        if self.name.is_empty() {
            return String::new();
        }
        format!(
            "projects/{}/regions/{}/{}/{}",
            self.project, self.region, self.resource_type, self.name
        )
    }

    /// `region_field` empty means the region must be part of the value
    #[allow(clippy::too_many_arguments)]
    pub fn parse(
        resource_type: &str,
        field_value: &str,
        project_field: &str,
        region_field: &str,
        zone_field: &str,
        d: &dyn ResourceData,
        config: &Config,
        is_empty_valid: bool,
    ) -> Result<Self, ResolveError> {
        let resource_type_owned = resource_type.to_string();
        if field_value.is_empty() {
            return empty_field("regional", resource_type, is_empty_valid).map(|()| Self {
                project: String::new(),
                region: String::new(),
                name: String::new(),
                resource_type: resource_type_owned,
            });
        }

        if let Some(parts) = captures(regional_link(resource_type), field_value) {
            return Ok(Self {
                project: parts[0].clone(),
                region: parts[1].clone(),
                name: parts[2].clone(),
                resource_type: resource_type_owned,
            });
        }

        let project = get_project_from_schema(project_field, d, config)?;

        if let Some(parts) = captures(regional_partial_link(resource_type), field_value) {
            return Ok(Self {
                project,
                region: parts[0].clone(),
                name: parts[1].clone(),
                resource_type: resource_type_owned,
            });
        }

        if region_field.is_empty() {
            return Err(ResolveError::InvalidFieldFormat {
                got: field_value.to_string(),
                expected: format!(
                    "projects/{{project}}/regions/{{region}}/{resource_type}/{{name}}"
                ),
            });
        }

        Ok(Self {
            project,
            region: get_region_from_schema(region_field, zone_field, d, config)?,
            name: get_resource_name_from_self_link(field_value).to_string(),
            resource_type: resource_type_owned,
        })
    }
}

/// Reference to a project-level resource: `projects/{project}/{type}/{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFieldValue {
    pub project: String,
    pub name: String,
    pub resource_type: String,
}

impl ProjectFieldValue {
    pub fn relative_link(&self) -> String {
        if self.name.is_empty() {
            return String::new();
        }
        format!("projects/{}/{}/{}", self.project, self.resource_type, self.name)
    }

    pub fn parse(
        resource_type: &str,
        field_value: &str,
        project_field: &str,
        d: &dyn ResourceData,
        config: &Config,
        is_empty_valid: bool,
    ) -> Result<Self, ResolveError> {
        if field_value.is_empty() {
            return empty_field("project", resource_type, is_empty_valid).map(|()| Self {
                project: String::new(),
                name: String::new(),
                resource_type: resource_type.to_string(),
            });
        }

        if let Some(parts) = captures(project_link(resource_type), field_value) {
            return Ok(Self {
                project: parts[0].clone(),
                name: parts[1].clone(),
                resource_type: resource_type.to_string(),
            });
        }

        Ok(Self {
            project: get_project_from_schema(project_field, d, config)?,
            name: get_resource_name_from_self_link(field_value).to_string(),
            resource_type: resource_type.to_string(),
        })
    }
}

/// Reference to an organization-level resource: `organizations/{org_id}/{type}/{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationFieldValue {
    pub org_id: String,
    pub name: String,
    pub resource_type: String,
}

impl OrganizationFieldValue {
    pub fn relative_link(&self) -> String {
        if self.name.is_empty() {
            return String::new();
        }
        format!(
            "organizations/{}/{}/{}",
            self.org_id, self.resource_type, self.name
        )
    }

    /// The organization cannot be inferred, so the value must be a link
    pub fn parse(
        resource_type: &str,
        field_value: &str,
        is_empty_valid: bool,
    ) -> Result<Self, ResolveError> {
        if field_value.is_empty() {
            return empty_field("organization", resource_type, is_empty_valid).map(|()| Self {
                org_id: String::new(),
                name: String::new(),
                resource_type: resource_type.to_string(),
            });
        }

        match captures(organization_link(resource_type), field_value) {
            Some(parts) => Ok(Self {
                org_id: parts[0].clone(),
                name: parts[1].clone(),
                resource_type: resource_type.to_string(),
            }),
            None => Err(ResolveError::InvalidFieldFormat {
                got: field_value.to_string(),
                expected: format!("organizations/{{org_id}}/{resource_type}/{{name}}"),
            }),
        }
    }
}

fn empty_field(
    kind: &'static str,
    resource_type: &str,
    is_empty_valid: bool,
) -> Result<(), ResolveError> {
    if is_empty_valid {
        Ok(())
    } else {
        Err(ResolveError::EmptyField {
            kind,
            resource_type: resource_type.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn provider() -> Config {
        Config {
            project: Some("default-project".to_string()),
            region: Some("default-region".to_string()),
            zone: Some("default-zone-a".to_string()),
            ..Default::default()
        }
    }

    fn data(fields: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
        fields.iter().copied().collect()
    }

    #[test]
    fn global_forms() {
        let d = data(&[]);
        let cases = [
            (
                "https://www.googleapis.com/compute/v1/projects/my-project/global/networks/my-network",
                "projects/my-project/global/networks/my-network",
            ),
            (
                "projects/my-project/global/networks/my-network",
                "projects/my-project/global/networks/my-network",
            ),
            ("my-network", "projects/default-project/global/networks/my-network"),
            ("global/networks/my-network", "projects/default-project/global/networks/my-network"),
        ];
        for (value, expected) in cases {
            let parsed =
                GlobalFieldValue::parse("networks", value, "project", &d, &provider(), false)
                    .unwrap();
            assert_eq!(parsed.relative_link(), expected, "{value}");
        }
    }

    #[test]
    fn global_uses_resource_project() {
        let d = data(&[("project", "resource-project")]);
        let parsed =
            GlobalFieldValue::parse("networks", "my-network", "project", &d, &provider(), false)
                .unwrap();
        assert_eq!(parsed.project, "resource-project");
    }

    #[test]
    fn empty_values() {
        let d = data(&[]);
        let parsed = GlobalFieldValue::parse("networks", "", "project", &d, &provider(), true).unwrap();
        assert_eq!(parsed.relative_link(), "");
        assert_eq!(
            GlobalFieldValue::parse("networks", "", "project", &d, &provider(), false)
                .unwrap_err()
                .to_string(),
            "The global field for resource networks cannot be empty"
        );
    }

    #[test]
    fn missing_project() {
        let d = data(&[]);
        assert_eq!(
            GlobalFieldValue::parse("networks", "n", "project", &d, &Config::default(), false),
            Err(ResolveError::MissingField("project".to_string()))
        );
    }

    #[test]
    fn zonal_forms() {
        let provider = provider();
        let cases = [
            (
                "https://www.googleapis.com/compute/v1/projects/my-project/zones/us-central1-a/disks/my-disk",
                data(&[]),
                "projects/my-project/zones/us-central1-a/disks/my-disk",
            ),
            (
                "zones/us-central1-b/disks/my-disk",
                data(&[]),
                "projects/default-project/zones/us-central1-b/disks/my-disk",
            ),
            (
                "my-disk",
                data(&[("zone", "resource-zone-c")]),
                "projects/default-project/zones/resource-zone-c/disks/my-disk",
            ),
            (
                "my-disk",
                data(&[]),
                "projects/default-project/zones/default-zone-a/disks/my-disk",
            ),
        ];
        for (value, d, expected) in cases {
            let parsed =
                ZonalFieldValue::parse("disks", value, "project", "zone", &d, &provider, false)
                    .unwrap();
            assert_eq!(parsed.relative_link(), expected, "{value}");
        }
    }

    #[test]
    fn zonal_errors() {
        let d = data(&[]);
        let config = Config {
            project: Some("p".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ZonalFieldValue::parse("disks", "my-disk", "project", "zone", &d, &config, false),
            Err(ResolveError::ZoneRequired)
        );
        assert_eq!(
            ZonalFieldValue::parse("disks", "my-disk", "project", "", &d, &config, false)
                .unwrap_err()
                .to_string(),
            "Invalid field format. Got 'my-disk', expected format 'projects/{project}/zones/{zone}/disks/{name}'"
        );
    }

    #[test]
    fn regional_forms() {
        let provider = provider();
        let cases = [
            (
                "projects/my-project/regions/us-east1/subnetworks/s",
                data(&[]),
                "projects/my-project/regions/us-east1/subnetworks/s",
            ),
            (
                "regions/us-west1/subnetworks/s",
                data(&[]),
                "projects/default-project/regions/us-west1/subnetworks/s",
            ),
            (
                "s",
                data(&[("region", "resource-region")]),
                "projects/default-project/regions/resource-region/subnetworks/s",
            ),
            (
                "s",
                data(&[("zone", "resource-zone-a")]),
                "projects/default-project/regions/resource-zone/subnetworks/s",
            ),
            (
                "s",
                data(&[]),
                "projects/default-project/regions/default-region/subnetworks/s",
            ),
        ];
        for (value, d, expected) in cases {
            let parsed = RegionalFieldValue::parse(
                "subnetworks",
                value,
                "project",
                "region",
                "zone",
                &d,
                &provider,
                false,
            )
            .unwrap();
            assert_eq!(parsed.relative_link(), expected, "{value}");
        }
    }

    #[test]
    fn project_and_organization() {
        let d = data(&[]);
        let parsed =
            ProjectFieldValue::parse("roles", "projects/p/roles/r", "project", &d, &provider(), false)
                .unwrap();
        assert_eq!(parsed.relative_link(), "projects/p/roles/r");
        let parsed =
            ProjectFieldValue::parse("roles", "r", "project", &d, &provider(), false).unwrap();
        assert_eq!(parsed.relative_link(), "projects/default-project/roles/r");

        let parsed = OrganizationFieldValue::parse("roles", "organizations/123/roles/r", false).unwrap();
        assert_eq!(parsed.org_id, "123");
        assert_eq!(parsed.relative_link(), "organizations/123/roles/r");
        assert_eq!(
            OrganizationFieldValue::parse("roles", "r", false)
                .unwrap_err()
                .to_string(),
            "Invalid field format. Got 'r', expected format 'organizations/{org_id}/roles/{name}'"
        );
    }
}
