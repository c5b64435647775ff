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

//! Provider functions, called as `provider::google::<name>(...)`

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{FunctionSchema, Parameter, Type};
use tf_provider::schema::Description;
use tf_provider::{Diagnostics, Function};

use crate::self_link::get_region_from_zone;
use crate::utils::static_regex;

/// Extract one element from a resource id or self link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdFunction {
    Project,
    Region,
    Zone,
    Location,
    Name,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdArgs {
    pub id: String,
}

impl IdFunction {
    fn element(self) -> &'static str {
        match self {
            IdFunction::Project => "project",
            IdFunction::Region => "region",
            IdFunction::Zone => "zone",
            IdFunction::Location => "location",
            IdFunction::Name => "name",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            IdFunction::Project => static_regex!(r"projects/(?P<ProjectId>[^/]+)/"),
            IdFunction::Region => static_regex!(r"regions/(?P<Region>[^/]+)"),
            IdFunction::Zone => static_regex!(r"zones/(?P<Zone>[^/]+)"),
            IdFunction::Location => static_regex!(r"locations/(?P<Location>[^/]+)"),
            IdFunction::Name => static_regex!(r"/(?P<Name>[^/]+)$"),
        }
    }

    /// Extract the element from `id`
    ///
    /// When the pattern matches more than once, the first match is used and
    /// a warning is emitted.
    pub fn extract(self, diags: &mut Diagnostics, id: &str) -> Option<String> {
        let pattern = self.pattern();
        let mut matches = pattern.captures_iter(id);
        let Some(first) = matches.next() else {
            diags.root_error(
                format!("Could not extract the {} from the id", self.element()),
                format!(
                    "The input string \"{id}\" doesn't contain the expected pattern \"{}\".",
                    pattern.as_str()
                ),
            );
            return None;
        };
        if matches.next().is_some() {
            diags.root_warning(
                "Ambiguous resource id",
                format!(
                    "The input string \"{id}\" contains more than one match for the pattern \"{}\". Terraform will use the first found match.",
                    pattern.as_str()
                ),
            );
        }
        first.get(1).map(|element| element.as_str().to_string())
    }
}

#[async_trait]
impl Function for IdFunction {
    type Input<'a> = IdArgs;
    type Output<'a> = String;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<FunctionSchema> {
        let element = self.element();
        Some(FunctionSchema {
            parameters: vec![Parameter {
                name: "id".into(),
                param_type: Type::String,
                description: Description::plain(
                    "A resource id, a self link, or a string containing one",
                ),
                ..Default::default()
            }],
            return_type: Type::String,
            summary: format!("Returns the {element} within a provided resource id or self link"),
            description: Description::markdown(format!(
                "Takes a single string argument, which should be a resource id or self link, and returns the {element} it contains. The pattern used is `{}`.",
                self.pattern().as_str()
            )),
            ..Default::default()
        })
    }

    async fn call<'a>(
        &self,
        diags: &mut Diagnostics,
        params: Self::Input<'a>,
    ) -> Option<Self::Output<'a>> {
        self.extract(diags, &params.id)
    }
}

/// `region_from_zone`: `us-central1` for `us-central1-a`
#[derive(Debug, Default, Clone, Copy)]
pub struct RegionFromZone;

#[derive(Debug, Serialize, Deserialize)]
pub struct ZoneArgs {
    pub zone: String,
}

#[async_trait]
impl Function for RegionFromZone {
    type Input<'a> = ZoneArgs;
    type Output<'a> = String;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<FunctionSchema> {
        Some(FunctionSchema {
            parameters: vec![Parameter {
                name: "zone".into(),
                param_type: Type::String,
                description: Description::plain("A zone name, eg: `us-central1-a`"),
                ..Default::default()
            }],
            return_type: Type::String,
            summary: "Returns the region within a provided zone".into(),
            description: Description::plain(
                "Takes a single string argument, which should be a zone name, and returns the region it belongs to.",
            ),
            ..Default::default()
        })
    }

    async fn call<'a>(
        &self,
        diags: &mut Diagnostics,
        params: Self::Input<'a>,
    ) -> Option<Self::Output<'a>> {
        let zone = params.zone;
        if zone.is_empty() {
            diags.root_error("Invalid zone", "The input string cannot be empty.");
            return None;
        }
        if zone.len() < 3 || zone.as_bytes()[zone.len() - 2] != b'-' {
            diags.root_error(
                "Invalid zone",
                format!("The input string \"{zone}\" is not a valid zone name."),
            );
            return None;
        }
        Some(get_region_from_zone(&zone))
    }
}
