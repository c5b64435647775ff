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

//! Labels managed by the provider
//!
//! A labelled resource exposes three maps:
//! - `labels`: the labels written in the resource configuration,
//! - `terraform_labels`: `labels` merged with the provider default labels
//!   and the attribution label,
//! - `effective_labels`: every label present on the cloud resource.

use std::collections::BTreeMap;

use crate::config::{AttributionStrategy, Config};

/// Label marking resources created through Terraform
pub const ATTRIBUTION_KEY: &str = "goog-terraform-provisioned";
pub const ATTRIBUTION_VALUE: &str = "true";

pub type Labels = BTreeMap<String, String>;

/// Labels managed by Terraform for a resource
///
/// `effective_labels` are the labels currently on the resource, and
/// `is_create` tells if the resource is about to be created.
/// User labels override the provider default labels.
pub fn terraform_labels(
    config: &Config,
    user_labels: &Labels,
    effective_labels: &Labels,
    is_create: bool,
) -> Labels {
    let mut labels = config.default_labels.clone();

    if config.add_terraform_attribution_label {
        let attribute = effective_labels.contains_key(ATTRIBUTION_KEY)
            || match config.terraform_attribution_label_addition_strategy {
                AttributionStrategy::Proactive => true,
                AttributionStrategy::CreationOnly => is_create,
            };
        if attribute {
            labels.insert(ATTRIBUTION_KEY.to_string(), ATTRIBUTION_VALUE.to_string());
        }
    }

    labels.extend(
        user_labels
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    labels
}

/// Labels expected on the resource after applying the new Terraform labels
///
/// Labels that Terraform stopped managing are removed, labels set outside
/// Terraform are kept.
pub fn effective_labels(
    old_terraform_labels: &Labels,
    new_terraform_labels: &Labels,
    current: &Labels,
) -> Labels {
    let mut effective = current.clone();
    effective.retain(|key, _| {
        !old_terraform_labels.contains_key(key) || new_terraform_labels.contains_key(key)
    });
    effective.extend(
        new_terraform_labels
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    effective
}

/// Restrict labels read from the API to the keys of the configured labels
pub fn set_labels(api_labels: &Labels, configured: &Labels) -> Labels {
    configured
        .keys()
        .map(|key| {
            (
                key.clone(),
                api_labels.get(key).cloned().unwrap_or_default(),
            )
        })
        .collect()
}

/// Split labels of an old state into `(labels, effective_labels)`
///
/// Labels starting with `prefix` are system labels and are only kept in the
/// effective labels.
pub fn split_system_labels(labels: &Labels, prefix: &str) -> (Labels, Labels) {
    let user = labels
        .iter()
        .filter(|(key, _)| !key.starts_with(prefix))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    (user, labels.clone())
}
