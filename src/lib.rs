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

//! Google Cloud provider for Terraform and OpenTofu
//!
//! The provider is served with [`tf_provider::serve`]: [`GoogleProvider`]
//! resolves its [`Config`](config::Config) from the provider block and the
//! environment, selects credentials, and exposes data sources and functions.
//!
//! The other modules hold the building blocks shared by Google resources:
//! self-link parsing, location lookup, URL templating, diff suppression,
//! labels and validation.

mod utils;

pub mod auth;
pub mod config;
pub mod data_source;
pub mod diff_suppress;
pub mod env;
pub mod error;
pub mod field_value;
pub mod functions;
pub mod labels;
pub mod location;
pub mod provider;
pub mod replace_vars;
pub mod self_link;
pub mod transport;
pub mod validation;

pub use provider::{GoogleProvider, ProviderState, SharedState};
