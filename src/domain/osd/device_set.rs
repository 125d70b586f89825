// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
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

//! Storage class device sets
//!
//! A device set asks for `count` identical claims. Every (set, set index,
//! template index) triple maps to one deterministic [`ClaimIdentity`], which
//! is the lookup key used to find a claim created on an earlier pass.

use crate::domain::osd::descriptor::Placement;
use crate::infrastructure::constants::{
    LABEL_DEVICE_SET, LABEL_DEVICE_SET_PVC_ID, LABEL_PVC_INDEX, LABEL_SET_INDEX,
};
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimVolumeSource, ResourceRequirements,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageClassDeviceSet {
    pub name: String,
    pub count: u32,
    pub resources: ResourceRequirements,
    pub placement: Placement,
    pub config: BTreeMap<String, String>,
    pub volume_claim_templates: Vec<PersistentVolumeClaim>,
}

/// A prepared claim, ready to back one OSD.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeSource {
    pub name: String,
    pub resources: ResourceRequirements,
    pub placement: Placement,
    pub config: BTreeMap<String, String>,
    pub claim: PersistentVolumeClaimVolumeSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClaimIdentity {
    pub device_set: String,
    pub set_index: u32,
    pub template_index: u32,
}

impl ClaimIdentity {
    pub fn new(device_set: impl Into<String>, set_index: u32, template_index: u32) -> Self {
        Self {
            device_set: device_set.into(),
            set_index,
            template_index,
        }
    }

    /// `<set>-<setIndex>-<templateIndex>`
    pub fn id(&self) -> String {
        format!(
            "{}-{}-{}",
            self.device_set, self.set_index, self.template_index
        )
    }

    pub fn selector(&self) -> String {
        format!("{}={}", LABEL_DEVICE_SET_PVC_ID, self.id())
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (LABEL_DEVICE_SET.to_string(), self.device_set.clone()),
            (LABEL_PVC_INDEX.to_string(), self.template_index.to_string()),
            (LABEL_SET_INDEX.to_string(), self.set_index.to_string()),
            (LABEL_DEVICE_SET_PVC_ID.to_string(), self.id()),
        ])
    }
}

impl fmt::Display for ClaimIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}
