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

use crate::domain::osd::store::StoreType;
use crate::infrastructure::constants::{
    ORCHESTRATION_STATUS_COMPLETED, ORCHESTRATION_STATUS_FAILED, ORCHESTRATION_STATUS_KEY,
};
use crate::shared::error::{OsdError, Result};
use k8s_openapi::api::core::v1::ConfigMap;
use serde::{Deserialize, Serialize};

/// Runtime description of an already provisioned OSD.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OsdInfo {
    pub id: u32,
    pub uuid: String,
    pub cluster: String,
    pub data_path: String,
    pub config: String,
    pub keyring_path: String,
    pub journal: Option<String>,
    /// Journal-based store.
    pub is_file_store: bool,
    pub is_directory: bool,
    pub device_part_uuid: Option<String>,
    pub ceph_volume_initiated: bool,
}

impl OsdInfo {
    pub fn store_type(&self) -> StoreType {
        if self.is_file_store {
            StoreType::Filestore
        } else {
            StoreType::Bluestore
        }
    }
}

/// Result the provisioning job publishes for its node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationStatus {
    pub osds: Vec<OsdInfo>,
    pub status: String,
    pub message: String,
    #[serde(rename = "pvcBackedOSD")]
    pub pvc_backed_osd: bool,
}

impl OrchestrationStatus {
    pub fn is_completed(&self) -> bool {
        self.status == ORCHESTRATION_STATUS_COMPLETED
    }

    pub fn is_failed(&self) -> bool {
        self.status == ORCHESTRATION_STATUS_FAILED
    }

    pub fn from_configmap(cm: &ConfigMap) -> Result<Self> {
        let name = cm.metadata.name.clone().unwrap_or_default();
        let raw = cm
            .data
            .as_ref()
            .and_then(|d| d.get(ORCHESTRATION_STATUS_KEY))
            .ok_or_else(|| {
                OsdError::ValidationError(format!(
                    "configmap {} has no '{}' key",
                    name, ORCHESTRATION_STATUS_KEY
                ))
            })?;

        Ok(serde_json::from_str(raw)?)
    }
}
