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

//! Cluster description loaded from TOML
//!
//! Everything the manifest builders need about the surrounding cluster lives
//! here: namespace, images, versions, networking and the desired storage
//! layout. Builders only read it.

use crate::domain::osd::{
    CephVersion, Device, Directory, OsdObject, Placement, Selection, StorageClassDeviceSet,
    StoreConfig,
};
use crate::infrastructure::constants::{
    DATA_DIR, ENV_HOSTPATH_REQUIRES_PRIVILEGED, LOCATION_KEY, METADATA_DEVICE_KEY,
    OSD_DEPLOYMENT_NAME_PREFIX, STATUS_CONFIGMAP_SUFFIX,
};
use crate::shared::error::{OsdError, Result};
use k8s_openapi::api::core::v1::ResourceRequirements;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::read_to_string;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConf {
    pub namespace: String,
    /// Host directory backing `/var/lib/rook` in every OSD pod.
    pub data_dir_host_path: String,
    pub host_network: bool,
    /// Force privileged provision containers (restricted platforms).
    pub hostpath_requires_privileged: bool,
    pub rook_image: String,
    pub rook_version: String,
    pub ceph: CephConf,
    pub owner: Option<OwnerConf>,
    pub annotations: BTreeMap<String, String>,
    pub resources: ResourceRequirements,
    pub placement: Placement,
    pub storage: StorageScope,
}

impl Default for ClusterConf {
    fn default() -> Self {
        Self {
            namespace: "rook-ceph".to_string(),
            data_dir_host_path: DATA_DIR.to_string(),
            host_network: false,
            hostpath_requires_privileged: false,
            rook_image: "rook/ceph:v1.0.0".to_string(),
            rook_version: "v1.0.0".to_string(),
            ceph: CephConf::default(),
            owner: None,
            annotations: BTreeMap::new(),
            resources: ResourceRequirements::default(),
            placement: Placement::default(),
            storage: StorageScope::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CephConf {
    pub image: String,
    pub version: CephVersion,
}

impl Default for CephConf {
    fn default() -> Self {
        Self {
            image: "ceph/ceph:v14.2.1-20190430".to_string(),
            version: CephVersion::default(),
        }
    }
}

/// Object that owns every generated workload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnerConf {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
}

impl OwnerConf {
    pub fn to_owner_reference(&self) -> OwnerReference {
        OwnerReference {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            uid: self.uid.clone(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }
}

/// Cluster-wide storage selection. Nodes inherit anything they leave unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageScope {
    pub use_all_devices: Option<bool>,
    pub device_filter: String,
    pub directories: Vec<Directory>,
    pub config: BTreeMap<String, String>,
    pub nodes: Vec<NodeConf>,
    pub storage_class_device_sets: Vec<StorageClassDeviceSet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConf {
    pub name: String,
    pub devices: Vec<Device>,
    pub use_all_devices: Option<bool>,
    pub device_filter: Option<String>,
    pub directories: Option<Vec<Directory>>,
    pub config: BTreeMap<String, String>,
    pub resources: Option<ResourceRequirements>,
    pub placement: Option<Placement>,
}

impl StorageScope {
    /// Effective descriptor for one node after inheriting cluster-level settings.
    pub fn resolve_node(
        &self,
        node: &NodeConf,
        cluster_resources: &ResourceRequirements,
    ) -> Result<OsdObject> {
        let mut config = self.config.clone();
        config.extend(node.config.clone());

        let selection = Selection {
            device_filter: node
                .device_filter
                .clone()
                .unwrap_or_else(|| self.device_filter.clone()),
            use_all_devices: node.use_all_devices.or(self.use_all_devices),
            directories: node
                .directories
                .clone()
                .unwrap_or_else(|| self.directories.clone()),
        };

        Ok(OsdObject {
            name: node.name.clone(),
            devices: node.devices.clone(),
            selection,
            metadata_device: config.get(METADATA_DEVICE_KEY).cloned().unwrap_or_default(),
            store_config: StoreConfig::from_map(&config)?,
            location: config.get(LOCATION_KEY).cloned().unwrap_or_default(),
            resources: node
                .resources
                .clone()
                .unwrap_or_else(|| cluster_resources.clone()),
            placement: node.placement.clone().unwrap_or_default(),
            pvc: None,
        })
    }
}

impl ClusterConf {
    /// Load configuration from TOML file
    pub fn from<T: AsRef<str>>(path: T) -> Result<Self> {
        let content = read_to_string(path.as_ref()).map_err(|e| {
            OsdError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref(),
                e
            ))
        })?;

        let conf: Self = toml::from_str(&content)?;
        Ok(conf)
    }

    /// Capture process-level overrides once, so the builders never read the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(ENV_HOSTPATH_REQUIRES_PRIVILEGED) {
            self.hostpath_requires_privileged = value == "true";
        }
    }

    pub fn owner_reference(&self) -> Option<OwnerReference> {
        self.owner.as_ref().map(OwnerConf::to_owner_reference)
    }

    /// Value for `ROOK_CLUSTER_ID`.
    pub fn cluster_id(&self) -> String {
        self.owner
            .as_ref()
            .map(|o| o.uid.clone())
            .unwrap_or_default()
    }

    pub fn status_configmap_name(&self, node: &str) -> String {
        format!(
            "{}{}{}",
            OSD_DEPLOYMENT_NAME_PREFIX, node, STATUS_CONFIGMAP_SUFFIX
        )
    }
}
