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

//! Worker descriptor for a single OSD placement
//!
//! An `OsdObject` is either a node (devices, filters and directories on that
//! host) or a claim (one PVC-backed block volume). It is the immutable input
//! to manifest construction.

use crate::domain::osd::store::StoreConfig;
use k8s_openapi::api::core::v1::{
    Affinity, NodeAffinity, PersistentVolumeClaimVolumeSource, PodAffinity, PodAntiAffinity,
    PodSpec, ResourceRequirements, Toleration,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    pub name: String,
    /// Per-device overrides such as `osdsPerDevice` or `metadataDevice`.
    pub config: BTreeMap<String, String>,
}

impl Device {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: BTreeMap::new(),
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    pub path: String,
}

impl Directory {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub device_filter: String,
    pub use_all_devices: Option<bool>,
    pub directories: Vec<Directory>,
}

impl Selection {
    pub fn use_all_devices(&self) -> bool {
        self.use_all_devices.unwrap_or(false)
    }
}

/// Scheduling constraints for a workload. Set fields replace the pod's own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    pub node_affinity: Option<NodeAffinity>,
    pub pod_affinity: Option<PodAffinity>,
    pub pod_anti_affinity: Option<PodAntiAffinity>,
    pub tolerations: Vec<Toleration>,
}

impl Placement {
    pub fn is_empty(&self) -> bool {
        self.node_affinity.is_none()
            && self.pod_affinity.is_none()
            && self.pod_anti_affinity.is_none()
            && self.tolerations.is_empty()
    }

    pub fn apply_to_pod_spec(&self, spec: &mut PodSpec) {
        if self.node_affinity.is_some()
            || self.pod_affinity.is_some()
            || self.pod_anti_affinity.is_some()
        {
            let affinity = spec.affinity.get_or_insert_with(Affinity::default);
            if let Some(node_affinity) = &self.node_affinity {
                affinity.node_affinity = Some(node_affinity.clone());
            }
            if let Some(pod_affinity) = &self.pod_affinity {
                affinity.pod_affinity = Some(pod_affinity.clone());
            }
            if let Some(pod_anti_affinity) = &self.pod_anti_affinity {
                affinity.pod_anti_affinity = Some(pod_anti_affinity.clone());
            }
        }

        if !self.tolerations.is_empty() {
            spec.tolerations = Some(self.tolerations.clone());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OsdObject {
    /// Node name, or the claim name for PVC-backed OSDs.
    pub name: String,
    pub devices: Vec<Device>,
    pub selection: Selection,
    pub metadata_device: String,
    pub store_config: StoreConfig,
    /// CRUSH location, e.g. `rack=r1 zone=z1`.
    pub location: String,
    pub resources: ResourceRequirements,
    pub placement: Placement,
    pub pvc: Option<PersistentVolumeClaimVolumeSource>,
}

impl OsdObject {
    pub fn for_node(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn for_claim(claim_name: impl Into<String>) -> Self {
        let claim_name = claim_name.into();
        Self {
            pvc: Some(PersistentVolumeClaimVolumeSource {
                claim_name: claim_name.clone(),
                read_only: Some(false),
            }),
            name: claim_name,
            ..Default::default()
        }
    }

    pub fn is_pvc_backed(&self) -> bool {
        self.pvc.is_some()
    }

    pub fn claim_name(&self) -> Option<&str> {
        self.pvc.as_ref().map(|p| p.claim_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{NodeSelector, NodeSelectorTerm};

    #[test]
    fn test_placement_overrides_only_set_fields() {
        let placement = Placement {
            node_affinity: Some(NodeAffinity {
                required_during_scheduling_ignored_during_execution: Some(NodeSelector {
                    node_selector_terms: vec![NodeSelectorTerm::default()],
                }),
                ..Default::default()
            }),
            tolerations: vec![Toleration {
                key: Some("storage".to_string()),
                operator: Some("Exists".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let mut spec = PodSpec {
            affinity: Some(Affinity {
                pod_anti_affinity: Some(PodAntiAffinity::default()),
                ..Default::default()
            }),
            ..Default::default()
        };
        placement.apply_to_pod_spec(&mut spec);

        let affinity = spec.affinity.unwrap();
        assert!(affinity.node_affinity.is_some());
        assert!(affinity.pod_anti_affinity.is_some());
        assert_eq!(spec.tolerations.unwrap().len(), 1);
    }

    #[test]
    fn test_empty_placement_leaves_spec_alone() {
        let mut spec = PodSpec::default();
        Placement::default().apply_to_pod_spec(&mut spec);
        assert!(spec.affinity.is_none());
        assert!(spec.tolerations.is_none());
        assert!(Placement::default().is_empty());
    }

    #[test]
    fn test_for_claim() {
        let osd = OsdObject::for_claim("set1-0-data-abcde");
        assert!(osd.is_pvc_backed());
        assert_eq!(osd.name, "set1-0-data-abcde");
        assert_eq!(osd.claim_name(), Some("set1-0-data-abcde"));
        assert!(!OsdObject::for_node("node1").is_pvc_backed());
    }
}
