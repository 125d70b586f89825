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

use crate::domain::osd::ClaimIdentity;
use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Claim for one device-set slot. The API server completes the generated name.
pub fn make_device_set_pvc(
    identity: &ClaimIdentity,
    template: &PersistentVolumeClaim,
) -> PersistentVolumeClaim {
    // <set>-<setIndex>-<templateIndex>-[<templateName>-]
    let mut generate_name = format!("{}-", identity.id());
    if let Some(template_name) = template.metadata.name.as_deref().filter(|n| !n.is_empty()) {
        generate_name.push_str(template_name);
        generate_name.push('-');
    }

    // Identity labels last: the allocator selects on them.
    let mut labels = template.metadata.labels.clone().unwrap_or_default();
    labels.extend(identity.labels());

    PersistentVolumeClaim {
        metadata: ObjectMeta {
            generate_name: Some(generate_name),
            labels: Some(labels),
            annotations: template.metadata.annotations.clone(),
            ..Default::default()
        },
        spec: template.spec.clone(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::constants::{LABEL_DEVICE_SET, LABEL_DEVICE_SET_PVC_ID};
    use k8s_openapi::api::core::v1::PersistentVolumeClaimSpec;
    use std::collections::BTreeMap;

    #[test]
    fn test_generate_name_and_labels() {
        let template = PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some("data".to_string()),
                labels: Some(BTreeMap::from([
                    ("team".to_string(), "storage".to_string()),
                    (LABEL_DEVICE_SET.to_string(), "overridden".to_string()),
                ])),
                annotations: Some(BTreeMap::from([(
                    "volume.beta.kubernetes.io/storage-class".to_string(),
                    "gp2".to_string(),
                )])),
                ..Default::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                volume_mode: Some("Block".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let pvc = make_device_set_pvc(&ClaimIdentity::new("set1", 1, 0), &template);
        assert_eq!(pvc.metadata.generate_name.as_deref(), Some("set1-1-0-data-"));
        assert!(pvc.metadata.name.is_none());

        let labels = pvc.metadata.labels.unwrap();
        assert_eq!(labels["team"], "storage");
        assert_eq!(labels[LABEL_DEVICE_SET], "set1");
        assert_eq!(labels[LABEL_DEVICE_SET_PVC_ID], "set1-1-0");
        assert_eq!(pvc.metadata.annotations.unwrap().len(), 1);
        assert_eq!(
            pvc.spec.unwrap().volume_mode.as_deref(),
            Some("Block")
        );
    }

    #[test]
    fn test_identity_labels_override_template() {
        let template = PersistentVolumeClaim {
            metadata: ObjectMeta {
                labels: Some(BTreeMap::from([(
                    LABEL_DEVICE_SET_PVC_ID.to_string(),
                    "shared".to_string(),
                )])),
                ..Default::default()
            },
            ..Default::default()
        };

        let identity = ClaimIdentity::new("set1", 2, 0);
        let pvc = make_device_set_pvc(&identity, &template);
        assert_eq!(pvc.metadata.labels.unwrap(), identity.labels());
    }

    #[test]
    fn test_unnamed_template() {
        let pvc = make_device_set_pvc(
            &ClaimIdentity::new("set1", 0, 0),
            &PersistentVolumeClaim::default(),
        );
        assert_eq!(pvc.metadata.generate_name.as_deref(), Some("set1-0-0-"));
    }
}
