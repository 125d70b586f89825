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

use crate::domain::config::ClusterConf;
use crate::domain::osd::StoreConfig;
use crate::infrastructure::constants::{DEVICE_FILTER_ALL, DEVICE_FILTER_NONE};
use crate::shared::error::{OsdError, Result};
use k8s_openapi::api::storage::v1::StorageClass;
use kube::api::Api;
use kube::Client;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};

const STORAGE_CLASS_ANNOTATION: &str = "volume.beta.kubernetes.io/storage-class";

pub struct OsdClusterValidator {
    client: Client,
}

impl OsdClusterValidator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Offline checks followed by a lookup of every referenced storage class.
    pub async fn validate_deployment(&self, conf: &ClusterConf) -> Result<()> {
        Self::validate_conf(conf)?;
        for storage_class in storage_class_names(conf) {
            self.validate_storage_class(&storage_class).await?;
        }
        Ok(())
    }

    pub fn validate_conf(conf: &ClusterConf) -> Result<()> {
        if conf.namespace.trim().is_empty() {
            return Err(OsdError::ValidationError(
                "namespace must not be empty".to_string(),
            ));
        }
        if conf.ceph.version.major == 0 {
            return Err(OsdError::ValidationError(format!(
                "ceph version {} is not a release version",
                conf.ceph.version
            )));
        }

        validate_device_filter(&conf.storage.device_filter)?;
        validate_store_config("storage", &conf.storage.config)?;
        for node in &conf.storage.nodes {
            if node.name.is_empty() {
                return Err(OsdError::ValidationError(
                    "storage node without a name".to_string(),
                ));
            }
            if let Some(filter) = &node.device_filter {
                validate_device_filter(filter)?;
            }
            let mut config = conf.storage.config.clone();
            config.extend(node.config.clone());
            validate_store_config(&node.name, &config)?;
        }

        let mut seen = HashSet::new();
        for set in &conf.storage.storage_class_device_sets {
            if set.name.is_empty() {
                return Err(OsdError::ValidationError(
                    "storageClassDeviceSet without a name".to_string(),
                ));
            }
            if !seen.insert(set.name.as_str()) {
                return Err(OsdError::ValidationError(format!(
                    "storageClassDeviceSet {} is defined more than once",
                    set.name
                )));
            }
            if set.volume_claim_templates.is_empty() {
                return Err(OsdError::NoClaimTemplate(set.name.clone()));
            }
            validate_store_config(&set.name, &set.config)?;
        }

        Ok(())
    }

    async fn validate_storage_class(&self, storage_class_name: &str) -> Result<()> {
        let api: Api<StorageClass> = Api::all(self.client.clone());

        match api.get(storage_class_name).await {
            Ok(_) => Ok(()),
            Err(kube::error::Error::Api(ae)) if ae.code == 404 => {
                let available_classes = self.list_storage_classes().await.unwrap_or_default();
                Err(OsdError::ValidationError(format!(
                    "\n StorageClass not found\n\
                    \n  Requested: '{}'\n\
\n Available StorageClasses:\n{}\n\
\n Use one of the above StorageClasses in the volume claim template.",
                    storage_class_name,
                    if available_classes.is_empty() {
                        "  (none found)".to_string()
                    } else {
                        available_classes
                            .into_iter()
                            .map(|s| format!("  - {}", s))
                            .collect::<Vec<_>>()
                            .join("\n")
                    }
                )))
            }
            Err(e) => Err(OsdError::KubeError(format!(
                "Failed to check StorageClass '{}': {}",
                storage_class_name, e
            ))),
        }
    }

    async fn list_storage_classes(&self) -> Result<Vec<String>> {
        let api: Api<StorageClass> = Api::all(self.client.clone());

        match api.list(&Default::default()).await {
            Ok(list) => Ok(list
                .items
                .iter()
                .filter_map(|sc| sc.metadata.name.clone())
                .collect()),
            Err(e) => Err(OsdError::KubeError(format!(
                "Failed to list StorageClasses: {}",
                e
            ))),
        }
    }
}

/// Storage classes named by device-set claim templates, by spec field or legacy annotation.
pub fn storage_class_names(conf: &ClusterConf) -> BTreeSet<String> {
    conf.storage
        .storage_class_device_sets
        .iter()
        .flat_map(|set| set.volume_claim_templates.iter())
        .filter_map(|template| {
            template
                .spec
                .as_ref()
                .and_then(|s| s.storage_class_name.clone())
                .or_else(|| {
                    template
                        .metadata
                        .annotations
                        .as_ref()
                        .and_then(|a| a.get(STORAGE_CLASS_ANNOTATION).cloned())
                })
        })
        .filter(|name| !name.is_empty())
        .collect()
}

fn validate_device_filter(filter: &str) -> Result<()> {
    if filter.is_empty() || filter == DEVICE_FILTER_ALL || filter == DEVICE_FILTER_NONE {
        return Ok(());
    }
    Regex::new(filter).map(|_| ()).map_err(|e| {
        OsdError::ValidationError(format!("invalid device filter '{}': {}", filter, e))
    })
}

fn validate_store_config(scope: &str, config: &BTreeMap<String, String>) -> Result<()> {
    StoreConfig::from_map(config)
        .and_then(|store| store.store_kind())
        .map(|_| ())
        .map_err(|e| OsdError::ValidationError(format!("{}: {}", scope, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::NodeConf;
    use crate::domain::osd::StorageClassDeviceSet;
    use k8s_openapi::api::core::v1::{PersistentVolumeClaim, PersistentVolumeClaimSpec};

    fn device_set(name: &str, storage_class: Option<&str>) -> StorageClassDeviceSet {
        StorageClassDeviceSet {
            name: name.to_string(),
            count: 1,
            volume_claim_templates: vec![PersistentVolumeClaim {
                spec: Some(PersistentVolumeClaimSpec {
                    storage_class_name: storage_class.map(str::to_string),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_default_conf_is_valid() {
        assert!(OsdClusterValidator::validate_conf(&ClusterConf::default()).is_ok());
    }

    #[test]
    fn test_rejects_bad_device_filter_and_store() {
        let mut conf = ClusterConf::default();
        conf.storage.device_filter = "sd[".to_string();
        assert!(OsdClusterValidator::validate_conf(&conf).is_err());

        let mut conf = ClusterConf::default();
        conf.storage.nodes = vec![NodeConf {
            name: "node1".to_string(),
            config: BTreeMap::from([("storeType".to_string(), "zfs".to_string())]),
            ..Default::default()
        }];
        let err = OsdClusterValidator::validate_conf(&conf).unwrap_err();
        assert!(err.to_string().contains("node1"));
    }

    #[test]
    fn test_device_sets() {
        let mut conf = ClusterConf::default();
        conf.storage.storage_class_device_sets =
            vec![device_set("set1", Some("gp2")), device_set("set1", None)];
        assert!(OsdClusterValidator::validate_conf(&conf).is_err());

        conf.storage.storage_class_device_sets = vec![StorageClassDeviceSet {
            name: "bare".to_string(),
            ..Default::default()
        }];
        assert!(matches!(
            OsdClusterValidator::validate_conf(&conf),
            Err(OsdError::NoClaimTemplate(_))
        ));

        conf.storage.storage_class_device_sets = vec![
            device_set("set1", Some("gp2")),
            device_set("set2", Some("gp2")),
            device_set("set3", None),
        ];
        assert!(OsdClusterValidator::validate_conf(&conf).is_ok());
        assert_eq!(
            storage_class_names(&conf).into_iter().collect::<Vec<_>>(),
            vec!["gp2".to_string()]
        );
    }
}
