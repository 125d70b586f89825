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

//! Environment variable builder for OSD containers
//!
//! The provision container and the daemon's config-init container share one
//! base set: node identity, mon discovery, secrets and the store settings.
//! Optional store fields are only emitted when they carry a value.

use crate::domain::osd::StoreConfig;
use crate::infrastructure::constants::*;
use k8s_openapi::api::core::v1::{
    ConfigMapKeySelector, EnvVar, EnvVarSource, ObjectFieldSelector, ResourceFieldSelector,
    SecretKeySelector,
};

pub struct EnvironmentBuilder {
    node_name: String,
    cluster_id: String,
    namespace: String,
    data_dir: String,
    store_config: StoreConfig,
    location: String,
    custom_vars: Vec<EnvVar>,
}

impl EnvironmentBuilder {
    pub fn new(node_name: String, cluster_id: String, namespace: String) -> Self {
        Self {
            node_name,
            cluster_id,
            namespace,
            data_dir: DATA_DIR.to_string(),
            store_config: StoreConfig::default(),
            location: String::new(),
            custom_vars: Vec::new(),
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<String>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_store_config(mut self, store_config: &StoreConfig) -> Self {
        self.store_config = store_config.clone();
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.custom_vars.push(env_var(name, value));
        self
    }

    pub fn build(self) -> Vec<EnvVar> {
        let mut env_vars = Vec::new();
        env_vars.extend(self.build_base_env_vars());
        env_vars.extend(self.build_store_env_vars());
        env_vars.extend(self.custom_vars);
        env_vars
    }

    fn build_base_env_vars(&self) -> Vec<EnvVar> {
        vec![
            node_name_env_var(&self.node_name),
            env_var(ENV_CLUSTER_ID, self.cluster_id.clone()),
            pod_ip_env_var(ENV_PRIVATE_IP),
            pod_ip_env_var(ENV_PUBLIC_IP),
            env_var(ENV_CLUSTER_NAME, self.namespace.clone()),
            EnvVar {
                name: ENV_MON_ENDPOINTS.to_string(),
                value_from: Some(EnvVarSource {
                    config_map_key_ref: Some(ConfigMapKeySelector {
                        name: MON_ENDPOINTS_CONFIGMAP.to_string(),
                        key: MON_ENDPOINTS_KEY.to_string(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            secret_env_var(ENV_MON_SECRET, MON_SECRET_KEY),
            secret_env_var(ENV_ADMIN_SECRET, ADMIN_SECRET_KEY),
            env_var(ENV_CONFIG_DIR, self.data_dir.clone()),
            env_var(ENV_CONFIG_OVERRIDE, ROOK_CONFIG_OVERRIDE_FILE),
            secret_env_var(ENV_FSID, FSID_SECRET_KEY),
        ]
    }

    fn build_store_env_vars(&self) -> Vec<EnvVar> {
        let store = &self.store_config;
        let mut env_vars = Vec::new();

        if !store.store_type.is_empty() {
            env_vars.push(env_var(ENV_OSD_STORE, store.store_type.clone()));
        }
        if store.database_size_mb != 0 {
            env_vars.push(env_var(
                ENV_OSD_DATABASE_SIZE,
                store.database_size_mb.to_string(),
            ));
        }
        if store.wal_size_mb != 0 {
            env_vars.push(env_var(ENV_OSD_WAL_SIZE, store.wal_size_mb.to_string()));
        }
        if store.journal_size_mb != 0 {
            env_vars.push(env_var(
                ENV_OSD_JOURNAL_SIZE,
                store.journal_size_mb.to_string(),
            ));
        }
        if store.osds_per_device != 0 {
            env_vars.push(env_var(
                ENV_OSDS_PER_DEVICE,
                store.osds_per_device.to_string(),
            ));
        }
        if store.encrypted_device {
            env_vars.push(env_var(ENV_ENCRYPTED_DEVICE, "true"));
        }
        if !self.location.is_empty() {
            env_vars.push(env_var(ENV_LOCATION, self.location.clone()));
        }

        env_vars
    }
}

pub fn env_var(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.into()),
        ..Default::default()
    }
}

pub fn node_name_env_var(node_name: &str) -> EnvVar {
    env_var(ENV_NODE_NAME, node_name)
}

pub fn pod_ip_env_var(name: &str) -> EnvVar {
    field_env_var(name, "status.podIP")
}

fn field_env_var(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn resource_env_var(name: &str, resource: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            resource_field_ref: Some(ResourceFieldSelector {
                resource: resource.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn secret_env_var(name: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: MON_SECRET_NAME.to_string(),
                key: key.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Pod identity and resource fields every long-running Ceph daemon receives.
pub fn daemon_env_vars(image: &str) -> Vec<EnvVar> {
    vec![
        env_var("CONTAINER_IMAGE", image),
        field_env_var("POD_NAME", "metadata.name"),
        field_env_var("POD_NAMESPACE", "metadata.namespace"),
        field_env_var("NODE_NAME", "spec.nodeName"),
        resource_env_var("POD_MEMORY_LIMIT", "limits.memory"),
        resource_env_var("POD_MEMORY_REQUEST", "requests.memory"),
        resource_env_var("POD_CPU_LIMIT", "limits.cpu"),
        resource_env_var("POD_CPU_REQUEST", "requests.cpu"),
    ]
}

/// Looks up a plain-valued variable.
pub fn find_env<'a>(env: &'a [EnvVar], name: &str) -> Option<&'a str> {
    env.iter()
        .find(|e| e.name == name)
        .and_then(|e| e.value.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_store_fields_are_omitted() {
        let env = EnvironmentBuilder::new("node1".to_string(), "uid".to_string(), "ns".to_string())
            .build();

        assert_eq!(find_env(&env, ENV_NODE_NAME), Some("node1"));
        assert_eq!(find_env(&env, ENV_CLUSTER_ID), Some("uid"));
        assert_eq!(find_env(&env, ENV_CONFIG_DIR), Some(DATA_DIR));
        assert!(env.iter().all(|e| e.name != ENV_OSD_STORE));
        assert!(env.iter().all(|e| e.name != ENV_ENCRYPTED_DEVICE));
        assert!(env.iter().all(|e| e.name != ENV_LOCATION));
    }

    #[test]
    fn test_store_fields() {
        let store = StoreConfig {
            store_type: "bluestore".to_string(),
            database_size_mb: 1024,
            wal_size_mb: 0,
            osds_per_device: 2,
            encrypted_device: true,
            ..Default::default()
        };
        let env = EnvironmentBuilder::new("node1".to_string(), String::new(), "ns".to_string())
            .with_store_config(&store)
            .with_location("rack=r1")
            .with_var(ENV_OSD_ID, "7")
            .build();

        assert_eq!(find_env(&env, ENV_OSD_STORE), Some("bluestore"));
        assert_eq!(find_env(&env, ENV_OSD_DATABASE_SIZE), Some("1024"));
        assert_eq!(find_env(&env, ENV_OSD_WAL_SIZE), None);
        assert_eq!(find_env(&env, ENV_OSDS_PER_DEVICE), Some("2"));
        assert_eq!(find_env(&env, ENV_ENCRYPTED_DEVICE), Some("true"));
        assert_eq!(find_env(&env, ENV_LOCATION), Some("rack=r1"));
        assert_eq!(env.last().map(|e| e.name.as_str()), Some(ENV_OSD_ID));
    }

    #[test]
    fn test_secret_refs() {
        let env = EnvironmentBuilder::new("n".to_string(), String::new(), "ns".to_string()).build();
        let fsid = env.iter().find(|e| e.name == ENV_FSID).unwrap();
        let secret = fsid
            .value_from
            .as_ref()
            .and_then(|v| v.secret_key_ref.as_ref())
            .unwrap();
        assert_eq!(secret.name, MON_SECRET_NAME);
        assert_eq!(secret.key, FSID_SECRET_KEY);
    }
}
