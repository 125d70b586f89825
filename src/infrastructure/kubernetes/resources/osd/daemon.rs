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
use crate::domain::osd::{OsdInfo, OsdObject};
use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::resources::osd::args::{ArgFlags, DaemonLaunch};
use crate::infrastructure::kubernetes::resources::pod::builders::{
    daemon_env_vars, env_var, node_name_env_var, pod_ip_env_var,
};
use crate::infrastructure::kubernetes::resources::pod::containers::{
    blkdevmapper_container, copy_binaries_container, privileged_security_context,
};
use crate::infrastructure::kubernetes::resources::pod::volumes::*;
use crate::infrastructure::kubernetes::resources::pod::{
    EnvironmentBuilder, LifecycleBuilder, PodBuilder,
};
use crate::shared::error::{OsdError, Result};
use crate::shared::quantity::memory_bytes;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStrategy};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

pub struct DaemonDeploymentBuilder<'a> {
    conf: &'a ClusterConf,
}

impl PodBuilder for DaemonDeploymentBuilder<'_> {
    fn app_name(&self) -> &'static str {
        APP_NAME
    }

    fn cluster_conf(&self) -> &ClusterConf {
        self.conf
    }
}

impl<'a> DaemonDeploymentBuilder<'a> {
    pub fn new(conf: &'a ClusterConf) -> Self {
        Self { conf }
    }

    pub fn deployment_name(osd_id: u32) -> String {
        format!("{}{}", OSD_DEPLOYMENT_NAME_PREFIX, osd_id)
    }

    fn osd_selector_labels(&self, info: &OsdInfo) -> BTreeMap<String, String> {
        let mut labels = self.get_selector_labels();
        labels.insert(LABEL_OSD_ID.to_string(), info.id.to_string());
        labels
    }

    pub fn build(&self, osd: &OsdObject, info: &OsdInfo) -> Result<Deployment> {
        let name = Self::deployment_name(info.id);

        let mut volumes = support_volumes(&self.conf.data_dir_host_path, &self.conf.namespace);
        let mut volume_mounts = ceph_volume_mounts();
        let mut config_mounts = rook_volume_mounts();
        let mut storage_volumes = 0;

        let data_dir = if info.is_directory {
            // data_path includes the osd subdirectory, the parent is what lives on the host
            let parent = Path::new(&info.data_path)
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .filter(|p| !p.is_empty());

            match parent {
                Some(parent) if parent == DATA_DIR => {
                    storage_volumes += 1;
                    parent
                }
                Some(parent) => {
                    let volume_name = path_to_volume_name(&parent);
                    volumes.push(host_path_volume(&volume_name, &parent));
                    config_mounts.push(mount(&volume_name, &parent));
                    volume_mounts.push(mount(&volume_name, &parent));
                    storage_volumes += 1;
                    parent
                }
                None => DATA_DIR.to_string(),
            }
        } else {
            volumes.push(host_path_volume(VOLUME_NAME_DEVICES, HOST_DEV_PATH));
            volume_mounts.push(mount(VOLUME_NAME_DEVICES, HOST_DEV_PATH));
            storage_volumes += 1;
            DATA_DIR.to_string()
        };

        if let Some(pvc) = &osd.pvc {
            volumes.extend(pvc_volumes(&osd.name, pvc));
            volume_mounts.push(bridge_mount(&pvc.claim_name));
            storage_volumes += 2;
        }

        if storage_volumes == 0 {
            return Err(OsdError::empty_volumes(name));
        }

        let (memory_limit, _) = memory_bytes(&osd.resources)?;
        let flags = ArgFlags {
            version: self.conf.ceph.version,
            host_network: self.conf.host_network,
            memory_limit,
        };
        let launch = DaemonLaunch::select(info);
        debug!("osd {} launches as {:?}", info.id, launch);

        volumes.push(binaries_volume());
        volume_mounts.push(binaries_mount());

        if launch.needs_udev() {
            volumes.push(host_path_volume(VOLUME_NAME_RUN_UDEV, HOST_UDEV_PATH));
            volume_mounts.push(mount(VOLUME_NAME_RUN_UDEV, HOST_UDEV_PATH));
        }

        let osd_id = info.id.to_string();
        let mut env = vec![
            node_name_env_var(&osd.name),
            pod_ip_env_var(ENV_PRIVATE_IP),
            pod_ip_env_var(ENV_PUBLIC_IP),
            env_var(ENV_TINI_SUBREAPER, ""),
        ];
        env.extend(daemon_env_vars(&self.conf.ceph.image));
        env.push(env_var(ENV_OSD_UUID, info.uuid.clone()));
        env.push(env_var(ENV_OSD_ID, osd_id.clone()));
        env.push(env_var(ENV_OSD_STORE_TYPE, info.store_type().as_str()));
        if osd.is_pvc_backed() {
            env.push(env_var(ENV_PVC_BACKED_OSD, "true"));
        }

        let mut config_env = EnvironmentBuilder::new(
            osd.name.clone(),
            self.conf.cluster_id(),
            self.conf.namespace.clone(),
        )
        .with_data_dir(data_dir)
        .with_store_config(&osd.store_config)
        .with_location(&osd.location)
        .with_var(ENV_TINI_SUBREAPER, "")
        .with_var(ENV_OSD_ID, osd_id.clone())
        .with_var(ENV_CEPH_VERSION, self.conf.ceph.version.formatted());
        if !info.is_directory {
            config_env = config_env.with_var(ENV_IS_DEVICE, "true");
        }

        let security_context = privileged_security_context();

        let mut init_containers = vec![
            Container {
                name: CONTAINER_NAME_CONFIG_INIT.to_string(),
                image: Some(self.conf.rook_image.clone()),
                args: Some(vec![
                    "ceph".to_string(),
                    "osd".to_string(),
                    "init".to_string(),
                ]),
                env: Some(config_env.build()),
                volume_mounts: Some(config_mounts),
                security_context: Some(security_context.clone()),
                ..Default::default()
            },
            copy_binaries_container(&self.conf.rook_image),
        ];
        if let Some(claim) = osd.claim_name() {
            init_containers.push(blkdevmapper_container(&self.conf.ceph.image, claim));
        }

        let daemon = Container {
            name: CONTAINER_NAME_OSD.to_string(),
            image: Some(self.conf.ceph.image.clone()),
            command: Some(launch.command()),
            args: Some(launch.args(info, &flags)),
            env: Some(env),
            volume_mounts: Some(volume_mounts),
            resources: Some(osd.resources.clone()),
            security_context: Some(security_context),
            lifecycle: LifecycleBuilder::build_ownership_fix(&info.data_path),
            ..Default::default()
        };

        let mut spec = PodSpec {
            init_containers: Some(init_containers),
            containers: vec![daemon],
            node_selector: Some(if osd.is_pvc_backed() {
                BTreeMap::new()
            } else {
                BTreeMap::from([(LABEL_HOSTNAME.to_string(), osd.name.clone())])
            }),
            restart_policy: Some(RESTART_POLICY_ALWAYS.to_string()),
            service_account_name: Some(SERVICE_ACCOUNT_NAME.to_string()),
            host_network: Some(self.conf.host_network),
            host_pid: Some(true),
            host_ipc: Some(osd.store_config.encrypted_device),
            dns_policy: Some(if self.conf.host_network {
                DNS_POLICY_CLUSTER_FIRST_WITH_HOST_NET.to_string()
            } else {
                DNS_POLICY_CLUSTER_FIRST.to_string()
            }),
            volumes: Some(volumes),
            ..Default::default()
        };
        osd.placement.apply_to_pod_spec(&mut spec);
        self.conf.placement.apply_to_pod_spec(&mut spec);

        let selector_labels = self.osd_selector_labels(info);
        let mut labels = self.get_labels();
        labels.extend(selector_labels.clone());
        if let Some(claim) = osd.claim_name() {
            labels.insert(LABEL_PVC.to_string(), claim.to_string());
        }

        Ok(Deployment {
            metadata: ObjectMeta {
                name: Some(name),
                namespace: Some(self.conf.namespace.clone()),
                labels: Some(labels),
                annotations: self.get_annotations(),
                owner_references: self.conf.owner_reference().map(|o| vec![o]),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(1),
                selector: LabelSelector {
                    match_labels: Some(selector_labels.clone()),
                    ..Default::default()
                },
                strategy: Some(DeploymentStrategy {
                    type_: Some(STRATEGY_TYPE_RECREATE.to_string()),
                    ..Default::default()
                }),
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        name: Some(APP_NAME.to_string()),
                        labels: Some(selector_labels),
                        annotations: self.get_annotations(),
                        ..Default::default()
                    }),
                    spec: Some(spec),
                },
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::osd::CephVersion;
    use crate::infrastructure::kubernetes::resources::pod::builders::find_env;

    fn pod_spec(d: &Deployment) -> &PodSpec {
        d.spec.as_ref().unwrap().template.spec.as_ref().unwrap()
    }

    fn osd_container(d: &Deployment) -> &Container {
        &pod_spec(d).containers[0]
    }

    fn device_info() -> OsdInfo {
        OsdInfo {
            id: 1,
            uuid: "uuid-1".to_string(),
            cluster: "ceph".to_string(),
            data_path: "/var/lib/rook/osd1".to_string(),
            config: "/var/lib/rook/osd1/rook-ceph.config".to_string(),
            keyring_path: "/var/lib/rook/osd1/keyring".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_device_osd() {
        let conf = ClusterConf::default();
        let osd = OsdObject::for_node("node1");
        let d = DaemonDeploymentBuilder::new(&conf)
            .build(&osd, &device_info())
            .unwrap();

        assert_eq!(d.metadata.name.as_deref(), Some("rook-ceph-osd-1"));
        let spec = d.spec.as_ref().unwrap();
        assert_eq!(spec.replicas, Some(1));
        assert_eq!(
            spec.strategy.as_ref().unwrap().type_.as_deref(),
            Some(STRATEGY_TYPE_RECREATE)
        );
        let selector = spec.selector.match_labels.as_ref().unwrap();
        assert_eq!(selector[LABEL_OSD_ID], "1");
        assert!(!selector.contains_key(LABEL_ROOK_VERSION));

        let pod = pod_spec(&d);
        assert_eq!(pod.host_pid, Some(true));
        assert_eq!(pod.dns_policy.as_deref(), Some(DNS_POLICY_CLUSTER_FIRST));
        let volumes = pod.volumes.as_ref().unwrap();
        assert!(volumes.iter().any(|v| v.name == VOLUME_NAME_DEVICES));
        assert!(volumes.iter().any(|v| v.name == VOLUME_NAME_ROOK_BINARIES));

        let init = pod.init_containers.as_ref().unwrap();
        assert_eq!(init[0].name, CONTAINER_NAME_CONFIG_INIT);
        assert_eq!(init[1].name, CONTAINER_NAME_COPY_BINS);
        let config_env = init[0].env.as_ref().unwrap();
        assert_eq!(find_env(config_env, ENV_IS_DEVICE), Some("true"));
        assert_eq!(
            find_env(config_env, ENV_CEPH_VERSION),
            Some("ceph version 14.2.1")
        );

        let c = osd_container(&d);
        assert_eq!(c.command.as_ref().unwrap(), &vec!["ceph-osd".to_string()]);
        let env = c.env.as_ref().unwrap();
        assert_eq!(find_env(env, ENV_OSD_ID), Some("1"));
        assert_eq!(find_env(env, ENV_OSD_STORE_TYPE), Some("bluestore"));
        assert!(c.lifecycle.is_some());
    }

    #[test]
    fn test_directory_osd_outside_default_dir() {
        let conf = ClusterConf::default();
        let osd = OsdObject::for_node("node1");
        let info = OsdInfo {
            is_directory: true,
            data_path: "/mnt/osds/osd2".to_string(),
            ..device_info()
        };

        let d = DaemonDeploymentBuilder::new(&conf).build(&osd, &info).unwrap();
        let pod = pod_spec(&d);
        let volumes = pod.volumes.as_ref().unwrap();
        assert!(volumes.iter().any(|v| v.name == "mnt-osds"));
        assert!(volumes.iter().all(|v| v.name != VOLUME_NAME_DEVICES));

        let config_env = pod.init_containers.as_ref().unwrap()[0].env.as_ref().unwrap();
        assert_eq!(find_env(config_env, ENV_CONFIG_DIR), Some("/mnt/osds"));
        assert_eq!(find_env(config_env, ENV_IS_DEVICE), None);
    }

    #[test]
    fn test_directory_osd_in_default_dir_adds_no_volume() {
        let conf = ClusterConf::default();
        let osd = OsdObject::for_node("node1");
        let info = OsdInfo {
            is_directory: true,
            ..device_info()
        };

        let d = DaemonDeploymentBuilder::new(&conf).build(&osd, &info).unwrap();
        let volumes = pod_spec(&d).volumes.as_ref().unwrap();
        assert!(volumes.iter().all(|v| v.name != "var-lib-rook"));
    }

    #[test]
    fn test_directory_osd_without_data_path() {
        let conf = ClusterConf::default();
        let osd = OsdObject::for_node("node1");
        let info = OsdInfo {
            is_directory: true,
            data_path: String::new(),
            ..device_info()
        };

        let err = DaemonDeploymentBuilder::new(&conf)
            .build(&osd, &info)
            .unwrap_err();
        assert!(matches!(err, OsdError::EmptyVolumes { .. }));
    }

    #[test]
    fn test_ceph_volume_osd_mounts_udev() {
        let conf = ClusterConf {
            ceph: crate::domain::config::CephConf {
                version: CephVersion::new(14, 2, 2),
                ..Default::default()
            },
            ..Default::default()
        };
        let osd = OsdObject::for_node("node1");
        let info = OsdInfo {
            ceph_volume_initiated: true,
            ..device_info()
        };

        let d = DaemonDeploymentBuilder::new(&conf).build(&osd, &info).unwrap();
        let c = osd_container(&d);
        assert_eq!(c.command.as_ref().unwrap(), &vec!["/rook/tini".to_string()]);
        let args = c.args.as_ref().unwrap();
        assert!(args.contains(&"--ms-learn-addr-from-peer=false".to_string()));
        assert!(c
            .volume_mounts
            .as_ref()
            .unwrap()
            .iter()
            .any(|m| m.name == VOLUME_NAME_RUN_UDEV));
    }

    #[test]
    fn test_pvc_osd() {
        let conf = ClusterConf::default();
        let osd = OsdObject::for_claim("set1-0-0-abcde");

        let d = DaemonDeploymentBuilder::new(&conf)
            .build(&osd, &device_info())
            .unwrap();
        let pod = pod_spec(&d);
        assert!(pod.node_selector.as_ref().unwrap().is_empty());
        let init = pod.init_containers.as_ref().unwrap();
        assert_eq!(init.last().unwrap().name, CONTAINER_NAME_BLKDEVMAPPER);

        let c = osd_container(&d);
        assert_eq!(
            find_env(c.env.as_ref().unwrap(), ENV_PVC_BACKED_OSD),
            Some("true")
        );
        assert!(c
            .volume_mounts
            .as_ref()
            .unwrap()
            .iter()
            .any(|m| m.name == "set1-0-0-abcde-bridge" && m.mount_path == "/mnt"));
        assert_eq!(
            d.metadata.labels.as_ref().unwrap()[LABEL_PVC],
            "set1-0-0-abcde"
        );
    }
}
