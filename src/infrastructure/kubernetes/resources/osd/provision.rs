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

//! Provisioning job for one node or one claim
//!
//! Device selection is resolved in a fixed order: explicit devices, then a
//! device filter, then "use all devices". A metadata device, directories and
//! a bound claim are added independently of that choice.

use crate::domain::config::ClusterConf;
use crate::domain::osd::{Directory, OsdObject};
use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::resources::osd::truncate_node_name;
use crate::infrastructure::kubernetes::resources::pod::builders::env::env_var;
use crate::infrastructure::kubernetes::resources::pod::containers::{
    blkdevmapper_container, copy_binaries_container,
};
use crate::infrastructure::kubernetes::resources::pod::volumes::*;
use crate::infrastructure::kubernetes::resources::pod::{EnvironmentBuilder, PodBuilder};
use crate::shared::error::{OsdError, Result};
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, PodSpec, PodTemplateSpec, SecurityContext, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub struct ProvisionJobBuilder<'a> {
    conf: &'a ClusterConf,
}

impl PodBuilder for ProvisionJobBuilder<'_> {
    fn app_name(&self) -> &'static str {
        PREPARE_APP_NAME
    }

    fn cluster_conf(&self) -> &ClusterConf {
        self.conf
    }
}

/// Storage wiring derived from a descriptor before any pod object is assembled.
#[derive(Debug, Default)]
struct StoragePlan {
    env: Vec<EnvVar>,
    volumes: Vec<Volume>,
    mounts: Vec<VolumeMount>,
    device_mount_needed: bool,
    storage_volumes: usize,
}

impl<'a> ProvisionJobBuilder<'a> {
    pub fn new(conf: &'a ClusterConf) -> Self {
        Self { conf }
    }

    pub fn job_name(node_name: &str) -> String {
        truncate_node_name(PREPARE_JOB_NAME_PREFIX, node_name)
    }

    pub fn build(&self, osd: &OsdObject) -> Result<Job> {
        let template = self.build_pod_template(osd)?;

        let mut labels = self.get_labels();
        if let Some(claim) = osd.claim_name() {
            labels.insert(LABEL_PVC.to_string(), claim.to_string());
        }

        Ok(Job {
            metadata: ObjectMeta {
                name: Some(Self::job_name(&osd.name)),
                namespace: Some(self.conf.namespace.clone()),
                labels: Some(labels),
                annotations: self.get_annotations(),
                owner_references: self.conf.owner_reference().map(|o| vec![o]),
                ..Default::default()
            },
            spec: Some(JobSpec {
                template,
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn build_pod_template(&self, osd: &OsdObject) -> Result<PodTemplateSpec> {
        let plan = self.plan_storage(osd);
        if plan.storage_volumes == 0 {
            return Err(OsdError::empty_volumes(Self::job_name(&osd.name)));
        }

        let mut volumes = support_volumes(&self.conf.data_dir_host_path, &self.conf.namespace);
        volumes.push(binaries_volume());
        volumes.extend(plan.volumes.iter().cloned());

        let mut init_containers = vec![copy_binaries_container(&self.conf.rook_image)];
        if let Some(claim) = osd.claim_name() {
            init_containers.push(blkdevmapper_container(&self.conf.ceph.image, claim));
        }

        let privileged = plan.device_mount_needed
            || self.conf.hostpath_requires_privileged
            || osd.is_pvc_backed();

        let mut spec = PodSpec {
            service_account_name: Some(SERVICE_ACCOUNT_NAME.to_string()),
            init_containers: Some(init_containers),
            containers: vec![self.build_provision_container(osd, plan, privileged)],
            restart_policy: Some(RESTART_POLICY_ON_FAILURE.to_string()),
            volumes: Some(volumes),
            host_network: Some(self.conf.host_network),
            host_ipc: Some(osd.store_config.encrypted_device),
            dns_policy: if self.conf.host_network {
                Some(DNS_POLICY_CLUSTER_FIRST_WITH_HOST_NET.to_string())
            } else {
                None
            },
            node_selector: Some(node_selector(osd)),
            ..Default::default()
        };

        osd.placement.apply_to_pod_spec(&mut spec);
        if !osd.is_pvc_backed() {
            self.conf.placement.apply_to_pod_spec(&mut spec);
        }

        Ok(PodTemplateSpec {
            metadata: Some(ObjectMeta {
                name: Some(APP_NAME.to_string()),
                labels: Some(self.get_selector_labels()),
                annotations: self.get_annotations(),
                ..Default::default()
            }),
            spec: Some(spec),
        })
    }

    fn plan_storage(&self, osd: &OsdObject) -> StoragePlan {
        let mut plan = StoragePlan::default();
        let mut data_devices = Vec::new();

        if !osd.devices.is_empty() {
            for device in &osd.devices {
                let count = device
                    .config
                    .get(OSDS_PER_DEVICE_KEY)
                    .map(String::as_str)
                    .unwrap_or("1");
                if device.config.contains_key(OSDS_PER_DEVICE_KEY) {
                    info!(
                        "{} osds requested on device {} (node {})",
                        count, device.name, osd.name
                    );
                }

                let mut entry = format!("{}:{}", device.name, count);
                if let Some(md) = device.config.get(METADATA_DEVICE_KEY) {
                    info!(
                        "osd {} requested with metadataDevice {} (node {})",
                        device.name, md, osd.name
                    );
                    entry.push(':');
                    entry.push_str(md);
                }
                data_devices.push(entry);
            }
            plan.device_mount_needed = true;
        } else if !osd.selection.device_filter.is_empty() {
            plan.env
                .push(env_var(ENV_DATA_DEVICE_FILTER, osd.selection.device_filter.clone()));
            plan.device_mount_needed = true;
        } else if osd.selection.use_all_devices() {
            plan.env.push(env_var(ENV_DATA_DEVICE_FILTER, DEVICE_FILTER_ALL));
            plan.device_mount_needed = true;
        }

        if !osd.metadata_device.is_empty() {
            plan.env
                .push(env_var(ENV_METADATA_DEVICE, osd.metadata_device.clone()));
            plan.device_mount_needed = true;
        }

        if plan.device_mount_needed {
            plan.volumes.extend(device_volumes());
            plan.mounts.extend(device_mounts());
            plan.storage_volumes += 2;
        }

        if let Some(pvc) = &osd.pvc {
            plan.volumes.extend(pvc_volumes(&osd.name, pvc));
            plan.mounts.push(bridge_mount(&pvc.claim_name));
            plan.storage_volumes += 2;
            data_devices.push(format!("{}/{}", PVC_BRIDGE_MOUNT_PATH, pvc.claim_name));
        }

        if !data_devices.is_empty() {
            plan.env.push(env_var(ENV_DATA_DEVICES, data_devices.join(",")));
        }
        if osd.is_pvc_backed() {
            plan.env.push(env_var(ENV_PVC_BACKED_OSD, "true"));
        }

        let directories = unique_directories(&osd.selection.directories);
        for dir in &directories {
            plan.storage_volumes += 1;
            // the default data dir is already mounted through the support volumes
            if dir.path == DATA_DIR {
                continue;
            }
            let name = unique_volume_name(&plan.volumes, &dir.path);
            plan.volumes.push(host_path_volume(&name, &dir.path));
            plan.mounts.push(mount(&name, &dir.path));
        }

        if !directories.is_empty() && !is_removing_node(&osd.selection.device_filter) {
            let paths: Vec<&str> = directories.iter().map(|d| d.path.as_str()).collect();
            plan.env.push(env_var(ENV_DATA_DIRECTORIES, paths.join(",")));
        }

        plan
    }

    fn build_provision_container(
        &self,
        osd: &OsdObject,
        plan: StoragePlan,
        privileged: bool,
    ) -> Container {
        let mut env = EnvironmentBuilder::new(
            osd.name.clone(),
            self.conf.cluster_id(),
            self.conf.namespace.clone(),
        )
        .with_data_dir(DATA_DIR)
        .with_store_config(&osd.store_config)
        .with_location(&osd.location)
        .build();
        env.extend(plan.env);

        let mut mounts = ceph_volume_mounts();
        mounts.push(binaries_mount());
        mounts.extend(plan.mounts);

        Container {
            name: CONTAINER_NAME_PROVISION.to_string(),
            image: Some(self.conf.ceph.image.clone()),
            command: Some(vec![format!("{}/{}", ROOK_BINARIES_MOUNT_PATH, TINI_BINARY)]),
            args: Some(vec![
                "--".to_string(),
                format!("{}/{}", ROOK_BINARIES_MOUNT_PATH, ROOK_BINARY),
                "ceph".to_string(),
                "osd".to_string(),
                "provision".to_string(),
            ]),
            env: Some(env),
            volume_mounts: Some(mounts),
            resources: Some(osd.resources.clone()),
            security_context: Some(SecurityContext {
                privileged: Some(privileged),
                run_as_user: Some(0),
                run_as_non_root: Some(false),
                read_only_root_filesystem: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// A device filter of `none` marks a node whose OSDs are being removed.
pub fn is_removing_node(device_filter: &str) -> bool {
    device_filter == DEVICE_FILTER_NONE
}

/// Dedupes directories, ignoring trailing slashes.
fn unique_directories(dirs: &[Directory]) -> Vec<Directory> {
    let mut unique: Vec<Directory> = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let path = match dir.path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        if !unique.iter().any(|d| d.path == path) {
            unique.push(Directory::new(path));
        }
    }
    unique
}

/// Distinct paths can flatten to the same name (`/mnt/a-b`, `/mnt-a/b`).
fn unique_volume_name(volumes: &[Volume], path: &str) -> String {
    let base = path_to_volume_name(path);
    let taken = |name: &str| volumes.iter().any(|v| v.name == name);
    if !taken(&base) {
        return base;
    }

    let mut suffix = 1;
    while taken(&format!("{}-{}", base, suffix)) {
        suffix += 1;
    }
    let name = format!("{}-{}", base, suffix);
    warn!("volume name {} already used, directory {} mounted as {}", base, path, name);
    name
}

fn node_selector(osd: &OsdObject) -> BTreeMap<String, String> {
    if osd.is_pvc_backed() {
        BTreeMap::new()
    } else {
        BTreeMap::from([(LABEL_HOSTNAME.to_string(), osd.name.clone())])
    }
}

/// Directory list a provision container was started with.
pub fn directories_from_container(container: &Container) -> Vec<Directory> {
    let value = container
        .env
        .as_deref()
        .unwrap_or_default()
        .iter()
        .rev()
        .find(|e| e.name == ENV_DATA_DIRECTORIES)
        .and_then(|e| e.value.clone())
        .unwrap_or_default();

    value
        .split(',')
        .filter(|p| !p.is_empty())
        .map(Directory::new)
        .collect()
}

/// Store settings a provision container was started with, keyed like the cluster config.
pub fn store_config_from_container(container: &Container) -> BTreeMap<String, String> {
    use crate::domain::osd::store::{
        DATABASE_SIZE_MB_KEY, JOURNAL_SIZE_MB_KEY, STORE_TYPE_KEY, WAL_SIZE_MB_KEY,
    };

    let mut config = BTreeMap::new();
    for env in container.env.as_deref().unwrap_or_default() {
        let key = match env.name.as_str() {
            ENV_OSD_STORE => STORE_TYPE_KEY,
            ENV_OSD_DATABASE_SIZE => DATABASE_SIZE_MB_KEY,
            ENV_OSD_WAL_SIZE => WAL_SIZE_MB_KEY,
            ENV_OSD_JOURNAL_SIZE => JOURNAL_SIZE_MB_KEY,
            ENV_METADATA_DEVICE => METADATA_DEVICE_KEY,
            _ => continue,
        };
        config.insert(key.to_string(), env.value.clone().unwrap_or_default());
    }
    config
}

/// The `provision` container of a job, if present.
pub fn provision_container(job: &Job) -> Option<&Container> {
    job.spec
        .as_ref()
        .and_then(|s| s.template.spec.as_ref())
        .and_then(|s| {
            s.containers
                .iter()
                .find(|c| c.name == CONTAINER_NAME_PROVISION)
        })
}
