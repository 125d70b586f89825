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

use crate::domain::cluster::allocator::{ClaimStore, VolumeClaimAllocator};
use crate::domain::cluster::validator::OsdClusterValidator;
use crate::domain::config::ClusterConf;
use crate::domain::osd::{
    ClaimIdentity, OrchestrationStatus, OsdObject, StorageClassDeviceSet, StoreConfig,
    VolumeSource,
};
use crate::infrastructure::constants::{
    APP_NAME, LOCATION_KEY, METADATA_DEVICE_KEY, OSD_POD_MINIMUM_MEMORY_MB,
};
use crate::infrastructure::kubernetes::client::OsdKubeClient;
use crate::infrastructure::kubernetes::resources::osd::{
    directories_from_container, provision_container, store_config_from_container,
};
use crate::infrastructure::kubernetes::resources::{DaemonDeploymentBuilder, ProvisionJobBuilder};
use crate::shared::error::{OsdError, Result};
use crate::shared::quantity::memory_bytes;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimVolumeSource, ResourceRequirements,
};
use tracing::{error, info, warn};

const MEGABYTE: u64 = 1024 * 1024;

/// Outcome of a pass over all workers. One worker failing never stops the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvisionReport {
    pub successes: Vec<String>,
    pub errors: Vec<String>,
}

impl ProvisionReport {
    pub fn success(&mut self, worker: impl Into<String>) {
        self.successes.push(worker.into());
    }

    pub fn failure(&mut self, worker: &str, err: impl std::fmt::Display) {
        error!("{}: {}", worker, err);
        self.errors.push(format!("{}: {}", worker, err));
    }

    pub fn merge(&mut self, other: ProvisionReport) {
        self.successes.extend(other.successes);
        self.errors.extend(other.errors);
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Claims found for one device-set slot. More than one entry means the slot is ambiguous.
#[derive(Debug, Clone)]
pub struct DeviceSetClaims {
    pub identity: ClaimIdentity,
    pub claims: Vec<PersistentVolumeClaim>,
}

/// Refuses memory settings an OSD cannot run with. Unset limits and requests are accepted.
pub fn check_pod_memory(resources: &ResourceRequirements, min_mb: u64) -> Result<()> {
    let (limit, request) = memory_bytes(resources)?;
    if limit == 0 && request == 0 {
        return Ok(());
    }

    if limit > 0 && limit < min_mb * MEGABYTE {
        return Err(OsdError::InsufficientMemory {
            daemon: APP_NAME.to_string(),
            reason: format!(
                "memory limit {}MB is below the minimum of {}MB",
                limit / MEGABYTE,
                min_mb
            ),
        });
    }

    if limit > 0 && request > limit {
        return Err(OsdError::InsufficientMemory {
            daemon: APP_NAME.to_string(),
            reason: format!(
                "memory request {}MB exceeds the limit of {}MB",
                request / MEGABYTE,
                limit / MEGABYTE
            ),
        });
    }

    Ok(())
}

fn volume_source(set: &StorageClassDeviceSet, claim_name: String) -> VolumeSource {
    VolumeSource {
        name: set.name.clone(),
        resources: set.resources.clone(),
        placement: set.placement.clone(),
        config: set.config.clone(),
        claim: PersistentVolumeClaimVolumeSource {
            claim_name,
            read_only: Some(false),
        },
    }
}

/// Volume sources for offline rendering. The claim identity stands in for the
/// name the API server would generate.
pub fn planned_volume_sources(conf: &ClusterConf) -> Vec<VolumeSource> {
    let mut sources = Vec::new();
    for set in &conf.storage.storage_class_device_sets {
        if set.volume_claim_templates.is_empty() {
            warn!("storageClassDeviceSet {} has no volume claim template", set.name);
            continue;
        }
        for set_index in 0..set.count {
            let identity = ClaimIdentity::new(&set.name, set_index, 0);
            sources.push(volume_source(set, identity.id()));
        }
    }
    sources
}

/// One descriptor per configured node plus one per prepared claim.
pub fn osd_objects(conf: &ClusterConf, sources: &[VolumeSource]) -> Result<Vec<OsdObject>> {
    let mut objects = Vec::with_capacity(conf.storage.nodes.len() + sources.len());
    for node in &conf.storage.nodes {
        objects.push(conf.storage.resolve_node(node, &conf.resources)?);
    }

    for source in sources {
        let mut config = conf.storage.config.clone();
        config.extend(source.config.clone());

        let mut osd = OsdObject::for_claim(source.claim.claim_name.clone());
        osd.metadata_device = config.get(METADATA_DEVICE_KEY).cloned().unwrap_or_default();
        osd.location = config.get(LOCATION_KEY).cloned().unwrap_or_default();
        osd.store_config = StoreConfig::from_map(&config)?;
        osd.resources = source.resources.clone();
        osd.placement = source.placement.clone();
        objects.push(osd);
    }

    Ok(objects)
}

pub struct OsdClusterDescriptor {
    client: Box<dyn OsdKubeClient>,
}

impl OsdClusterDescriptor {
    pub fn new(client: Box<dyn OsdKubeClient>) -> Self {
        Self { client }
    }

    /// Ensures a claim for every slot of every device set.
    pub async fn prepare_device_sets(
        &self,
        conf: &ClusterConf,
    ) -> (Vec<VolumeSource>, ProvisionReport) {
        let allocator = VolumeClaimAllocator::new(self.client.as_ref());
        let mut sources = Vec::new();
        let mut report = ProvisionReport::default();

        for set in &conf.storage.storage_class_device_sets {
            if let Err(e) = check_pod_memory(&set.resources, OSD_POD_MINIMUM_MEMORY_MB) {
                report.failure(&set.name, e);
                continue;
            }

            for set_index in 0..set.count {
                match allocator.ensure_claim(set, set_index).await {
                    Ok(claim) => {
                        let claim_name = claim.metadata.name.unwrap_or_default();
                        info!(
                            "storageClassDeviceSet {} set {} is backed by pvc {}",
                            set.name, set_index, claim_name
                        );
                        sources.push(volume_source(set, claim_name));
                    }
                    Err(e) => {
                        report.failure(&ClaimIdentity::new(&set.name, set_index, 0).id(), e)
                    }
                }
            }
        }

        (sources, report)
    }

    /// Starts a provisioning job for every node and prepared claim.
    pub async fn provision(&self, conf: &ClusterConf) -> Result<ProvisionReport> {
        OsdClusterValidator::validate_conf(conf)?;

        let (sources, mut report) = self.prepare_device_sets(conf).await;
        let objects = osd_objects(conf, &sources)?;
        let builder = ProvisionJobBuilder::new(conf);

        for osd in &objects {
            let job_name = ProvisionJobBuilder::job_name(&osd.name);
            let job = match builder.build(osd) {
                Ok(job) => job,
                Err(e) => {
                    report.failure(&osd.name, e);
                    continue;
                }
            };

            self.log_drift(&job_name, &job).await;
            match self.client.apply_job(&job).await {
                Ok(()) => {
                    info!("osd provision job started: {}", job_name);
                    report.success(job_name);
                }
                Err(e) => report.failure(&osd.name, e),
            }
        }

        Ok(report)
    }

    /// Starts one daemon per OSD that finished provisioning.
    pub async fn start_daemons(&self, conf: &ClusterConf) -> Result<ProvisionReport> {
        OsdClusterValidator::validate_conf(conf)?;

        let mut report = ProvisionReport::default();
        let sources = self.existing_volume_sources(conf, &mut report).await;
        let objects = osd_objects(conf, &sources)?;
        let builder = DaemonDeploymentBuilder::new(conf);

        for osd in &objects {
            let status = match self.read_status(conf, &osd.name).await {
                Ok(status) => status,
                Err(e) => {
                    report.failure(&osd.name, e);
                    continue;
                }
            };

            if status.is_failed() {
                report.failure(&osd.name, format!("provisioning failed: {}", status.message));
                continue;
            }
            if !status.is_completed() {
                report.failure(
                    &osd.name,
                    format!("provisioning is not complete (status '{}')", status.status),
                );
                continue;
            }

            if status.osds.is_empty() {
                warn!("no osds were provisioned on {}", osd.name);
            }

            for info in &status.osds {
                let name = DaemonDeploymentBuilder::deployment_name(info.id);
                let result = match builder.build(osd, info) {
                    Ok(deployment) => self.client.apply_deployment(&deployment).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(()) => {
                        info!("started osd.{} on {}", info.id, osd.name);
                        report.success(name);
                    }
                    Err(e) => report.failure(&name, e),
                }
            }
        }

        Ok(report)
    }

    /// Claims of every device-set slot, without creating any.
    pub async fn list_claims(&self, conf: &ClusterConf) -> Result<Vec<DeviceSetClaims>> {
        let mut found = Vec::new();
        for set in &conf.storage.storage_class_device_sets {
            for set_index in 0..set.count {
                let identity = ClaimIdentity::new(&set.name, set_index, 0);
                let claims = self
                    .client
                    .list_claims(&identity.selector())
                    .await
                    .map_err(|e| OsdError::claim_store(&set.name, set_index, e))?;
                found.push(DeviceSetClaims { identity, claims });
            }
        }
        Ok(found)
    }

    async fn existing_volume_sources(
        &self,
        conf: &ClusterConf,
        report: &mut ProvisionReport,
    ) -> Vec<VolumeSource> {
        let claims = match self.list_claims(conf).await {
            Ok(claims) => claims,
            Err(e) => {
                report.failure("storageClassDeviceSets", e);
                return Vec::new();
            }
        };

        let mut sources = Vec::new();
        for slot in claims {
            let set = conf
                .storage
                .storage_class_device_sets
                .iter()
                .find(|s| s.name == slot.identity.device_set);
            match (set, slot.claims.as_slice()) {
                (Some(set), [claim]) => sources.push(volume_source(
                    set,
                    claim.metadata.name.clone().unwrap_or_default(),
                )),
                (_, []) => warn!("no pvc found for {}", slot.identity),
                (_, claims) if claims.len() > 1 => report.failure(
                    &slot.identity.id(),
                    OsdError::AmbiguousClaims {
                        selector: slot.identity.selector(),
                        claims: claims
                            .iter()
                            .map(|c| c.metadata.name.clone().unwrap_or_default())
                            .collect(),
                    },
                ),
                _ => {}
            }
        }
        sources
    }

    /// Reports directory and store setting changes against the job being replaced.
    async fn log_drift(&self, job_name: &str, job: &Job) {
        let previous = match self.client.get_job(job_name).await {
            Ok(previous) => previous,
            Err(_) => return,
        };
        let (Some(old), Some(new)) = (provision_container(&previous), provision_container(job))
        else {
            return;
        };

        let old_dirs = directories_from_container(old);
        let new_dirs = directories_from_container(new);
        if old_dirs != new_dirs {
            info!(
                "{}: data directories change from {:?} to {:?}",
                job_name,
                old_dirs.iter().map(|d| d.path.as_str()).collect::<Vec<_>>(),
                new_dirs.iter().map(|d| d.path.as_str()).collect::<Vec<_>>()
            );
        }
        if store_config_from_container(old) != store_config_from_container(new) {
            warn!(
                "{}: store settings changed, existing osds keep their original store",
                job_name
            );
        }
    }

    async fn read_status(&self, conf: &ClusterConf, worker: &str) -> Result<OrchestrationStatus> {
        let cm = self
            .client
            .get_configmap(&conf.status_configmap_name(worker))
            .await?;
        OrchestrationStatus::from_configmap(&cm)
    }
}
