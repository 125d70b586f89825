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

use async_trait::async_trait;
use ceph_osd_kube::domain::osd::{Device, OrchestrationStatus, OsdInfo, StorageClassDeviceSet};
use ceph_osd_kube::domain::config::NodeConf;
use ceph_osd_kube::infrastructure::constants::LABEL_DEVICE_SET_PVC_ID;
use ceph_osd_kube::{
    ClaimIdentity, ClaimStore, ClusterConf, OsdClusterDescriptor, OsdError, OsdKubeClient,
    Result, VolumeClaimAllocator,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct ClusterState {
    claims: Vec<PersistentVolumeClaim>,
    jobs: Vec<Job>,
    deployments: Vec<Deployment>,
    configmaps: Vec<ConfigMap>,
}

/// In-memory stand-in for the API server.
#[derive(Clone, Default)]
struct FakeCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl FakeCluster {
    fn add_claim(&self, name: &str, identity: &ClaimIdentity) {
        self.state.lock().unwrap().claims.push(PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(identity.labels()),
                ..Default::default()
            },
            ..Default::default()
        });
    }

    fn add_status(&self, node: &str, status: &OrchestrationStatus) {
        self.state.lock().unwrap().configmaps.push(ConfigMap {
            metadata: ObjectMeta {
                name: Some(format!("rook-ceph-osd-{}-status", node)),
                ..Default::default()
            },
            data: Some(BTreeMap::from([(
                "status".to_string(),
                serde_json::to_string(status).unwrap(),
            )])),
            ..Default::default()
        });
    }

    fn names<T>(items: &[T], name: impl Fn(&T) -> Option<String>) -> Vec<String> {
        items.iter().filter_map(name).collect()
    }
}

#[async_trait]
impl ClaimStore for FakeCluster {
    async fn list_claims(&self, selector: &str) -> Result<Vec<PersistentVolumeClaim>> {
        let (key, value) = selector.split_once('=').unwrap();
        Ok(self
            .state
            .lock()
            .unwrap()
            .claims
            .iter()
            .filter(|c| {
                c.metadata.labels.as_ref().and_then(|l| l.get(key)).map(String::as_str)
                    == Some(value)
            })
            .cloned()
            .collect())
    }

    async fn create_claim(&self, claim: &PersistentVolumeClaim) -> Result<PersistentVolumeClaim> {
        let mut state = self.state.lock().unwrap();
        let mut created = claim.clone();
        created.metadata.name = Some(format!(
            "{}{:05}",
            claim.metadata.generate_name.as_deref().unwrap_or_default(),
            state.claims.len()
        ));
        state.claims.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl OsdKubeClient for FakeCluster {
    async fn apply_job(&self, job: &Job) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.jobs.retain(|j| j.metadata.name != job.metadata.name);
        state.jobs.push(job.clone());
        Ok(())
    }

    async fn get_job(&self, name: &str) -> Result<Job> {
        self.state
            .lock()
            .unwrap()
            .jobs
            .iter()
            .find(|j| j.metadata.name.as_deref() == Some(name))
            .cloned()
            .ok_or_else(|| OsdError::not_found("Job", name, "rook-ceph"))
    }

    async fn apply_deployment(&self, deployment: &Deployment) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .deployments
            .retain(|d| d.metadata.name != deployment.metadata.name);
        state.deployments.push(deployment.clone());
        Ok(())
    }

    async fn get_configmap(&self, name: &str) -> Result<ConfigMap> {
        self.state
            .lock()
            .unwrap()
            .configmaps
            .iter()
            .find(|c| c.metadata.name.as_deref() == Some(name))
            .cloned()
            .ok_or_else(|| OsdError::not_found("ConfigMap", name, "rook-ceph"))
    }

}

fn device_set(name: &str, count: u32) -> StorageClassDeviceSet {
    StorageClassDeviceSet {
        name: name.to_string(),
        count,
        volume_claim_templates: vec![PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some("data".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn conf_with(nodes: Vec<NodeConf>, sets: Vec<StorageClassDeviceSet>) -> ClusterConf {
    let mut conf = ClusterConf::default();
    conf.storage.nodes = nodes;
    conf.storage.storage_class_device_sets = sets;
    conf
}

fn device_node(name: &str) -> NodeConf {
    NodeConf {
        name: name.to_string(),
        devices: vec![Device::new("sdb")],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_allocator_is_idempotent() {
    let cluster = FakeCluster::default();
    let allocator = VolumeClaimAllocator::new(&cluster);
    let set = device_set("set1", 1);

    let first = allocator.ensure_claim(&set, 0).await.unwrap();
    let second = allocator.ensure_claim(&set, 0).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.metadata.labels.as_ref().unwrap()[LABEL_DEVICE_SET_PVC_ID],
        "set1-0-0"
    );
    assert!(first
        .metadata
        .name
        .as_deref()
        .unwrap()
        .starts_with("set1-0-0-data-"));
    assert_eq!(cluster.state.lock().unwrap().claims.len(), 1);
}

#[tokio::test]
async fn test_allocator_fails_closed_on_duplicates() {
    let cluster = FakeCluster::default();
    let identity = ClaimIdentity::new("set1", 0, 0);
    cluster.add_claim("set1-0-0-aaaaa", &identity);
    cluster.add_claim("set1-0-0-bbbbb", &identity);

    let err = VolumeClaimAllocator::new(&cluster)
        .ensure_claim(&device_set("set1", 1), 0)
        .await
        .unwrap_err();
    assert!(err.is_ambiguous_claims());
    let msg = err.to_string();
    assert!(msg.contains("set1-0-0-aaaaa"));
    assert!(msg.contains("set1-0-0-bbbbb"));
    // nothing was created or removed
    assert_eq!(cluster.state.lock().unwrap().claims.len(), 2);
}

#[tokio::test]
async fn test_provision_continues_past_failures() {
    let cluster = FakeCluster::default();
    let identity = ClaimIdentity::new("set1", 1, 0);
    cluster.add_claim("dup-a", &identity);
    cluster.add_claim("dup-b", &identity);

    let bare = NodeConf {
        name: "bare".to_string(),
        ..Default::default()
    };
    let conf = conf_with(
        vec![device_node("node1"), bare],
        vec![device_set("set1", 2)],
    );

    let descriptor = OsdClusterDescriptor::new(Box::new(cluster.clone()));
    let report = descriptor.provision(&conf).await.unwrap();

    // set1-1-0 is ambiguous and node "bare" has no storage
    assert_eq!(report.errors.len(), 2, "{:?}", report.errors);
    assert!(report.errors.iter().any(|e| e.starts_with("set1-1-0")));
    assert!(report.errors.iter().any(|e| e.starts_with("bare")));

    let state = cluster.state.lock().unwrap();
    let jobs = FakeCluster::names(&state.jobs, |j| j.metadata.name.clone());
    assert_eq!(jobs.len(), 2);
    assert!(jobs.contains(&"rook-ceph-osd-prepare-node1".to_string()));
    assert!(jobs
        .iter()
        .any(|j| j.starts_with("rook-ceph-osd-prepare-set1-0-0-data-")));
}

#[tokio::test]
async fn test_device_set_below_memory_minimum_is_skipped() {
    let cluster = FakeCluster::default();
    let mut set = device_set("small", 1);
    set.resources.limits = Some(BTreeMap::from([(
        "memory".to_string(),
        Quantity("1Gi".to_string()),
    )]));
    let conf = conf_with(vec![], vec![set]);

    let descriptor = OsdClusterDescriptor::new(Box::new(cluster.clone()));
    let (sources, report) = descriptor.prepare_device_sets(&conf).await;
    assert!(sources.is_empty());
    assert_eq!(report.errors.len(), 1);
    assert!(cluster.state.lock().unwrap().claims.is_empty());
}

#[tokio::test]
async fn test_start_daemons_from_status() {
    let cluster = FakeCluster::default();
    cluster.add_status(
        "node1",
        &OrchestrationStatus {
            osds: vec![
                OsdInfo {
                    id: 0,
                    uuid: "u0".to_string(),
                    cluster: "ceph".to_string(),
                    data_path: "/var/lib/rook/osd0".to_string(),
                    ..Default::default()
                },
                OsdInfo {
                    id: 1,
                    uuid: "u1".to_string(),
                    cluster: "ceph".to_string(),
                    data_path: "/var/lib/rook/osd1".to_string(),
                    ..Default::default()
                },
            ],
            status: "completed".to_string(),
            ..Default::default()
        },
    );
    cluster.add_status(
        "node2",
        &OrchestrationStatus {
            status: "orchestrating".to_string(),
            ..Default::default()
        },
    );

    let conf = conf_with(
        vec![device_node("node1"), device_node("node2"), device_node("node3")],
        vec![],
    );
    let descriptor = OsdClusterDescriptor::new(Box::new(cluster.clone()));
    let report = descriptor.start_daemons(&conf).await.unwrap();

    assert_eq!(
        report.successes,
        vec!["rook-ceph-osd-0".to_string(), "rook-ceph-osd-1".to_string()]
    );
    // node2 is still provisioning, node3 has no status at all
    assert_eq!(report.errors.len(), 2);

    let state = cluster.state.lock().unwrap();
    assert_eq!(state.deployments.len(), 2);
}

#[tokio::test]
async fn test_list_claims_does_not_create() {
    let cluster = FakeCluster::default();
    cluster.add_claim("set1-0-0-aaaaa", &ClaimIdentity::new("set1", 0, 0));
    let conf = conf_with(vec![], vec![device_set("set1", 2)]);

    let descriptor = OsdClusterDescriptor::new(Box::new(cluster.clone()));
    let slots = descriptor.list_claims(&conf).await.unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].claims.len(), 1);
    assert!(slots[1].claims.is_empty());
    assert_eq!(cluster.state.lock().unwrap().claims.len(), 1);
}
