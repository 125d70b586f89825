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

use ceph_osd_kube::domain::osd::{Device, Directory, OsdInfo, OsdObject, StoreType};
use ceph_osd_kube::infrastructure::constants::{
    DATA_DIR, ENV_DATA_DEVICES, VOLUME_NAME_DEVICES,
};
use ceph_osd_kube::infrastructure::kubernetes::resources::osd::ArgFlags;
use ceph_osd_kube::infrastructure::kubernetes::resources::pod::builders::find_env;
use ceph_osd_kube::{
    CephVersion, ClusterConf, DaemonDeploymentBuilder, DaemonLaunch, OsdError,
    ProvisionJobBuilder,
};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Container, PodSpec};

fn pod_spec(job: &Job) -> &PodSpec {
    job.spec.as_ref().unwrap().template.spec.as_ref().unwrap()
}

fn provision_container(job: &Job) -> &Container {
    &pod_spec(job).containers[0]
}

fn privileged(job: &Job) -> bool {
    provision_container(job)
        .security_context
        .as_ref()
        .and_then(|sc| sc.privileged)
        .unwrap_or(false)
}

/// One descriptor per storage input that on its own must produce a workload.
fn single_input_descriptors() -> Vec<(&'static str, OsdObject)> {
    let node = || OsdObject::for_node("node1");

    let mut devices = node();
    devices.devices = vec![Device::new("sdb")];

    let mut filter = node();
    filter.selection.device_filter = "^sd[b-d]".to_string();

    let mut all = node();
    all.selection.use_all_devices = Some(true);

    let mut metadata = node();
    metadata.metadata_device = "nvme0n1".to_string();

    let mut directories = node();
    directories.selection.directories = vec![Directory::new("/mnt/osd")];

    vec![
        ("devices", devices),
        ("device filter", filter),
        ("use all devices", all),
        ("metadata device", metadata),
        ("directories", directories),
        ("pvc", OsdObject::for_claim("set1-0-0-abcde")),
    ]
}

#[test]
fn test_any_storage_input_yields_volumes() {
    let conf = ClusterConf::default();
    let builder = ProvisionJobBuilder::new(&conf);

    for (input, osd) in single_input_descriptors() {
        let job = builder
            .build(&osd)
            .unwrap_or_else(|e| panic!("{} should build: {}", input, e));
        let volumes = pod_spec(&job).volumes.as_ref().unwrap();
        assert!(!volumes.is_empty(), "{} produced no volumes", input);
    }
}

#[test]
fn test_no_storage_input_is_rejected() {
    let conf = ClusterConf::default();
    let builder = ProvisionJobBuilder::new(&conf);

    let mut osd = OsdObject::for_node("node1");
    osd.location = "rack=r1".to_string();
    let err = builder.build(&osd).unwrap_err();
    assert!(matches!(err, OsdError::EmptyVolumes { .. }));

    // the default data directory still counts as storage
    osd.selection.directories = vec![Directory::new(DATA_DIR)];
    assert!(builder.build(&osd).is_ok());
}

#[test]
fn test_memory_target_flag() {
    let info = OsdInfo {
        id: 0,
        uuid: "uuid".to_string(),
        ..Default::default()
    };
    let versions = [
        CephVersion::new(12, 2, 12),
        CephVersion::new(13, 2, 5),
        CephVersion::new(14, 0, 0),
        CephVersion::new(14, 2, 2),
    ];

    for version in versions {
        for store in [StoreType::Bluestore, StoreType::Filestore] {
            for memory_limit in [0u64, 4 * 1024 * 1024 * 1024] {
                let flags = ArgFlags {
                    version,
                    host_network: true,
                    memory_limit,
                };
                let mut info = info.clone();
                info.is_file_store = store == StoreType::Filestore;
                info.journal = info.is_file_store.then(|| "/dev/sdc1".to_string());

                let args = DaemonLaunch::Direct.args(&info, &flags);
                let has_target = args.iter().any(|a| a.starts_with("--osd-memory-target="));
                let expected = store == StoreType::Bluestore
                    && !version.is_at_least_nautilus()
                    && memory_limit > 0;
                assert_eq!(
                    has_target, expected,
                    "version {} store {} limit {}",
                    version, store, memory_limit
                );

                let has_journal = args.iter().any(|a| a.starts_with("--osd-journal="));
                assert_eq!(has_journal, store == StoreType::Filestore);
            }
        }
    }
}

#[test]
fn test_privileged_matrix() {
    for device_mount in [false, true] {
        for override_privileged in [false, true] {
            for pvc in [false, true] {
                let conf = ClusterConf {
                    hostpath_requires_privileged: override_privileged,
                    ..Default::default()
                };
                let mut osd = if pvc {
                    OsdObject::for_claim("set1-0-0-abcde")
                } else {
                    let mut osd = OsdObject::for_node("node1");
                    osd.selection.directories = vec![Directory::new("/mnt/osd")];
                    osd
                };
                if device_mount {
                    osd.devices = vec![Device::new("sdb")];
                }

                let job = ProvisionJobBuilder::new(&conf).build(&osd).unwrap();
                assert_eq!(
                    privileged(&job),
                    device_mount || override_privileged || pvc,
                    "devices={} override={} pvc={}",
                    device_mount,
                    override_privileged,
                    pvc
                );
            }
        }
    }
}

#[test]
fn test_default_data_dir_never_duplicated() {
    let conf = ClusterConf::default();
    for repeats in 1..=4 {
        let mut osd = OsdObject::for_node("node1");
        osd.selection.directories = vec![Directory::new(DATA_DIR); repeats];

        let job = ProvisionJobBuilder::new(&conf).build(&osd).unwrap();
        let container = provision_container(&job);
        let mounts = container.volume_mounts.as_ref().unwrap();
        assert_eq!(mounts.iter().filter(|m| m.mount_path == DATA_DIR).count(), 1);

        let volumes = pod_spec(&job).volumes.as_ref().unwrap();
        let host_paths = volumes
            .iter()
            .filter_map(|v| v.host_path.as_ref())
            .filter(|h| h.path == DATA_DIR)
            .count();
        assert_eq!(host_paths, 1);
    }
}

#[test]
fn test_two_device_example() {
    let conf = ClusterConf::default();
    let mut osd = OsdObject::for_node("node1");
    osd.devices = vec![Device::new("sdb"), Device::new("sdc")];

    let job = ProvisionJobBuilder::new(&conf).build(&osd).unwrap();
    let env = provision_container(&job).env.as_ref().unwrap();
    assert_eq!(
        env.iter().filter(|e| e.name == ENV_DATA_DEVICES).count(),
        1
    );
    assert_eq!(find_env(env, ENV_DATA_DEVICES), Some("sdb:1,sdc:1"));

    let volumes = pod_spec(&job).volumes.as_ref().unwrap();
    assert!(volumes.iter().any(|v| v.name == VOLUME_NAME_DEVICES));
    assert!(privileged(&job));
}

#[test]
fn test_journal_directory_example() {
    let conf = ClusterConf::default();
    let info = OsdInfo {
        id: 3,
        uuid: "a1b2".to_string(),
        cluster: "ceph".to_string(),
        data_path: "/var/lib/rook/osd3".to_string(),
        config: "/var/lib/rook/osd3/rook-ceph.config".to_string(),
        keyring_path: "/var/lib/rook/osd3/keyring".to_string(),
        journal: Some("/dev/disk/by-partuuid/j0".to_string()),
        is_file_store: true,
        is_directory: true,
        device_part_uuid: Some("p0".to_string()),
        ceph_volume_initiated: false,
    };

    let launch = DaemonLaunch::select(&info);
    assert!(matches!(launch, DaemonLaunch::FilestoreDeviceWrapper { .. }));

    let mut osd = OsdObject::for_node("node1");
    osd.selection.directories = vec![Directory::new("/var/lib/rook")];
    let deployment = DaemonDeploymentBuilder::new(&conf).build(&osd, &info).unwrap();
    let container = &deployment
        .spec
        .as_ref()
        .unwrap()
        .template
        .spec
        .as_ref()
        .unwrap()
        .containers[0];

    assert_eq!(container.command.as_ref().unwrap(), &launch.command());
    let args = container.args.as_ref().unwrap();
    assert!(args.contains(&"filestore-device".to_string()));
    assert!(args.contains(&"--osd-journal=/dev/disk/by-partuuid/j0".to_string()));
}
