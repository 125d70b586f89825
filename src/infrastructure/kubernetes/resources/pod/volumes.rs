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

//! Volumes and mounts shared by OSD pods

use crate::infrastructure::constants::*;
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, EmptyDirVolumeSource, HostPathVolumeSource, KeyToPath,
    PersistentVolumeClaimVolumeSource, Volume, VolumeMount,
};

/// `/var/lib/foo` becomes `var-lib-foo`.
pub fn path_to_volume_name(path: &str) -> String {
    path.replace('/', "-").trim_start_matches('-').to_string()
}

pub fn host_path_volume(name: &str, path: &str) -> Volume {
    Volume {
        name: name.to_string(),
        host_path: Some(HostPathVolumeSource {
            path: path.to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn mount(name: &str, mount_path: &str) -> VolumeMount {
    VolumeMount {
        name: name.to_string(),
        mount_path: mount_path.to_string(),
        ..Default::default()
    }
}

/// Data dir, config override and log dir. Present in every OSD pod.
pub fn support_volumes(data_dir_host_path: &str, namespace: &str) -> Vec<Volume> {
    let data_dir = if data_dir_host_path.is_empty() {
        Volume {
            name: VOLUME_NAME_DATA_DIR.to_string(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        }
    } else {
        host_path_volume(VOLUME_NAME_DATA_DIR, data_dir_host_path)
    };

    let log_dir = if data_dir_host_path.is_empty() {
        Volume {
            name: VOLUME_NAME_CEPH_LOG.to_string(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        }
    } else {
        host_path_volume(
            VOLUME_NAME_CEPH_LOG,
            &format!(
                "{}/{}/log",
                data_dir_host_path.trim_end_matches('/'),
                namespace
            ),
        )
    };

    vec![
        data_dir,
        Volume {
            name: VOLUME_NAME_CONFIG_OVERRIDE.to_string(),
            config_map: Some(ConfigMapVolumeSource {
                name: CONFIG_OVERRIDE_NAME.to_string(),
                items: Some(vec![KeyToPath {
                    key: CONFIG_OVERRIDE_KEY.to_string(),
                    path: "override.conf".to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        },
        log_dir,
    ]
}

/// Mounts for containers running a Ceph image.
pub fn ceph_volume_mounts() -> Vec<VolumeMount> {
    vec![
        mount(VOLUME_NAME_DATA_DIR, DATA_DIR),
        mount(VOLUME_NAME_CONFIG_OVERRIDE, ROOK_CONFIG_OVERRIDE_DIR),
        mount(VOLUME_NAME_CEPH_LOG, CEPH_LOG_DIR),
    ]
}

/// Mounts for containers running the Rook image.
pub fn rook_volume_mounts() -> Vec<VolumeMount> {
    vec![
        mount(VOLUME_NAME_DATA_DIR, DATA_DIR),
        mount(VOLUME_NAME_CONFIG_OVERRIDE, ROOK_CONFIG_OVERRIDE_DIR),
    ]
}

pub fn binaries_volume() -> Volume {
    Volume {
        name: VOLUME_NAME_ROOK_BINARIES.to_string(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Default::default()
    }
}

pub fn binaries_mount() -> VolumeMount {
    mount(VOLUME_NAME_ROOK_BINARIES, ROOK_BINARIES_MOUNT_PATH)
}

pub fn device_volumes() -> Vec<Volume> {
    vec![
        host_path_volume(VOLUME_NAME_DEVICES, HOST_DEV_PATH),
        host_path_volume(VOLUME_NAME_UDEV, HOST_UDEV_PATH),
    ]
}

pub fn device_mounts() -> Vec<VolumeMount> {
    vec![
        mount(VOLUME_NAME_DEVICES, HOST_DEV_PATH),
        mount(VOLUME_NAME_UDEV, HOST_UDEV_PATH),
    ]
}

pub fn bridge_volume_name(claim_name: &str) -> String {
    format!("{}{}", claim_name, VOLUME_NAME_BRIDGE_SUFFIX)
}

/// The claim itself, named after the OSD, plus the in-memory bridge it is copied into.
pub fn pvc_volumes(osd_name: &str, pvc: &PersistentVolumeClaimVolumeSource) -> Vec<Volume> {
    vec![
        Volume {
            name: osd_name.to_string(),
            persistent_volume_claim: Some(pvc.clone()),
            ..Default::default()
        },
        Volume {
            name: bridge_volume_name(&pvc.claim_name),
            empty_dir: Some(EmptyDirVolumeSource {
                medium: Some(VOLUME_MEDIUM_MEMORY.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        },
    ]
}

pub fn bridge_mount(claim_name: &str) -> VolumeMount {
    mount(&bridge_volume_name(claim_name), PVC_BRIDGE_MOUNT_PATH)
}
