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

//! OSD daemon command line
//!
//! The launch form is picked once from the runtime info. Every form then
//! receives the same cross-cutting flags, which depend only on the store
//! type, the Ceph version, host networking and the memory limit.

use crate::domain::osd::{CephVersion, OsdInfo, StoreType};
use crate::infrastructure::constants::{
    CEPH_OSD_BINARY, CEPH_SERVICE_USER, DEVICE_BY_PARTUUID_DIR, OSD_MEMORY_TARGET_SAFETY_FACTOR,
    ROOK_BINARIES_MOUNT_PATH, ROOK_BINARY, TINI_BINARY,
};
use tracing::warn;

/// How the daemon container starts the OSD process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonLaunch {
    /// Rook bind-mounts the partition by UUID, runs the daemon, and unmounts it on exit.
    FilestoreDeviceWrapper { source_path: String },
    /// Provisioned by ceph-volume; rook supervises the daemon as the ceph user.
    CephVolume,
    Direct,
}

impl DaemonLaunch {
    pub fn select(info: &OsdInfo) -> Self {
        if info.is_directory && info.is_file_store && !info.ceph_volume_initiated {
            let part_uuid = info.device_part_uuid.as_deref().unwrap_or_default();
            if part_uuid.is_empty() {
                warn!(
                    "osd {} has no device partition uuid, the wrapper cannot mount its data",
                    info.id
                );
            }
            DaemonLaunch::FilestoreDeviceWrapper {
                source_path: format!("{}/{}", DEVICE_BY_PARTUUID_DIR, part_uuid),
            }
        } else if info.ceph_volume_initiated {
            DaemonLaunch::CephVolume
        } else {
            DaemonLaunch::Direct
        }
    }

    pub fn command(&self) -> Vec<String> {
        match self {
            DaemonLaunch::FilestoreDeviceWrapper { .. } | DaemonLaunch::CephVolume => {
                vec![binary_path(TINI_BINARY)]
            }
            DaemonLaunch::Direct => vec![CEPH_OSD_BINARY.to_string()],
        }
    }

    /// Full argument list: launch-specific prefix followed by the cross-cutting flags.
    pub fn args(&self, info: &OsdInfo, flags: &ArgFlags) -> Vec<String> {
        let mut args = match self {
            DaemonLaunch::FilestoreDeviceWrapper { source_path } => {
                let mut args = to_strings(&["--", &binary_path(ROOK_BINARY)]);
                args.extend(to_strings(&[
                    "ceph",
                    "osd",
                    "filestore-device",
                    "--source-path",
                    source_path,
                    "--mount-path",
                    &info.data_path,
                    "--",
                ]));
                args.extend(common_args(info));
                args
            }
            DaemonLaunch::CephVolume => {
                let id = info.id.to_string();
                to_strings(&[
                    "--",
                    &binary_path(ROOK_BINARY),
                    "ceph",
                    "osd",
                    "start",
                    "--",
                    "--foreground",
                    "--id",
                    &id,
                    "--osd-uuid",
                    &info.uuid,
                    "--conf",
                    &info.config,
                    "--cluster",
                    "ceph",
                    "--setuser",
                    CEPH_SERVICE_USER,
                    "--setgroup",
                    CEPH_SERVICE_USER,
                    "--setuser-match-path",
                    &info.data_path,
                ])
            }
            DaemonLaunch::Direct => common_args(info),
        };

        args.extend(flags.for_store(info.store_type(), info.journal.as_deref()));
        args
    }

    pub fn needs_udev(&self) -> bool {
        matches!(self, DaemonLaunch::CephVolume)
    }
}

/// Cluster-level inputs to the cross-cutting flags.
#[derive(Debug, Clone, Copy)]
pub struct ArgFlags {
    pub version: CephVersion,
    pub host_network: bool,
    /// Memory limit in bytes, zero when unset.
    pub memory_limit: u64,
}

impl ArgFlags {
    pub fn for_store(&self, store: StoreType, journal: Option<&str>) -> Vec<String> {
        let mut flags = Vec::new();
        flags.extend(memory_target_flag(store, &self.version, self.memory_limit));
        if store.is_journal_based() {
            flags.push(journal_flag(journal.unwrap_or_default()));
        }
        flags.extend(log_to_file_flags(&self.version));
        flags.extend(sdn_flags(self.host_network, &self.version));
        flags
    }
}

pub fn common_args(info: &OsdInfo) -> Vec<String> {
    let id = info.id.to_string();
    to_strings(&[
        "--foreground",
        "--id",
        &id,
        "--conf",
        &info.config,
        "--osd-data",
        &info.data_path,
        "--keyring",
        &info.keyring_path,
        "--cluster",
        &info.cluster,
        "--osd-uuid",
        &info.uuid,
    ])
}

/// From Nautilus on, the OSD tunes its own memory target.
pub fn memory_target_flag(
    store: StoreType,
    version: &CephVersion,
    memory_limit: u64,
) -> Option<String> {
    if store != StoreType::Bluestore || version.is_at_least_nautilus() || memory_limit == 0 {
        return None;
    }
    let target = (memory_limit as f64 * OSD_MEMORY_TARGET_SAFETY_FACTOR) as u64;
    Some(format!("--osd-memory-target={}", target))
}

pub fn journal_flag(journal: &str) -> String {
    format!("--osd-journal={}", journal)
}

pub fn log_to_file_flags(version: &CephVersion) -> Vec<String> {
    if version.is_at_least(&CephVersion::LOG_TO_FILE_FLAG) {
        to_strings(&["--default-log-to-file", "false"])
    } else {
        Vec::new()
    }
}

/// The OSD binds to the wrong address on an SDN unless it stops learning it from peers.
pub fn sdn_flags(host_network: bool, version: &CephVersion) -> Vec<String> {
    if !host_network && version.is_at_least(&CephVersion::LEARN_ADDR_FROM_PEER_FIX) {
        vec!["--ms-learn-addr-from-peer=false".to_string()]
    } else {
        Vec::new()
    }
}

fn binary_path(binary: &str) -> String {
    format!("{}/{}", ROOK_BINARIES_MOUNT_PATH, binary)
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
