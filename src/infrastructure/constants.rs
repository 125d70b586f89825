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

/// Paths inside the containers
pub const DATA_DIR: &str = "/var/lib/rook";
pub const CEPH_LOG_DIR: &str = "/var/log/ceph";
pub const ETC_CEPH_DIR: &str = "/etc/ceph";
pub const ROOK_CONFIG_OVERRIDE_DIR: &str = "/etc/rook/config";
pub const ROOK_CONFIG_OVERRIDE_FILE: &str = "/etc/rook/config/override.conf";
pub const ROOK_BINARIES_MOUNT_PATH: &str = "/rook";
pub const DEVICE_BY_PARTUUID_DIR: &str = "/dev/disk/by-partuuid";
pub const HOST_DEV_PATH: &str = "/dev";
pub const HOST_UDEV_PATH: &str = "/run/udev";
pub const PVC_BRIDGE_MOUNT_PATH: &str = "/mnt";

/// Binaries shipped into the shared binaries volume
pub const TINI_BINARY: &str = "tini";
pub const ROOK_BINARY: &str = "rook";
pub const CEPH_OSD_BINARY: &str = "ceph-osd";

/// Application names and labels
pub const APP_NAME: &str = "rook-ceph-osd";
pub const PREPARE_APP_NAME: &str = "rook-ceph-osd-prepare";
pub const LABEL_APP: &str = "app";
pub const LABEL_CLUSTER: &str = "rook_cluster";
pub const LABEL_OSD_ID: &str = "ceph-osd-id";
pub const LABEL_ROOK_VERSION: &str = "rook-version";
pub const LABEL_CEPH_VERSION: &str = "ceph-version";
pub const LABEL_PVC: &str = "ceph.rook.io/pvc";
pub const LABEL_HOSTNAME: &str = "kubernetes.io/hostname";

/// Device set claim identity labels
pub const LABEL_DEVICE_SET: &str = "ceph.rook.io/storageClassDeviceSet";
pub const LABEL_PVC_INDEX: &str = "ceph.rook.io/pvcIndex";
pub const LABEL_SET_INDEX: &str = "ceph.rook.io/setIndex";
pub const LABEL_DEVICE_SET_PVC_ID: &str = "ceph.rook.io/StorageClassDeviceSetPVCId";

/// Workload naming
pub const PREPARE_JOB_NAME_PREFIX: &str = "rook-ceph-osd-prepare-";
pub const OSD_DEPLOYMENT_NAME_PREFIX: &str = "rook-ceph-osd-";
pub const STATUS_CONFIGMAP_SUFFIX: &str = "-status";
pub const MAX_RESOURCE_NAME_LENGTH: usize = 63;
pub const SERVICE_ACCOUNT_NAME: &str = "rook-ceph-osd";

/// Container names
pub const CONTAINER_NAME_PROVISION: &str = "provision";
pub const CONTAINER_NAME_OSD: &str = "osd";
pub const CONTAINER_NAME_CONFIG_INIT: &str = "config-init";
pub const CONTAINER_NAME_COPY_BINS: &str = "copy-bins";
pub const CONTAINER_NAME_BLKDEVMAPPER: &str = "blkdevmapper";

/// Volume names
pub const VOLUME_NAME_DATA_DIR: &str = "rook-data";
pub const VOLUME_NAME_CONFIG_OVERRIDE: &str = "rook-config-override";
pub const VOLUME_NAME_CEPH_LOG: &str = "rook-ceph-log";
pub const VOLUME_NAME_ROOK_BINARIES: &str = "rook-binaries";
pub const VOLUME_NAME_DEVICES: &str = "devices";
pub const VOLUME_NAME_UDEV: &str = "udev";
pub const VOLUME_NAME_RUN_UDEV: &str = "run-udev";
pub const VOLUME_NAME_BRIDGE_SUFFIX: &str = "-bridge";
pub const VOLUME_MEDIUM_MEMORY: &str = "Memory";

/// ConfigMaps and Secrets consumed by the daemons
pub const CONFIG_OVERRIDE_NAME: &str = "rook-config-override";
pub const CONFIG_OVERRIDE_KEY: &str = "config";
pub const MON_ENDPOINTS_CONFIGMAP: &str = "rook-ceph-mon-endpoints";
pub const MON_ENDPOINTS_KEY: &str = "data";
pub const MON_SECRET_NAME: &str = "rook-ceph-mon";
pub const MON_SECRET_KEY: &str = "mon-secret";
pub const ADMIN_SECRET_KEY: &str = "admin-secret";
pub const FSID_SECRET_KEY: &str = "fsid";

/// Environment variables passed to the OSD containers
pub const ENV_NODE_NAME: &str = "ROOK_NODE_NAME";
pub const ENV_CLUSTER_ID: &str = "ROOK_CLUSTER_ID";
pub const ENV_CLUSTER_NAME: &str = "ROOK_CLUSTER_NAME";
pub const ENV_PRIVATE_IP: &str = "ROOK_PRIVATE_IP";
pub const ENV_PUBLIC_IP: &str = "ROOK_PUBLIC_IP";
pub const ENV_MON_ENDPOINTS: &str = "ROOK_MON_ENDPOINTS";
pub const ENV_MON_SECRET: &str = "ROOK_MON_SECRET";
pub const ENV_ADMIN_SECRET: &str = "ROOK_ADMIN_SECRET";
pub const ENV_CONFIG_DIR: &str = "ROOK_CONFIG_DIR";
pub const ENV_CONFIG_OVERRIDE: &str = "ROOK_CEPH_CONFIG_OVERRIDE";
pub const ENV_FSID: &str = "ROOK_FSID";
pub const ENV_LOCATION: &str = "ROOK_LOCATION";
pub const ENV_DATA_DIRECTORIES: &str = "ROOK_DATA_DIRECTORIES";
pub const ENV_OSD_STORE: &str = "ROOK_OSD_STORE";
pub const ENV_OSD_DATABASE_SIZE: &str = "ROOK_OSD_DATABASE_SIZE";
pub const ENV_OSD_WAL_SIZE: &str = "ROOK_OSD_WAL_SIZE";
pub const ENV_OSD_JOURNAL_SIZE: &str = "ROOK_OSD_JOURNAL_SIZE";
pub const ENV_OSDS_PER_DEVICE: &str = "ROOK_OSDS_PER_DEVICE";
pub const ENV_ENCRYPTED_DEVICE: &str = "ROOK_ENCRYPTED_DEVICE";
pub const ENV_METADATA_DEVICE: &str = "ROOK_METADATA_DEVICE";
pub const ENV_PVC_BACKED_OSD: &str = "ROOK_PVC_BACKED_OSD";
pub const ENV_DATA_DEVICES: &str = "ROOK_DATA_DEVICES";
pub const ENV_DATA_DEVICE_FILTER: &str = "ROOK_DATA_DEVICE_FILTER";
pub const ENV_OSD_UUID: &str = "ROOK_OSD_UUID";
pub const ENV_OSD_ID: &str = "ROOK_OSD_ID";
pub const ENV_OSD_STORE_TYPE: &str = "ROOK_OSD_STORE_TYPE";
pub const ENV_CEPH_VERSION: &str = "ROOK_CEPH_VERSION";
pub const ENV_IS_DEVICE: &str = "ROOK_IS_DEVICE";
pub const ENV_TINI_SUBREAPER: &str = "TINI_SUBREAPER";
pub const ENV_HOSTPATH_REQUIRES_PRIVILEGED: &str = "ROOK_HOSTPATH_REQUIRES_PRIVILEGED";

/// Device selection
pub const DEVICE_FILTER_ALL: &str = "all";
pub const DEVICE_FILTER_NONE: &str = "none";
pub const OSDS_PER_DEVICE_KEY: &str = "osdsPerDevice";
pub const METADATA_DEVICE_KEY: &str = "metadataDevice";
pub const LOCATION_KEY: &str = "location";

/// Ceph daemon tuning
pub const OSD_MEMORY_TARGET_SAFETY_FACTOR: f64 = 0.8;
pub const OSD_POD_MINIMUM_MEMORY_MB: u64 = 2048;
pub const CEPH_SERVICE_USER: &str = "ceph";

/// Pod settings
pub const RESTART_POLICY_ALWAYS: &str = "Always";
pub const RESTART_POLICY_ON_FAILURE: &str = "OnFailure";
pub const STRATEGY_TYPE_RECREATE: &str = "Recreate";
pub const DNS_POLICY_CLUSTER_FIRST: &str = "ClusterFirst";
pub const DNS_POLICY_CLUSTER_FIRST_WITH_HOST_NET: &str = "ClusterFirstWithHostNet";

/// Orchestration status written by the provisioning job
pub const ORCHESTRATION_STATUS_KEY: &str = "status";
pub const ORCHESTRATION_STATUS_COMPLETED: &str = "completed";
pub const ORCHESTRATION_STATUS_FAILED: &str = "failed";

/// Server-side apply field manager
pub const FIELD_MANAGER: &str = "ceph-osd-kube";
