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

use crate::infrastructure::constants::*;
use crate::infrastructure::kubernetes::resources::pod::volumes::{binaries_mount, bridge_mount};
use k8s_openapi::api::core::v1::{Container, SecurityContext, VolumeDevice};

/// Root, privileged, writable root filesystem.
pub fn privileged_security_context() -> SecurityContext {
    SecurityContext {
        privileged: Some(true),
        run_as_user: Some(0),
        read_only_root_filesystem: Some(false),
        ..Default::default()
    }
}

/// Copies `tini` and `rook` into the shared binaries volume.
pub fn copy_binaries_container(rook_image: &str) -> Container {
    Container {
        name: CONTAINER_NAME_COPY_BINS.to_string(),
        image: Some(rook_image.to_string()),
        args: Some(vec![
            "copy-binaries".to_string(),
            "--copy-to-dir".to_string(),
            ROOK_BINARIES_MOUNT_PATH.to_string(),
        ]),
        volume_mounts: Some(vec![binaries_mount()]),
        ..Default::default()
    }
}

/// Copies the raw block device of a claim into its bridge volume.
pub fn blkdevmapper_container(ceph_image: &str, claim_name: &str) -> Container {
    let device_path = format!("/{}", claim_name);
    Container {
        name: CONTAINER_NAME_BLKDEVMAPPER.to_string(),
        image: Some(ceph_image.to_string()),
        args: Some(vec![
            "cp".to_string(),
            "-a".to_string(),
            device_path.clone(),
            format!("{}/{}", PVC_BRIDGE_MOUNT_PATH, claim_name),
        ]),
        volume_devices: Some(vec![VolumeDevice {
            name: claim_name.to_string(),
            device_path,
        }]),
        volume_mounts: Some(vec![bridge_mount(claim_name)]),
        security_context: Some(privileged_security_context()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blkdevmapper() {
        let c = blkdevmapper_container("ceph/ceph:v14.2.2", "pvc0");
        assert_eq!(c.args.unwrap(), vec!["cp", "-a", "/pvc0", "/mnt/pvc0"]);
        let devices = c.volume_devices.unwrap();
        assert_eq!(devices[0].name, "pvc0");
        assert_eq!(devices[0].device_path, "/pvc0");
        assert_eq!(c.volume_mounts.unwrap()[0].name, "pvc0-bridge");
    }

    #[test]
    fn test_copy_binaries() {
        let c = copy_binaries_container("rook/ceph:v1.0.0");
        assert_eq!(c.name, "copy-bins");
        assert_eq!(c.volume_mounts.unwrap()[0].mount_path, "/rook");
    }
}
