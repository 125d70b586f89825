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

use crate::infrastructure::constants::{CEPH_LOG_DIR, CEPH_SERVICE_USER};
use k8s_openapi::api::core::v1::{ExecAction, Lifecycle, LifecycleHandler};

pub struct LifecycleBuilder;

impl LifecycleBuilder {
    /// Hands the log directory and the OSD data path to the ceph user once the container starts.
    pub fn build_ownership_fix(data_path: &str) -> Option<Lifecycle> {
        let owner = format!("{}:{}", CEPH_SERVICE_USER, CEPH_SERVICE_USER);

        let mut command = vec![
            "chown".to_string(),
            "--recursive".to_string(),
            owner,
            CEPH_LOG_DIR.to_string(),
        ];
        if !data_path.is_empty() {
            command.push(data_path.to_string());
        }

        Some(Lifecycle {
            post_start: Some(LifecycleHandler {
                exec: Some(ExecAction {
                    command: Some(command),
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chown_command() {
        let lifecycle = LifecycleBuilder::build_ownership_fix("/var/lib/rook/osd1").unwrap();
        let command = lifecycle
            .post_start
            .and_then(|h| h.exec)
            .and_then(|e| e.command)
            .unwrap();
        assert_eq!(
            command,
            vec![
                "chown",
                "--recursive",
                "ceph:ceph",
                "/var/log/ceph",
                "/var/lib/rook/osd1"
            ]
        );
        assert!(lifecycle.pre_stop.is_none());
    }
}
