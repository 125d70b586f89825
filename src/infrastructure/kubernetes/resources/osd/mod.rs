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

//! OSD workload builders

pub mod args;
pub mod daemon;
pub mod provision;

pub use self::args::{ArgFlags, DaemonLaunch};
pub use self::daemon::DaemonDeploymentBuilder;
pub use self::provision::{
    directories_from_container, provision_container, store_config_from_container,
    ProvisionJobBuilder,
};

use crate::infrastructure::constants::MAX_RESOURCE_NAME_LENGTH;
use fnv::FnvHasher;
use std::hash::Hasher;
use tracing::info;

/// `<prefix><node>`, with the node name replaced by a stable hash when the result would be too long.
pub fn truncate_node_name(prefix: &str, node_name: &str) -> String {
    if prefix.len() + node_name.len() <= MAX_RESOURCE_NAME_LENGTH {
        return format!("{}{}", prefix, node_name);
    }

    let mut hasher = FnvHasher::default();
    hasher.write(node_name.as_bytes());
    let hashed = format!("{:016x}", hasher.finish());
    info!(
        "prefix and node name longer than {} chars, node name {} will be {}",
        MAX_RESOURCE_NAME_LENGTH, node_name, hashed
    );
    format!("{}{}", prefix, hashed)
}
