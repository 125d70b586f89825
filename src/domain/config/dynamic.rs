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

use crate::domain::config::ClusterConf;
use crate::domain::osd::{CephVersion, Directory};
use crate::shared::error::{OsdError, Result};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::{BTreeMap, HashMap};

/// Apply `-D key=value` properties on top of the loaded file.
pub fn apply_to_cluster_conf(
    configs: &HashMap<String, String>,
    conf: &mut ClusterConf,
) -> Result<()> {
    if let Some(namespace) = configs.get("namespace") {
        conf.namespace = namespace.clone();
    }

    if let Some(path) = configs.get("data-dir-host-path") {
        conf.data_dir_host_path = path.clone();
    }

    if let Some(image) = configs.get("ceph.image") {
        conf.ceph.image = image.clone();
    }

    if let Some(version) = configs.get("ceph.version") {
        conf.ceph.version = version.parse::<CephVersion>()?;
    }

    if let Some(image) = configs.get("rook.image") {
        conf.rook_image = image.clone();
    }

    if let Some(version) = configs.get("rook.version") {
        conf.rook_version = version.clone();
    }

    if let Some(value) = configs.get("network.host-network") {
        conf.host_network = parse_bool("network.host-network", value)?;
    }

    if let Some(filter) = configs.get("storage.device-filter") {
        conf.storage.device_filter = filter.clone();
    }

    if let Some(value) = configs.get("storage.use-all-devices") {
        conf.storage.use_all_devices = Some(parse_bool("storage.use-all-devices", value)?);
    }

    if let Some(dirs) = configs.get("storage.directories") {
        conf.storage.directories = dirs
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(Directory::new)
            .collect();
    }

    if let Some(mem) = configs.get("osd.memory") {
        let quantity = Quantity(mem.clone());
        conf.resources
            .limits
            .get_or_insert_with(BTreeMap::new)
            .insert("memory".to_string(), quantity.clone());
        conf.resources
            .requests
            .get_or_insert_with(BTreeMap::new)
            .insert("memory".to_string(), quantity);
    }

    if let Some(annotations) = configs.get("annotations") {
        conf.annotations.extend(parse_key_value_pairs(annotations));
    }

    for (key, value) in configs {
        if let Some(store_key) = key.strip_prefix("storage.config.") {
            conf.storage
                .config
                .insert(store_key.to_string(), value.clone());
        }
    }

    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .trim()
        .parse()
        .map_err(|_| OsdError::ConfigError(format!("{} expects true or false, got '{}'", key, value)))
}

fn parse_key_value_pairs(input: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for pair in input.split(',') {
        if let Some((k, v)) = pair.split_once('=') {
            map.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    map
}
