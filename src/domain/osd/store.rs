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

//! OSD store settings
//!
//! A store is either object-based (bluestore) or journal-based (filestore).
//! The settings arrive as a free-form string map on the cluster, node or
//! device set and are normalised here.

use crate::shared::error::OsdError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const STORE_TYPE_KEY: &str = "storeType";
pub const DATABASE_SIZE_MB_KEY: &str = "databaseSizeMB";
pub const WAL_SIZE_MB_KEY: &str = "walSizeMB";
pub const JOURNAL_SIZE_MB_KEY: &str = "journalSizeMB";
pub const OSDS_PER_DEVICE_KEY: &str = "osdsPerDevice";
pub const ENCRYPTED_DEVICE_KEY: &str = "encryptedDevice";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StoreType {
    #[serde(rename = "bluestore")]
    #[default]
    Bluestore,
    #[serde(rename = "filestore")]
    Filestore,
}

impl StoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::Bluestore => "bluestore",
            StoreType::Filestore => "filestore",
        }
    }

    pub fn is_journal_based(&self) -> bool {
        matches!(self, StoreType::Filestore)
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StoreType {
    type Err = OsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bluestore" => Ok(StoreType::Bluestore),
            "filestore" => Ok(StoreType::Filestore),
            _ => Err(OsdError::ConfigError(format!("Invalid store type: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Raw store type name; empty means "let the provisioner decide".
    pub store_type: String,
    #[serde(rename = "databaseSizeMB")]
    pub database_size_mb: u32,
    #[serde(rename = "walSizeMB")]
    pub wal_size_mb: u32,
    #[serde(rename = "journalSizeMB")]
    pub journal_size_mb: u32,
    pub osds_per_device: u32,
    pub encrypted_device: bool,
}

impl StoreConfig {
    /// Build from a config map. Unknown keys are ignored, malformed numbers are errors.
    pub fn from_map(config: &BTreeMap<String, String>) -> Result<Self, OsdError> {
        let mut store = StoreConfig::default();

        for (key, value) in config {
            match key.as_str() {
                STORE_TYPE_KEY => store.store_type = value.clone(),
                DATABASE_SIZE_MB_KEY => store.database_size_mb = parse_u32(key, value)?,
                WAL_SIZE_MB_KEY => store.wal_size_mb = parse_u32(key, value)?,
                JOURNAL_SIZE_MB_KEY => store.journal_size_mb = parse_u32(key, value)?,
                OSDS_PER_DEVICE_KEY => store.osds_per_device = parse_u32(key, value)?,
                ENCRYPTED_DEVICE_KEY => store.encrypted_device = value == "true",
                _ => {}
            }
        }

        Ok(store)
    }

    /// Typed store kind, if one was requested.
    pub fn store_kind(&self) -> Result<Option<StoreType>, OsdError> {
        if self.store_type.is_empty() {
            Ok(None)
        } else {
            self.store_type.parse().map(Some)
        }
    }
}

fn parse_u32(key: &str, value: &str) -> Result<u32, OsdError> {
    value.trim().parse().map_err(|_| {
        OsdError::ConfigError(format!("invalid value '{}' for store setting {}", value, key))
    })
}
