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

use thiserror::Error;
pub type Result<T> = std::result::Result<T, OsdError>;

#[derive(Error, Debug)]
pub enum OsdError {
    /// The workload would start without any storage-backing volume.
    #[error("empty volumes: no storage volume could be assembled for {workload}")]
    EmptyVolumes { workload: String },

    #[error("failed to ensure pvc for storageClassDeviceSet {device_set} (set {set_index}): {source}")]
    ClaimStore {
        device_set: String,
        set_index: u32,
        #[source]
        source: Box<OsdError>,
    },

    /// More than one claim carries the same identity label. Never resolved automatically.
    #[error("more than one pvc exists with label {selector}: [{}]", .claims.join(", "))]
    AmbiguousClaims {
        selector: String,
        claims: Vec<String>,
    },

    #[error("no volume claim template available for storageClassDeviceSet {0}")]
    NoClaimTemplate(String),

    #[error("refusing to deploy {daemon}: {reason}")]
    InsufficientMemory { daemon: String, reason: String },

    #[error("invalid ceph version '{0}'")]
    InvalidVersion(String),

    #[error("Kubernetes API error: {0}")]
    KubeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Resource not found: {resource_type} '{name}' in namespace '{namespace}'")]
    NotFound {
        resource_type: String,
        name: String,
        namespace: String,
    },

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<kube::Error> for OsdError {
    fn from(err: kube::Error) -> Self {
        OsdError::KubeError(err.to_string())
    }
}

impl OsdError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::ConfigError(context.into())
    }

    pub fn empty_volumes(workload: impl Into<String>) -> Self {
        Self::EmptyVolumes {
            workload: workload.into(),
        }
    }

    pub fn not_found(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Prepends the device set and set index to a backing-store failure.
    pub fn claim_store(device_set: impl Into<String>, set_index: u32, source: OsdError) -> Self {
        Self::ClaimStore {
            device_set: device_set.into(),
            set_index,
            source: Box::new(source),
        }
    }

    pub fn is_ambiguous_claims(&self) -> bool {
        matches!(self, Self::AmbiguousClaims { .. })
    }
}
