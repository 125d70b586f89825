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

//! One claim per (device set, set index), created on first use and reused after.
//!
//! Lookup and creation are two separate calls. Two allocators racing on the same
//! identity can both see zero claims and both create one; the next run then
//! reports the identity as ambiguous.

use crate::domain::osd::{ClaimIdentity, StorageClassDeviceSet};
use crate::infrastructure::kubernetes::resources::make_device_set_pvc;
use crate::shared::error::{OsdError, Result};
use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use tracing::{debug, info};

/// Backing store for device-set claims, scoped to one namespace.
#[async_trait::async_trait]
pub trait ClaimStore: Send + Sync {
    async fn list_claims(&self, selector: &str) -> Result<Vec<PersistentVolumeClaim>>;

    async fn create_claim(&self, claim: &PersistentVolumeClaim) -> Result<PersistentVolumeClaim>;
}

pub struct VolumeClaimAllocator<'a, S: ClaimStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ClaimStore + ?Sized> VolumeClaimAllocator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Returns the claim for `set_index`, creating it when none exists.
    /// Only the first volume claim template is used.
    pub async fn ensure_claim(
        &self,
        device_set: &StorageClassDeviceSet,
        set_index: u32,
    ) -> Result<PersistentVolumeClaim> {
        let template = device_set
            .volume_claim_templates
            .first()
            .ok_or_else(|| OsdError::NoClaimTemplate(device_set.name.clone()))?;

        let identity = ClaimIdentity::new(&device_set.name, set_index, 0);
        let selector = identity.selector();

        let mut existing = self
            .store
            .list_claims(&selector)
            .await
            .map_err(|e| OsdError::claim_store(&device_set.name, set_index, e))?;

        match existing.len() {
            0 => {
                let claim = make_device_set_pvc(&identity, template);
                let created = self
                    .store
                    .create_claim(&claim)
                    .await
                    .map_err(|e| OsdError::claim_store(&device_set.name, set_index, e))?;
                info!(
                    "created pvc {} for storageClassDeviceSet {} (set {})",
                    created.metadata.name.as_deref().unwrap_or_default(),
                    device_set.name,
                    set_index
                );
                Ok(created)
            }
            1 => {
                let claim = existing.remove(0);
                debug!(
                    "reusing pvc {} for {}",
                    claim.metadata.name.as_deref().unwrap_or_default(),
                    identity
                );
                Ok(claim)
            }
            _ => Err(OsdError::AmbiguousClaims {
                selector,
                claims: existing
                    .iter()
                    .map(|c| c.metadata.name.clone().unwrap_or_default())
                    .collect(),
            }),
        }
    }
}
