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

//! OSD domain model

pub mod descriptor;
pub mod device_set;
pub mod info;
pub mod store;
pub mod version;

pub use descriptor::{Device, Directory, OsdObject, Placement, Selection};
pub use device_set::{ClaimIdentity, StorageClassDeviceSet, VolumeSource};
pub use info::{OrchestrationStatus, OsdInfo};
pub use store::{StoreConfig, StoreType};
pub use version::CephVersion;
