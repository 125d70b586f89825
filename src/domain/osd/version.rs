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

use crate::shared::error::OsdError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Three-part Ceph release version, ordered field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CephVersion {
    pub major: u32,
    pub minor: u32,
    pub extra: u32,
}

impl CephVersion {
    /// Nautilus, from which the OSD auto-tunes its memory target.
    pub const NAUTILUS: CephVersion = CephVersion::new(14, 0, 0);
    /// First release where `--default-log-to-file` is honoured.
    pub const LOG_TO_FILE_FLAG: CephVersion = CephVersion::new(14, 2, 1);
    /// First release carrying the learn-addr-from-peer fix for SDN deployments.
    pub const LEARN_ADDR_FROM_PEER_FIX: CephVersion = CephVersion::new(14, 2, 2);

    pub const fn new(major: u32, minor: u32, extra: u32) -> Self {
        Self {
            major,
            minor,
            extra,
        }
    }

    pub fn is_at_least(&self, other: &CephVersion) -> bool {
        self >= other
    }

    pub fn is_at_least_nautilus(&self) -> bool {
        self.is_at_least(&Self::NAUTILUS)
    }

    /// Form reported by `ceph --version`.
    pub fn formatted(&self) -> String {
        format!("ceph version {}", self)
    }
}

impl Default for CephVersion {
    fn default() -> Self {
        Self::new(14, 2, 1)
    }
}

impl fmt::Display for CephVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.extra)
    }
}

impl FromStr for CephVersion {
    type Err = OsdError;

    /// Accepts "14.2.1", "v14.2.1-20190430" or "ceph version 14.2.1 (...) nautilus (stable)".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = Regex::new(r"(\d+)\.(\d+)\.(\d+)")
            .map_err(|e| OsdError::InvalidVersion(format!("{}: {}", s, e)))?;
        let caps = re
            .captures(s)
            .ok_or_else(|| OsdError::InvalidVersion(s.to_string()))?;

        let part = |i: usize| -> Result<u32, OsdError> {
            caps.get(i)
                .map_or("", |m| m.as_str())
                .parse()
                .map_err(|_| OsdError::InvalidVersion(s.to_string()))
        };

        Ok(Self::new(part(1)?, part(2)?, part(3)?))
    }
}

impl TryFrom<String> for CephVersion {
    type Error = OsdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CephVersion> for String {
    fn from(v: CephVersion) -> Self {
        v.to_string()
    }
}
