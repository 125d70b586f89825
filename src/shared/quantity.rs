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

//! Kubernetes resource quantity helpers

use crate::shared::error::{OsdError, Result};
use k8s_openapi::api::core::v1::ResourceRequirements;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

const BINARY_SUFFIXES: [(&str, f64); 6] = [
    ("Ki", 1024.0),
    ("Mi", 1024.0 * 1024.0),
    ("Gi", 1024.0 * 1024.0 * 1024.0),
    ("Ti", 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Pi", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Ei", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
];

const DECIMAL_SUFFIXES: [(&str, f64); 9] = [
    ("n", 1e-9),
    ("u", 1e-6),
    ("m", 1e-3),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
    ("E", 1e18),
];

/// Parse a quantity such as "4Gi", "512M", "1.5Gi" or "1e9" into whole bytes.
pub fn parse_quantity_bytes(quantity: &Quantity) -> Result<u64> {
    let s = quantity.0.trim();
    if s.is_empty() {
        return Err(OsdError::config_error("empty resource quantity"));
    }

    let (num_str, multiplier) = split_suffix(s);

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| OsdError::ConfigError(format!("Invalid resource quantity: {}", s)))?;

    if num < 0.0 {
        return Err(OsdError::ConfigError(format!(
            "Negative resource quantity: {}",
            s
        )));
    }

    Ok((num * multiplier).floor() as u64)
}

fn split_suffix(s: &str) -> (&str, f64) {
    for (suffix, factor) in BINARY_SUFFIXES {
        if let Some(num) = s.strip_suffix(suffix) {
            return (num, factor);
        }
    }

    // "1e9" is an exponent, not the exa suffix
    if s.contains(['e', 'E']) && s.parse::<f64>().is_ok() {
        return (s, 1.0);
    }

    for (suffix, factor) in DECIMAL_SUFFIXES {
        if let Some(num) = s.strip_suffix(suffix) {
            return (num, factor);
        }
    }

    (s, 1.0)
}

/// Memory limit and request in bytes. Zero means "not set".
pub fn memory_bytes(resources: &ResourceRequirements) -> Result<(u64, u64)> {
    let limit = match resources.limits.as_ref().and_then(|l| l.get("memory")) {
        Some(q) => parse_quantity_bytes(q)?,
        None => 0,
    };
    let request = match resources.requests.as_ref().and_then(|r| r.get("memory")) {
        Some(q) => parse_quantity_bytes(q)?,
        None => 0,
    };
    Ok((limit, request))
}
