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
use crate::infrastructure::constants::{
    LABEL_APP, LABEL_CEPH_VERSION, LABEL_CLUSTER, LABEL_ROOK_VERSION,
};
use std::collections::BTreeMap;

/// Label conventions shared by the OSD workload builders.
pub trait PodBuilder {
    fn app_name(&self) -> &'static str;

    fn cluster_conf(&self) -> &ClusterConf;

    fn get_selector_labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert(LABEL_APP.to_string(), self.app_name().to_string());
        labels.insert(
            LABEL_CLUSTER.to_string(),
            self.cluster_conf().namespace.clone(),
        );
        labels
    }

    /// Selector labels plus the rook and ceph version labels.
    fn get_labels(&self) -> BTreeMap<String, String> {
        let mut labels = self.get_selector_labels();
        labels.insert(
            LABEL_ROOK_VERSION.to_string(),
            self.cluster_conf().rook_version.clone(),
        );
        labels.insert(
            LABEL_CEPH_VERSION.to_string(),
            ceph_version_label(self.cluster_conf()),
        );
        labels
    }

    fn get_annotations(&self) -> Option<BTreeMap<String, String>> {
        let annotations = &self.cluster_conf().annotations;
        if annotations.is_empty() {
            None
        } else {
            Some(annotations.clone())
        }
    }
}

/// Label values may not contain spaces, so only the dotted version is used.
fn ceph_version_label(conf: &ClusterConf) -> String {
    conf.ceph.version.to_string()
}
