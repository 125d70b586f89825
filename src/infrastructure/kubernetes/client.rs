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

use crate::domain::cluster::allocator::ClaimStore;
use crate::infrastructure::constants::FIELD_MANAGER;
use crate::shared::error::OsdError;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim};
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams, PropagationPolicy};
use kube::{Api, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

const JOB_DELETE_TIMEOUT_SECONDS: u64 = 60;
const JOB_DELETE_CHECK_INTERVAL_SECONDS: u64 = 2;

#[async_trait::async_trait]
pub trait OsdKubeClient: ClaimStore + Send + Sync {
    /// Replaces any job with the same name. Job pod templates are immutable.
    async fn apply_job(&self, job: &Job) -> Result<(), OsdError>;

    async fn get_job(&self, name: &str) -> Result<Job, OsdError>;

    async fn apply_deployment(&self, deployment: &Deployment) -> Result<(), OsdError>;

    async fn get_configmap(&self, name: &str) -> Result<ConfigMap, OsdError>;
}

pub struct OsdKubeClientImpl {
    client: Client,
    namespace: String,
}

impl OsdKubeClientImpl {
    pub async fn new_with_config(
        namespace: String,
        kubeconfig_path: Option<String>,
        context: Option<String>,
    ) -> Result<Self, OsdError> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        let kubeconfig = match kubeconfig_path {
            Some(path) => Kubeconfig::read_from(path),
            None => Kubeconfig::read(),
        }
        .map_err(|e| OsdError::KubeError(format!("Failed to load kubeconfig: {}", e)))?;

        let config_options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &config_options)
            .await
            .map_err(|e| {
                OsdError::KubeError(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            OsdError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client, namespace })
    }

    pub fn get_client(&self) -> Client {
        self.client.clone()
    }

    fn jobs(&self) -> Api<Job> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn claims(&self) -> Api<PersistentVolumeClaim> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn map_get_error(&self, kind: &str, name: &str, e: kube::Error) -> OsdError {
        match e {
            kube::Error::Api(ae) if ae.code == 404 => {
                OsdError::not_found(kind, name, &self.namespace)
            }
            kube::Error::Api(ae) => OsdError::KubeError(ae.message),
            e => OsdError::KubeError(e.to_string()),
        }
    }

    async fn wait_for_job_deleted(&self, name: &str) -> Result<(), OsdError> {
        let mut waited = 0;
        while waited < JOB_DELETE_TIMEOUT_SECONDS {
            match self.jobs().get(name).await {
                Err(kube::Error::Api(ae)) if ae.code == 404 => return Ok(()),
                Err(e) => return Err(e.into()),
                Ok(_) => debug!("waiting for job {} to be deleted", name),
            }
            sleep(Duration::from_secs(JOB_DELETE_CHECK_INTERVAL_SECONDS)).await;
            waited += JOB_DELETE_CHECK_INTERVAL_SECONDS;
        }

        Err(OsdError::Timeout(format!(
            "job {} was not deleted within {} seconds",
            name, JOB_DELETE_TIMEOUT_SECONDS
        )))
    }
}

#[async_trait::async_trait]
impl OsdKubeClient for OsdKubeClientImpl {
    async fn apply_job(&self, job: &Job) -> Result<(), OsdError> {
        let api = self.jobs();
        let name = job
            .metadata
            .name
            .as_ref()
            .ok_or_else(|| OsdError::ConfigError("Job name is required".to_string()))?;

        match api.get(name).await {
            Ok(_) => {
                info!("removing previous job {} to restart provisioning", name);
                let dp = DeleteParams {
                    propagation_policy: Some(PropagationPolicy::Foreground),
                    ..Default::default()
                };
                api.delete(name, &dp).await?;
                self.wait_for_job_deleted(name).await?;
            }
            Err(kube::Error::Api(ae)) if ae.code == 404 => {}
            Err(e) => return Err(OsdError::KubeError(e.to_string())),
        }

        api.create(&PostParams::default(), job).await?;
        Ok(())
    }

    async fn get_job(&self, name: &str) -> Result<Job, OsdError> {
        self.jobs()
            .get(name)
            .await
            .map_err(|e| self.map_get_error("Job", name, e))
    }

    async fn apply_deployment(&self, deployment: &Deployment) -> Result<(), OsdError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), &self.namespace);
        let name = deployment
            .metadata
            .name
            .as_ref()
            .ok_or_else(|| OsdError::ConfigError("Deployment name is required".to_string()))?;

        match api.get(name).await {
            Ok(_) => {
                let patch_params = PatchParams::apply(FIELD_MANAGER).force();
                let patch = serde_json::to_value(deployment).map_err(|e| {
                    OsdError::KubeError(format!("Failed to serialize Deployment: {}", e))
                })?;
                api.patch(name, &patch_params, &Patch::Apply(patch)).await?;
            }
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                api.create(&PostParams::default(), deployment).await?;
            }
            Err(e) => return Err(OsdError::KubeError(e.to_string())),
        }
        Ok(())
    }

    async fn get_configmap(&self, name: &str) -> Result<ConfigMap, OsdError> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), &self.namespace);
        api.get(name)
            .await
            .map_err(|e| self.map_get_error("ConfigMap", name, e))
    }

}

#[async_trait::async_trait]
impl ClaimStore for OsdKubeClientImpl {
    async fn list_claims(&self, selector: &str) -> Result<Vec<PersistentVolumeClaim>, OsdError> {
        let list_params = ListParams::default().labels(selector);
        Ok(self.claims().list(&list_params).await?.items)
    }

    async fn create_claim(
        &self,
        claim: &PersistentVolumeClaim,
    ) -> Result<PersistentVolumeClaim, OsdError> {
        Ok(self.claims().create(&PostParams::default(), claim).await?)
    }
}
