//! OSD rollout commands

use crate::cli::display::{ClaimInfo, TableRenderer};
use crate::domain::cluster::{
    osd_objects, planned_volume_sources, OsdClusterDescriptor, OsdClusterValidator,
};
use crate::domain::config::{apply_to_cluster_conf, ClusterConf};
use crate::domain::osd::OsdInfo;
use crate::infrastructure::kubernetes::resources::{DaemonDeploymentBuilder, ProvisionJobBuilder};
use crate::infrastructure::kubernetes::OsdKubeClientImpl;
use anyhow::Context;
use clap::{Args, Parser};
use std::collections::{BTreeMap, HashMap};

/// Options shared by every command that loads a cluster description
#[derive(Args, Debug, Clone)]
pub struct ClusterArgs {
    /// Path to the cluster description (TOML)
    /// If not provided, built-in defaults are used
    #[arg(long, short = 'f', value_name = "PATH")]
    pub config_file: Option<String>,

    /// Kubernetes namespace of the Ceph cluster (overrides the file and -D namespace)
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,

    /// Dynamic configuration properties to override any settings (-D key=value)
    ///
    /// Basic: namespace, data-dir-host-path
    /// Images: ceph.image, ceph.version, rook.image, rook.version
    /// Network: network.host-network
    /// Storage: storage.device-filter, storage.use-all-devices, storage.directories (comma-separated)
    /// Store settings: storage.config.<key> (e.g. storage.config.storeType=filestore)
    /// Resources: osd.memory
    /// Annotations: annotations (format: key1=val1,key2=val2)
    ///
    /// Example: -Dceph.version=14.2.2 -Dstorage.device-filter=^sd[b-d]
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

impl ClusterArgs {
    /// Resolves the cluster description: flag > -D property > file > defaults.
    pub fn load(&self) -> anyhow::Result<ClusterConf> {
        let mut conf = match &self.config_file {
            Some(path) => ClusterConf::from(path)
                .with_context(|| format!("Failed to load cluster description {}", path))?,
            None => {
                println!("ℹ️  No configuration file specified, using default settings");
                ClusterConf::default()
            }
        };
        conf.apply_env_overrides();

        if !self.properties.is_empty() {
            let dynamic_configs = parse_dynamic_configs(&self.properties)
                .map_err(|e| anyhow::anyhow!("Failed to parse dynamic configs: {}", e))?;
            apply_to_cluster_conf(&dynamic_configs, &mut conf)?;
        }

        if let Some(namespace) = &self.namespace {
            conf.namespace = namespace.clone();
        }

        Ok(conf)
    }
}

#[derive(Args, Debug, Clone)]
pub struct KubeArgs {
    /// Path to kubeconfig file
    /// If not specified, uses default kubeconfig resolution (KUBECONFIG env or ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Kubernetes context to use
    /// If not specified, uses current context from kubeconfig
    #[arg(long)]
    pub context: Option<String>,
}

impl KubeArgs {
    async fn connect(&self, conf: &ClusterConf) -> anyhow::Result<OsdKubeClientImpl> {
        Ok(OsdKubeClientImpl::new_with_config(
            conf.namespace.clone(),
            self.kubeconfig.clone(),
            self.context.clone(),
        )
        .await?)
    }
}

#[derive(Parser, Debug, Clone)]
pub struct RenderCommand {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// YAML map of worker name to provisioned OSDs; renders daemon deployments for them
    #[arg(long, value_name = "PATH")]
    pub osd_info: Option<String>,

    /// Write the manifests to this file instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ProvisionCommand {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    #[command(flatten)]
    pub kube: KubeArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct StartCommand {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    #[command(flatten)]
    pub kube: KubeArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct ClaimsCommand {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    #[command(flatten)]
    pub kube: KubeArgs,
}

impl RenderCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let conf = self.cluster.load()?;
        OsdClusterValidator::validate_conf(&conf)?;

        let manifests = render_manifests(&conf, self.osd_info.as_deref())?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, &manifests)
                    .with_context(|| format!("Failed to write manifests to {}", path))?;
                println!("✓ Manifests written to {}", path);
            }
            None => print!("{}", manifests),
        }
        Ok(())
    }
}

/// Multi-document YAML for every provisioning job, followed by the daemon
/// deployments described in `osd_info_path`.
pub fn render_manifests(conf: &ClusterConf, osd_info_path: Option<&str>) -> anyhow::Result<String> {
    let objects = osd_objects(conf, &planned_volume_sources(conf))?;
    let mut documents = Vec::new();

    let job_builder = ProvisionJobBuilder::new(conf);
    for osd in &objects {
        let job = job_builder
            .build(osd)
            .with_context(|| format!("Failed to build provisioning job for {}", osd.name))?;
        documents.push(serde_yaml::to_string(&job)?);
    }

    if let Some(path) = osd_info_path {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read osd info {}", path))?;
        let provisioned: BTreeMap<String, Vec<OsdInfo>> = serde_yaml::from_str(&content)?;

        let deployment_builder = DaemonDeploymentBuilder::new(conf);
        for (worker, infos) in &provisioned {
            let osd = objects
                .iter()
                .find(|o| &o.name == worker)
                .ok_or_else(|| anyhow::anyhow!("osd info refers to unknown worker '{}'", worker))?;
            for info in infos {
                let deployment = deployment_builder
                    .build(osd, info)
                    .with_context(|| format!("Failed to build deployment for osd.{}", info.id))?;
                documents.push(serde_yaml::to_string(&deployment)?);
            }
        }
    }

    Ok(documents
        .iter()
        .map(|d| format!("---\n{}", d))
        .collect::<String>())
}

impl ProvisionCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let conf = self.cluster.load()?;
        let client = self.kube.connect(&conf).await?;

        OsdClusterValidator::new(client.get_client())
            .validate_deployment(&conf)
            .await?;

        println!("Provisioning OSDs in namespace '{}'...", conf.namespace);
        let descriptor = OsdClusterDescriptor::new(Box::new(client));
        let report = descriptor.provision(&conf).await?;

        println!("{}", TableRenderer::new().render_report("provision", &report));
        if !report.is_ok() {
            anyhow::bail!("{} worker(s) failed to provision", report.errors.len());
        }
        Ok(())
    }
}

impl StartCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let conf = self.cluster.load()?;
        let client = self.kube.connect(&conf).await?;

        println!("Starting OSD daemons in namespace '{}'...", conf.namespace);
        let descriptor = OsdClusterDescriptor::new(Box::new(client));
        let report = descriptor.start_daemons(&conf).await?;

        println!("{}", TableRenderer::new().render_report("start", &report));
        if !report.is_ok() {
            anyhow::bail!("{} osd(s) could not be started", report.errors.len());
        }
        Ok(())
    }
}

impl ClaimsCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let conf = self.cluster.load()?;
        let client = self.kube.connect(&conf).await?;

        let descriptor = OsdClusterDescriptor::new(Box::new(client));
        let slots = descriptor.list_claims(&conf).await?;

        let now = chrono::Utc::now();
        let rows: Vec<ClaimInfo> = slots
            .iter()
            .flat_map(|slot| ClaimInfo::from_slot(slot, now))
            .collect();

        println!("{}", TableRenderer::new().render_claims(&rows));
        Ok(())
    }
}

/// Parse dynamic configuration properties from -D key=value format
pub fn parse_dynamic_configs(configs: &[String]) -> Result<HashMap<String, String>, String> {
    let mut map = HashMap::new();

    for config in configs {
        let (key, value) = config.split_once('=').ok_or_else(|| {
            format!("Invalid config format: '{}'. Expected 'key=value'", config)
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(format!("Empty key in config: '{}'", config));
        }

        map.insert(key.to_string(), value.trim().to_string());
    }

    Ok(map)
}
