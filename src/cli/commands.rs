// CLI command definitions

use super::osd::{ClaimsCommand, ProvisionCommand, RenderCommand, StartCommand};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "ceph-osd-kube",
    version,
    about = "Ceph OSD rollout tool for Kubernetes",
    long_about = "Renders and applies Ceph OSD provisioning jobs, daemon deployments and device-set claims"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Print provisioning jobs (and daemon deployments) as YAML without contacting the cluster
    Render(RenderCommand),

    /// Allocate device-set claims and start provisioning jobs
    Provision(ProvisionCommand),

    /// Start daemon deployments for provisioned OSDs
    Start(StartCommand),

    /// List device-set claims
    Claims(ClaimsCommand),
}
