//! Elastic Jupyter Operator - notebooks, gateways, and kernels on Kubernetes

mod controller_runner;
mod crds;
mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use kube::Client;

use jupyter_common::retry::RetryConfig;
use jupyter_controller::context::{DEFAULT_MAX_API_ATTEMPTS, DEFAULT_REFERENCE_RETRY};
use jupyter_controller::{Context, ControllerConfig};
use jupyter_workload::defaults::{DEFAULT_GATEWAY_IMAGE, DEFAULT_NOTEBOOK_IMAGE};
use jupyter_workload::WorkloadDefaults;

use crate::telemetry::{init_telemetry, LogFormat};

/// Elastic Jupyter Operator - CRD-driven notebooks with remote kernels
#[derive(Parser, Debug)]
#[command(name = "jupyter-operator", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "JUPYTER_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the controllers (default mode)
    ///
    /// Watches all five Jupyter kinds and keeps their generated Deployments,
    /// Services, and ConfigMaps in line with the specs.
    Controller(ControllerArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
struct ControllerArgs {
    /// Only watch this namespace (default: all namespaces)
    #[arg(long, env = "JUPYTER_WATCH_NAMESPACE")]
    namespace: Option<String>,

    /// Install or upgrade the CRDs before starting
    #[arg(long, env = "JUPYTER_INSTALL_CRDS")]
    install_crds: bool,

    /// Image for notebooks that only name a gateway
    #[arg(long, env = "JUPYTER_NOTEBOOK_IMAGE", default_value = DEFAULT_NOTEBOOK_IMAGE)]
    notebook_image: String,

    /// Image for gateways that do not pick one
    #[arg(long, env = "JUPYTER_GATEWAY_IMAGE", default_value = DEFAULT_GATEWAY_IMAGE)]
    gateway_image: String,

    /// Seconds before re-checking a reference that does not exist yet
    #[arg(long, env = "JUPYTER_REFERENCE_RETRY_SECS", default_value_t = DEFAULT_REFERENCE_RETRY.as_secs())]
    reference_retry_secs: u64,

    /// Attempts per API call before a reconcile gives up
    #[arg(long, env = "JUPYTER_MAX_API_ATTEMPTS", default_value_t = DEFAULT_MAX_API_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
    max_api_attempts: u32,
}

impl ControllerArgs {
    fn config(&self) -> ControllerConfig {
        ControllerConfig {
            reference_retry: Duration::from_secs(self.reference_retry_secs),
            api_retry: RetryConfig::with_max_attempts(self.max_api_attempts),
            defaults: WorkloadDefaults {
                notebook_image: self.notebook_image.clone(),
                gateway_image: self.gateway_image.clone(),
            },
            ..Default::default()
        }
    }
}

impl Default for ControllerArgs {
    fn default() -> Self {
        Self {
            namespace: None,
            install_crds: false,
            notebook_image: DEFAULT_NOTEBOOK_IMAGE.to_string(),
            gateway_image: DEFAULT_GATEWAY_IMAGE.to_string(),
            reference_retry_secs: DEFAULT_REFERENCE_RETRY.as_secs(),
            max_api_attempts: DEFAULT_MAX_API_ATTEMPTS,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.crd {
        let yaml = crds::crd_manifests()
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRDs: {}", e))?;
        println!("{yaml}");
        return Ok(());
    }

    init_telemetry(cli.log_format)?;

    match cli.command {
        Some(Commands::Controller(args)) => run_controller(args).await,
        None => run_controller(ControllerArgs::default()).await,
    }
}

async fn run_controller(args: ControllerArgs) -> anyhow::Result<()> {
    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    if args.install_crds {
        crds::ensure_crds_installed(&client).await?;
    }

    let config = args.config();
    tracing::info!(
        reference_retry = ?config.reference_retry,
        max_api_attempts = config.api_retry.max_attempts,
        notebook_image = %config.defaults.notebook_image,
        gateway_image = %config.defaults.gateway_image,
        "starting elastic Jupyter operator"
    );

    let ctx = Arc::new(Context::builder(client.clone()).config(config).build());
    let controllers =
        controller_runner::build_controllers(client, args.namespace.as_deref(), ctx);

    futures::future::join_all(controllers).await;
    tracing::info!("controllers stopped, shutting down");
    Ok(())
}
