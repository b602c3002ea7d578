// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Load Balancer Convergence Planner
//!
//! Prints the steps a reconciliation pass would take for a service, without
//! touching the cloud.
//!
//! Usage:
//!   lbplan --config cloud.yaml --service svc.yaml [--nodes nodes.yaml] [--actual lb.json]
//!
//! Without `--nodes` the nodes are listed from the current Kubernetes cluster.
//! Without `--actual` the plan starts from a load balancer that does not exist.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use bmcs_lb::config::ProviderConfig;
use bmcs_lb::model::LoadBalancer;
use bmcs_lb::reconcilers::{extract_node_ips, plan_for_spec, LoadBalancerSpec};
use clap::{Parser, ValueEnum};
use k8s_openapi::api::core::v1::{Node, Service};
use kube::api::ListParams;
use kube::{Api, Client};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Preview load balancer changes for a Kubernetes service.
#[derive(Debug, Parser)]
#[command(name = "lbplan", version, about)]
struct Args {
    /// Cloud-provider configuration file
    #[arg(long)]
    config: PathBuf,

    /// Service manifest (YAML or JSON)
    #[arg(long)]
    service: PathBuf,

    /// List of Node objects (YAML or JSON); defaults to the cluster's nodes
    #[arg(long)]
    nodes: Option<PathBuf>,

    /// Snapshot of the remote load balancer (YAML or JSON)
    #[arg(long)]
    actual: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    initialize_logging();
    let args = Args::parse();

    let config = ProviderConfig::from_file(&args.config)?;
    let service: Service = read_manifest(&args.service)?;

    let nodes: Vec<Node> = match &args.nodes {
        Some(path) => read_manifest(path)?,
        None => list_cluster_nodes().await?,
    };
    let node_ips = extract_node_ips(&nodes);
    debug!("Found {} node addresses", node_ips.len());

    let actual: Option<LoadBalancer> = args
        .actual
        .as_deref()
        .map(read_manifest)
        .transpose()?;

    let spec = LoadBalancerSpec::new(&config, &service, node_ips)?;
    let plan = plan_for_spec(&spec, actual.as_ref())?;
    info!(
        "Planned {} steps for load balancer {}",
        plan.actions.len(),
        plan.load_balancer
    );

    match args.output {
        OutputFormat::Text => print!("{plan}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }

    Ok(())
}

/// Logs go to stderr so the plan on stdout stays machine-readable.
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .compact()
                .init();
        }
    }
}

fn read_manifest<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_yaml::from_reader(file).with_context(|| format!("failed to parse {}", path.display()))
}

async fn list_cluster_nodes() -> Result<Vec<Node>> {
    debug!("Listing nodes from the current cluster");
    let client = Client::try_default().await?;
    let nodes: Api<Node> = Api::all(client);
    Ok(nodes.list(&ListParams::default()).await?.items)
}
