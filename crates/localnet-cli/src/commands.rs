//! CLI subcommand implementations.

use anyhow::{Context, Result};
use localnet_compose::{Orchestrator, Roster};
use localnet_config::{ConfigLoader, FileLoader, GeneratorConfig};
use std::path::Path;
use tracing::{info, warn};

use crate::RunArgs;

/// Defaults, then the config file, then `LOCALNET_*` variables, then flags.
fn load_config(args: &RunArgs) -> Result<GeneratorConfig> {
    let mut config = ConfigLoader::new()
        .layers(args.config.as_deref())
        .context("failed to load generator configuration")?;

    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(image) = &args.image {
        config.image = image.clone();
    }
    if let Some(archive_nodes) = args.archive_nodes {
        config.archive_nodes = archive_nodes;
    }
    if args.allow_override {
        config.allow_override = true;
    }
    if let Some(policy) = args.failure_policy {
        config.failure_policy = policy;
    }
    if let Some(subnet) = args.subnet {
        config.network.subnet = subnet;
    }

    config.validate().context("invalid generator configuration")?;
    Ok(config)
}

fn load_roster(path: &Path) -> Result<Roster> {
    Roster::load(path).with_context(|| format!("failed to read network file {}", path.display()))
}

pub fn generate(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    let roster = load_roster(&args.network_file)?;
    let orchestrator = Orchestrator::new(config)?;

    let report = orchestrator
        .run(&roster)
        .context("failed to generate deployment")?;

    for failure in &report.failures {
        warn!(node_id = %failure.node_id, error = %failure.error, "node left out of deployment");
    }
    info!(
        nodes = report.materialized.len(),
        skipped = report.failures.len(),
        "deployment generated"
    );

    println!("manifest: {}", report.manifest_path.display());
    println!("nodes: {}", report.materialized.len());
    if !report.is_complete() {
        println!("skipped: {}", report.failures.len());
        for failure in &report.failures {
            println!("  {}: {}", failure.node_id, failure.error);
        }
    }
    Ok(())
}

pub fn plan(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    let roster = load_roster(&args.network_file)?;
    let orchestrator = Orchestrator::new(config)?;
    let topology = orchestrator.plan(&roster).context("failed to plan topology")?;

    let config = orchestrator.config();
    println!("network: {} ({})", config.network.name, config.network.subnet);
    println!("output: {}", config.output_dir.display());
    println!(
        "{:<4} {:<44} {:<10} {:<15} {:<11} bootstrap",
        "#", "node", "role", "ip", "ports"
    );
    for fact in topology.iter() {
        let bootstrap = match &fact.bootstrap {
            Some(peer) => format!("{} @ {}", peer.node_id, peer.address),
            None => "-".to_string(),
        };
        println!(
            "{:<4} {:<44} {:<10} {:<15} {:<11} {}",
            fact.ordinal,
            fact.node_id,
            fact.role.to_string(),
            fact.ip.to_string(),
            format!("{}/{}", fact.host_ports.api, fact.host_ports.peer),
            bootstrap
        );
    }
    Ok(())
}

pub fn default_config(path: &Path) -> Result<()> {
    FileLoader::save_auto(&GeneratorConfig::default(), path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote default configuration to {}", path.display());
    Ok(())
}
