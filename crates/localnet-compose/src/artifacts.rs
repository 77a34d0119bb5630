//! Node config, chain config and genesis files.

use crate::error::{Artifact, ComposeError, ComposeResult};
use crate::layout::NodeLayout;
use crate::roster::{GenesisDocument, Participant, Role};
use crate::topology::TopologyFact;
use localnet_config::GeneratorConfig;
use localnet_utils::fs;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::path::PathBuf;
use tracing::debug;

/// Pretty-print with tab indentation, the layout node operators expect.
pub fn to_tabbed_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Per-node `config.json`. Field order is the on-disk order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeConfigArtifact {
    pub data_dir: String,
    pub http_port: u16,
    pub staking_port: u16,
    pub http_host: String,
    pub public_ip: String,
    pub index_enabled: bool,
    pub api_admin_enabled: bool,
    pub log_display_level: String,
    pub log_level: String,
    pub network_id: u64,
    pub bootstrap_ips: String,
    pub bootstrap_ids: String,
}

impl NodeConfigArtifact {
    pub fn new(config: &GeneratorConfig, fact: &TopologyFact) -> Self {
        let node = &config.node;
        Self {
            data_dir: node.data_dir.clone(),
            http_port: config.ports.http_port,
            staking_port: config.ports.staking_port,
            http_host: node.http_host.clone(),
            public_ip: fact.ip.to_string(),
            index_enabled: node.index_enabled,
            api_admin_enabled: node.api_admin_enabled,
            log_display_level: node.log_display_level.clone(),
            log_level: node.log_level.clone(),
            network_id: node.network_id,
            bootstrap_ips: fact.bootstrap_ips(),
            bootstrap_ids: fact.bootstrap_ids(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        to_tabbed_json(self)
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Per-node sub-chain `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChainConfigArtifact {
    pub pruning_enabled: bool,
    pub allow_missing_tries: bool,
    pub offline_pruning_enabled: bool,
    pub offline_pruning_data_directory: String,
}

impl ChainConfigArtifact {
    /// Validators prune; archive nodes keep every trie and tolerate the ones
    /// a pruned history no longer has.
    pub fn for_role(role: Role, config: &GeneratorConfig) -> Self {
        let archive = role == Role::Archive;
        Self {
            pruning_enabled: !archive,
            allow_missing_tries: archive,
            offline_pruning_enabled: false,
            offline_pruning_data_directory: config.chain.offline_pruning_dir(&config.node.data_dir),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        to_tabbed_json(self)
    }
}

/// Paths written for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifacts {
    pub node_config: PathBuf,
    pub genesis: PathBuf,
    pub chain_config: Option<PathBuf>,
}

/// Writes the node config, the genesis copy and the chain config of a node.
pub struct NodeArtifactWriter<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> NodeArtifactWriter<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn write(
        &self,
        participant: &Participant,
        fact: &TopologyFact,
        genesis: &GenesisDocument,
    ) -> ComposeResult<WrittenArtifacts> {
        debug_assert_eq!(participant.node_id(), fact.node_id);

        let node_id = participant.node_id();
        let layout = NodeLayout::new(&self.config.output_dir, node_id);

        fs::ensure_dir(layout.node_dir())
            .map_err(|source| ComposeError::artifact(node_id, Artifact::NodeDirectory, source))?;

        let node_config = NodeConfigArtifact::new(self.config, fact)
            .to_json()
            .map_err(|source| ComposeError::encode(node_id, Artifact::NodeConfig, source))?;
        let node_config_path = layout.node_config_path();
        fs::write_file(&node_config_path, &node_config)
            .map_err(|source| ComposeError::artifact(node_id, Artifact::NodeConfig, source))?;

        let genesis_json = to_tabbed_json(genesis.as_value())
            .map_err(|source| ComposeError::encode(node_id, Artifact::Genesis, source))?;
        let genesis_path = layout.genesis_path();
        fs::write_file(&genesis_path, &genesis_json)
            .map_err(|source| ComposeError::artifact(node_id, Artifact::Genesis, source))?;

        let chain_config = if self.config.chain.enabled {
            Some(self.write_chain_config(&layout, participant)?)
        } else {
            None
        };

        debug!(node_id, role = %participant.role(), ip = %fact.ip, "wrote node artifacts");
        Ok(WrittenArtifacts {
            node_config: node_config_path,
            genesis: genesis_path,
            chain_config,
        })
    }

    fn write_chain_config(
        &self,
        layout: &NodeLayout,
        participant: &Participant,
    ) -> ComposeResult<PathBuf> {
        let node_id = participant.node_id();
        let settings = &self.config.chain;

        fs::ensure_dir(layout.chain_config_dir(&settings.alias))
            .map_err(|source| ComposeError::artifact(node_id, Artifact::ChainConfig, source))?;

        let content = ChainConfigArtifact::for_role(participant.role(), self.config)
            .to_json()
            .map_err(|source| ComposeError::encode(node_id, Artifact::ChainConfig, source))?;
        let path = layout.chain_config_path(&settings.alias);
        fs::write_file(&path, &content)
            .map_err(|source| ComposeError::artifact(node_id, Artifact::ChainConfig, source))?;

        Ok(path)
    }
}
