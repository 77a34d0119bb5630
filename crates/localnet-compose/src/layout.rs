//! Where each node's files live, on the host and inside its container.
//!
//! The artifact writers and the manifest builder both derive paths from
//! here, so the bind mount always points at the directory that was written.

use std::path::{Path, PathBuf};

pub const STAKING_DIR: &str = "staking";
pub const CERT_FILE: &str = "staker.crt";
pub const KEY_FILE: &str = "staker.key";
pub const NODE_CONFIG_FILE: &str = "config.json";
pub const GENESIS_FILE: &str = "genesis.json";
pub const CHAIN_CONFIG_FILE: &str = "config.json";

/// `configs/chains`, relative to a node directory or the container data dir
const CHAIN_CONFIG_ROOT: [&str; 2] = ["configs", "chains"];

/// Host-side paths of one node's tree under the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLayout {
    node_id: String,
    node_dir: PathBuf,
}

impl NodeLayout {
    pub fn new(output_root: &Path, node_id: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            node_dir: output_root.join(node_id),
        }
    }

    pub fn node_dir(&self) -> &Path {
        &self.node_dir
    }

    pub fn staking_dir(&self) -> PathBuf {
        self.node_dir.join(STAKING_DIR)
    }

    pub fn cert_path(&self) -> PathBuf {
        self.staking_dir().join(CERT_FILE)
    }

    pub fn key_path(&self) -> PathBuf {
        self.staking_dir().join(KEY_FILE)
    }

    pub fn node_config_path(&self) -> PathBuf {
        self.node_dir.join(NODE_CONFIG_FILE)
    }

    pub fn genesis_path(&self) -> PathBuf {
        self.node_dir.join(GENESIS_FILE)
    }

    pub fn chain_config_dir(&self, alias: &str) -> PathBuf {
        CHAIN_CONFIG_ROOT
            .iter()
            .fold(self.node_dir.clone(), |dir, part| dir.join(part))
            .join(alias)
    }

    pub fn chain_config_path(&self, alias: &str) -> PathBuf {
        self.chain_config_dir(alias).join(CHAIN_CONFIG_FILE)
    }

    /// Bind-mount source as written in the manifest, relative to the
    /// manifest's own directory (the output root).
    pub fn volume_source(&self) -> String {
        format!("./{}", self.node_id)
    }
}

/// Container-side paths, rooted at the node's data dir mount point.
#[derive(Debug, Clone, Copy)]
pub struct ContainerPaths<'a> {
    data_dir: &'a str,
}

impl<'a> ContainerPaths<'a> {
    pub fn new(data_dir: &'a str) -> Self {
        Self {
            data_dir: data_dir.trim_end_matches('/'),
        }
    }

    pub fn data_dir(&self) -> &str {
        self.data_dir
    }

    pub fn node_config(&self) -> String {
        format!("{}/{}", self.data_dir, NODE_CONFIG_FILE)
    }

    pub fn genesis(&self) -> String {
        format!("{}/{}", self.data_dir, GENESIS_FILE)
    }

    pub fn chain_config_dir(&self) -> String {
        format!("{}/{}", self.data_dir, CHAIN_CONFIG_ROOT.join("/"))
    }
}
