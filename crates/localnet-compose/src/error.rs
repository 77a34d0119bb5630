use localnet_config::{ConfigError, Subnet};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Files and directories written for a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    NodeDirectory,
    Certificate,
    PrivateKey,
    NodeConfig,
    Genesis,
    ChainConfig,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::NodeDirectory => write!(f, "node directory"),
            Artifact::Certificate => write!(f, "staking certificate"),
            Artifact::PrivateKey => write!(f, "staking key"),
            Artifact::NodeConfig => write!(f, "node config"),
            Artifact::Genesis => write!(f, "genesis"),
            Artifact::ChainConfig => write!(f, "chain config"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output directory {} already exists; enable override to replace it", .0.display())]
    OutputExists(PathBuf),

    #[error("Refusing to replace {}: it is the filesystem root or contains the working directory", .0.display())]
    UnsafeOverride(PathBuf),

    #[error("Roster of {participants} nodes does not fit in {subnet} ({capacity} assignable addresses)")]
    RosterTooLarge {
        participants: usize,
        subnet: Subnet,
        capacity: usize,
    },

    #[error("Host port range exhausted: node {ordinal} would need port {port}")]
    PortRangeExhausted { ordinal: usize, port: u32 },

    #[error("Invalid roster: {0}")]
    InvalidRoster(String),

    #[error("Failed to read network file {}: {source}", .path.display())]
    NetworkFileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse network file: {0}")]
    NetworkFileFormat(#[source] serde_json::Error),

    #[error("Failed to prepare output directory {}: {source}", .path.display())]
    Prepare {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {artifact} for node {node_id}: {source}")]
    Artifact {
        node_id: String,
        artifact: Artifact,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode {artifact} for node {node_id}: {source}")]
    Encode {
        node_id: String,
        artifact: Artifact,
        #[source]
        source: serde_json::Error,
    },

    #[error("Bootstrap node {node_id} could not be materialized: {source}")]
    BootstrapFailed {
        node_id: String,
        #[source]
        source: Box<ComposeError>,
    },

    #[error("Manifest conflict: {0}")]
    ManifestConflict(String),

    #[error("Manifest serialization error: {0}")]
    ManifestEncode(#[from] serde_yaml::Error),

    #[error("Failed to write manifest {}: {source}", .path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ComposeError {
    pub(crate) fn artifact(node_id: &str, artifact: Artifact, source: io::Error) -> Self {
        ComposeError::Artifact {
            node_id: node_id.to_string(),
            artifact,
            source,
        }
    }

    pub(crate) fn encode(node_id: &str, artifact: Artifact, source: serde_json::Error) -> Self {
        ComposeError::Encode {
            node_id: node_id.to_string(),
            artifact,
            source,
        }
    }

    /// Node the error is attributed to, for per-participant failures
    pub fn node_id(&self) -> Option<&str> {
        match self {
            ComposeError::Artifact { node_id, .. }
            | ComposeError::Encode { node_id, .. }
            | ComposeError::BootstrapFailed { node_id, .. } => Some(node_id),
            _ => None,
        }
    }

    /// Artifact that failed, for per-participant failures
    pub fn failed_artifact(&self) -> Option<Artifact> {
        match self {
            ComposeError::Artifact { artifact, .. } | ComposeError::Encode { artifact, .. } => {
                Some(*artifact)
            }
            ComposeError::BootstrapFailed { source, .. } => source.failed_artifact(),
            _ => None,
        }
    }
}

pub type ComposeResult<T> = Result<T, ComposeError>;
