//! Network participants as handed over by the network builder.

use crate::error::{ComposeError, ComposeResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Part a participant plays in the generated network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Staking node; the first validator is the bootstrap node
    Validator,
    /// Non-staking node that keeps full history
    Archive,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Validator => write!(f, "validator"),
            Role::Archive => write!(f, "archive"),
        }
    }
}

/// One network member with its identity and staking material.
#[derive(Clone, PartialEq, Eq)]
pub struct Participant {
    node_id: String,
    role: Role,
    cert_bytes: Vec<u8>,
    key_bytes: Vec<u8>,
    stake: u64,
}

impl Participant {
    pub fn new(
        node_id: impl Into<String>,
        role: Role,
        cert_bytes: Vec<u8>,
        key_bytes: Vec<u8>,
        stake: u64,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            role,
            cert_bytes,
            key_bytes,
            stake,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn cert_bytes(&self) -> &[u8] {
        &self.cert_bytes
    }

    pub fn key_bytes(&self) -> &[u8] {
        &self.key_bytes
    }

    pub fn stake(&self) -> u64 {
        self.stake
    }
}

// Keeps key material out of logs.
impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("node_id", &self.node_id)
            .field("role", &self.role)
            .field("cert_bytes", &self.cert_bytes.len())
            .field("key_bytes", &"<redacted>")
            .field("stake", &self.stake)
            .finish()
    }
}

/// Shared genesis document, copied unchanged into every node directory.
#[derive(Debug, Clone, PartialEq)]
pub struct GenesisDocument(Value);

impl GenesisDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Ordered set of participants plus the genesis they share.
///
/// Validators keep the builder's order; the first one is the bootstrap node.
/// Archive identities are only used when archive nodes are requested.
#[derive(Debug, Clone)]
pub struct Roster {
    version: String,
    genesis: GenesisDocument,
    validators: Vec<Participant>,
    archive_nodes: Vec<Participant>,
}

impl Roster {
    pub fn new(
        genesis: GenesisDocument,
        validators: Vec<Participant>,
        archive_nodes: Vec<Participant>,
    ) -> ComposeResult<Self> {
        let roster = Self {
            version: String::new(),
            genesis,
            validators,
            archive_nodes,
        };
        roster.validate()?;
        Ok(roster)
    }

    /// Parse the builder's network file
    pub fn from_json(content: &str) -> ComposeResult<Self> {
        let file: NetworkFile =
            serde_json::from_str(content).map_err(ComposeError::NetworkFileFormat)?;

        let validators = file
            .stakers
            .into_iter()
            .map(|record| record.into_participant(Role::Validator))
            .collect();
        let archive_nodes = file
            .archive_nodes
            .into_iter()
            .map(|record| record.into_participant(Role::Archive))
            .collect();

        let mut roster = Self::new(GenesisDocument::new(file.genesis_config), validators, archive_nodes)?;
        roster.version = file.version;
        Ok(roster)
    }

    /// Read and parse the builder's network file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> ComposeResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ComposeError::NetworkFileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let roster = Self::from_json(&content)?;
        debug!(
            path = %path.display(),
            validators = roster.validators.len(),
            archive_nodes = roster.archive_nodes.len(),
            "loaded network file"
        );
        Ok(roster)
    }

    /// Builder format version, empty when the roster was built in code
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn genesis(&self) -> &GenesisDocument {
        &self.genesis
    }

    pub fn validators(&self) -> &[Participant] {
        &self.validators
    }

    pub fn archive_nodes(&self) -> &[Participant] {
        &self.archive_nodes
    }

    /// The node every other node bootstraps from
    pub fn bootstrap_node(&self) -> &Participant {
        &self.validators[0]
    }

    /// Participants of one run: all validators, then the first
    /// `archive_count` archive identities.
    pub fn select(&self, archive_count: usize) -> ComposeResult<Vec<&Participant>> {
        if archive_count > self.archive_nodes.len() {
            return Err(ComposeError::InvalidRoster(format!(
                "{} archive nodes requested but the network file provides {}",
                archive_count,
                self.archive_nodes.len()
            )));
        }

        Ok(self
            .validators
            .iter()
            .chain(self.archive_nodes.iter().take(archive_count))
            .collect())
    }

    fn validate(&self) -> ComposeResult<()> {
        if self.validators.is_empty() {
            return Err(ComposeError::InvalidRoster(
                "at least one validator is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for participant in self.validators.iter().chain(self.archive_nodes.iter()) {
            let node_id = participant.node_id();
            validate_node_id(node_id)?;

            if !seen.insert(node_id) {
                return Err(ComposeError::InvalidRoster(format!(
                    "duplicate node id {}",
                    node_id
                )));
            }

            if participant.cert_bytes.is_empty() || participant.key_bytes.is_empty() {
                return Err(ComposeError::InvalidRoster(format!(
                    "node {} is missing its staking certificate or key",
                    node_id
                )));
            }
        }

        Ok(())
    }
}

/// Node IDs name a directory and a compose service, so they must be a single
/// path component made of characters both accept.
fn validate_node_id(node_id: &str) -> ComposeResult<()> {
    let valid_chars = node_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if node_id.is_empty() || node_id == "." || node_id == ".." || !valid_chars {
        return Err(ComposeError::InvalidRoster(format!(
            "node id '{}' cannot be used as a directory or service name",
            node_id
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NetworkFile {
    #[serde(default)]
    version: String,
    genesis_config: Value,
    stakers: Vec<StakerRecord>,
    #[serde(default)]
    archive_nodes: Vec<StakerRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StakerRecord {
    #[serde(rename = "NodeID")]
    node_id: String,
    #[serde(deserialize_with = "base64_bytes")]
    cert_bytes: Vec<u8>,
    #[serde(deserialize_with = "base64_bytes")]
    key_bytes: Vec<u8>,
    #[serde(default)]
    stake: u64,
}

impl StakerRecord {
    fn into_participant(self, role: Role) -> Participant {
        Participant::new(self.node_id, role, self.cert_bytes, self.key_bytes, self.stake)
    }
}

fn base64_bytes<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}
