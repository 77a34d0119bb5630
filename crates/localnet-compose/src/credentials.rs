//! Staking certificate and key files.

use crate::error::{Artifact, ComposeError, ComposeResult};
use crate::layout::NodeLayout;
use crate::roster::Participant;
use localnet_utils::fs;
use tracing::debug;

/// Writes a node's staking certificate and key.
pub struct CredentialWriter;

impl CredentialWriter {
    /// Write `staker.crt` then `staker.key` into the node's staking directory
    /// and make both read-only.
    ///
    /// Permissions are only tightened once both files are complete, so a
    /// failed attempt never leaves a read-only partial file behind.
    pub fn write(layout: &NodeLayout, participant: &Participant) -> ComposeResult<()> {
        let node_id = participant.node_id();
        let cert_path = layout.cert_path();
        let key_path = layout.key_path();

        fs::ensure_dir(layout.staking_dir())
            .map_err(|source| ComposeError::artifact(node_id, Artifact::NodeDirectory, source))?;

        fs::write_file(&cert_path, participant.cert_bytes())
            .map_err(|source| ComposeError::artifact(node_id, Artifact::Certificate, source))?;
        fs::write_file(&key_path, participant.key_bytes())
            .map_err(|source| ComposeError::artifact(node_id, Artifact::PrivateKey, source))?;

        fs::set_read_only(&cert_path)
            .map_err(|source| ComposeError::artifact(node_id, Artifact::Certificate, source))?;
        fs::set_read_only(&key_path)
            .map_err(|source| ComposeError::artifact(node_id, Artifact::PrivateKey, source))?;

        debug!(node_id, path = %layout.staking_dir().display(), "wrote staking credentials");
        Ok(())
    }
}
