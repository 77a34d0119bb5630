//! One generator run: prepare the output root, materialize every node,
//! compose the manifest.

use crate::artifacts::NodeArtifactWriter;
use crate::credentials::CredentialWriter;
use crate::error::{ComposeError, ComposeResult};
use crate::layout::NodeLayout;
use crate::manifest::ManifestBuilder;
use crate::roster::{GenesisDocument, Participant, Roster};
use crate::topology::{Topology, TopologyFact};
use localnet_config::{FailurePolicy, GeneratorConfig};
use localnet_utils::fs;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Run phases, always entered in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    Materialize,
    Compose,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Prepare => write!(f, "prepare"),
            Phase::Materialize => write!(f, "materialize"),
            Phase::Compose => write!(f, "compose"),
        }
    }
}

/// A node that was left out of the deployment under the lenient policy.
#[derive(Debug)]
pub struct ParticipantFailure {
    pub node_id: String,
    pub error: ComposeError,
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunReport {
    pub manifest_path: PathBuf,
    /// Node IDs present in the manifest, in ordinal order
    pub materialized: Vec<String>,
    /// Lenient-mode failures; always empty under the strict policy
    pub failures: Vec<ParticipantFailure>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives a generator run from a validated configuration.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    config: GeneratorConfig,
}

impl Orchestrator {
    pub fn new(config: GeneratorConfig) -> ComposeResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Topology of the run without touching the filesystem.
    pub fn plan(&self, roster: &Roster) -> ComposeResult<Topology> {
        let participants = roster.select(self.config.archive_nodes)?;
        Topology::plan(&self.config, &participants)
    }

    /// Generate every node tree and the manifest.
    ///
    /// The topology is planned before the output root is touched, so
    /// configuration errors leave the filesystem as it was.
    pub fn run(&self, roster: &Roster) -> ComposeResult<RunReport> {
        let participants = roster.select(self.config.archive_nodes)?;
        let topology = Topology::plan(&self.config, &participants)?;

        info!(
            phase = %Phase::Prepare,
            output = %self.config.output_dir.display(),
            validators = roster.validators().len(),
            archive_nodes = self.config.archive_nodes,
            bootstrap = roster.bootstrap_node().node_id(),
            "starting run"
        );
        self.prepare()?;

        info!(
            phase = %Phase::Materialize,
            nodes = topology.len(),
            policy = %self.config.failure_policy,
            "writing node trees"
        );
        let (materialized, failures) =
            self.materialize(roster.genesis(), &participants, &topology)?;

        info!(phase = %Phase::Compose, services = materialized.len(), "building manifest");
        let builder = ManifestBuilder::new(&self.config);
        let manifest = builder.build(materialized.iter().copied())?;
        let manifest_path = self.config.manifest_path();
        builder.write(&manifest, &manifest_path)?;

        Ok(RunReport {
            manifest_path,
            materialized: materialized.iter().map(|fact| fact.node_id.clone()).collect(),
            failures,
        })
    }

    fn prepare(&self) -> ComposeResult<()> {
        let root = &self.config.output_dir;
        let prepare_err = |source: std::io::Error| ComposeError::Prepare {
            path: root.clone(),
            source,
        };

        if root.exists() {
            if !self.config.allow_override {
                return Err(ComposeError::OutputExists(root.clone()));
            }

            let cwd = std::env::current_dir().map_err(prepare_err)?;
            check_removable(root, &cwd)?;

            info!(path = %root.display(), "removing existing output");
            if root.is_dir() {
                std::fs::remove_dir_all(root).map_err(prepare_err)?;
            } else {
                std::fs::remove_file(root).map_err(prepare_err)?;
            }
        }

        fs::ensure_dir(root).map_err(prepare_err)
    }

    fn materialize<'t>(
        &self,
        genesis: &GenesisDocument,
        participants: &[&Participant],
        topology: &'t Topology,
    ) -> ComposeResult<(Vec<&'t TopologyFact>, Vec<ParticipantFailure>)> {
        let mut materialized = Vec::with_capacity(topology.len());
        let mut failures = Vec::new();

        for (participant, fact) in participants.iter().zip(topology.iter()) {
            match self.materialize_node(participant, fact, genesis) {
                Ok(()) => materialized.push(fact),
                Err(error) => match self.config.failure_policy {
                    FailurePolicy::Strict => return Err(error),
                    FailurePolicy::Lenient if fact.is_bootstrap_node() => {
                        return Err(ComposeError::BootstrapFailed {
                            node_id: fact.node_id.clone(),
                            source: Box::new(error),
                        });
                    }
                    FailurePolicy::Lenient => {
                        warn!(node_id = %fact.node_id, error = %error, "skipping node");
                        failures.push(ParticipantFailure {
                            node_id: fact.node_id.clone(),
                            error,
                        });
                    }
                },
            }
        }

        Ok((materialized, failures))
    }

    fn materialize_node(
        &self,
        participant: &Participant,
        fact: &TopologyFact,
        genesis: &GenesisDocument,
    ) -> ComposeResult<()> {
        let layout = NodeLayout::new(&self.config.output_dir, participant.node_id());

        CredentialWriter::write(&layout, participant)?;
        NodeArtifactWriter::new(&self.config).write(participant, fact, genesis)?;

        debug!(node_id = %fact.node_id, ordinal = fact.ordinal, "materialized node");
        Ok(())
    }
}

/// An override may not delete the filesystem root or the directory the
/// process runs in (or any of its ancestors).
fn check_removable(root: &Path, cwd: &Path) -> ComposeResult<()> {
    let target = root.canonicalize().map_err(|source| ComposeError::Prepare {
        path: root.to_path_buf(),
        source,
    })?;
    let cwd = cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf());

    if target.parent().is_none() || cwd.starts_with(&target) {
        return Err(ComposeError::UnsafeOverride(root.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Artifact;
    use crate::roster::Role;
    use serde_json::json;
    use tempfile::TempDir;

    fn roster(validators: usize) -> Roster {
        let validators = (0..validators)
            .map(|i| Participant::new(format!("v{}", i), Role::Validator, vec![1], vec![2], 1))
            .collect();
        Roster::new(GenesisDocument::new(json!({ "networkID": 54321 })), validators, vec![]).unwrap()
    }

    fn orchestrator(dir: &TempDir, policy: FailurePolicy) -> Orchestrator {
        let mut config = GeneratorConfig::default();
        config.output_dir = dir.path().join("out");
        config.failure_policy = policy;
        Orchestrator::new(config).unwrap()
    }

    /// Occupy `node_id`'s directory with a plain file so its writes fail.
    fn block_node(orchestrator: &Orchestrator, node_id: &str) {
        std::fs::create_dir_all(&orchestrator.config.output_dir).unwrap();
        std::fs::write(orchestrator.config.output_dir.join(node_id), b"").unwrap();
    }

    #[test]
    fn test_strict_policy_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir, FailurePolicy::Strict);
        let roster = roster(4);
        let topology = orchestrator.plan(&roster).unwrap();
        let participants = roster.select(0).unwrap();
        block_node(&orchestrator, "v2");

        let err = orchestrator
            .materialize(roster.genesis(), &participants, &topology)
            .unwrap_err();

        assert_eq!(err.node_id(), Some("v2"));
        assert!(!NodeLayout::new(&orchestrator.config.output_dir, "v3")
            .node_dir()
            .exists());
    }

    #[test]
    fn test_lenient_policy_collects_failures() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir, FailurePolicy::Lenient);
        let roster = roster(4);
        let topology = orchestrator.plan(&roster).unwrap();
        let participants = roster.select(0).unwrap();
        block_node(&orchestrator, "v2");

        let (materialized, failures) = orchestrator
            .materialize(roster.genesis(), &participants, &topology)
            .unwrap();

        let ids: Vec<_> = materialized.iter().map(|fact| fact.node_id.as_str()).collect();
        assert_eq!(ids, vec!["v0", "v1", "v3"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].node_id, "v2");
        assert_eq!(failures[0].error.failed_artifact(), Some(Artifact::NodeDirectory));
    }

    #[test]
    fn test_lenient_policy_still_needs_bootstrap_node() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir, FailurePolicy::Lenient);
        let roster = roster(3);
        let topology = orchestrator.plan(&roster).unwrap();
        let participants = roster.select(0).unwrap();
        block_node(&orchestrator, "v0");

        let err = orchestrator
            .materialize(roster.genesis(), &participants, &topology)
            .unwrap_err();

        assert!(matches!(err, ComposeError::BootstrapFailed { .. }));
        assert_eq!(err.node_id(), Some("v0"));
    }

    #[test]
    fn test_prepare_replaces_stray_file_with_override() {
        let dir = TempDir::new().unwrap();
        let mut config = GeneratorConfig::default();
        config.output_dir = dir.path().join("out");
        config.allow_override = true;
        std::fs::write(&config.output_dir, b"not a directory").unwrap();

        let orchestrator = Orchestrator::new(config).unwrap();
        orchestrator.prepare().unwrap();

        assert!(orchestrator.config.output_dir.is_dir());
    }

    #[test]
    fn test_override_never_removes_working_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("work").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        for cwd in [dir.path().to_path_buf(), dir.path().join("work"), nested.clone()] {
            assert!(matches!(
                check_removable(dir.path(), &cwd),
                Err(ComposeError::UnsafeOverride(_))
            ));
        }
        assert!(matches!(
            check_removable(Path::new("/"), &nested),
            Err(ComposeError::UnsafeOverride(_))
        ));

        assert!(check_removable(&dir.path().join("work"), dir.path()).is_ok());
        assert!(check_removable(&nested, &dir.path().join("work").join("..")).is_ok());
    }

    #[test]
    fn test_override_of_working_directory_keeps_contents() {
        let cwd = std::env::current_dir().unwrap();
        let mut config = GeneratorConfig::default();
        config.output_dir = PathBuf::from(".");
        config.allow_override = true;

        let err = Orchestrator::new(config).unwrap().prepare().unwrap_err();

        assert!(matches!(err, ComposeError::UnsafeOverride(_)));
        assert!(cwd.join("Cargo.toml").exists());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::Prepare.to_string(), "prepare");
        assert_eq!(Phase::Materialize.to_string(), "materialize");
        assert_eq!(Phase::Compose.to_string(), "compose");
    }
}
