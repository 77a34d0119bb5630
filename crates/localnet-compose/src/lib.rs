//! Local network deployment generator
//!
//! Given a roster of participants (validators, then optional archive nodes)
//! and a shared genesis document, this crate assigns every node a virtual
//! network address, a pair of host ports and a bootstrap peer, writes one
//! directory per node (staking credentials, node config, genesis, chain
//! config) and composes a single manifest that runs the whole network.
//!
//! Topology is planned up front from each participant's ordinal, so the node
//! files and the manifest always describe the same network.

pub mod artifacts;
pub mod credentials;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod orchestrator;
pub mod roster;
pub mod topology;

pub use artifacts::{ChainConfigArtifact, NodeArtifactWriter, NodeConfigArtifact, WrittenArtifacts};
pub use credentials::CredentialWriter;
pub use error::{Artifact, ComposeError, ComposeResult};
pub use layout::{ContainerPaths, NodeLayout};
pub use manifest::{Manifest, ManifestBuilder, Service};
pub use orchestrator::{Orchestrator, ParticipantFailure, Phase, RunReport};
pub use roster::{GenesisDocument, Participant, Role, Roster};
pub use topology::{BootstrapPeer, HostPorts, Topology, TopologyFact};
