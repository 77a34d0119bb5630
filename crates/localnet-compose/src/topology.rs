//! Deterministic address, port and bootstrap assignment.
//!
//! Every fact is a pure function of a participant's ordinal: its position in
//! the combined run order (validators first, then archive nodes). Facts are
//! computed for the whole roster before anything touches the filesystem.

use crate::error::{ComposeError, ComposeResult};
use crate::roster::{Participant, Role};
use localnet_config::{GeneratorConfig, Subnet};
use std::net::{Ipv4Addr, SocketAddrV4};

/// Offset of ordinal 0 inside the subnet; `.0` is the network, `.1` the gateway.
pub const FIRST_HOST_OFFSET: u64 = 2;

/// Host ports consumed per node: API, then peer.
pub const PORT_STRIDE: u32 = 2;

/// Address of the node at `ordinal`.
pub fn address(subnet: &Subnet, ordinal: usize) -> ComposeResult<Ipv4Addr> {
    subnet
        .host(ordinal as u64 + FIRST_HOST_OFFSET)
        .ok_or(ComposeError::RosterTooLarge {
            participants: ordinal + 1,
            subnet: *subnet,
            capacity: subnet.host_capacity(),
        })
}

/// Host-side ports published for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostPorts {
    pub api: u16,
    pub peer: u16,
}

/// Host ports of the node at `ordinal`: `base + 2i` and `base + 2i + 1`.
pub fn ports(base: u16, ordinal: usize) -> ComposeResult<HostPorts> {
    let api = u64::from(base) + ordinal as u64 * u64::from(PORT_STRIDE);
    let peer = api + 1;

    if peer > u64::from(u16::MAX) {
        return Err(ComposeError::PortRangeExhausted {
            ordinal,
            port: peer.min(u64::from(u32::MAX)) as u32,
        });
    }

    Ok(HostPorts {
        api: api as u16,
        peer: peer as u16,
    })
}

/// The node others join through, addressed on the virtual network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPeer {
    pub node_id: String,
    pub address: SocketAddrV4,
}

/// Ordinal 0 bootstraps from nothing; everyone else from `genesis`.
pub fn bootstrap(ordinal: usize, genesis: &BootstrapPeer) -> Option<BootstrapPeer> {
    if ordinal == 0 {
        None
    } else {
        Some(genesis.clone())
    }
}

/// Everything the writers and the manifest need to agree on for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyFact {
    pub ordinal: usize,
    pub node_id: String,
    pub role: Role,
    pub ip: Ipv4Addr,
    pub host_ports: HostPorts,
    pub bootstrap: Option<BootstrapPeer>,
}

impl TopologyFact {
    pub fn is_bootstrap_node(&self) -> bool {
        self.bootstrap.is_none()
    }

    /// Value of the node config's `bootstrap-ids` field
    pub fn bootstrap_ids(&self) -> String {
        self.bootstrap
            .as_ref()
            .map(|peer| peer.node_id.clone())
            .unwrap_or_default()
    }

    /// Value of the node config's `bootstrap-ips` field
    pub fn bootstrap_ips(&self) -> String {
        self.bootstrap
            .as_ref()
            .map(|peer| peer.address.to_string())
            .unwrap_or_default()
    }
}

/// Topology facts for one run, in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    facts: Vec<TopologyFact>,
}

impl Topology {
    /// Assign every participant its address, host ports and bootstrap peer.
    ///
    /// Fails without side effects when the roster does not fit the subnet or
    /// the host port range.
    pub fn plan(config: &GeneratorConfig, participants: &[&Participant]) -> ComposeResult<Self> {
        let subnet = &config.network.subnet;

        let genesis = match participants.first() {
            Some(first) if first.role() == Role::Validator => first,
            Some(first) => {
                return Err(ComposeError::InvalidRoster(format!(
                    "bootstrap node {} must be a validator",
                    first.node_id()
                )))
            }
            None => {
                return Err(ComposeError::InvalidRoster(
                    "no participants to place".to_string(),
                ))
            }
        };

        if participants.len() > subnet.host_capacity() {
            return Err(ComposeError::RosterTooLarge {
                participants: participants.len(),
                subnet: *subnet,
                capacity: subnet.host_capacity(),
            });
        }

        let genesis_peer = BootstrapPeer {
            node_id: genesis.node_id().to_string(),
            address: SocketAddrV4::new(address(subnet, 0)?, config.ports.staking_port),
        };

        let facts = participants
            .iter()
            .enumerate()
            .map(|(ordinal, participant)| -> ComposeResult<TopologyFact> {
                Ok(TopologyFact {
                    ordinal,
                    node_id: participant.node_id().to_string(),
                    role: participant.role(),
                    ip: address(subnet, ordinal)?,
                    host_ports: ports(config.ports.host_base, ordinal)?,
                    bootstrap: bootstrap(ordinal, &genesis_peer),
                })
            })
            .collect::<ComposeResult<Vec<_>>>()?;

        Ok(Self { facts })
    }

    pub fn facts(&self) -> &[TopologyFact] {
        &self.facts
    }

    pub fn iter(&self) -> impl Iterator<Item = &TopologyFact> {
        self.facts.iter()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn get(&self, node_id: &str) -> Option<&TopologyFact> {
        self.facts.iter().find(|fact| fact.node_id == node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn genesis_peer() -> BootstrapPeer {
        BootstrapPeer {
            node_id: "NodeID-genesis".to_string(),
            address: SocketAddrV4::new(Ipv4Addr::new(10, 0, 7, 2), 9651),
        }
    }

    fn participants(validators: usize, archives: usize) -> Vec<Participant> {
        (0..validators)
            .map(|i| Participant::new(format!("v{}", i), Role::Validator, vec![1], vec![2], 1))
            .chain((0..archives).map(|i| {
                Participant::new(format!("a{}", i), Role::Archive, vec![1], vec![2], 0)
            }))
            .collect()
    }

    #[test]
    fn test_first_addresses() {
        let subnet = Subnet::default();
        assert_eq!(address(&subnet, 0).unwrap(), Ipv4Addr::new(10, 0, 7, 2));
        assert_eq!(address(&subnet, 4).unwrap(), Ipv4Addr::new(10, 0, 7, 6));
        assert_eq!(address(&subnet, 252).unwrap(), Ipv4Addr::new(10, 0, 7, 254));
    }

    #[test]
    fn test_address_beyond_capacity() {
        let subnet = Subnet::default();
        let err = address(&subnet, 253).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::RosterTooLarge {
                participants: 254,
                capacity: 253,
                ..
            }
        ));
    }

    #[test]
    fn test_port_stride() {
        assert_eq!(ports(9650, 0).unwrap(), HostPorts { api: 9650, peer: 9651 });
        assert_eq!(ports(9650, 4).unwrap(), HostPorts { api: 9658, peer: 9659 });
    }

    #[test]
    fn test_port_overflow() {
        assert!(ports(65533, 0).is_ok());
        assert!(matches!(
            ports(65533, 1),
            Err(ComposeError::PortRangeExhausted { ordinal: 1, port: 65536 })
        ));
    }

    #[test]
    fn test_bootstrap_policy() {
        let genesis = genesis_peer();
        assert_eq!(bootstrap(0, &genesis), None);
        assert_eq!(bootstrap(1, &genesis), Some(genesis.clone()));
        assert_eq!(bootstrap(200, &genesis), Some(genesis));
    }

    #[test]
    fn test_plan_star_topology() {
        let config = GeneratorConfig::default();
        let roster = participants(3, 2);
        let refs: Vec<_> = roster.iter().collect();

        let topology = Topology::plan(&config, &refs).unwrap();

        assert_eq!(topology.len(), 5);
        let first = &topology.facts()[0];
        assert!(first.is_bootstrap_node());
        assert_eq!(first.bootstrap_ids(), "");
        assert_eq!(first.bootstrap_ips(), "");

        for fact in topology.iter().skip(1) {
            assert_eq!(fact.bootstrap_ids(), "v0");
            assert_eq!(fact.bootstrap_ips(), "10.0.7.2:9651");
        }

        let archive = topology.get("a1").unwrap();
        assert_eq!(archive.ordinal, 4);
        assert_eq!(archive.role, Role::Archive);
        assert_eq!(archive.ip, Ipv4Addr::new(10, 0, 7, 6));
        assert_eq!(archive.host_ports, HostPorts { api: 9658, peer: 9659 });
    }

    #[test]
    fn test_plan_rejects_oversized_roster() {
        let mut config = GeneratorConfig::default();
        config.network.subnet = "10.0.7.0/29".parse().unwrap();
        let roster = participants(6, 0);
        let refs: Vec<_> = roster.iter().collect();

        assert!(matches!(
            Topology::plan(&config, &refs),
            Err(ComposeError::RosterTooLarge {
                participants: 6,
                capacity: 5,
                ..
            })
        ));

        assert!(Topology::plan(&config, &refs[..5]).is_ok());
    }

    #[test]
    fn test_plan_requires_validator_first() {
        let config = GeneratorConfig::default();
        let roster = participants(0, 1);
        let refs: Vec<_> = roster.iter().collect();

        assert!(matches!(
            Topology::plan(&config, &refs),
            Err(ComposeError::InvalidRoster(_))
        ));
        assert!(Topology::plan(&config, &[]).is_err());
    }

    proptest! {
        #[test]
        fn prop_addresses_distinct_and_increasing(n in 1usize..=253) {
            let subnet = Subnet::default();
            let addresses: Vec<_> = (0..n).map(|i| address(&subnet, i).unwrap()).collect();

            prop_assert_eq!(addresses[0], Ipv4Addr::new(10, 0, 7, 2));
            for pair in addresses.windows(2) {
                prop_assert_eq!(u32::from(pair[1]), u32::from(pair[0]) + 1);
            }
        }

        #[test]
        fn prop_ports_never_collide(base in 1024u16..20000, n in 1usize..200) {
            let mut seen = HashSet::new();
            let mut previous_api = None;
            for ordinal in 0..n {
                let host = ports(base, ordinal).unwrap();
                prop_assert_eq!(host.api % 2, base % 2);
                prop_assert!(seen.insert(host.api));
                prop_assert!(seen.insert(host.peer));
                if let Some(previous) = previous_api {
                    prop_assert!(previous < host.api);
                }
                previous_api = Some(host.api);
            }
        }

        #[test]
        fn prop_bootstrap_only_empty_for_first(ordinal in 0usize..1000) {
            let genesis = genesis_peer();
            let resolved = bootstrap(ordinal, &genesis);
            prop_assert_eq!(resolved.is_none(), ordinal == 0);
            if let Some(peer) = resolved {
                prop_assert_eq!(peer, genesis);
            }
        }
    }
}
