//! The docker-compose manifest wiring every node into one virtual network.

use crate::error::{ComposeError, ComposeResult};
use crate::layout::{ContainerPaths, NodeLayout};
use crate::topology::TopologyFact;
use localnet_config::{GeneratorConfig, Subnet};
use localnet_utils::fs;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::{debug, info};

/// String-keyed map that serializes in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert `key`, returning `false` when it is already present
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> bool {
        let key = key.into();
        if self.get(&key).is_some() {
            return false;
        }
        self.0.push((key, value));
        true
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map with string keys")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// Attachment of a service to a virtual network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceNetwork {
    pub ipv4_address: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub image: String,
    pub entrypoint: String,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub environment: OrderedMap<String>,
    pub volumes: Vec<String>,
    pub ports: Vec<String>,
    pub networks: OrderedMap<ServiceNetwork>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamConfig {
    pub subnet: Subnet,
    pub gateway: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipam {
    pub config: Vec<IpamConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub driver: String,
    pub ipam: Ipam,
}

/// Whole compose document. Services appear in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub services: OrderedMap<Service>,
    pub networks: OrderedMap<Network>,
}

impl Manifest {
    pub fn service(&self, node_id: &str) -> Option<&Service> {
        self.services.get(node_id)
    }

    pub fn to_yaml(&self) -> ComposeResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(content: &str) -> ComposeResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Builds the manifest from the same facts the artifact writers used.
pub struct ManifestBuilder<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> ManifestBuilder<'a> {
    pub const SCHEMA_VERSION: &'static str = "3";

    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// One service per fact, in the order given, plus the single virtual
    /// network they all share.
    ///
    /// Rejects facts that would put two services on the same name, address
    /// or host port, or an address outside the subnet.
    pub fn build<'f, I>(&self, facts: I) -> ComposeResult<Manifest>
    where
        I: IntoIterator<Item = &'f TopologyFact>,
    {
        let network = &self.config.network;
        let mut services = OrderedMap::new();
        let mut addresses = HashSet::new();
        let mut host_ports = HashSet::new();

        for fact in facts {
            if !network.subnet.contains(fact.ip) {
                return Err(ComposeError::ManifestConflict(format!(
                    "address {} of node {} is outside {}",
                    fact.ip, fact.node_id, network.subnet
                )));
            }

            if !addresses.insert(fact.ip) {
                return Err(ComposeError::ManifestConflict(format!(
                    "address {} assigned twice (node {})",
                    fact.ip, fact.node_id
                )));
            }

            for port in [fact.host_ports.api, fact.host_ports.peer] {
                if !host_ports.insert(port) {
                    return Err(ComposeError::ManifestConflict(format!(
                        "host port {} claimed twice (node {})",
                        port, fact.node_id
                    )));
                }
            }

            if !services.insert(fact.node_id.clone(), self.service(fact)) {
                return Err(ComposeError::ManifestConflict(format!(
                    "duplicate service {}",
                    fact.node_id
                )));
            }
        }

        let mut networks = OrderedMap::new();
        networks.insert(
            network.name.clone(),
            Network {
                driver: network.driver.clone(),
                ipam: Ipam {
                    config: vec![IpamConfig {
                        subnet: network.subnet,
                        gateway: network.subnet.gateway(),
                    }],
                },
            },
        );

        debug!(services = services.len(), network = %network.name, "built manifest");
        Ok(Manifest {
            version: Self::SCHEMA_VERSION.to_string(),
            services,
            networks,
        })
    }

    /// Serialize `manifest` and move it into place at `path` in one step.
    pub fn write(&self, manifest: &Manifest, path: &Path) -> ComposeResult<()> {
        let content = manifest.to_yaml()?;
        fs::write_atomic(path, content.as_bytes()).map_err(|source| {
            ComposeError::ManifestWrite {
                path: path.to_path_buf(),
                source,
            }
        })?;

        info!(path = %path.display(), services = manifest.services.len(), "wrote manifest");
        Ok(())
    }

    fn service(&self, fact: &TopologyFact) -> Service {
        let node = &self.config.node;
        let ports = &self.config.ports;
        let container = ContainerPaths::new(&node.data_dir);
        let layout = NodeLayout::new(&self.config.output_dir, &fact.node_id);

        let mut entrypoint = format!(
            "{} --config-file {} --genesis {}",
            node.binary,
            container.node_config(),
            container.genesis()
        );
        if self.config.chain.enabled {
            entrypoint.push_str(&format!(" --chain-config-dir {}", container.chain_config_dir()));
        }

        let mut environment = OrderedMap::new();
        for (key, value) in &self.config.service_environment {
            environment.insert(key.clone(), value.clone());
        }

        let mut networks = OrderedMap::new();
        networks.insert(
            self.config.network.name.clone(),
            ServiceNetwork {
                ipv4_address: fact.ip,
            },
        );

        Service {
            image: self.config.image.clone(),
            entrypoint,
            environment,
            volumes: vec![format!("{}:{}", layout.volume_source(), container.data_dir())],
            ports: vec![
                format!("{}:{}", fact.host_ports.api, ports.http_port),
                format!("{}:{}", fact.host_ports.peer, ports.staking_port),
            ],
            networks,
        }
    }
}
