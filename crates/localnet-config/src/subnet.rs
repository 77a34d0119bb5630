use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// IPv4 subnet of the virtual network the services are attached to.
///
/// Offset 0 is the network address, offset 1 the gateway and the last
/// address is broadcast; everything in between is assignable to nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subnet {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Subnet {
    /// Smallest subnet that still leaves one assignable host.
    pub const MAX_PREFIX_LEN: u8 = 30;

    /// Addresses that are never handed to nodes: network, gateway, broadcast.
    pub const RESERVED_ADDRESSES: u64 = 3;

    pub fn new(network: Ipv4Addr, prefix_len: u8) -> ConfigResult<Self> {
        let input = format!("{}/{}", network, prefix_len);

        if prefix_len > Self::MAX_PREFIX_LEN {
            return Err(ConfigError::InvalidSubnet {
                input,
                reason: format!("prefix length must be at most {}", Self::MAX_PREFIX_LEN),
            });
        }

        let subnet = Self {
            network,
            prefix_len,
        };
        if u32::from(network) & !subnet.mask() != 0 {
            return Err(ConfigError::InvalidSubnet {
                input,
                reason: "host bits must be zero".to_string(),
            });
        }

        Ok(subnet)
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Gateway address, always the first address after the network address.
    pub fn gateway(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) + 1)
    }

    /// Number of addresses that can be assigned to nodes.
    pub fn host_capacity(&self) -> usize {
        (self.size() - Self::RESERVED_ADDRESSES) as usize
    }

    /// Address at `offset` from the network address, if it is assignable.
    pub fn host(&self, offset: u64) -> Option<Ipv4Addr> {
        if offset < 2 || offset >= self.size() - 1 {
            return None;
        }
        Some(Ipv4Addr::from(u32::from(self.network) + offset as u32))
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & self.mask() == u32::from(self.network)
    }

    fn size(&self) -> u64 {
        1u64 << (32 - self.prefix_len)
    }

    fn mask(&self) -> u32 {
        if self.prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - self.prefix_len)
        }
    }
}

impl Default for Subnet {
    fn default() -> Self {
        Self {
            network: Ipv4Addr::new(10, 0, 7, 0),
            prefix_len: 24,
        }
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl FromStr for Subnet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidSubnet {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| invalid("expected CIDR notation such as 10.0.7.0/24"))?;
        let network: Ipv4Addr = addr.parse().map_err(|_| invalid("bad IPv4 address"))?;
        let prefix_len: u8 = prefix.parse().map_err(|_| invalid("bad prefix length"))?;

        Self::new(network, prefix_len)
    }
}

impl TryFrom<String> for Subnet {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subnet> for String {
    fn from(subnet: Subnet) -> Self {
        subnet.to_string()
    }
}
