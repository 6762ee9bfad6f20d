use serde::{Deserialize, Serialize};

/// Runtime offload behavior, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OffloadPolicy {
    /// Collapse non-VXLAN tunnel GSO types to zero for consumers built
    /// against the older type numbering, which had no UDP tunnel sub-types.
    pub legacy_type_collapse: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

/// Transmit checksum settings of a UDP tunnel port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UdpPortConfig {
    pub family: AddressFamily,
    pub use_udp_checksums: bool,
    pub use_udp6_tx_checksums: bool,
}

impl Default for UdpPortConfig {
    fn default() -> Self {
        Self {
            family: AddressFamily::Ipv4,
            use_udp_checksums: false,
            use_udp6_tx_checksums: false,
        }
    }
}

impl UdpPortConfig {
    /// Whether outbound packets on this port carry a UDP checksum.
    pub fn tx_checksum(&self) -> bool {
        match self.family {
            AddressFamily::Ipv4 => self.use_udp_checksums,
            AddressFamily::Ipv6 => self.use_udp6_tx_checksums,
        }
    }
}
