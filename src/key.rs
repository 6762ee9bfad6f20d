use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{BitOr, BitOrAssign};

/// Tunnel flag bits, numbered like the datapath's `TUNNEL_*` flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TunnelFlags(u16);

impl TunnelFlags {
    pub const NONE: TunnelFlags = TunnelFlags(0);
    /// Outer UDP checksum was present on receive / is wanted on transmit.
    pub const CSUM: TunnelFlags = TunnelFlags(0x01);
    pub const KEY: TunnelFlags = TunnelFlags(0x04);
    pub const DONT_FRAGMENT: TunnelFlags = TunnelFlags(0x0100);
    pub const OAM: TunnelFlags = TunnelFlags(0x0200);
    pub const GENEVE_OPT: TunnelFlags = TunnelFlags(0x0800);
    pub const VXLAN_OPT: TunnelFlags = TunnelFlags(0x1000);

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: TunnelFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: TunnelFlags) {
        self.0 |= other.0;
    }
}

impl BitOr for TunnelFlags {
    type Output = TunnelFlags;

    fn bitor(self, rhs: TunnelFlags) -> TunnelFlags {
        TunnelFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for TunnelFlags {
    fn bitor_assign(&mut self, rhs: TunnelFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for TunnelFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TunnelFlags({:#06x})", self.0)
    }
}

/// Identifies one tunnel flow for downstream dispatch.
///
/// The IP-layer fields are filled from the outer header before the UDP stage
/// runs. `tp_src`, `tp_dst` and the `CSUM` flag belong to the UDP stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TunnelKey {
    pub tun_id: u64,
    pub src: IpAddr,
    pub dst: IpAddr,
    pub tos: u8,
    pub ttl: u8,
    /// IPv6 flow label; zero for IPv4.
    pub label: u32,
    pub tp_src: u16,
    pub tp_dst: u16,
    pub flags: TunnelFlags,
}

impl Default for TunnelKey {
    fn default() -> Self {
        Self {
            tun_id: 0,
            src: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            dst: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            tos: 0,
            ttl: 0,
            label: 0,
            tp_src: 0,
            tp_dst: 0,
            flags: TunnelFlags::NONE,
        }
    }
}
