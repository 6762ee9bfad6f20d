//! Receive-side tunnel metadata: outer UDP ports and checksum flag.

use std::net::IpAddr;

use smoltcp::wire::{Ipv4Packet, Ipv6Packet};
use tracing::warn;

use crate::constants::UDP_HEADER_SIZE;
use crate::key::{TunnelFlags, TunnelKey};
use crate::packet::{GsoType, Packet};
use crate::udp::UdpHeader;

/// Merges the outer UDP header of a decapsulated packet into its tunnel key.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngressKeyMerger;

impl IngressKeyMerger {
    pub fn new() -> Self {
        Self
    }

    /// Copy ports from the UDP header at the packet's transport offset and set
    /// `CSUM` if the header carries a checksum. Other flags are left alone.
    pub fn merge(&self, packet: &Packet, key: &mut TunnelKey) {
        self.merge_at(packet.data(), packet.transport_offset(), key);
    }

    pub fn merge_at(&self, buf: &[u8], offset: usize, key: &mut TunnelKey) {
        // Upstream has validated the header; a short buffer here is a bug there.
        let hdr = match UdpHeader::parse_at(buf, offset) {
            Ok(hdr) => hdr,
            Err(e) => {
                warn!("Tunnel key merge skipped: {}", e);
                return;
            }
        };

        key.tp_src = hdr.src_port;
        key.tp_dst = hdr.dst_port;
        if hdr.has_checksum() {
            key.flags.insert(TunnelFlags::CSUM);
        }
    }

    /// Build the receive key for `packet` from its outer IP and UDP headers.
    ///
    /// Returns `None` if the outer IP header at the network offset is not a
    /// valid IPv4 or IPv6 header.
    pub fn rx_key(&self, packet: &Packet, flags: TunnelFlags, tun_id: u64) -> Option<TunnelKey> {
        let ip = packet.data().get(packet.network_offset()..)?;
        let mut key = outer_ip_key(ip)?;
        key.tun_id = tun_id;
        key.flags = flags;
        self.merge(packet, &mut key);
        Some(key)
    }

    /// Tag a GRO-merged packet with the tunnel GSO type matching its outer
    /// checksum. `nhoff` is the offset just past the UDP header.
    pub fn gro_complete(&self, packet: &mut Packet, nhoff: usize) {
        let Some(offset) = nhoff.checked_sub(UDP_HEADER_SIZE) else {
            warn!("GRO complete: offset {} precedes UDP header", nhoff);
            return;
        };
        let hdr = match UdpHeader::parse_at(packet.data(), offset) {
            Ok(hdr) => hdr,
            Err(e) => {
                warn!("GRO complete skipped: {}", e);
                return;
            }
        };

        packet.add_gso_type(if hdr.has_checksum() {
            GsoType::UDP_TUNNEL_CSUM
        } else {
            GsoType::UDP_TUNNEL
        });
    }
}

fn outer_ip_key(buffer: &[u8]) -> Option<TunnelKey> {
    let version = buffer.first()? >> 4;
    match version {
        4 => {
            let ip = Ipv4Packet::new_checked(buffer).ok()?;
            Some(TunnelKey {
                src: IpAddr::V4(ip.src_addr().into()),
                dst: IpAddr::V4(ip.dst_addr().into()),
                tos: (ip.dscp() << 2) | ip.ecn(),
                ttl: ip.hop_limit(),
                ..Default::default()
            })
        }
        6 => {
            let ip = Ipv6Packet::new_checked(buffer).ok()?;
            Some(TunnelKey {
                src: IpAddr::V6(ip.src_addr().into()),
                dst: IpAddr::V6(ip.dst_addr().into()),
                tos: ip.traffic_class(),
                ttl: ip.hop_limit(),
                label: ip.flow_label(),
                ..Default::default()
            })
        }
        _ => None,
    }
}
