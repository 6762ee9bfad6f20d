//! Transmit-side GSO preparation for UDP-encapsulated packets.
//!
//! Before a packet goes to the generic segmentation engine it gets a tunnel
//! GSO type and a post-segmentation fix-up, so each resulting segment has its
//! outer UDP length and checksum repaired. Packets that already carry
//! encapsulated GSO metadata are dropped here: the engine cannot segment a
//! tunnel inside a tunnel.

use tracing::{debug, trace};

use crate::config::{OffloadPolicy, UdpPortConfig};
use crate::error::PrepareError;
use crate::packet::{BufferRelease, Discard, GsoType, Packet};
use crate::policy::{effective_gso_type, select_fixup};

/// Post-segmentation repair applied by the engine to every segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixupKind {
    /// Rewrite the outer UDP length, leave the checksum at zero.
    Plain,
    /// Rewrite the outer UDP length and recompute its checksum.
    Checksummed,
}

/// What the engine needs to segment one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationDescriptor {
    pub gso_type: GsoType,
    pub fixup: FixupKind,
}

/// The generic segmentation engine. It owns the fix-up routines and looks
/// them up by [`FixupKind`].
pub trait SegmentationEngine {
    type Output;
    type Error;

    fn handle_offloads(
        &self,
        packet: Packet,
        checksummed: bool,
        descriptor: SegmentationDescriptor,
    ) -> Result<Self::Output, Self::Error>;
}

pub struct OffloadPreparer<G, R = Discard> {
    engine: G,
    policy: OffloadPolicy,
    release: R,
}

impl<G: SegmentationEngine> OffloadPreparer<G, Discard> {
    pub fn new(engine: G, policy: OffloadPolicy) -> Self {
        Self::with_release(engine, policy, Discard)
    }
}

impl<G: SegmentationEngine, R: BufferRelease> OffloadPreparer<G, R> {
    pub fn with_release(engine: G, policy: OffloadPolicy, release: R) -> Self {
        Self {
            engine,
            policy,
            release,
        }
    }

    /// Tag `packet` for UDP tunnel segmentation and pass it to the engine.
    ///
    /// The engine's result is returned as is. On
    /// [`PrepareError::NestedEncapsulation`] the packet buffer has been
    /// released already.
    pub fn prepare(
        &self,
        packet: Packet,
        use_checksum: bool,
        base_type: GsoType,
        is_vxlan: bool,
    ) -> Result<G::Output, PrepareError<G::Error>> {
        if packet.requires_segmentation() && packet.is_encapsulated() {
            debug!(
                "Dropping nested tunnel GSO packet: len={}, gso_type={:?}",
                packet.len(),
                packet.gso_type()
            );
            self.release.release(packet.into_buffer());
            return Err(PrepareError::NestedEncapsulation);
        }

        let descriptor = self.descriptor(use_checksum, base_type, is_vxlan);
        trace!(?descriptor, use_checksum, "Handing packet to GSO engine");

        self.engine
            .handle_offloads(packet, use_checksum, descriptor)
            .map_err(PrepareError::Engine)
    }

    /// [`prepare`](Self::prepare) with the checksum mode taken from the port.
    pub fn prepare_for_port(
        &self,
        packet: Packet,
        port: &UdpPortConfig,
        base_type: GsoType,
        is_vxlan: bool,
    ) -> Result<G::Output, PrepareError<G::Error>> {
        self.prepare(packet, port.tx_checksum(), base_type, is_vxlan)
    }

    pub fn descriptor(
        &self,
        use_checksum: bool,
        base_type: GsoType,
        is_vxlan: bool,
    ) -> SegmentationDescriptor {
        SegmentationDescriptor {
            gso_type: effective_gso_type(
                base_type,
                use_checksum,
                is_vxlan,
                self.policy.legacy_type_collapse,
            ),
            fixup: select_fixup(use_checksum),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AddressFamily;
    use bytes::BytesMut;
    use std::cell::Cell;
    use thiserror::Error;

    #[derive(Debug)]
    struct Handed {
        packet: Packet,
        checksummed: bool,
        descriptor: SegmentationDescriptor,
    }

    struct EchoEngine;

    impl SegmentationEngine for EchoEngine {
        type Output = Handed;
        type Error = std::convert::Infallible;

        fn handle_offloads(
            &self,
            packet: Packet,
            checksummed: bool,
            descriptor: SegmentationDescriptor,
        ) -> Result<Handed, Self::Error> {
            Ok(Handed {
                packet,
                checksummed,
                descriptor,
            })
        }
    }

    #[derive(Debug, PartialEq, Eq, Error)]
    #[error("no headroom for outer header: {0}")]
    struct NoHeadroom(usize);

    struct FailingEngine;

    impl SegmentationEngine for FailingEngine {
        type Output = ();
        type Error = NoHeadroom;

        fn handle_offloads(
            &self,
            packet: Packet,
            _checksummed: bool,
            _descriptor: SegmentationDescriptor,
        ) -> Result<(), NoHeadroom> {
            Err(NoHeadroom(packet.len()))
        }
    }

    #[derive(Default)]
    struct CountingRelease {
        count: Cell<usize>,
        bytes: Cell<usize>,
    }

    impl BufferRelease for &CountingRelease {
        fn release(&self, buffer: BytesMut) {
            self.count.set(self.count.get() + 1);
            self.bytes.set(self.bytes.get() + buffer.len());
        }
    }

    fn gso_packet(encapsulation: bool) -> Packet {
        Packet::new(BytesMut::from(&[0u8; 3000][..]))
            .with_gso(1400, GsoType::TCPV4)
            .with_encapsulation(encapsulation)
    }

    #[test]
    fn test_nested_encapsulation_rejected_and_released_once() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let release = CountingRelease::default();
        let preparer = OffloadPreparer::with_release(EchoEngine, OffloadPolicy::default(), &release);

        let err = preparer
            .prepare(gso_packet(true), true, GsoType::TCPV4, true)
            .unwrap_err();
        assert!(matches!(err, PrepareError::NestedEncapsulation));
        assert_eq!(err.errno(), Some(crate::constants::ENOSYS));
        assert_eq!(release.count.get(), 1);
        assert_eq!(release.bytes.get(), 3000);
    }

    #[test]
    fn test_encapsulated_without_gso_is_forwarded() {
        let release = CountingRelease::default();
        let preparer = OffloadPreparer::with_release(EchoEngine, OffloadPolicy::default(), &release);

        let pkt = Packet::new(BytesMut::from(&[0u8; 100][..])).with_encapsulation(true);
        let handed = preparer.prepare(pkt, false, GsoType::NONE, false).unwrap();
        assert_eq!(handed.packet.len(), 100);
        assert_eq!(release.count.get(), 0);
    }

    #[test]
    fn test_fixup_follows_checksum_mode() {
        let preparer = OffloadPreparer::new(EchoEngine, OffloadPolicy::default());

        let plain = preparer.prepare(gso_packet(false), false, GsoType::TCPV4, false).unwrap();
        assert_eq!(plain.descriptor.fixup, FixupKind::Plain);
        assert_eq!(plain.descriptor.gso_type, GsoType::TCPV4 | GsoType::UDP_TUNNEL);
        assert!(!plain.checksummed);

        let csum = preparer.prepare(gso_packet(false), true, GsoType::TCPV4, false).unwrap();
        assert_eq!(csum.descriptor.fixup, FixupKind::Checksummed);
        assert_eq!(csum.descriptor.gso_type, GsoType::TCPV4 | GsoType::UDP_TUNNEL_CSUM);
        assert!(csum.checksummed);
    }

    #[test]
    fn test_legacy_policy_zeroes_non_vxlan_type() {
        let policy = OffloadPolicy {
            legacy_type_collapse: true,
        };
        let preparer = OffloadPreparer::new(EchoEngine, policy);

        for use_checksum in [false, true] {
            let handed = preparer
                .prepare(gso_packet(false), use_checksum, GsoType::TCPV6, false)
                .unwrap();
            assert_eq!(handed.descriptor.gso_type, GsoType::NONE);
            // Fix-up selection is independent of the collapse rule.
            assert_eq!(handed.descriptor.fixup, select_fixup(use_checksum));
        }
    }

    #[test]
    fn test_legacy_policy_keeps_vxlan_checksum_bit() {
        let policy = OffloadPolicy {
            legacy_type_collapse: true,
        };
        let preparer = OffloadPreparer::new(EchoEngine, policy);

        let handed = preparer.prepare(gso_packet(false), true, GsoType::TCPV4, true).unwrap();
        assert!(handed.descriptor.gso_type.contains(GsoType::UDP_TUNNEL_CSUM));
        assert!(handed.descriptor.gso_type.contains(GsoType::TCPV4));
    }

    #[test]
    fn test_engine_checksum_flag_matches_descriptor() {
        let policy = OffloadPolicy {
            legacy_type_collapse: true,
        };
        let preparer = OffloadPreparer::new(EchoEngine, policy);

        for (use_checksum, is_vxlan) in [(false, false), (false, true), (true, false), (true, true)] {
            let handed = preparer
                .prepare(gso_packet(false), use_checksum, GsoType::TCPV4, is_vxlan)
                .unwrap();
            assert_eq!(handed.checksummed, use_checksum);
            assert_eq!(handed.descriptor.fixup == FixupKind::Checksummed, use_checksum);
            if is_vxlan {
                assert_eq!(
                    handed.descriptor.gso_type.contains(GsoType::UDP_TUNNEL_CSUM),
                    use_checksum
                );
            }
        }
    }

    #[test]
    fn test_engine_error_passes_through() {
        let preparer = OffloadPreparer::new(FailingEngine, OffloadPolicy::default());
        let err = preparer
            .prepare(gso_packet(false), false, GsoType::TCPV4, true)
            .unwrap_err();
        match err {
            PrepareError::Engine(e) => assert_eq!(e, NoHeadroom(3000)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_prepare_for_port_uses_family_checksum() {
        let preparer = OffloadPreparer::new(EchoEngine, OffloadPolicy::default());
        let port = UdpPortConfig {
            family: AddressFamily::Ipv6,
            use_udp_checksums: true,
            use_udp6_tx_checksums: false,
        };

        let handed = preparer
            .prepare_for_port(gso_packet(false), &port, GsoType::TCPV6, true)
            .unwrap();
        assert_eq!(handed.descriptor.fixup, FixupKind::Plain);
        assert!(handed.descriptor.gso_type.contains(GsoType::UDP_TUNNEL));
    }
}
