//! Packet buffer and the GSO metadata carried alongside it.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use bytes::BytesMut;

/// Segmentation type bits, laid out like Linux `SKB_GSO_*`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GsoType(u32);

impl GsoType {
    /// Neutral tag: the engine infers the type on its own.
    pub const NONE: GsoType = GsoType(0);
    pub const TCPV4: GsoType = GsoType(1 << 0);
    pub const DODGY: GsoType = GsoType(1 << 1);
    pub const TCP_ECN: GsoType = GsoType(1 << 2);
    pub const TCPV6: GsoType = GsoType(1 << 4);
    pub const GRE: GsoType = GsoType(1 << 6);
    pub const GRE_CSUM: GsoType = GsoType(1 << 7);
    pub const UDP_TUNNEL: GsoType = GsoType(1 << 10);
    pub const UDP_TUNNEL_CSUM: GsoType = GsoType(1 << 11);
    pub const UDP_L4: GsoType = GsoType(1 << 16);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: GsoType) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for GsoType {
    type Output = GsoType;

    fn bitor(self, rhs: GsoType) -> GsoType {
        GsoType(self.0 | rhs.0)
    }
}

impl BitOrAssign for GsoType {
    fn bitor_assign(&mut self, rhs: GsoType) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for GsoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GsoType({:#x})", self.0)
    }
}

/// A packet owned by exactly one pipeline stage at a time.
///
/// `gso_size != 0` means the packet is larger than the path MTU and must be
/// segmented. `encapsulation` is set once an outer tunnel header has been
/// accounted for in the GSO metadata.
#[derive(Debug)]
pub struct Packet {
    buffer: BytesMut,
    network_offset: usize,
    transport_offset: usize,
    gso_size: u16,
    gso_type: GsoType,
    encapsulation: bool,
}

impl Packet {
    pub fn new(buffer: BytesMut) -> Self {
        Self {
            buffer,
            network_offset: 0,
            transport_offset: 0,
            gso_size: 0,
            gso_type: GsoType::NONE,
            encapsulation: false,
        }
    }

    /// Record where the outer IP and UDP headers start.
    pub fn with_offsets(mut self, network_offset: usize, transport_offset: usize) -> Self {
        self.network_offset = network_offset;
        self.transport_offset = transport_offset;
        self
    }

    pub fn with_gso(mut self, gso_size: u16, gso_type: GsoType) -> Self {
        self.gso_size = gso_size;
        self.gso_type = gso_type;
        self
    }

    pub fn with_encapsulation(mut self, encapsulation: bool) -> Self {
        self.encapsulation = encapsulation;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn network_offset(&self) -> usize {
        self.network_offset
    }

    pub fn transport_offset(&self) -> usize {
        self.transport_offset
    }

    pub fn gso_size(&self) -> u16 {
        self.gso_size
    }

    pub fn gso_type(&self) -> GsoType {
        self.gso_type
    }

    pub(crate) fn add_gso_type(&mut self, bits: GsoType) {
        self.gso_type |= bits;
    }

    pub fn requires_segmentation(&self) -> bool {
        self.gso_size != 0
    }

    pub fn is_encapsulated(&self) -> bool {
        self.encapsulation
    }

    /// Give up the buffer, e.g. to hand it back to a pool.
    pub fn into_buffer(self) -> BytesMut {
        self.buffer
    }
}

/// Where rejected packet buffers go.
pub trait BufferRelease {
    fn release(&self, buffer: BytesMut);
}

/// Frees the buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl BufferRelease for Discard {
    fn release(&self, buffer: BytesMut) {
        drop(buffer);
    }
}
