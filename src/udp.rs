use smoltcp::wire::UdpPacket;

use crate::constants::UDP_HEADER_SIZE;
use crate::error::HeaderError;

/// Copy of the 8-byte UDP header, host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub length: u16,
    pub checksum: u16,
}

impl UdpHeader {
    /// Parse the header at `offset`. Only the fixed header is read; the length
    /// field is not checked against the buffer.
    pub fn parse_at(buf: &[u8], offset: usize) -> Result<Self, HeaderError> {
        let end = offset.saturating_add(UDP_HEADER_SIZE);
        if buf.len() < end {
            return Err(HeaderError::Truncated {
                needed: end,
                have: buf.len(),
            });
        }
        let udp = UdpPacket::new_unchecked(&buf[offset..end]);
        Ok(Self {
            src_port: udp.src_port(),
            dst_port: udp.dst_port(),
            length: udp.len(),
            checksum: udp.checksum(),
        })
    }

    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        Self::parse_at(buf, 0)
    }

    /// Write the header in network byte order at the start of `buf`.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<(), HeaderError> {
        if buf.len() < UDP_HEADER_SIZE {
            return Err(HeaderError::Truncated {
                needed: UDP_HEADER_SIZE,
                have: buf.len(),
            });
        }
        buf[0..2].copy_from_slice(&self.src_port.to_be_bytes());
        buf[2..4].copy_from_slice(&self.dst_port.to_be_bytes());
        buf[4..6].copy_from_slice(&self.length.to_be_bytes());
        buf[6..8].copy_from_slice(&self.checksum.to_be_bytes());
        Ok(())
    }

    pub fn has_checksum(&self) -> bool {
        self.checksum != 0
    }
}
