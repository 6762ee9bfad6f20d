/// Size of the fixed UDP header (src port, dst port, length, checksum).
pub const UDP_HEADER_SIZE: usize = 8;

/// IANA-assigned VXLAN destination port.
pub const VXLAN_PORT: u16 = 4789;

/// Reason code reported for nested tunnel segmentation, matching Linux `ENOSYS`.
pub const ENOSYS: i32 = 38;
