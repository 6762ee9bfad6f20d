//! Segmentation type selection for UDP-encapsulated packets.
//!
//! Older consumers numbered GSO types without UDP tunnel sub-types. For them
//! anything except a VXLAN request goes out with a zero type tag, and the
//! engine works the type out from the packet itself.

use crate::offload::FixupKind;
use crate::packet::GsoType;

/// Tunnel bit for the requested checksum mode.
pub fn tunnel_gso_bit(use_checksum: bool) -> GsoType {
    if use_checksum {
        GsoType::UDP_TUNNEL_CSUM
    } else {
        GsoType::UDP_TUNNEL
    }
}

/// Type tag handed to the engine.
///
/// | legacy_type_collapse | is_vxlan | result                      |
/// |----------------------|----------|-----------------------------|
/// | false                | any      | `base \| tunnel bit`        |
/// | true                 | true     | `base \| tunnel bit`        |
/// | true                 | false    | `GsoType::NONE`             |
pub fn effective_gso_type(
    base: GsoType,
    use_checksum: bool,
    is_vxlan: bool,
    legacy_type_collapse: bool,
) -> GsoType {
    if legacy_type_collapse && !is_vxlan {
        return GsoType::NONE;
    }
    base | tunnel_gso_bit(use_checksum)
}

pub fn select_fixup(use_checksum: bool) -> FixupKind {
    if use_checksum {
        FixupKind::Checksummed
    } else {
        FixupKind::Plain
    }
}
