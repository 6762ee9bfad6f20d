//! UDP tunnel offload - GSO preparation and tunnel key extraction for
//! UDP-encapsulated datapaths.
//!
//! Transmit: [`OffloadPreparer`] tags outgoing tunnel packets for the
//! segmentation engine. Receive: [`IngressKeyMerger`] folds the outer UDP
//! header into the packet's [`TunnelKey`].

pub mod config;
pub mod constants;
pub mod error;
pub mod ingress;
pub mod key;
pub mod offload;
pub mod packet;
pub mod policy;
pub mod udp;

pub use config::{AddressFamily, OffloadPolicy, UdpPortConfig};
pub use error::{HeaderError, PrepareError};
pub use ingress::IngressKeyMerger;
pub use key::{TunnelFlags, TunnelKey};
pub use offload::{FixupKind, OffloadPreparer, SegmentationDescriptor, SegmentationEngine};
pub use packet::{BufferRelease, Discard, GsoType, Packet};
pub use udp::UdpHeader;
