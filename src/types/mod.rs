//! Core type definitions using newtype patterns for type safety.
//!
//! These types prevent common logic errors by making invalid states unrepresentable
//! at compile time.

mod address;
mod port;
mod target;

pub use address::{is_valid_target_ip, parse_target_ip, AddressError, MacAddress, IPV4_LEN, MAC_LEN};
pub use port::{Port, PortError, PortRange, PortSpec, ProbePorts};
pub use target::ScanTarget;
