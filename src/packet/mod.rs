//! Packet engine: checksums, frame builders and reply matchers.

pub mod checksum;
pub mod frame;

pub use checksum::{icmp_checksum, ip_checksum, tcp_checksum};
pub use frame::{
    build_arp_request, build_icmp_echo, build_tcp_syn, match_arp_reply, match_echo_reply,
    match_syn_ack, ARP_FRAME_LEN, IP_FRAME_LEN,
};
