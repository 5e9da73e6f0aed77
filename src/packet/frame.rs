//! Ethernet frame construction and reply matching.
//!
//! Builders lay out ARP requests, ICMP echo requests and TCP SYN segments
//! through pnet's mutable packet views, then fill in checksums with the
//! crate's own checksum engine. Matchers read received frames through the
//! immutable views and pick out the replies each listener cares about.

use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::packet::icmp::echo_request::{IcmpCodes, MutableEchoRequestPacket};
use pnet::packet::icmp::IcmpTypes;
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::{Ipv4Flags, Ipv4Packet, MutableIpv4Packet};
use pnet::packet::tcp::{MutableTcpPacket, TcpFlags, TcpPacket};
use pnet::packet::Packet;
use std::net::Ipv4Addr;
use tracing::trace;

use super::checksum::{icmp_checksum, ip_checksum, pseudo_header, tcp_checksum};
use crate::error::{ScanError, ScanResult};
use crate::types::{MacAddress, IPV4_LEN, MAC_LEN};

pub const ETHERNET_HEADER_LEN: usize = 14;
pub const ARP_MESSAGE_LEN: usize = 28;
pub const IPV4_HEADER_LEN: usize = 20;
pub const ICMP_HEADER_LEN: usize = 8;
pub const TCP_HEADER_LEN: usize = 20;

/// Size of a built ARP request.
pub const ARP_FRAME_LEN: usize = ETHERNET_HEADER_LEN + ARP_MESSAGE_LEN;

/// Size of a built ICMP echo or TCP SYN frame, zero padded.
pub const IP_FRAME_LEN: usize = 64;

pub const IP_IDENTIFICATION: u16 = 10201;
pub const IP_TTL: u8 = 64;
/// DSCP 4, ECN 0: a TOS byte of 16 (minimize delay).
pub const IP_DSCP: u8 = 4;
pub const ICMP_ECHO_ID: u16 = 1000;
pub const SYN_WINDOW: u16 = 5840;

const IP_START: usize = ETHERNET_HEADER_LEN;
const L4_START: usize = ETHERNET_HEADER_LEN + IPV4_HEADER_LEN;

fn view_error(layer: &str) -> ScanError {
    ScanError::InvalidPacket(format!("buffer too small for {layer} header"))
}

fn write_ethernet(
    frame: &mut [u8],
    source: MacAddress,
    destination: MacAddress,
    ethertype: pnet::packet::ethernet::EtherType,
) -> ScanResult<()> {
    let mut eth = MutableEthernetPacket::new(frame).ok_or_else(|| view_error("ethernet"))?;
    eth.set_destination(destination.into());
    eth.set_source(source.into());
    eth.set_ethertype(ethertype);
    Ok(())
}

/// Fill the fixed IPv4 header fields and its checksum.
fn write_ipv4(
    frame: &mut [u8],
    source: Ipv4Addr,
    destination: Ipv4Addr,
    protocol: pnet::packet::ip::IpNextHeaderProtocol,
    payload_len: usize,
) -> ScanResult<()> {
    let mut ip = MutableIpv4Packet::new(&mut frame[IP_START..]).ok_or_else(|| view_error("ipv4"))?;
    ip.set_version(4);
    ip.set_header_length(5);
    ip.set_dscp(IP_DSCP);
    ip.set_ecn(0);
    ip.set_total_length((IPV4_HEADER_LEN + payload_len) as u16);
    ip.set_identification(IP_IDENTIFICATION);
    ip.set_flags(Ipv4Flags::DontFragment);
    ip.set_fragment_offset(0);
    ip.set_ttl(IP_TTL);
    ip.set_next_level_protocol(protocol);
    ip.set_source(source);
    ip.set_destination(destination);
    ip.set_checksum(0);
    let checksum = ip_checksum(ip.packet());
    ip.set_checksum(checksum);
    Ok(())
}

/// Build a broadcast ARP request asking who owns `target_ip`.
pub fn build_arp_request(
    source_mac: MacAddress,
    source_ip: Ipv4Addr,
    target_ip: Ipv4Addr,
) -> ScanResult<[u8; ARP_FRAME_LEN]> {
    let mut frame = [0u8; ARP_FRAME_LEN];
    write_ethernet(&mut frame, source_mac, MacAddress::BROADCAST, EtherTypes::Arp)?;

    let mut arp = MutableArpPacket::new(&mut frame[ETHERNET_HEADER_LEN..])
        .ok_or_else(|| view_error("arp"))?;
    arp.set_hardware_type(ArpHardwareTypes::Ethernet);
    arp.set_protocol_type(EtherTypes::Ipv4);
    arp.set_hw_addr_len(MAC_LEN as u8);
    arp.set_proto_addr_len(IPV4_LEN as u8);
    arp.set_operation(ArpOperations::Request);
    arp.set_sender_hw_addr(source_mac.into());
    arp.set_sender_proto_addr(source_ip);
    arp.set_target_hw_addr(MacAddress::ZERO.into());
    arp.set_target_proto_addr(target_ip);

    trace!(target = %target_ip, len = frame.len(), "built arp request");
    Ok(frame)
}

/// Build an ICMP echo request (id 1000, sequence 0, no payload).
pub fn build_icmp_echo(
    source_ip: Ipv4Addr,
    destination_ip: Ipv4Addr,
    source_mac: MacAddress,
    destination_mac: MacAddress,
) -> ScanResult<[u8; IP_FRAME_LEN]> {
    let mut frame = [0u8; IP_FRAME_LEN];
    write_ethernet(&mut frame, source_mac, destination_mac, EtherTypes::Ipv4)?;

    {
        let mut echo = MutableEchoRequestPacket::new(&mut frame[L4_START..])
            .ok_or_else(|| view_error("icmp"))?;
        echo.set_icmp_type(IcmpTypes::EchoRequest);
        echo.set_icmp_code(IcmpCodes::NoCode);
        echo.set_identifier(ICMP_ECHO_ID);
        echo.set_sequence_number(0);
        echo.set_checksum(0);
    }

    write_ipv4(
        &mut frame,
        source_ip,
        destination_ip,
        IpNextHeaderProtocols::Icmp,
        ICMP_HEADER_LEN,
    )?;

    let checksum = icmp_checksum(&frame[L4_START..]);
    frame[L4_START + 2..L4_START + 4].copy_from_slice(&checksum.to_be_bytes());

    trace!(target = %destination_ip, "built icmp echo request");
    Ok(frame)
}

/// Build a TCP SYN from `source_port` to `destination_port`.
pub fn build_tcp_syn(
    source_ip: Ipv4Addr,
    destination_ip: Ipv4Addr,
    source_mac: MacAddress,
    destination_mac: MacAddress,
    source_port: u16,
    destination_port: u16,
) -> ScanResult<[u8; IP_FRAME_LEN]> {
    let mut frame = [0u8; IP_FRAME_LEN];
    write_ethernet(&mut frame, source_mac, destination_mac, EtherTypes::Ipv4)?;
    write_ipv4(
        &mut frame,
        source_ip,
        destination_ip,
        IpNextHeaderProtocols::Tcp,
        TCP_HEADER_LEN,
    )?;

    // The pseudo-header is taken from the finished IP header.
    let pseudo = {
        let ip = Ipv4Packet::new(&frame[IP_START..]).ok_or_else(|| view_error("ipv4"))?;
        pseudo_header(
            ip.get_source().octets(),
            ip.get_destination().octets(),
            ip.get_next_level_protocol().0,
            TCP_HEADER_LEN as u16,
        )
    };

    let mut tcp =
        MutableTcpPacket::new(&mut frame[L4_START..]).ok_or_else(|| view_error("tcp"))?;
    tcp.set_source(source_port);
    tcp.set_destination(destination_port);
    tcp.set_sequence(0);
    tcp.set_acknowledgement(0);
    tcp.set_data_offset(5);
    tcp.set_reserved(0);
    tcp.set_flags(TcpFlags::SYN);
    tcp.set_window(SYN_WINDOW);
    tcp.set_urgent_ptr(0);
    tcp.set_checksum(0);
    let checksum = tcp_checksum(tcp.packet(), &pseudo);
    tcp.set_checksum(checksum);

    trace!(
        target = %destination_ip,
        source_port,
        port = destination_port,
        "built syn"
    );
    Ok(frame)
}

/// Return the sender MAC of an ARP reply from `target_ip` addressed to us.
pub fn match_arp_reply(
    frame: &[u8],
    local_mac: MacAddress,
    local_ip: Ipv4Addr,
    target_ip: Ipv4Addr,
) -> Option<MacAddress> {
    let eth = EthernetPacket::new(frame)?;
    if eth.get_ethertype() != EtherTypes::Arp
        || MacAddress::from(eth.get_destination()) != local_mac
    {
        return None;
    }

    let arp = ArpPacket::new(eth.payload())?;
    let addressed_to_us = arp.get_sender_proto_addr() == target_ip
        && arp.get_target_proto_addr() == local_ip
        && MacAddress::from(arp.get_target_hw_addr()) == local_mac;

    addressed_to_us.then(|| arp.get_sender_hw_addr().into())
}

/// Check whether `frame` is an ICMP packet from `target_ip` to us.
pub fn match_echo_reply(
    frame: &[u8],
    local_mac: MacAddress,
    local_ip: Ipv4Addr,
    target_ip: Ipv4Addr,
) -> bool {
    let Some(eth) = EthernetPacket::new(frame) else {
        return false;
    };
    if eth.get_ethertype() != EtherTypes::Ipv4
        || MacAddress::from(eth.get_destination()) != local_mac
    {
        return false;
    }

    Ipv4Packet::new(eth.payload()).is_some_and(|ip| {
        ip.get_next_level_protocol() == IpNextHeaderProtocols::Icmp
            && ip.get_source() == target_ip
            && ip.get_destination() == local_ip
    })
}

/// Return the remote port of a SYN-ACK from `target_ip` addressed to us.
///
/// Any segment with ACK set and RST clear counts.
pub fn match_syn_ack(frame: &[u8], local_mac: MacAddress, target_ip: Ipv4Addr) -> Option<u16> {
    let eth = EthernetPacket::new(frame)?;
    if eth.get_ethertype() != EtherTypes::Ipv4
        || MacAddress::from(eth.get_destination()) != local_mac
    {
        return None;
    }

    let ip = Ipv4Packet::new(eth.payload())?;
    if ip.get_source() != target_ip || ip.get_next_level_protocol() != IpNextHeaderProtocols::Tcp
    {
        return None;
    }

    let header_len = usize::from(ip.get_header_length()) * 4;
    if header_len < IPV4_HEADER_LEN {
        return None;
    }
    let tcp = TcpPacket::new(eth.payload().get(header_len..)?)?;

    let flags = tcp.get_flags();
    if flags & TcpFlags::ACK != 0 && flags & TcpFlags::RST == 0 {
        Some(tcp.get_source())
    } else {
        None
    }
}
