//! In-memory link for exercising resolver, prober and scanner without
//! privileges.
//!
//! Every frame handed to a [`SimLink`] sender is recorded and passed to a
//! responder closure; the frames it returns are delivered to each receiver
//! that was open at the time and is bound to the matching EtherType.

use pnet::packet::arp::ArpPacket;
use pnet::packet::ethernet::{EtherType, EtherTypes, EthernetPacket};
use pnet::packet::icmp::{IcmpPacket, IcmpTypes};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::tcp::{TcpFlags, TcpPacket};
use pnet::packet::Packet;
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ethertype_of, FrameReceiver, FrameSender, InterfaceInfo, Link};
use crate::config::ScanSettings;
use crate::error::{ScanError, ScanResult};
use crate::packet::{build_arp_request, build_icmp_echo, build_tcp_syn};
use crate::types::MacAddress;

pub(crate) const LOCAL_MAC: MacAddress = MacAddress::new([0x02, 0, 0, 0, 0, 0x01]);
pub(crate) const LOCAL_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);
pub(crate) const REMOTE_MAC: MacAddress = MacAddress::new([0x02, 0, 0, 0, 0, 0x02]);
pub(crate) const REMOTE_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

/// The interface simulated links pretend to be.
pub(crate) fn local_interface() -> InterfaceInfo {
    InterfaceInfo {
        name: "sim0".to_string(),
        index: 3,
        mac: LOCAL_MAC,
        ip: LOCAL_IP,
    }
}

/// Settings scaled down so timeouts elapse in milliseconds.
pub(crate) fn fast_settings() -> ScanSettings {
    ScanSettings {
        reply_timeout_ms: 60,
        poll_interval_ms: 2,
        settle_ms: 30,
        range_delay_us: 0,
        list_delay_us: 200,
        listener_grace_ms: 2000,
        ..ScanSettings::default()
    }
}

type Responder = dyn Fn(&[u8]) -> Vec<Vec<u8>> + Send + Sync;
type Queue = Arc<Mutex<VecDeque<Vec<u8>>>>;

/// Poll interval of simulated receivers.
pub(crate) const SIM_POLL: Duration = Duration::from_millis(2);

struct SimState {
    responder: Box<Responder>,
    receivers: Mutex<Vec<(EtherType, Queue)>>,
    sent: Mutex<Vec<Vec<u8>>>,
    fail_after: Option<usize>,
    refuse_receivers: bool,
}

#[derive(Clone)]
pub(crate) struct SimLink {
    state: Arc<SimState>,
}

impl SimLink {
    pub(crate) fn new(responder: impl Fn(&[u8]) -> Vec<Vec<u8>> + Send + Sync + 'static) -> Self {
        Self {
            state: Arc::new(SimState {
                responder: Box::new(responder),
                receivers: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
                fail_after: None,
                refuse_receivers: false,
            }),
        }
    }

    /// A link on which nothing ever answers.
    pub(crate) fn silent() -> Self {
        Self::new(|_| Vec::new())
    }

    /// Accept `count` frames, then fail every later send.
    pub(crate) fn fail_sends_after(self, count: usize) -> Self {
        self.reconfigure(|state| state.fail_after = Some(count))
    }

    /// Fail every attempt to open a receiver.
    pub(crate) fn refuse_receivers(self) -> Self {
        self.reconfigure(|state| state.refuse_receivers = true)
    }

    fn reconfigure(self, apply: impl FnOnce(&mut SimState)) -> Self {
        let mut state = Arc::try_unwrap(self.state)
            .unwrap_or_else(|_| panic!("reconfigure a SimLink before sharing it"));
        apply(&mut state);
        Self {
            state: Arc::new(state),
        }
    }

    /// Every frame accepted by a sender so far.
    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.state.sent.lock().unwrap().clone()
    }

    /// Deliver `frame` to open receivers as if it arrived from the wire.
    pub(crate) fn inject(&self, frame: &[u8]) {
        self.state.deliver(frame.to_vec());
    }
}

impl SimState {
    fn deliver(&self, frame: Vec<u8>) {
        let Some(ethertype) = ethertype_of(&frame) else {
            return;
        };
        for (bound, queue) in self.receivers.lock().unwrap().iter() {
            if *bound == ethertype {
                queue.lock().unwrap().push_back(frame.clone());
            }
        }
    }
}

impl Link for SimLink {
    fn open_sender(&self) -> ScanResult<Box<dyn FrameSender>> {
        Ok(Box::new(SimSender {
            state: Arc::clone(&self.state),
        }))
    }

    fn open_receiver(&self, ethertype: EtherType) -> ScanResult<Box<dyn FrameReceiver>> {
        if self.state.refuse_receivers {
            return Err(ScanError::PermissionDenied("simulated".to_string()));
        }
        let queue = Queue::default();
        self.state
            .receivers
            .lock()
            .unwrap()
            .push((ethertype, Arc::clone(&queue)));
        Ok(Box::new(SimReceiver {
            queue,
            current: Vec::new(),
        }))
    }
}

struct SimSender {
    state: Arc<SimState>,
}

impl FrameSender for SimSender {
    fn send(&mut self, frame: &[u8]) -> ScanResult<usize> {
        {
            let mut sent = self.state.sent.lock().unwrap();
            if self.state.fail_after.is_some_and(|limit| sent.len() >= limit) {
                return Err(ScanError::TransmitFailure("simulated".to_string()));
            }
            sent.push(frame.to_vec());
        }
        for reply in (self.state.responder)(frame) {
            self.state.deliver(reply);
        }
        Ok(frame.len())
    }
}

struct SimReceiver {
    queue: Queue,
    current: Vec<u8>,
}

impl FrameReceiver for SimReceiver {
    fn recv(&mut self) -> ScanResult<Option<&[u8]>> {
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(frame) => {
                self.current = frame;
                Ok(Some(&self.current))
            }
            None => {
                std::thread::sleep(SIM_POLL);
                Ok(None)
            }
        }
    }
}

/// A host at `ip`/`mac` that answers ARP for itself, replies to echo
/// requests, and answers SYNs with SYN-ACK on `open_ports` and RST-ACK
/// elsewhere.
pub(crate) fn remote_host(
    ip: Ipv4Addr,
    mac: MacAddress,
    open_ports: &[u16],
) -> impl Fn(&[u8]) -> Vec<Vec<u8>> + Send + Sync + 'static {
    let open_ports = open_ports.to_vec();
    move |frame: &[u8]| {
        let Some(eth) = EthernetPacket::new(frame) else {
            return Vec::new();
        };
        let peer_mac = MacAddress::from(eth.get_source());

        if eth.get_ethertype() == EtherTypes::Arp {
            let Some(arp) = ArpPacket::new(eth.payload()) else {
                return Vec::new();
            };
            if arp.get_target_proto_addr() != ip {
                return Vec::new();
            }
            return vec![arp_reply(ip, mac, arp.get_sender_proto_addr(), peer_mac)];
        }

        let Some(ipv4) = Ipv4Packet::new(eth.payload()) else {
            return Vec::new();
        };
        if ipv4.get_destination() != ip {
            return Vec::new();
        }
        let peer_ip = ipv4.get_source();

        match ipv4.get_next_level_protocol() {
            IpNextHeaderProtocols::Icmp => {
                let is_echo = IcmpPacket::new(ipv4.payload())
                    .is_some_and(|icmp| icmp.get_icmp_type() == IcmpTypes::EchoRequest);
                if is_echo {
                    vec![echo_reply(ip, mac, peer_ip, peer_mac)]
                } else {
                    Vec::new()
                }
            }
            IpNextHeaderProtocols::Tcp => {
                let Some(tcp) = TcpPacket::new(ipv4.payload()) else {
                    return Vec::new();
                };
                let port = tcp.get_destination();
                let flags = if open_ports.contains(&port) {
                    (TcpFlags::SYN | TcpFlags::ACK) as u8
                } else {
                    (TcpFlags::RST | TcpFlags::ACK) as u8
                };
                vec![tcp_reply(ip, mac, peer_ip, peer_mac, port, tcp.get_source(), flags)]
            }
            _ => Vec::new(),
        }
    }
}

/// ARP reply from `ip`/`mac` to `peer_ip`/`peer_mac`.
pub(crate) fn arp_reply(
    ip: Ipv4Addr,
    mac: MacAddress,
    peer_ip: Ipv4Addr,
    peer_mac: MacAddress,
) -> Vec<u8> {
    let mut frame = build_arp_request(mac, ip, peer_ip).unwrap();
    frame[0..6].copy_from_slice(&peer_mac.octets());
    frame[21] = 2;
    frame[32..38].copy_from_slice(&peer_mac.octets());
    frame.to_vec()
}

/// ICMP echo reply from `ip`/`mac` to `peer_ip`/`peer_mac`.
pub(crate) fn echo_reply(
    ip: Ipv4Addr,
    mac: MacAddress,
    peer_ip: Ipv4Addr,
    peer_mac: MacAddress,
) -> Vec<u8> {
    let mut frame = build_icmp_echo(ip, peer_ip, mac, peer_mac).unwrap();
    frame[34] = 0;
    frame.to_vec()
}

/// TCP segment with raw `flags` from `ip:port` to `peer_ip:peer_port`.
pub(crate) fn tcp_reply(
    ip: Ipv4Addr,
    mac: MacAddress,
    peer_ip: Ipv4Addr,
    peer_mac: MacAddress,
    port: u16,
    peer_port: u16,
    flags: u8,
) -> Vec<u8> {
    let mut frame = build_tcp_syn(ip, peer_ip, mac, peer_mac, port, peer_port).unwrap();
    frame[47] = flags;
    frame.to_vec()
}
