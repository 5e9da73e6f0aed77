//! Link-layer access.
//!
//! The scanner talks to the wire through three small traits so the raw
//! socket backend can be swapped for an in-memory link under test:
//!
//! - [`Link`] opens per-interface senders and receivers
//! - [`FrameSender`] transmits one prebuilt Ethernet frame
//! - [`FrameReceiver`] yields inbound frames of one EtherType

pub mod datalink;
#[cfg(test)]
pub(crate) mod sim;
pub mod tables;

use pnet::packet::ethernet::EtherType;
use serde::Serialize;
use std::net::Ipv4Addr;
use tracing::debug;

use crate::error::ScanResult;
use crate::types::MacAddress;

pub use datalink::DatalinkLink;
pub use tables::{CommandTables, SystemTables};

/// Addresses of the local interface a scan runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceInfo {
    pub name: String,
    pub index: u32,
    pub mac: MacAddress,
    pub ip: Ipv4Addr,
}

/// Transmits complete Ethernet frames on one interface.
pub trait FrameSender: Send {
    /// Send `frame` as-is. Returns the number of bytes handed to the link.
    ///
    /// A failed send is reported as `ScanError::TransmitFailure` and is not
    /// retried.
    fn send(&mut self, frame: &[u8]) -> ScanResult<usize>;
}

/// Receives inbound Ethernet frames carrying one EtherType.
pub trait FrameReceiver: Send {
    /// Make one receive attempt, waiting at most the link's poll interval.
    ///
    /// Returns `Ok(None)` when the wait elapsed or the frame that arrived
    /// carried a different EtherType.
    fn recv(&mut self) -> ScanResult<Option<&[u8]>>;
}

/// A network interface that can hand out senders and receivers.
pub trait Link: Send + Sync {
    fn open_sender(&self) -> ScanResult<Box<dyn FrameSender>>;

    fn open_receiver(&self, ethertype: EtherType) -> ScanResult<Box<dyn FrameReceiver>>;
}

/// Send one frame and log the outcome.
pub fn transmit(sender: &mut dyn FrameSender, frame: &[u8]) -> ScanResult<usize> {
    let sent = sender.send(frame)?;
    debug!(bytes = sent, "frame sent");
    Ok(sent)
}

/// EtherType of a raw Ethernet frame, if it is long enough to carry one.
pub(crate) fn ethertype_of(frame: &[u8]) -> Option<EtherType> {
    frame
        .get(12..14)
        .map(|bytes| EtherType::new(u16::from_be_bytes([bytes[0], bytes[1]])))
}
