//! Raw Ethernet access through pnet's datalink channels.
//!
//! **Requires elevated privileges (root/sudo).**

use pnet::datalink::{self, Channel, Config, DataLinkReceiver, DataLinkSender, NetworkInterface};
use pnet::packet::ethernet::EtherType;
use std::io;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, trace};

use super::{ethertype_of, FrameReceiver, FrameSender, InterfaceInfo, Link};
use crate::error::{ScanError, ScanResult};

/// A [`Link`] bound to one named interface.
pub struct DatalinkLink {
    interface: NetworkInterface,
    poll_interval: Duration,
}

impl DatalinkLink {
    /// Look up `name` among the system's interfaces.
    ///
    /// Receivers opened on this link wait at most `poll_interval` per
    /// receive attempt.
    pub fn for_interface(name: &str, poll_interval: Duration) -> ScanResult<Self> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == name)
            .ok_or_else(|| ScanError::InterfaceNotFound(name.to_string()))?;

        debug!(interface = %interface.name, index = interface.index, "interface found");
        Ok(Self {
            interface,
            poll_interval,
        })
    }

    /// Index, MAC and first non-loopback IPv4 address of the interface.
    pub fn info(&self) -> ScanResult<InterfaceInfo> {
        let name = self.interface.name.clone();
        let mac = self
            .interface
            .mac
            .ok_or_else(|| ScanError::InterfaceAddress {
                name: name.clone(),
                what: "MAC address",
            })?;
        let ip = self
            .interface
            .ips
            .iter()
            .find_map(|net| match net.ip() {
                IpAddr::V4(addr) if !addr.is_loopback() => Some(addr),
                _ => None,
            })
            .ok_or_else(|| ScanError::InterfaceAddress {
                name: name.clone(),
                what: "IPv4 address",
            })?;

        Ok(InterfaceInfo {
            name,
            index: self.interface.index,
            mac: mac.into(),
            ip,
        })
    }

    fn open_channel(&self) -> ScanResult<(Box<dyn DataLinkSender>, Box<dyn DataLinkReceiver>)> {
        let config = Config {
            read_timeout: Some(self.poll_interval),
            ..Default::default()
        };

        match datalink::channel(&self.interface, config) {
            Ok(Channel::Ethernet(tx, rx)) => Ok((tx, rx)),
            Ok(_) => Err(ScanError::RawSocket("Unsupported channel type".to_string())),
            Err(e) => {
                let err_str = e.to_string().to_lowercase();
                if e.kind() == io::ErrorKind::PermissionDenied
                    || err_str.contains("permission")
                    || err_str.contains("operation not permitted")
                {
                    return Err(ScanError::PermissionDenied(
                        "Raw socket access requires root/sudo privileges".to_string(),
                    ));
                }
                Err(ScanError::RawSocket(e.to_string()))
            }
        }
    }
}

impl Link for DatalinkLink {
    fn open_sender(&self) -> ScanResult<Box<dyn FrameSender>> {
        let (tx, _) = self.open_channel()?;
        Ok(Box::new(DatalinkSender { tx }))
    }

    fn open_receiver(&self, ethertype: EtherType) -> ScanResult<Box<dyn FrameReceiver>> {
        let (_, rx) = self.open_channel()?;
        trace!(interface = %self.interface.name, ?ethertype, "receiver opened");
        Ok(Box::new(DatalinkReceiver { rx, ethertype }))
    }
}

struct DatalinkSender {
    tx: Box<dyn DataLinkSender>,
}

impl FrameSender for DatalinkSender {
    fn send(&mut self, frame: &[u8]) -> ScanResult<usize> {
        match self.tx.send_to(frame, None) {
            Some(Ok(())) => Ok(frame.len()),
            Some(Err(e)) => Err(ScanError::TransmitFailure(e.to_string())),
            None => Err(ScanError::TransmitFailure(
                "datalink channel rejected the frame".to_string(),
            )),
        }
    }
}

struct DatalinkReceiver {
    rx: Box<dyn DataLinkReceiver>,
    ethertype: EtherType,
}

impl FrameReceiver for DatalinkReceiver {
    fn recv(&mut self) -> ScanResult<Option<&[u8]>> {
        match self.rx.next() {
            Ok(frame) if ethertype_of(frame) == Some(self.ethertype) => Ok(Some(frame)),
            Ok(_) => Ok(None),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(ScanError::ListenerFailed(e.to_string())),
        }
    }
}
