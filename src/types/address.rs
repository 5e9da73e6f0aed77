//! Link-layer and IPv4 address types.
//!
//! `MacAddress` is a 6-byte newtype with colon-hex text form. IPv4 addresses
//! use `std::net::Ipv4Addr` (dotted-quad, `u32` and `[u8; 4]` conversions all
//! come with it); this module adds the strict target validator.

use pnet::util::MacAddr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Number of octets in a MAC address.
pub const MAC_LEN: usize = 6;

/// Number of octets in an IPv4 address.
pub const IPV4_LEN: usize = 4;

/// A 48-bit Ethernet hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress([u8; MAC_LEN]);

impl MacAddress {
    /// The all-ones broadcast address.
    pub const BROADCAST: Self = Self([0xff; MAC_LEN]);

    /// The all-zero address, used as the unknown target in ARP requests.
    pub const ZERO: Self = Self([0x00; MAC_LEN]);

    /// Create a MAC address from raw octets.
    #[inline]
    pub const fn new(octets: [u8; MAC_LEN]) -> Self {
        Self(octets)
    }

    /// Get the raw octets.
    #[inline]
    pub const fn octets(&self) -> [u8; MAC_LEN] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddress {
    type Err = AddressError;

    /// Parse `aa:bb:cc:dd:ee:ff` (case-insensitive; `-` separators accepted).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut octets = [0u8; MAC_LEN];
        let mut count = 0;

        for part in s.split(|c| c == ':' || c == '-') {
            if count == MAC_LEN || part.is_empty() || part.len() > 2 {
                return Err(AddressError::InvalidMac(s.to_string()));
            }
            octets[count] = u8::from_str_radix(part, 16)
                .map_err(|_| AddressError::InvalidMac(s.to_string()))?;
            count += 1;
        }

        if count != MAC_LEN {
            return Err(AddressError::InvalidMac(s.to_string()));
        }

        Ok(Self(octets))
    }
}

impl From<[u8; MAC_LEN]> for MacAddress {
    fn from(octets: [u8; MAC_LEN]) -> Self {
        Self(octets)
    }
}

impl From<MacAddr> for MacAddress {
    fn from(mac: MacAddr) -> Self {
        let MacAddr(a, b, c, d, e, f) = mac;
        Self([a, b, c, d, e, f])
    }
}

impl From<MacAddress> for MacAddr {
    fn from(mac: MacAddress) -> Self {
        let [a, b, c, d, e, f] = mac.0;
        MacAddr(a, b, c, d, e, f)
    }
}

impl Serialize for MacAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for address parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),
    #[error("invalid IPv4 address: {0}")]
    InvalidIpv4(String),
    #[error("first and last octet of a target address cannot be 0: {0}")]
    ZeroEdgeOctet(String),
}

/// Validate and parse a scan target address.
///
/// Accepts exactly four dot-separated decimal components in `0..=255`.
/// The first and last component must be non-zero, so `0.x.x.y` and
/// `x.x.x.0` style addresses are rejected as targets.
pub fn parse_target_ip(s: &str) -> Result<Ipv4Addr, AddressError> {
    let s = s.trim();
    let mut octets = [0u8; IPV4_LEN];
    let mut count = 0;

    for part in s.split('.') {
        if count == IPV4_LEN
            || part.is_empty()
            || part.len() > 3
            || !part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(AddressError::InvalidIpv4(s.to_string()));
        }
        octets[count] = part
            .parse()
            .map_err(|_| AddressError::InvalidIpv4(s.to_string()))?;
        count += 1;
    }

    if count != IPV4_LEN {
        return Err(AddressError::InvalidIpv4(s.to_string()));
    }

    if octets[0] == 0 || octets[IPV4_LEN - 1] == 0 {
        return Err(AddressError::ZeroEdgeOctet(s.to_string()));
    }

    Ok(Ipv4Addr::from(octets))
}

/// Check whether `s` is an acceptable scan target address.
pub fn is_valid_target_ip(s: &str) -> bool {
    parse_target_ip(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_validator() {
        assert!(is_valid_target_ip("192.168.1.1"));
        assert!(is_valid_target_ip("10.0.0.1"));
        assert!(!is_valid_target_ip("0.168.1.1"));
        assert!(!is_valid_target_ip("192.168.1.0"));
        assert!(!is_valid_target_ip("256.1.1.1"));
        assert!(!is_valid_target_ip("1.2.3"));
        assert!(!is_valid_target_ip("1.2.3.4.5"));
        assert!(!is_valid_target_ip("1..3.4"));
        assert!(!is_valid_target_ip("1.2.3.x"));
        assert!(!is_valid_target_ip("+1.2.3.4"));
    }

    #[test]
    fn test_zero_edge_error_kind() {
        assert_eq!(
            parse_target_ip("192.168.1.0"),
            Err(AddressError::ZeroEdgeOctet("192.168.1.0".to_string()))
        );
    }

    #[test]
    fn test_ip_text_roundtrip() {
        for text in ["192.168.1.1", "10.20.30.40", "1.0.0.1", "255.255.255.255"] {
            let ip = parse_target_ip(text).unwrap();
            assert_eq!(ip.to_string(), text);
            assert_eq!(Ipv4Addr::from(u32::from(ip)), ip);
        }
    }

    #[test]
    fn test_mac_parse_and_display() {
        let mac: MacAddress = "AA:bb:0c:dd:ee:0F".parse().unwrap();
        assert_eq!(mac.octets(), [0xaa, 0xbb, 0x0c, 0xdd, 0xee, 0x0f]);
        assert_eq!(mac.to_string(), "aa:bb:0c:dd:ee:0f");

        let dashed: MacAddress = "aa-bb-0c-dd-ee-0f".parse().unwrap();
        assert_eq!(dashed, mac);
    }

    #[test]
    fn test_mac_roundtrip() {
        for octets in [[0u8; 6], [0xff; 6], [0x02, 0x42, 0xac, 0x11, 0x00, 0x02]] {
            let mac = MacAddress::new(octets);
            let parsed: MacAddress = mac.to_string().parse().unwrap();
            assert_eq!(parsed.octets(), octets);
        }
    }

    #[test]
    fn test_mac_rejects_malformed() {
        assert!("aa:bb:cc:dd:ee".parse::<MacAddress>().is_err());
        assert!("aa:bb:cc:dd:ee:ff:00".parse::<MacAddress>().is_err());
        assert!("aa:bb:cc:dd:ee:fg".parse::<MacAddress>().is_err());
        assert!("aaa:bb:cc:dd:ee:ff".parse::<MacAddress>().is_err());
        assert!("<incomplete>".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_mac_pnet_conversion() {
        let mac = MacAddress::new([1, 2, 3, 4, 5, 6]);
        let pnet_mac: MacAddr = mac.into();
        assert_eq!(pnet_mac, MacAddr::new(1, 2, 3, 4, 5, 6));
        assert_eq!(MacAddress::from(pnet_mac), mac);
        assert_eq!(MacAddr::from(MacAddress::BROADCAST), MacAddr::broadcast());
    }
}
