//! Ones-complement checksums over raw header bytes.
//!
//! Words are read in host byte order exactly as they sit in the buffer, and
//! the running sum is folded whenever it exceeds [`CARRY_THRESHOLD`] rather
//! than once at the end. Every function returns the checksum as a value that,
//! written big-endian (e.g. with pnet's `set_checksum`), yields the bytes the
//! folded sum occupies in memory.

use tracing::trace;

/// Running sums above this are folded back into 16 bits.
pub const CARRY_THRESHOLD: u32 = 65545;

/// Words summed for a 20-byte IPv4 header.
pub const IP_HEADER_WORDS: usize = 10;

/// Words summed for an 8-byte ICMP header. Payload bytes are not covered.
pub const ICMP_HEADER_WORDS: usize = 4;

/// Words summed from the TCP segment buffer: the 20-byte header plus the
/// two zero words of frame padding that follow it.
pub const TCP_HEADER_WORDS: usize = 12;

/// Words summed from the TCP pseudo-header buffer, one past the 12 bytes
/// the pseudo-header defines.
pub const PSEUDO_HEADER_WORDS: usize = 7;

/// Byte length of the pseudo-header buffer, including its trailing pad word.
pub const PSEUDO_HEADER_LEN: usize = PSEUDO_HEADER_WORDS * 2;

/// Fold a stream of 16-bit words and return the complemented low half.
pub fn ones_complement<I>(words: I) -> u16
where
    I: IntoIterator<Item = u16>,
{
    let mut sum: u32 = 0;
    for word in words {
        sum += u32::from(word);
        if sum > CARRY_THRESHOLD {
            sum = (sum & 0xFFFF) + 1;
        }
    }
    !(sum as u16)
}

fn host_words(bytes: &[u8], count: usize) -> impl Iterator<Item = u16> + '_ {
    bytes
        .chunks_exact(2)
        .take(count)
        .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
}

fn to_wire(checksum: u16) -> u16 {
    u16::from_be_bytes(checksum.to_ne_bytes())
}

/// Checksum of a 20-byte IPv4 header whose checksum field is zero.
pub fn ip_checksum(header: &[u8]) -> u16 {
    let checksum = to_wire(ones_complement(host_words(header, IP_HEADER_WORDS)));
    trace!(checksum, "ip header checksum");
    checksum
}

/// Checksum of an 8-byte ICMP header whose checksum field is zero.
pub fn icmp_checksum(header: &[u8]) -> u16 {
    let checksum = to_wire(ones_complement(host_words(header, ICMP_HEADER_WORDS)));
    trace!(checksum, "icmp header checksum");
    checksum
}

/// Checksum of a TCP segment buffer (checksum field zero) preceded by its
/// pseudo-header buffer.
pub fn tcp_checksum(segment: &[u8], pseudo_header: &[u8]) -> u16 {
    let words = host_words(pseudo_header, PSEUDO_HEADER_WORDS)
        .chain(host_words(segment, TCP_HEADER_WORDS));
    let checksum = to_wire(ones_complement(words));
    trace!(checksum, "tcp checksum");
    checksum
}

/// Lay out the TCP pseudo-header: source, destination, zero, protocol,
/// segment length, and a zero pad word.
pub fn pseudo_header(
    source: [u8; 4],
    destination: [u8; 4],
    protocol: u8,
    segment_len: u16,
) -> [u8; PSEUDO_HEADER_LEN] {
    let mut buf = [0u8; PSEUDO_HEADER_LEN];
    buf[0..4].copy_from_slice(&source);
    buf[4..8].copy_from_slice(&destination);
    buf[9] = protocol;
    buf[10..12].copy_from_slice(&segment_len.to_be_bytes());
    buf
}
