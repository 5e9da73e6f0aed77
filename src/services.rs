//! Well-known TCP ports.
//!
//! `COMMON_TCP_PORTS` is the port set probed by a default (non-full) scan.
//! `get_service_description` labels open ports in the report, and
//! `get_service_name` is the lookup behind it.

/// Ports probed when neither `--full` nor `--ports` is given, in send order.
pub const COMMON_TCP_PORTS: [u16; 54] = [
    20, 21, 22, 23, 25, 42, 43, 49, 53, 69, 70, 79, 80, 88, 102, 110, 113, 119, 123, 135, 137,
    138, 139, 143, 161, 179, 194, 201, 264, 389, 443, 445, 554, 993, 995, 1025, 1080, 1720, 2082,
    3128, 3306, 3389, 5060, 5061, 5432, 6379, 6970, 8000, 8080, 8200, 8222, 9092, 19226, 27017,
];

/// Service names, sorted by port for binary search.
static SERVICE_NAMES: &[(u16, &str)] = &[
    (20, "ftp-data"),
    (21, "ftp"),
    (22, "ssh"),
    (23, "telnet"),
    (25, "smtp"),
    (42, "nameserver"),
    (43, "whois"),
    (49, "tacacs"),
    (53, "dns"),
    (69, "tftp"),
    (70, "gopher"),
    (79, "finger"),
    (80, "http"),
    (88, "kerberos"),
    (102, "iso-tsap"),
    (110, "pop3"),
    (111, "rpcbind"),
    (113, "ident"),
    (119, "nntp"),
    (123, "ntp"),
    (135, "msrpc"),
    (137, "netbios-ns"),
    (138, "netbios-dgm"),
    (139, "netbios-ssn"),
    (143, "imap"),
    (161, "snmp"),
    (179, "bgp"),
    (194, "irc"),
    (201, "at-rtmp"),
    (264, "bgmp"),
    (389, "ldap"),
    (443, "https"),
    (445, "microsoft-ds"),
    (465, "smtps"),
    (554, "rtsp"),
    (587, "submission"),
    (631, "ipp"),
    (636, "ldaps"),
    (873, "rsync"),
    (993, "imaps"),
    (995, "pop3s"),
    (1025, "nfs-or-iis"),
    (1080, "socks"),
    (1433, "mssql"),
    (1521, "oracle"),
    (1720, "h323"),
    (1723, "pptp"),
    (2049, "nfs"),
    (2082, "cpanel"),
    (2083, "cpanel-ssl"),
    (3128, "squid"),
    (3306, "mysql"),
    (3389, "rdp"),
    (5060, "sip"),
    (5061, "sips"),
    (5432, "postgresql"),
    (5900, "vnc"),
    (6379, "redis"),
    (6970, "rtsp-data"),
    (8000, "http-alt"),
    (8080, "http-proxy"),
    (8200, "vault"),
    (8222, "http-mgmt"),
    (8443, "https-alt"),
    (9092, "kafka"),
    (9200, "elasticsearch"),
    (11211, "memcached"),
    (19226, "panda-agent"),
    (27017, "mongodb"),
];

/// Look up the probable service name for a given port.
///
/// Returns `None` if the port is not in the table.
pub fn get_service_name(port: u16) -> Option<&'static str> {
    SERVICE_NAMES
        .binary_search_by_key(&port, |&(p, _)| p)
        .ok()
        .map(|i| SERVICE_NAMES[i].1)
}

/// Service name for display, "unknown" when not recognized.
pub fn get_service_description(port: u16) -> &'static str {
    get_service_name(port).unwrap_or("unknown")
}
