use std::net::IpAddr;

use ipnetwork::IpNetwork;
use plexguard_shared::SessionLocation;

/// Classifies a source address as LAN or WAN (spec §4.3.1 step 3):
/// RFC1918/loopback/link-local is `lan`, everything else is `wan`.
pub fn classify(addr: IpAddr) -> SessionLocation {
    if is_private_range(addr) {
        SessionLocation::Lan
    } else {
        SessionLocation::Wan
    }
}

fn is_private_range(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => v6.is_loopback() || is_unique_local_v6(v6) || is_link_local_v6(v6),
    }
}

fn is_unique_local_v6(addr: std::net::Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xfe00) == 0xfc00
}

fn is_link_local_v6(addr: std::net::Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xffc0) == 0xfe80
}

/// Whether `addr` matches at least one entry in an allow-list of single
/// IPs or CIDR ranges.
pub fn allow_list_contains(allowed: &[IpNetwork], addr: IpAddr) -> bool {
    allowed.iter().any(|network| network.contains(addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rfc1918_and_loopback_as_lan() {
        assert_eq!(classify("192.168.1.5".parse().unwrap()), SessionLocation::Lan);
        assert_eq!(classify("10.0.0.2".parse().unwrap()), SessionLocation::Lan);
        assert_eq!(classify("127.0.0.1".parse().unwrap()), SessionLocation::Lan);
        assert_eq!(classify("169.254.1.1".parse().unwrap()), SessionLocation::Lan);
    }

    #[test]
    fn classifies_public_addresses_as_wan() {
        assert_eq!(classify("203.0.113.5".parse().unwrap()), SessionLocation::Wan);
        assert_eq!(classify("198.51.100.7".parse().unwrap()), SessionLocation::Wan);
    }

    #[test]
    fn allow_list_matches_exact_and_cidr() {
        let allowed: Vec<IpNetwork> = vec!["203.0.113.5/32".parse().unwrap(), "198.51.100.0/24".parse().unwrap()];
        assert!(allow_list_contains(&allowed, "203.0.113.5".parse().unwrap()));
        assert!(allow_list_contains(&allowed, "198.51.100.42".parse().unwrap()));
        assert!(!allow_list_contains(&allowed, "198.51.101.1".parse().unwrap()));
    }
}
