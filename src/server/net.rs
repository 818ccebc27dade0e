//! Address helpers for validating data connection peers against the control connection peer.

use std::net::{IpAddr, Ipv4Addr};

/// Normalizes an address for comparison: IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) become
/// plain IPv4.
pub(crate) fn normalize_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}

/// Applies a prefix-length netmask to an IPv4 address.
pub(crate) fn mask_v4(addr: Ipv4Addr, prefix: u8) -> Ipv4Addr {
    let bits = u32::from(addr);
    let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - u32::from(prefix.min(32))) };
    Ipv4Addr::from(bits & mask)
}

/// Tells whether `addr` falls in the network given by `network`/`prefix`.
pub(crate) fn v4_net_contains(network: Ipv4Addr, prefix: u8, addr: Ipv4Addr) -> bool {
    mask_v4(addr, prefix) == mask_v4(network, prefix)
}

/// Tells whether a data connection peer is acceptable for a session whose control connection
/// comes from `control`. The addresses must match after normalization; a loopback control
/// connection accepts any loopback data peer, nothing else.
pub(crate) fn data_peer_allowed(control: IpAddr, data: IpAddr) -> bool {
    let control = normalize_ip(control);
    let data = normalize_ip(data);
    if control == data {
        return true;
    }
    match (control, data) {
        (IpAddr::V4(c), IpAddr::V4(d)) if c.is_loopback() => v4_net_contains(Ipv4Addr::new(127, 0, 0, 0), 8, d),
        (IpAddr::V6(c), IpAddr::V6(d)) if c.is_loopback() => d.is_loopback(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mapped_v6_addresses_normalize_to_v4() {
        let mapped: IpAddr = "::ffff:192.0.2.1".parse().unwrap();
        assert_eq!(normalize_ip(mapped), "192.0.2.1".parse::<IpAddr>().unwrap());
        let plain: IpAddr = "2001:db8::1".parse().unwrap();
        assert_eq!(normalize_ip(plain), plain);
    }

    #[test]
    fn masking_round_trips() {
        // For any address and prefix, the masked address is inside its own network.
        for addr in ["10.1.2.3", "192.0.2.200", "255.255.255.255", "0.0.0.1"] {
            let addr: Ipv4Addr = addr.parse().unwrap();
            for prefix in [0u8, 1, 8, 16, 24, 31, 32] {
                assert!(v4_net_contains(mask_v4(addr, prefix), prefix, addr), "{}/{}", addr, prefix);
            }
        }
    }

    #[test]
    fn mask_edges() {
        let addr: Ipv4Addr = "192.0.2.200".parse().unwrap();
        assert_eq!(mask_v4(addr, 0), Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(mask_v4(addr, 24), Ipv4Addr::new(192, 0, 2, 0));
        assert_eq!(mask_v4(addr, 32), addr);
    }

    #[test]
    fn matching_peers_are_allowed() {
        let control: IpAddr = "192.0.2.1".parse().unwrap();
        assert!(data_peer_allowed(control, control));
        assert!(data_peer_allowed(control, "::ffff:192.0.2.1".parse().unwrap()));
        assert!(!data_peer_allowed(control, "192.0.2.2".parse().unwrap()));
    }

    #[test]
    fn loopback_control_accepts_only_loopback_data() {
        let control: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(data_peer_allowed(control, "127.0.0.2".parse().unwrap()));
        assert!(!data_peer_allowed(control, "192.0.2.1".parse().unwrap()));
    }
}
