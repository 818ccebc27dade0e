//! The passive-port allocator: hands out listeners on ports from the configured range, one
//! session at a time, and never the same port twice while it is in use.

use dashmap::DashSet;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

// How many candidate ports we probe before giving up on a bind.
const DEFAULT_BIND_ATTEMPTS: u8 = 5;

/// Allocates passive data ports from an inclusive range. Shared by every session of a server;
/// the cursor rotates so consecutive allocations spread over the range.
#[derive(Debug)]
pub(crate) struct PassivePorts {
    range: RangeInclusive<u16>,
    cursor: Mutex<u16>,
    in_use: Arc<DashSet<u16>>,
    bind_attempts: u8,
}

/// Releases the reserved port when the data channel is done with it.
#[derive(Debug)]
pub(crate) struct PortGuard {
    port: u16,
    in_use: Arc<DashSet<u16>>,
}

impl PortGuard {
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for PortGuard {
    fn drop(&mut self) {
        self.in_use.remove(&self.port);
    }
}

impl PassivePorts {
    pub fn new(range: RangeInclusive<u16>) -> Self {
        let start = *range.start();
        PassivePorts {
            range,
            cursor: Mutex::new(start),
            in_use: Arc::new(DashSet::new()),
            bind_attempts: DEFAULT_BIND_ATTEMPTS,
        }
    }

    fn next_candidate(&self) -> u16 {
        let mut cursor = self.cursor.lock().unwrap();
        let candidate = *cursor;
        *cursor = if candidate >= *self.range.end() { *self.range.start() } else { candidate + 1 };
        candidate
    }

    /// Binds a listener on a free port of the range, with a backlog of one connection. Ports
    /// already handed out are skipped; a port that turns out to be taken by another process
    /// advances to the next candidate, up to the probe limit.
    pub async fn bind(&self, ip: IpAddr) -> io::Result<(TcpListener, PortGuard)> {
        let span = usize::from(*self.range.end() - *self.range.start()) + 1;
        let mut last_error = io::Error::new(io::ErrorKind::AddrInUse, "no free passive port");
        let mut probes = 0u8;
        let mut skips = 0usize;
        while probes < self.bind_attempts {
            let port = self.next_candidate();
            if !self.in_use.insert(port) {
                // Handed out to another session right now; doesn't count as a probe, but a full
                // lap over the range means nothing is left to try.
                skips += 1;
                if skips > span {
                    return Err(io::Error::new(io::ErrorKind::AddrInUse, "all passive ports are handed out"));
                }
                continue;
            }
            match TcpListener::bind(SocketAddr::new(ip, port)).await {
                Ok(listener) => {
                    return Ok((
                        listener,
                        PortGuard {
                            port,
                            in_use: Arc::clone(&self.in_use),
                        },
                    ));
                }
                Err(err) => {
                    self.in_use.remove(&port);
                    probes += 1;
                    if err.kind() != io::ErrorKind::AddrInUse {
                        return Err(err);
                    }
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn ports_are_unique_while_held() {
        let ports = PassivePorts::new(42180..=42189);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let mut held = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..5 {
            let (listener, guard) = ports.bind(ip).await.unwrap();
            assert!(seen.insert(guard.port()), "port {} handed out twice", guard.port());
            held.push((listener, guard));
        }
    }

    #[tokio::test]
    async fn released_ports_can_be_handed_out_again() {
        let ports = PassivePorts::new(42280..=42281);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let (l1, g1) = ports.bind(ip).await.unwrap();
        let (_l2, _g2) = ports.bind(ip).await.unwrap();
        let free_again = g1.port();
        drop(l1);
        drop(g1);
        let (_l3, g3) = ports.bind(ip).await.unwrap();
        assert_eq!(g3.port(), free_again);
    }

    #[tokio::test]
    async fn gives_up_after_the_probe_limit() {
        // Park listeners on the whole range outside of the allocator's bookkeeping.
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let mut squatters = Vec::new();
        for port in 42380..=42383u16 {
            squatters.push(TcpListener::bind(SocketAddr::new(ip, port)).await.unwrap());
        }
        let ports = PassivePorts::new(42380..=42383);
        assert!(ports.bind(ip).await.is_err());
    }
}
