//! Sliding-window rate limiting for connections (keyed by client IP) and for commands (one
//! counter per session).

use dashmap::DashMap;
use std::collections::VecDeque;
use std::net::IpAddr;
use std::time::{Duration, Instant};

/// Counts events in a sliding time window.
#[derive(Debug)]
pub(crate) struct SlidingWindow {
    max: u32,
    window: Duration,
    hits: VecDeque<Instant>,
}

impl SlidingWindow {
    pub fn new(max: u32, window: Duration) -> Self {
        SlidingWindow {
            max,
            window,
            hits: VecDeque::new(),
        }
    }

    /// Registers an event; returns false when the window is already full.
    pub fn check(&mut self) -> bool {
        self.check_at(Instant::now())
    }

    fn check_at(&mut self, now: Instant) -> bool {
        while let Some(oldest) = self.hits.front() {
            if now.duration_since(*oldest) >= self.window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
        if self.hits.len() as u32 >= self.max {
            return false;
        }
        self.hits.push_back(now);
        true
    }
}

/// Limits how often clients from one address may connect. Shared by all sessions.
#[derive(Debug)]
pub(crate) struct IpRateLimiter {
    max: u32,
    window: Duration,
    per_ip: DashMap<IpAddr, SlidingWindow>,
}

impl IpRateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        IpRateLimiter {
            max,
            window,
            per_ip: DashMap::new(),
        }
    }

    /// Registers a connection attempt from `ip`; returns false when over the limit.
    pub fn check(&self, ip: IpAddr) -> bool {
        let mut entry = self.per_ip.entry(ip).or_insert_with(|| SlidingWindow::new(self.max, self.window));
        let allowed = entry.check();
        drop(entry);
        // Idle peers would otherwise accumulate forever.
        let horizon = self.window;
        self.per_ip.retain(|_, window| window.hits.back().is_some_and(|newest| newest.elapsed() < horizon));
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit() {
        let mut window = SlidingWindow::new(3, Duration::from_secs(60));
        let now = Instant::now();
        assert!(window.check_at(now));
        assert!(window.check_at(now));
        assert!(window.check_at(now));
        assert!(!window.check_at(now));
    }

    #[test]
    fn old_hits_fall_out_of_the_window() {
        let mut window = SlidingWindow::new(2, Duration::from_secs(60));
        let start = Instant::now();
        assert!(window.check_at(start));
        assert!(window.check_at(start));
        assert!(!window.check_at(start + Duration::from_secs(30)));
        assert!(window.check_at(start + Duration::from_secs(61)));
    }

    #[test]
    fn limits_are_per_address() {
        let limiter = IpRateLimiter::new(1, Duration::from_secs(60));
        let a: IpAddr = "192.0.2.1".parse().unwrap();
        let b: IpAddr = "192.0.2.2".parse().unwrap();
        assert!(limiter.check(a));
        assert!(!limiter.check(a));
        assert!(limiter.check(b));
    }
}
