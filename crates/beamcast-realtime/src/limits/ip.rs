//! Per-IP concurrent connection limiting.

use dashmap::DashMap;

/// Counts concurrent connections per client IP against a fixed cap.
#[derive(Debug)]
pub struct IpConnectionLimiter {
    max_per_ip: usize,
    /// IP → current connection count. Entries are dropped at zero.
    counts: DashMap<String, usize>,
}

impl IpConnectionLimiter {
    /// Creates a limiter with the given per-IP cap.
    pub fn new(max_per_ip: usize) -> Self {
        Self {
            max_per_ip,
            counts: DashMap::new(),
        }
    }

    /// Whether a new connection from this IP is currently below the cap.
    pub fn can_connect(&self, ip: &str) -> bool {
        self.connection_count(ip) < self.max_per_ip
    }

    /// Check-and-increment in one step, so concurrent accepts cannot
    /// overshoot the cap. Returns `false` when the IP is at the cap.
    pub fn try_add_connection(&self, ip: &str) -> bool {
        if self.max_per_ip == 0 {
            return false;
        }
        let mut count = self.counts.entry(ip.to_string()).or_insert(0);
        if *count < self.max_per_ip {
            *count += 1;
            true
        } else {
            false
        }
    }

    /// Releases one connection slot; drops the entry at zero.
    pub fn remove_connection(&self, ip: &str) {
        if let Some(mut count) = self.counts.get_mut(ip) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                drop(count);
                self.counts.remove_if(ip, |_, c| *c == 0);
            }
        }
    }

    /// Current connection count for an IP.
    pub fn connection_count(&self, ip: &str) -> usize {
        self.counts.get(ip).map(|c| *c).unwrap_or(0)
    }

    /// Number of tracked IPs.
    pub fn tracked_ips(&self) -> usize {
        self.counts.len()
    }
}
