//! In-memory lockout for the login endpoint, keyed by client address.
//!
//! Failures are counted in a fixed window. Reaching `max_attempts` locks the key for
//! `lockout_seconds`; a successful login clears it.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use tracing::warn;

use crate::config::AuthThrottleConfig;

/// Entries kept before stale ones are swept.
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Locked { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    failures: u32,
    window_started: Instant,
    locked_until: Option<Instant>,
}

#[derive(Debug)]
pub struct LoginThrottle {
    enabled: bool,
    max_attempts: u32,
    window: Duration,
    lockout: Duration,
    trusted_proxies: Vec<IpAddr>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl LoginThrottle {
    #[must_use]
    pub fn new(config: &AuthThrottleConfig) -> Self {
        let trusted_proxies = config
            .trusted_proxy_ips
            .iter()
            .filter_map(|raw| match raw.trim().parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    warn!(value = %raw, "Ignoring unparseable trusted proxy address");
                    None
                }
            })
            .collect();

        Self {
            enabled: config.enabled,
            max_attempts: config.max_attempts.max(1),
            window: Duration::from_secs(config.window_seconds),
            lockout: Duration::from_secs(config.lockout_seconds),
            trusted_proxies,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Picks the throttle key for a request. `X-Forwarded-For` is honoured only when the
    /// socket peer is a trusted proxy.
    #[must_use]
    pub fn client_key(&self, peer: Option<IpAddr>, headers: &HeaderMap) -> String {
        let forwarded = peer
            .filter(|ip| self.trusted_proxies.contains(ip))
            .and_then(|_| headers.get("x-forwarded-for"))
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());

        forwarded
            .or(peer)
            .map_or_else(|| "unknown".to_string(), |ip| ip.to_string())
    }

    pub fn check(&self, key: &str, now: Instant) -> ThrottleDecision {
        if !self.enabled {
            return ThrottleDecision::Allowed;
        }

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = entries.get(key).copied() else {
            return ThrottleDecision::Allowed;
        };

        match entry.locked_until {
            Some(until) if now < until => ThrottleDecision::Locked {
                retry_after: until - now,
            },
            Some(_) => {
                entries.remove(key);
                ThrottleDecision::Allowed
            }
            None => ThrottleDecision::Allowed,
        }
    }

    /// Counts a rejected login. Returns `Locked` when this failure triggered the lockout.
    pub fn record_failure(&self, key: &str, now: Instant) -> ThrottleDecision {
        if !self.enabled {
            return ThrottleDecision::Allowed;
        }

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if entries.len() >= SWEEP_THRESHOLD {
            let window = self.window;
            entries.retain(|_, e| match e.locked_until {
                Some(until) => now < until,
                None => now.duration_since(e.window_started) < window,
            });
        }

        let entry = entries.entry(key.to_string()).or_insert(Entry {
            failures: 0,
            window_started: now,
            locked_until: None,
        });

        if let Some(until) = entry.locked_until {
            if now < until {
                return ThrottleDecision::Locked {
                    retry_after: until - now,
                };
            }
            entry.locked_until = None;
            entry.failures = 0;
            entry.window_started = now;
        }

        if now.duration_since(entry.window_started) >= self.window {
            entry.failures = 0;
            entry.window_started = now;
        }

        entry.failures += 1;

        if entry.failures >= self.max_attempts {
            let until = now + self.lockout;
            entry.locked_until = Some(until);
            warn!(client = %key, failures = entry.failures, "Login locked out");
            metrics::counter!("vitrine_login_lockouts_total").increment(1);
            return ThrottleDecision::Locked {
                retry_after: self.lockout,
            };
        }

        ThrottleDecision::Allowed
    }

    pub fn record_success(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config() -> AuthThrottleConfig {
        AuthThrottleConfig {
            enabled: true,
            max_attempts: 5,
            window_seconds: 900,
            lockout_seconds: 900,
            trusted_proxy_ips: vec!["10.0.0.1".to_string()],
        }
    }

    #[test]
    fn test_locks_after_max_failures() {
        let throttle = LoginThrottle::new(&config());
        let t0 = Instant::now();

        for i in 0..4 {
            assert_eq!(
                throttle.record_failure("1.2.3.4", t0 + Duration::from_secs(i)),
                ThrottleDecision::Allowed
            );
        }
        assert!(matches!(
            throttle.record_failure("1.2.3.4", t0 + Duration::from_secs(5)),
            ThrottleDecision::Locked { .. }
        ));

        let later = t0 + Duration::from_secs(65);
        match throttle.check("1.2.3.4", later) {
            ThrottleDecision::Locked { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(840));
            }
            ThrottleDecision::Allowed => panic!("expected lockout"),
        }

        assert_eq!(throttle.check("5.6.7.8", later), ThrottleDecision::Allowed);
    }

    #[test]
    fn test_lock_lifts_after_lockout() {
        let throttle = LoginThrottle::new(&config());
        let t0 = Instant::now();
        for _ in 0..5 {
            throttle.record_failure("k", t0);
        }

        assert!(matches!(
            throttle.check("k", t0 + Duration::from_secs(899)),
            ThrottleDecision::Locked { .. }
        ));
        assert_eq!(
            throttle.check("k", t0 + Duration::from_secs(900)),
            ThrottleDecision::Allowed
        );
        assert_eq!(
            throttle.record_failure("k", t0 + Duration::from_secs(901)),
            ThrottleDecision::Allowed
        );
    }

    #[test]
    fn test_window_expiry_resets_count() {
        let throttle = LoginThrottle::new(&config());
        let t0 = Instant::now();
        for _ in 0..4 {
            throttle.record_failure("k", t0);
        }

        let next_window = t0 + Duration::from_secs(900);
        assert_eq!(
            throttle.record_failure("k", next_window),
            ThrottleDecision::Allowed
        );
        assert_eq!(throttle.check("k", next_window), ThrottleDecision::Allowed);
    }

    #[test]
    fn test_success_clears_key() {
        let throttle = LoginThrottle::new(&config());
        let t0 = Instant::now();
        for _ in 0..4 {
            throttle.record_failure("k", t0);
        }
        throttle.record_success("k");

        for _ in 0..4 {
            assert_eq!(throttle.record_failure("k", t0), ThrottleDecision::Allowed);
        }
    }

    #[test]
    fn test_disabled_never_locks() {
        let throttle = LoginThrottle::new(&AuthThrottleConfig {
            enabled: false,
            ..config()
        });
        let t0 = Instant::now();
        for _ in 0..20 {
            assert_eq!(throttle.record_failure("k", t0), ThrottleDecision::Allowed);
        }
        assert_eq!(throttle.check("k", t0), ThrottleDecision::Allowed);
    }

    #[test]
    fn test_forwarded_header_only_from_trusted_proxy() {
        let throttle = LoginThrottle::new(&config());
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );

        let proxy: IpAddr = "10.0.0.1".parse().unwrap();
        let stranger: IpAddr = "198.51.100.7".parse().unwrap();

        assert_eq!(throttle.client_key(Some(proxy), &headers), "203.0.113.9");
        assert_eq!(throttle.client_key(Some(stranger), &headers), "198.51.100.7");
        assert_eq!(throttle.client_key(None, &headers), "unknown");
    }
}
