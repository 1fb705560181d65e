use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the timestamp placed in signed requests
///
/// Servers reject requests whose timestamp drifts too far from their own
/// clock, so callers usually want a [`NetworkClock`] kept in sync with a
/// trusted time source rather than the raw system clock.
pub trait Clock: Send + Sync {
    /// Current time in whole seconds since the Unix epoch
    fn now_seconds(&self) -> u64;
}

fn system_seconds() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        // clock set before 1970
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> u64 {
        system_seconds().max(0) as u64
    }
}

/// System time corrected by an offset learned from the network
#[derive(Debug, Default)]
pub struct NetworkClock {
    offset_seconds: AtomicI64,
}

impl NetworkClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the time reported by a network source, in seconds
    pub fn sync(&self, network_seconds: u64) {
        let offset = network_seconds as i64 - system_seconds();
        self.set_offset(offset);
    }

    pub fn set_offset(&self, offset_seconds: i64) {
        tracing::debug!(offset_seconds, "network clock offset updated");
        self.offset_seconds.store(offset_seconds, Ordering::Relaxed);
    }

    pub fn offset(&self) -> i64 {
        self.offset_seconds.load(Ordering::Relaxed)
    }
}

impl Clock for NetworkClock {
    fn now_seconds(&self) -> u64 {
        system_seconds().saturating_add(self.offset()).max(0) as u64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_network_clock_defaults_to_system_time() {
        let clock = NetworkClock::new();
        let system = SystemClock.now_seconds();
        assert_eq!(clock.offset(), 0);
        assert!(clock.now_seconds().abs_diff(system) <= 1);
    }

    #[test]
    fn test_network_clock_applies_offset() {
        let clock = NetworkClock::new();
        clock.set_offset(-3600);
        let system = SystemClock.now_seconds();
        assert!((system - 3600).abs_diff(clock.now_seconds()) <= 1);

        clock.set_offset(120);
        assert!((system + 120).abs_diff(clock.now_seconds()) <= 1);
    }

    #[test]
    fn test_network_clock_sync() {
        let clock = NetworkClock::new();
        let ahead = SystemClock.now_seconds() + 500;
        clock.sync(ahead);
        assert!((499..=501).contains(&clock.offset()));
        assert!(clock.now_seconds().abs_diff(ahead) <= 1);
    }

    #[test]
    fn test_network_clock_never_goes_negative() {
        let clock = NetworkClock::new();
        clock.set_offset(i64::MIN);
        assert_eq!(clock.now_seconds(), 0);
    }
}
