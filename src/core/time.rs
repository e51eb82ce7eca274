//! Simulated tick clock
//!
//! All deferred work (record expiry, immersive felling delays, probe
//! cooldowns) is measured in host ticks rather than wall-clock time, so a
//! session behaves identically no matter how fast the host runs.

/// Default host tick rate
pub const TICKS_PER_SECOND: u32 = 20;

/// Monotonic tick counter owned by a session
#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    tick: u64,
    ticks_per_second: u32,
}

impl TickClock {
    /// Create a clock starting at tick 0
    pub fn new(ticks_per_second: u32) -> Self {
        Self {
            tick: 0,
            ticks_per_second: ticks_per_second.max(1),
        }
    }

    /// Advance by one tick and return the new tick
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Current tick
    pub fn now(&self) -> u64 {
        self.tick
    }

    /// Ticks per simulated second
    pub fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }

    /// Convert simulated seconds to ticks
    pub fn secs_to_ticks(&self, secs: u32) -> u64 {
        secs as u64 * self.ticks_per_second as u64
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(TICKS_PER_SECOND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advance() {
        let mut clock = TickClock::default();
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.advance(), 1);
        assert_eq!(clock.advance(), 2);
        assert_eq!(clock.now(), 2);
    }

    #[test]
    fn test_secs_to_ticks() {
        let clock = TickClock::new(20);
        assert_eq!(clock.secs_to_ticks(5), 100);
        assert_eq!(clock.secs_to_ticks(0), 0);
    }

    #[test]
    fn test_zero_rate_clamped() {
        let clock = TickClock::new(0);
        assert_eq!(clock.ticks_per_second(), 1);
    }
}
