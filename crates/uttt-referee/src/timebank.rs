//! Per-agent thinking time

use std::time::Duration;

/// Rolling time allowance carried across a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timebank {
    remaining: Duration,
    max: Duration,
    increment: Duration,
}

impl Timebank {
    /// A full timebank
    pub fn new(max: Duration, increment: Duration) -> Self {
        Self {
            remaining: max,
            max,
            increment,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Add the per-move increment, capped at the maximum, and return the
    /// allowance offered for the coming move.
    pub fn replenish(&mut self) -> Duration {
        self.remaining = (self.remaining + self.increment).min(self.max);
        self.remaining
    }

    /// Deduct time spent on a move.
    ///
    /// Returns the new balance, or `None` (leaving the bank empty) when
    /// `elapsed` exceeds what was left.
    pub fn charge(&mut self, elapsed: Duration) -> Option<Duration> {
        match self.remaining.checked_sub(elapsed) {
            Some(left) => {
                self.remaining = left;
                Some(left)
            }
            None => {
                self.remaining = Duration::ZERO;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_replenish_caps_at_max() {
        let mut bank = Timebank::new(ms(10000), ms(500));
        bank.charge(ms(200)).unwrap();
        assert_eq!(bank.remaining(), ms(9800));

        // 9800 + 500 is capped at 10000
        assert_eq!(bank.replenish(), ms(10000));
        assert_eq!(bank.charge(ms(600)), Some(ms(9400)));
        assert_eq!(bank.remaining(), ms(9400));
    }

    #[test]
    fn test_replenish_below_cap() {
        let mut bank = Timebank::new(ms(10000), ms(500));
        bank.charge(ms(3000)).unwrap();
        assert_eq!(bank.replenish(), ms(7500));
    }

    #[test]
    fn test_overrun_empties_bank() {
        let mut bank = Timebank::new(ms(1000), ms(100));
        let offered = bank.replenish();
        assert_eq!(offered, ms(1000));
        assert_eq!(bank.charge(ms(1001)), None);
        assert_eq!(bank.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_spending_exactly_the_balance_is_allowed() {
        let mut bank = Timebank::new(ms(1000), ms(100));
        assert_eq!(bank.charge(ms(1000)), Some(Duration::ZERO));
    }
}
