// src/progress.rs

/// Highest value the cosmetic animation may reach on its own.
pub const PROGRESS_CAP: f64 = 90.0;
const MAX_STEP: f64 = 10.0;

/// A purely cosmetic progress bar. It creeps upwards while a project is
/// running and says nothing about real server progress.
#[derive(Debug, Clone, Default)]
pub struct ProgressAnimator {
    raw: f64,
}

impl ProgressAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances by `jitter * 10` points where `jitter` is in `[0, 1)`.
    /// Returns the percentage to display.
    pub fn advance(&mut self, jitter: f64) -> u8 {
        if self.raw < PROGRESS_CAP {
            self.raw += jitter.clamp(0.0, 1.0) * MAX_STEP;
        }
        self.percent()
    }

    pub fn percent(&self) -> u8 {
        self.raw.min(PROGRESS_CAP) as u8
    }
}

/// A random number in `[0, 1)` drawn from a v4 uuid's random bits.
pub fn random_jitter() -> f64 {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    let bits = u16::from_le_bytes([bytes[0], bytes[1]]);
    bits as f64 / (u16::MAX as f64 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_never_exceeds_cap() {
        let mut animator = ProgressAnimator::new();
        for _ in 0..100 {
            assert!(animator.advance(0.99) <= 90);
        }
        assert_eq!(animator.percent(), 90);
    }

    #[test]
    fn test_progress_advances_monotonically() {
        let mut animator = ProgressAnimator::new();
        let mut last = 0;
        for jitter in [0.1, 0.0, 0.5, 0.3, 0.9] {
            let now = animator.advance(jitter);
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 18);
    }

    #[test]
    fn test_random_jitter_in_range() {
        for _ in 0..1000 {
            let j = random_jitter();
            assert!((0.0..1.0).contains(&j));
        }
    }
}
