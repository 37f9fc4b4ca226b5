//! Identifier and choice generation.

use std::sync::atomic::{AtomicU32, Ordering};

use rand::Rng;

/// Source of support-ticket ids and template choices.
pub trait IdGenerator: Send + Sync {
    /// Returns `prefix` followed by six digits, e.g. `RET482913`.
    fn support_id(&self, prefix: &str) -> String;

    /// Picks an index in `0..len`. `len` is never zero.
    fn choose(&self, len: usize) -> usize;
}

/// Random ids, for production.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn support_id(&self, prefix: &str) -> String {
        let n: u32 = rand::thread_rng().gen_range(100_000..=999_999);
        format!("{prefix}{n}")
    }

    fn choose(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len.max(1))
    }
}

/// Deterministic ids for tests: `RET100001`, `RET100002`, ...
/// and always the same template choice.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: AtomicU32,
    choice: usize,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always choose index `choice` (clamped to the available range).
    pub fn with_choice(choice: usize) -> Self {
        Self {
            counter: AtomicU32::new(0),
            choice,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn support_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}{}", 100_000 + n)
    }

    fn choose(&self, len: usize) -> usize {
        self.choice.min(len.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_have_six_digits() {
        let ids = RandomIdGenerator;
        for _ in 0..50 {
            let id = ids.support_id("RET");
            assert_eq!(id.len(), 9);
            assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
            assert!(ids.choose(3) < 3);
        }
    }

    #[test]
    fn sequential_ids_are_predictable() {
        let ids = SequentialIdGenerator::new();
        assert_eq!(ids.support_id("RET"), "RET100001");
        assert_eq!(ids.support_id("EXC"), "EXC100002");
        assert_eq!(ids.choose(3), 0);

        let last = SequentialIdGenerator::with_choice(7);
        assert_eq!(last.choose(3), 2);
    }
}
