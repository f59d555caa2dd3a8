//! Fresh suffixes for synthesized identifiers.

use ahash::AHashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UidMode {
    Random,
    Sequential,
}

/// Issues identifier-safe suffixes that never repeat within one run.
///
/// `random()` is the production default; `sequential()` yields `0`, `1`, ...
/// so converted output is reproducible in tests.
#[derive(Debug, Clone)]
pub struct UidGenerator {
    mode: UidMode,
    counter: u64,
    issued: AHashSet<String>,
}

impl UidGenerator {
    #[must_use]
    pub fn random() -> Self {
        Self::with_mode(UidMode::Random)
    }

    #[must_use]
    pub fn sequential() -> Self {
        Self::with_mode(UidMode::Sequential)
    }

    fn with_mode(mode: UidMode) -> Self {
        Self {
            mode,
            counter: 0,
            issued: AHashSet::new(),
        }
    }

    /// Returns a suffix distinct from every other suffix this generator has issued.
    pub fn next(&mut self) -> String {
        loop {
            let candidate = match self.mode {
                UidMode::Random => Uuid::new_v4().simple().to_string(),
                UidMode::Sequential => {
                    let value = self.counter;
                    self.counter += 1;
                    value.to_string()
                }
            };
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Starts a new run: the counter restarts and earlier suffixes may be
    /// issued again.
    pub(crate) fn reset(&mut self) {
        self.counter = 0;
        self.issued.clear();
    }

    /// Number of suffixes issued so far.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}

impl Default for UidGenerator {
    fn default() -> Self {
        Self::random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_counts_from_zero() {
        let mut uids = UidGenerator::sequential();
        assert_eq!(uids.next(), "0");
        assert_eq!(uids.next(), "1");
        assert_eq!(uids.issued(), 2);
    }

    #[test]
    fn reset_starts_a_new_run() {
        let mut uids = UidGenerator::sequential();
        uids.next();
        uids.next();
        uids.reset();
        assert_eq!(uids.issued(), 0);
        assert_eq!(uids.next(), "0");
    }

    #[test]
    fn random_values_are_identifier_safe_and_unique() {
        let mut uids = UidGenerator::random();
        let values: AHashSet<String> = (0..64).map(|_| uids.next()).collect();
        assert_eq!(values.len(), 64);
        assert!(
            values.iter().all(|v| v.chars().all(|c| c.is_ascii_hexdigit())),
            "uids must embed in identifiers: {values:?}"
        );
    }
}
