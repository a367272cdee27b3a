//! Collision-free naming for variables derived from layer names.

use std::collections::HashMap;

/// Allocates disambiguated names within one reconciliation batch.
///
/// The first occurrence of a base name stays verbatim; the n-th duplicate
/// becomes `{base}_{n}`. The counter advances by exactly one per occurrence,
/// so suffixes are consecutive.
#[derive(Debug, Default)]
pub struct NameAllocator {
    occurrences: HashMap<String, usize>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next free name for `base`.
    pub fn disambiguate(&mut self, base: &str) -> String {
        let count = self.occurrences.get(base).copied().unwrap_or(0);
        let name = if count == 0 {
            base.to_owned()
        } else {
            format!("{base}_{count}")
        };
        self.occurrences.insert(base.to_owned(), count + 1);
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_get_consecutive_suffixes() {
        let mut names = NameAllocator::new();
        let allocated: Vec<String> = ["A", "A", "B", "A"]
            .iter()
            .map(|base| names.disambiguate(base))
            .collect();
        assert_eq!(allocated, ["A", "A_1", "B", "A_2"]);
    }

    #[test]
    fn allocations_are_pairwise_distinct() {
        let mut names = NameAllocator::new();
        let allocated: Vec<String> = (0..5).map(|_| names.disambiguate("Title")).collect();
        for (i, a) in allocated.iter().enumerate() {
            for b in &allocated[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn each_batch_starts_fresh() {
        let mut first = NameAllocator::new();
        first.disambiguate("A");
        first.disambiguate("A");

        let mut second = NameAllocator::new();
        assert_eq!(second.disambiguate("A"), "A");
    }
}
