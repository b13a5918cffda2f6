//! Weighted choice table.
//!
//! Selection is proportional to each entry's weight among all entries; weights
//! are never normalized up front. [`WeightedTable::pick_at`] is a pure function
//! of a roll in `[0, total)`, so the distribution can be tested directly.

use rand::Rng;

use crate::error::ProfileError;

/// Entries with positive integer weights and their cumulative sums.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    entries: Vec<T>,
    cumulative: Vec<u64>,
}

impl<T> WeightedTable<T> {
    /// Build a table. `label` names an entry in error messages.
    pub fn new<I, L>(items: I, label: L) -> Result<Self, ProfileError>
    where
        I: IntoIterator<Item = (T, u32)>,
        L: Fn(&T) -> String,
    {
        let mut entries = Vec::new();
        let mut cumulative = Vec::new();
        let mut running = 0u64;

        for (item, weight) in items {
            if weight == 0 {
                return Err(ProfileError::ZeroWeight(label(&item)));
            }
            running += u64::from(weight);
            entries.push(item);
            cumulative.push(running);
        }

        if entries.is_empty() {
            return Err(ProfileError::Empty);
        }

        Ok(Self {
            entries,
            cumulative,
        })
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry owning `roll`. Rolls at or past the total clamp to the last entry.
    pub fn pick_at(&self, roll: u64) -> &T {
        let idx = self
            .cumulative
            .partition_point(|&upper| upper <= roll)
            .min(self.entries.len() - 1);
        &self.entries[idx]
    }

    /// Draw an entry with probability proportional to its weight.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        self.pick_at(rng.gen_range(0..self.total_weight()))
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn table() -> WeightedTable<&'static str> {
        WeightedTable::new([("a", 3), ("b", 1), ("c", 6)], |s| s.to_string()).unwrap()
    }

    #[test]
    fn rolls_map_to_cumulative_ranges() {
        let t = table();
        assert_eq!(t.total_weight(), 10);
        assert_eq!(*t.pick_at(0), "a");
        assert_eq!(*t.pick_at(2), "a");
        assert_eq!(*t.pick_at(3), "b");
        assert_eq!(*t.pick_at(4), "c");
        assert_eq!(*t.pick_at(9), "c");
        assert_eq!(*t.pick_at(99), "c");
    }

    #[test]
    fn every_roll_counts_toward_its_weight() {
        let t = table();
        let mut counts = [0u32; 3];
        for roll in 0..t.total_weight() {
            match *t.pick_at(roll) {
                "a" => counts[0] += 1,
                "b" => counts[1] += 1,
                _ => counts[2] += 1,
            }
        }
        assert_eq!(counts, [3, 1, 6]);
    }

    #[test]
    fn random_draws_follow_weights() {
        let t = table();
        let mut rng = StdRng::seed_from_u64(7);
        let draws = 20_000;
        let c = (0..draws).filter(|_| *t.pick(&mut rng) == "c").count();
        let share = c as f64 / draws as f64;
        assert!((share - 0.6).abs() < 0.02, "share of c was {share}");
    }

    #[test]
    fn rejects_empty_and_zero_weight() {
        let empty: Vec<(&str, u32)> = Vec::new();
        assert!(matches!(
            WeightedTable::new(empty, |s| s.to_string()),
            Err(ProfileError::Empty)
        ));
        assert!(matches!(
            WeightedTable::new([("x", 1), ("y", 0)], |s| s.to_string()),
            Err(ProfileError::ZeroWeight(name)) if name == "y"
        ));
    }
}
