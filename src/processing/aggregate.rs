//! Per-title aggregation of joined ratings.
//!
//! Aggregation is a fold into [`RatingAccumulator`]s keyed by title. Accumulators sum exactly,
//! so partial tables built over disjoint slices of the joined ratings combine with
//! [`StatsTable::merge`] into the same table, bit for bit, whatever the input order or chunking.

use std::collections::BTreeMap;

use crate::types::{JoinedRating, MovieStats, RatingAccumulator};

/// Running `(sum, count)` per title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsTable {
    by_title: BTreeMap<String, RatingAccumulator>,
}

impl StatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one joined rating into the table.
    pub fn add(&mut self, title: &str, value: f64) {
        match self.by_title.get_mut(title) {
            Some(acc) => acc.push(value),
            None => {
                self.by_title.insert(title.to_owned(), RatingAccumulator::single(value));
            }
        }
    }

    /// Combine two partial tables.
    pub fn merge(mut self, other: StatsTable) -> StatsTable {
        for (title, acc) in other.by_title {
            match self.by_title.get_mut(&title) {
                Some(mine) => mine.merge(acc),
                None => {
                    self.by_title.insert(title, acc);
                }
            }
        }
        self
    }

    /// Accumulator for a title.
    pub fn get(&self, title: &str) -> Option<&RatingAccumulator> {
        self.by_title.get(title)
    }

    /// Number of distinct titles.
    pub fn len(&self) -> usize {
        self.by_title.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_title.is_empty()
    }

    /// One [`MovieStats`] per title, ordered by title.
    pub fn to_stats(&self) -> Vec<MovieStats> {
        self.by_title
            .iter()
            .filter_map(|(title, acc)| acc.mean().map(|mean| MovieStats::new(title.as_str(), mean, acc.count)))
            .collect()
    }
}

impl<'a> FromIterator<&'a JoinedRating> for StatsTable {
    fn from_iter<I: IntoIterator<Item = &'a JoinedRating>>(iter: I) -> Self {
        let mut table = StatsTable::new();
        for jr in iter {
            table.add(&jr.title, jr.value);
        }
        table
    }
}

/// Fold joined ratings into a [`StatsTable`].
pub fn aggregate(joined: &[JoinedRating]) -> StatsTable {
    joined.iter().collect()
}

/// Convenience wrapper: aggregate and return per-title stats ordered by title.
pub fn movie_stats(joined: &[JoinedRating]) -> Vec<MovieStats> {
    aggregate(joined).to_stats()
}
