//! Core data model types.
//!
//! [`Movie`] and [`Rating`] are produced once per input line and never mutated.
//! [`JoinedRating`] and [`MovieStats`] are derived fresh on every run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which input dataset a line or record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dataset {
    /// Movie catalog (`id,title,genres`).
    Movies,
    /// Rating events (`userId,movieId,rating,timestamp`).
    Ratings,
}

impl Dataset {
    /// Number of positional fields a data line must yield.
    pub fn expected_fields(self) -> usize {
        match self {
            Self::Movies => 3,
            Self::Ratings => 4,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movies => f.write_str("movies"),
            Self::Ratings => f.write_str("ratings"),
        }
    }
}

/// A catalog entry. `id` is the join key.
///
/// `title` and `genres` are kept as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub genres: String,
}

impl Movie {
    pub fn new(id: impl Into<String>, title: impl Into<String>, genres: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            genres: genres.into(),
        }
    }
}

/// A single rating event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: String,
    pub movie_id: String,
    pub value: f64,
    pub timestamp: i64,
}

impl Rating {
    pub fn new(
        user_id: impl Into<String>,
        movie_id: impl Into<String>,
        value: f64,
        timestamp: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            movie_id: movie_id.into(),
            value,
            timestamp,
        }
    }
}

/// A rating matched to its movie title by the join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRating {
    pub title: String,
    pub value: f64,
}

impl JoinedRating {
    pub fn new(title: impl Into<String>, value: f64) -> Self {
        Self {
            title: title.into(),
            value,
        }
    }
}

/// Running `(sum, count)` for one title.
///
/// The sum is kept exactly as a list of non-overlapping partials (Shewchuk's algorithm) and
/// rounded once when read, so the result is independent of the order ratings are pushed in
/// and of how partial accumulators are grouped by [`RatingAccumulator::merge`].
#[derive(Debug, Clone, Default)]
pub struct RatingAccumulator {
    /// Non-overlapping, ordered by increasing magnitude; their exact sum is the rating sum.
    partials: Vec<f64>,
    pub count: u64,
}

impl RatingAccumulator {
    /// Accumulator holding a single rating.
    pub fn single(value: f64) -> Self {
        let mut acc = Self::default();
        acc.push(value);
        acc
    }

    /// Fold one more rating into the accumulator.
    pub fn push(&mut self, value: f64) {
        add_exact(&mut self.partials, value);
        self.count += 1;
    }

    /// Combine another partial accumulator into this one.
    pub fn merge(&mut self, other: RatingAccumulator) {
        for p in other.partials {
            add_exact(&mut self.partials, p);
        }
        self.count += other.count;
    }

    /// Sum of all ratings, correctly rounded.
    pub fn sum(&self) -> f64 {
        round_partials(&self.partials)
    }

    /// Arithmetic mean, or `None` for an empty accumulator.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum() / self.count as f64)
        }
    }
}

impl PartialEq for RatingAccumulator {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.sum() == other.sum()
    }
}

fn add_exact(partials: &mut Vec<f64>, mut x: f64) {
    let mut kept = 0;
    for j in 0..partials.len() {
        let mut y = partials[j];
        if x.abs() < y.abs() {
            std::mem::swap(&mut x, &mut y);
        }
        let hi = x + y;
        let lo = y - (hi - x);
        if lo != 0.0 {
            partials[kept] = lo;
            kept += 1;
        }
        x = hi;
    }
    partials.truncate(kept);
    partials.push(x);
}

fn round_partials(partials: &[f64]) -> f64 {
    let Some((&top, rest)) = partials.split_last() else {
        return 0.0;
    };
    let mut hi = top;
    let mut lo = 0.0;
    let mut n = rest.len();
    while n > 0 {
        let x = hi;
        n -= 1;
        let y = rest[n];
        hi = x + y;
        lo = y - (hi - x);
        if lo != 0.0 {
            break;
        }
    }
    // Half-way case: the remaining partials decide which way `lo` rounds.
    if n > 0 && ((lo < 0.0 && rest[n - 1] < 0.0) || (lo > 0.0 && rest[n - 1] > 0.0)) {
        let y = lo * 2.0;
        let x = hi + y;
        if y == x - hi {
            hi = x;
        }
    }
    hi
}

/// Per-title aggregate. `rating_count` is always at least 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieStats {
    pub title: String,
    pub mean_rating: f64,
    pub rating_count: u64,
}

impl MovieStats {
    pub fn new(title: impl Into<String>, mean_rating: f64, rating_count: u64) -> Self {
        Self {
            title: title.into(),
            mean_rating,
            rating_count,
        }
    }
}
