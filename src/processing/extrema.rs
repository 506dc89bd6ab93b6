//! Selection of the best and worst rated titles.
//!
//! Both directions run the same steps:
//!
//! 1. find the extreme (max or min) mean over all titles
//! 2. keep every title whose mean equals it exactly
//! 3. take the count of the k-th entry when those titles' rating counts are sorted descending,
//!    or the smallest count when there are fewer than k titles
//! 4. keep every extreme title whose count reaches that threshold
//!
//! Step 4 is tie-inclusive, so a selection can hold more than k titles.

use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::types::MovieStats;

/// Number of most-rated titles kept per extreme unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 5;

/// Which end of the mean-rating range to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Extreme {
    /// Global maximum mean.
    Highest,
    /// Global minimum mean.
    Lowest,
}

/// Titles selected for one extreme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub extreme: Extreme,
    /// The extreme mean, `None` when there were no stats at all.
    pub extreme_value: Option<f64>,
    /// Minimum rating count a title needed to be kept.
    pub count_threshold: Option<u64>,
    /// Selected titles, in input order.
    pub titles: Vec<MovieStats>,
}

/// Maximum or minimum mean rating across all titles.
pub fn extreme_value(stats: &[MovieStats], extreme: Extreme) -> Option<f64> {
    stats
        .iter()
        .map(|s| s.mean_rating)
        .reduce(|a, b| match extreme {
            Extreme::Highest => a.max(b),
            Extreme::Lowest => a.min(b),
        })
}

/// Titles whose mean equals `value` exactly.
pub fn extreme_set(stats: &[MovieStats], value: f64) -> Vec<&MovieStats> {
    stats.iter().filter(|s| s.mean_rating == value).collect()
}

/// Tie-inclusive top-k threshold: the k-th highest count, or the minimum if fewer than k.
///
/// Returns `None` for no counts or `k == 0`.
pub fn count_threshold(counts: impl IntoIterator<Item = u64>, k: usize) -> Option<u64> {
    if k == 0 {
        return None;
    }
    let mut counts: Vec<u64> = counts.into_iter().collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));
    counts.get(k - 1).or_else(|| counts.last()).copied()
}

/// Run all four selection steps for one extreme.
pub fn select(stats: &[MovieStats], extreme: Extreme, k: usize) -> PipelineResult<Selection> {
    if k == 0 {
        return Err(PipelineError::InvalidOptions {
            message: "top_k must be at least 1".to_string(),
        });
    }

    let Some(value) = extreme_value(stats, extreme) else {
        return Ok(Selection {
            extreme,
            extreme_value: None,
            count_threshold: None,
            titles: Vec::new(),
        });
    };

    let candidates = extreme_set(stats, value);
    let threshold = count_threshold(candidates.iter().map(|s| s.rating_count), k);
    let titles = candidates
        .into_iter()
        .filter(|s| threshold.is_some_and(|t| s.rating_count >= t))
        .cloned()
        .collect();

    Ok(Selection {
        extreme,
        extreme_value: Some(value),
        count_threshold: threshold,
        titles,
    })
}

/// Select both extremes: `(highest, lowest)`.
pub fn select_extremes(stats: &[MovieStats], k: usize) -> PipelineResult<(Selection, Selection)> {
    Ok((
        select(stats, Extreme::Highest, k)?,
        select(stats, Extreme::Lowest, k)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::{count_threshold, extreme_value, select, select_extremes, Extreme};
    use crate::error::PipelineError;
    use crate::types::MovieStats;

    fn titles(sel: &super::Selection) -> Vec<&str> {
        sel.titles.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn threshold_is_kth_highest_count() {
        assert_eq!(count_threshold([9, 1, 7, 3, 5, 8, 2], 5), Some(3));
        assert_eq!(count_threshold([4, 4, 4, 4, 4, 4], 5), Some(4));
    }

    #[test]
    fn threshold_degrades_to_minimum_for_small_sets() {
        assert_eq!(count_threshold([3, 1, 2], 5), Some(1));
        assert_eq!(count_threshold([], 5), None);
        assert_eq!(count_threshold([3], 0), None);
    }

    #[test]
    fn worked_example() {
        let stats = vec![
            MovieStats::new("A", 5.0, 2),
            MovieStats::new("B", 5.0, 1),
            MovieStats::new("C", 1.0, 1),
        ];
        let (top, bottom) = select_extremes(&stats, 5).unwrap();
        assert_eq!(top.extreme_value, Some(5.0));
        assert_eq!(top.count_threshold, Some(1));
        assert_eq!(titles(&top), vec!["A", "B"]);
        assert_eq!(bottom.extreme_value, Some(1.0));
        assert_eq!(titles(&bottom), vec!["C"]);
    }

    #[test]
    fn ties_at_threshold_can_exceed_k() {
        let counts = [10, 9, 8, 7, 3, 3, 3, 1];
        let stats: Vec<MovieStats> = counts
            .iter()
            .enumerate()
            .map(|(i, c)| MovieStats::new(format!("T{i}"), 5.0, *c))
            .collect();
        let top = select(&stats, Extreme::Highest, 5).unwrap();
        assert_eq!(top.count_threshold, Some(3));
        assert_eq!(top.titles.len(), 7);
        assert!(top.titles.iter().all(|s| s.rating_count >= 3));
    }

    #[test]
    fn all_titles_tied_makes_whole_catalog_the_extreme_set() {
        let stats: Vec<MovieStats> = (0..8u64)
            .map(|i| MovieStats::new(format!("M{i}"), 3.0, i + 1))
            .collect();
        let (top, bottom) = select_extremes(&stats, 5).unwrap();
        assert_eq!(top.titles, bottom.titles);
        assert_eq!(titles(&top), vec!["M3", "M4", "M5", "M6", "M7"]);
    }

    #[test]
    fn near_equal_means_are_not_ties() {
        let stats = vec![
            MovieStats::new("exact", 4.0, 1),
            MovieStats::new("close", 4.0 - 1e-12, 50),
        ];
        assert_eq!(extreme_value(&stats, Extreme::Highest), Some(4.0));
        let top = select(&stats, Extreme::Highest, 5).unwrap();
        assert_eq!(titles(&top), vec!["exact"]);
    }

    #[test]
    fn empty_stats_select_nothing() {
        let (top, bottom) = select_extremes(&[], 5).unwrap();
        assert!(top.titles.is_empty());
        assert!(bottom.titles.is_empty());
        assert_eq!(top.extreme_value, None);
    }

    #[test]
    fn zero_k_is_rejected() {
        let err = select(&[MovieStats::new("A", 1.0, 1)], Extreme::Lowest, 0).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidOptions { .. }));
    }
}
