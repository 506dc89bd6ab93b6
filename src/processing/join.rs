//! Inner join of ratings to movie titles.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{JoinedRating, Movie, Rating};

/// How a catalog with repeated movie ids is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateIdPolicy {
    /// Keep the first row for each id; later rows are ignored.
    #[default]
    FirstWins,
    /// Fail with [`PipelineError::DuplicateMovieId`].
    FailFast,
}

/// Lookup from movie id to title, the build side of the join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieIndex {
    titles: HashMap<String, String>,
}

impl MovieIndex {
    /// Index a catalog by id.
    pub fn build(movies: &[Movie], policy: DuplicateIdPolicy) -> PipelineResult<Self> {
        let mut titles = HashMap::with_capacity(movies.len());
        for movie in movies {
            match titles.entry(movie.id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(movie.title.clone());
                }
                Entry::Occupied(existing) => {
                    if policy == DuplicateIdPolicy::FailFast {
                        return Err(PipelineError::DuplicateMovieId {
                            id: movie.id.clone(),
                            first_title: existing.get().clone(),
                            second_title: movie.title.clone(),
                        });
                    }
                    log::debug!("ignoring duplicate movie id '{}' ('{}')", movie.id, movie.title);
                }
            }
        }
        Ok(Self { titles })
    }

    /// Title for a movie id, if the catalog has it.
    pub fn title_of(&self, movie_id: &str) -> Option<&str> {
        self.titles.get(movie_id).map(String::as_str)
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// Join ratings against an index. Ratings for unknown ids are dropped.
///
/// Output order follows `ratings`.
pub fn join(index: &MovieIndex, ratings: &[Rating]) -> Vec<JoinedRating> {
    ratings
        .iter()
        .filter_map(|r| index.title_of(&r.movie_id).map(|title| JoinedRating::new(title, r.value)))
        .collect()
}

/// Index `movies` and join `ratings` against it in one step.
pub fn join_ratings(
    movies: &[Movie],
    ratings: &[Rating],
    policy: DuplicateIdPolicy,
) -> PipelineResult<Vec<JoinedRating>> {
    let index = MovieIndex::build(movies, policy)?;
    Ok(join(&index, ratings))
}

#[cfg(test)]
mod tests {
    use super::{join_ratings, DuplicateIdPolicy, MovieIndex};
    use crate::error::PipelineError;
    use crate::types::{JoinedRating, Movie, Rating};

    fn catalog() -> Vec<Movie> {
        vec![
            Movie::new("1", "A", "Comedy"),
            Movie::new("2", "B", "Drama"),
            Movie::new("3", "Unrated", "Horror"),
        ]
    }

    #[test]
    fn every_matching_rating_yields_one_pair() {
        let ratings = vec![
            Rating::new("u1", "1", 5.0, 0),
            Rating::new("u2", "1", 4.0, 0),
            Rating::new("u1", "2", 3.0, 0),
        ];
        let joined = join_ratings(&catalog(), &ratings, DuplicateIdPolicy::FirstWins).unwrap();
        assert_eq!(
            joined,
            vec![
                JoinedRating::new("A", 5.0),
                JoinedRating::new("A", 4.0),
                JoinedRating::new("B", 3.0),
            ]
        );
    }

    #[test]
    fn orphan_ratings_are_dropped_silently() {
        let ratings = vec![Rating::new("u1", "999", 5.0, 0), Rating::new("u1", "2", 1.0, 0)];
        let joined = join_ratings(&catalog(), &ratings, DuplicateIdPolicy::FirstWins).unwrap();
        assert_eq!(joined, vec![JoinedRating::new("B", 1.0)]);
    }

    #[test]
    fn first_row_wins_for_duplicate_ids() {
        let movies = vec![Movie::new("1", "First", "x"), Movie::new("1", "Second", "y")];
        let index = MovieIndex::build(&movies, DuplicateIdPolicy::FirstWins).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.title_of("1"), Some("First"));
    }

    #[test]
    fn fail_fast_rejects_duplicate_ids() {
        let movies = vec![Movie::new("1", "First", "x"), Movie::new("1", "Second", "y")];
        let err = MovieIndex::build(&movies, DuplicateIdPolicy::FailFast).unwrap_err();
        match err {
            PipelineError::DuplicateMovieId {
                id,
                first_title,
                second_title,
            } => {
                assert_eq!(id, "1");
                assert_eq!(first_title, "First");
                assert_eq!(second_title, "Second");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ids_are_matched_exactly() {
        let ratings = vec![Rating::new("u1", " 1", 5.0, 0), Rating::new("u1", "01", 5.0, 0)];
        let joined = join_ratings(&catalog(), &ratings, DuplicateIdPolicy::FirstWins).unwrap();
        assert!(joined.is_empty());
    }
}
