//! Line-to-record parsing for the movie catalog and the rating events.
//!
//! The default [`SplitStrategy::QuoteHeuristic`] is a positional splitter, not a CSV parser:
//!
//! - Movie lines containing a `"` have every `,"` rewritten to `",` and are then split on
//!   `",`. A quoted title such as `"American President, The (1995)"` therefore survives its
//!   internal comma, and loses its surrounding quotes.
//! - Movie lines without a `"` are split on bare commas. A title with an internal comma and no
//!   wrapping quotes mis-splits; the first three fields are used regardless.
//! - Rating lines are always split on bare commas.
//!
//! [`SplitStrategy::Rfc4180`] uses a real quoted-field reader instead.
//!
//! A line that yields fewer fields than its dataset needs, or whose numeric fields do not parse,
//! is an error. Whether that error aborts the run is decided by [`MalformedLinePolicy`].

use csv::StringRecord;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{Dataset, Movie, Rating};

use super::lines::normalize_line;

/// 1-based line number of the first data line (line 1 is the header).
pub const FIRST_DATA_LINE: usize = 2;

/// How data lines are split into fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitStrategy {
    /// Split on `",` after rewriting `,"` for quote-containing lines, on `,` otherwise.
    #[default]
    QuoteHeuristic,
    /// Quoted-field parsing with the `csv` crate. Fields are trimmed.
    Rfc4180,
}

/// What to do with a data line that cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedLinePolicy {
    /// Abort the whole run.
    #[default]
    Fail,
    /// Drop the line, report it, and keep going.
    Skip,
}

/// A record type that can be parsed from one data line.
pub trait Record: Sized + Send {
    /// Dataset this record belongs to.
    const DATASET: Dataset;

    /// Parse one (already normalized) data line.
    fn parse_line(line_no: usize, line: &str, strategy: SplitStrategy) -> PipelineResult<Self>;
}

impl Record for Movie {
    const DATASET: Dataset = Dataset::Movies;

    fn parse_line(line_no: usize, line: &str, strategy: SplitStrategy) -> PipelineResult<Self> {
        match strategy {
            SplitStrategy::QuoteHeuristic => {
                let fields = split_movie_fields(line);
                match fields.as_slice() {
                    [id, title, genres, ..] => Ok(Movie::new(id.as_str(), title.as_str(), genres.as_str())),
                    _ => Err(malformed(Dataset::Movies, line_no, line, fields.len())),
                }
            }
            SplitStrategy::Rfc4180 => {
                let record = positional_record(Dataset::Movies, line_no, line)?;
                record
                    .deserialize::<Movie>(None)
                    .map_err(|e| record_error(Dataset::Movies, line_no, line, e))
            }
        }
    }
}

impl Record for Rating {
    const DATASET: Dataset = Dataset::Ratings;

    fn parse_line(line_no: usize, line: &str, strategy: SplitStrategy) -> PipelineResult<Self> {
        let rating = match strategy {
            SplitStrategy::QuoteHeuristic => {
                let fields: Vec<&str> = line.split(',').collect();
                match fields.as_slice() {
                    [user_id, movie_id, value, timestamp, ..] => Rating::new(
                        *user_id,
                        *movie_id,
                        parse_field(line_no, line, "rating", value)?,
                        parse_field(line_no, line, "timestamp", timestamp)?,
                    ),
                    _ => return Err(malformed(Dataset::Ratings, line_no, line, fields.len())),
                }
            }
            SplitStrategy::Rfc4180 => {
                let record = positional_record(Dataset::Ratings, line_no, line)?;
                record
                    .deserialize::<Rating>(None)
                    .map_err(|e| record_error(Dataset::Ratings, line_no, line, e))?
            }
        };

        if !rating.value.is_finite() {
            return Err(PipelineError::ParseError {
                dataset: Dataset::Ratings,
                line: line_no,
                field: "rating",
                raw: line.to_owned(),
                message: "rating must be a finite number".to_string(),
            });
        }
        Ok(rating)
    }
}

/// Split a movie line with the quote heuristic.
pub fn split_movie_fields(line: &str) -> Vec<String> {
    if line.contains('"') {
        line.replace(",\"", "\",")
            .split("\",")
            .map(str::to_owned)
            .collect()
    } else {
        line.split(',').map(str::to_owned).collect()
    }
}

/// Serialize a movie back to a quote-free line.
///
/// Only meaningful for movies whose fields contain neither `,` nor `"`.
pub fn format_movie_line(movie: &Movie) -> String {
    format!("{},{},{}", movie.id, movie.title, movie.genres)
}

/// The data lines of a dataset: everything after the header.
pub fn data_lines<S: AsRef<str>>(lines: &[S]) -> &[S] {
    lines.get(1..).unwrap_or(&[])
}

/// A data line dropped under [`MalformedLinePolicy::Skip`].
#[derive(Debug)]
pub struct SkippedLine {
    /// 1-based line number in the dataset.
    pub line: usize,
    /// Why the line was rejected.
    pub error: PipelineError,
}

/// Parsed records plus the lines that were skipped to get them.
#[derive(Debug)]
pub struct ParsedRecords<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedLine>,
}

impl<T> Default for ParsedRecords<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> ParsedRecords<T> {
    /// Append `other` after `self`, keeping line order.
    pub fn append(&mut self, other: ParsedRecords<T>) {
        self.records.extend(other.records);
        self.skipped.extend(other.skipped);
    }
}

/// Parse a run of data lines.
///
/// `first_line_no` is the 1-based line number of `lines[0]` in the source dataset.
pub fn parse_data_lines<T, S>(
    lines: &[S],
    first_line_no: usize,
    strategy: SplitStrategy,
    policy: MalformedLinePolicy,
) -> PipelineResult<ParsedRecords<T>>
where
    T: Record,
    S: AsRef<str>,
{
    let mut out = ParsedRecords {
        records: Vec::with_capacity(lines.len()),
        skipped: Vec::new(),
    };
    for (offset, raw) in lines.iter().enumerate() {
        let line_no = first_line_no + offset;
        match T::parse_line(line_no, normalize_line(raw.as_ref()), strategy) {
            Ok(record) => out.records.push(record),
            Err(error) if policy == MalformedLinePolicy::Skip && error.is_line_error() => {
                out.skipped.push(SkippedLine { line: line_no, error });
            }
            Err(error) => return Err(error),
        }
    }
    Ok(out)
}

/// Parse a whole dataset (header included) into records.
pub fn parse_records<T, S>(
    lines: &[S],
    strategy: SplitStrategy,
    policy: MalformedLinePolicy,
) -> PipelineResult<ParsedRecords<T>>
where
    T: Record,
    S: AsRef<str>,
{
    parse_data_lines(data_lines(lines), FIRST_DATA_LINE, strategy, policy)
}

fn parse_field<V>(line_no: usize, line: &str, field: &'static str, raw: &str) -> PipelineResult<V>
where
    V: std::str::FromStr,
    V::Err: std::fmt::Display,
{
    raw.trim().parse::<V>().map_err(|e| PipelineError::ParseError {
        dataset: Dataset::Ratings,
        line: line_no,
        field,
        raw: line.to_owned(),
        message: format!("{e} (value='{raw}')"),
    })
}

fn positional_record(dataset: Dataset, line_no: usize, line: &str) -> PipelineResult<StringRecord> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    rdr.read_record(&mut record)?;

    let expected = dataset.expected_fields();
    if record.len() < expected {
        return Err(malformed(dataset, line_no, line, record.len()));
    }
    Ok(record.iter().take(expected).collect())
}

fn record_error(dataset: Dataset, line_no: usize, line: &str, e: csv::Error) -> PipelineError {
    PipelineError::ParseError {
        dataset,
        line: line_no,
        field: "record",
        raw: line.to_owned(),
        message: e.to_string(),
    }
}

fn malformed(dataset: Dataset, line_no: usize, line: &str, found: usize) -> PipelineError {
    PipelineError::MalformedLine {
        dataset,
        line: line_no,
        expected: dataset.expected_fields(),
        found,
        raw: line.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        format_movie_line, parse_records, split_movie_fields, MalformedLinePolicy, Record,
        SplitStrategy,
    };
    use crate::error::PipelineError;
    use crate::types::{Movie, Rating};

    #[test]
    fn quote_free_movie_line_splits_on_commas() {
        let m = Movie::parse_line(2, "1,Toy Story (1995),Adventure|Animation", SplitStrategy::QuoteHeuristic)
            .unwrap();
        assert_eq!(m, Movie::new("1", "Toy Story (1995)", "Adventure|Animation"));
    }

    #[test]
    fn quoted_title_keeps_internal_comma() {
        let line = r#"11,"American President, The (1995)",Comedy|Drama|Romance"#;
        assert_eq!(
            split_movie_fields(line),
            vec!["11", "American President, The (1995)", "Comedy|Drama|Romance"]
        );
        let m = Movie::parse_line(2, line, SplitStrategy::QuoteHeuristic).unwrap();
        assert_eq!(m.title, "American President, The (1995)");
    }

    #[test]
    fn doubled_inner_quotes_are_left_alone() {
        let line = r#"7,"Movie ""Nickname"" (1999)",Drama"#;
        let m = Movie::parse_line(2, line, SplitStrategy::QuoteHeuristic).unwrap();
        assert_eq!(m.title, r#"Movie ""Nickname"" (1999)"#);
        assert_eq!(m.genres, "Drama");
    }

    #[test]
    fn unquoted_embedded_comma_mis_splits() {
        let m = Movie::parse_line(2, "5,Title, With Comma,Drama", SplitStrategy::QuoteHeuristic).unwrap();
        assert_eq!(m.title, "Title");
        assert_eq!(m.genres, " With Comma");
    }

    #[test]
    fn rfc4180_handles_embedded_commas() {
        let m = Movie::parse_line(2, "5,\"Title, With Comma\",Drama", SplitStrategy::Rfc4180).unwrap();
        assert_eq!(m, Movie::new("5", "Title, With Comma", "Drama"));
    }

    #[test]
    fn quote_free_line_round_trips() {
        let line = "42,Heat (1995),Action|Crime|Thriller";
        let m = Movie::parse_line(2, line, SplitStrategy::QuoteHeuristic).unwrap();
        assert_eq!(format_movie_line(&m), line);
    }

    #[test]
    fn rating_line_is_typed() {
        let r = Rating::parse_line(2, "1,31,2.5,1260759144", SplitStrategy::QuoteHeuristic).unwrap();
        assert_eq!(r, Rating::new("1", "31", 2.5, 1_260_759_144));

        let r = Rating::parse_line(2, "1,31,2.5,1260759144", SplitStrategy::Rfc4180).unwrap();
        assert_eq!(r, Rating::new("1", "31", 2.5, 1_260_759_144));
    }

    #[test]
    fn short_lines_are_malformed() {
        let err = Movie::parse_line(3, "1,Only Title", SplitStrategy::QuoteHeuristic).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedLine { line: 3, expected: 3, found: 2, .. }
        ));

        let err = Rating::parse_line(4, "1,2,3.0", SplitStrategy::Rfc4180).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedLine { line: 4, expected: 4, found: 3, .. }
        ));
    }

    #[test]
    fn bad_numbers_are_parse_errors() {
        let err = Rating::parse_line(2, "1,2,great,0", SplitStrategy::QuoteHeuristic).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("failed to parse ratings line 2"));
        assert!(msg.contains("field 'rating'"));

        let err = Rating::parse_line(2, "1,2,4.0,yesterday", SplitStrategy::QuoteHeuristic).unwrap_err();
        assert!(err.to_string().contains("field 'timestamp'"));

        let err = Rating::parse_line(2, "1,2,NaN,0", SplitStrategy::QuoteHeuristic).unwrap_err();
        assert!(err.to_string().contains("finite"));
    }

    #[test]
    fn header_is_discarded_and_line_numbers_are_one_based() {
        let lines = ["movieId,title,genres", "1,A,Comedy", "oops"];
        let err = parse_records::<Movie, _>(&lines, SplitStrategy::QuoteHeuristic, MalformedLinePolicy::Fail)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedLine { line: 3, .. }));
    }

    #[test]
    fn skip_policy_collects_bad_lines() {
        let lines = ["userId,movieId,rating,timestamp", "u1,1,4.0,0", "u2,1", "u3,2,x,0", "u4,2,3.0,0"];
        let parsed = parse_records::<Rating, _>(&lines, SplitStrategy::QuoteHeuristic, MalformedLinePolicy::Skip)
            .unwrap();
        assert_eq!(parsed.records.len(), 2);
        let skipped: Vec<usize> = parsed.skipped.iter().map(|s| s.line).collect();
        assert_eq!(skipped, vec![3, 4]);
    }

    #[test]
    fn empty_dataset_has_no_records() {
        let lines: [&str; 0] = [];
        let parsed = parse_records::<Movie, _>(&lines, SplitStrategy::QuoteHeuristic, MalformedLinePolicy::Fail)
            .unwrap();
        assert!(parsed.records.is_empty());
    }
}
