use movie_rating_extremes::execution::{ExecutionEngine, ExecutionOptions};
use movie_rating_extremes::pipeline::{analyze, run_pipeline, run_pipeline_from_paths, PipelineOptions};
use movie_rating_extremes::processing::{RatingDisplay, RenderOptions};
use movie_rating_extremes::PipelineError;

const MOVIES: [&str; 4] = ["movieId,title,genres", "1,A,Comedy", "2,B,Drama", "3,C,Drama"];
const RATINGS: [&str; 5] = [
    "userId,movieId,rating,timestamp",
    "u1,1,5.0,0",
    "u2,1,5.0,0",
    "u3,2,5.0,0",
    "u4,3,1.0,0",
];

fn titles(entries: &[movie_rating_extremes::processing::ReportEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.title.as_str()).collect()
}

#[test]
fn worked_example_report() {
    let report = run_pipeline(&MOVIES, &RATINGS, &PipelineOptions::default()).unwrap();
    assert_eq!(
        report.render_lines(&RenderOptions::default()),
        vec![
            "Top Movies, sorted alphabetically:",
            "",
            "A, rating: 5/5",
            "B, rating: 5/5",
            "",
            "Bottom Movies, sorted alphabetically:",
            "",
            "C, rating: 1/5",
        ]
    );
}

#[test]
fn orphan_rating_is_ignored_without_error() {
    let mut ratings = RATINGS.to_vec();
    ratings.push("u9,404,0.5,0");
    let analysis = analyze(&MOVIES, &ratings, &PipelineOptions::default()).unwrap();
    assert_eq!(analysis.stats.len(), 3);
    assert_eq!(titles(&analysis.report.bottom), vec!["C"]);
}

#[test]
fn short_line_fails_the_run() {
    let mut ratings = RATINGS.to_vec();
    ratings.insert(2, "u5,2");
    let err = run_pipeline(&MOVIES, &ratings, &PipelineOptions::default()).unwrap_err();
    match err {
        PipelineError::MalformedLine {
            line,
            expected,
            found,
            ..
        } => {
            assert_eq!(line, 3);
            assert_eq!(expected, 4);
            assert_eq!(found, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn short_movie_line_fails_the_run() {
    let movies = ["movieId,title,genres", "1,A,Comedy", "2"];
    let err = run_pipeline(&movies, &RATINGS, &PipelineOptions::default()).unwrap_err();
    assert!(matches!(err, PipelineError::MalformedLine { line: 3, .. }));
}

#[test]
fn permuted_input_gives_identical_report() {
    let movies = [
        "movieId,title,genres",
        "4,D,x",
        "1,A,x",
        "3,C,x",
        "2,B,x",
        "5,E,x",
    ];
    let ratings = [
        "userId,movieId,rating,timestamp",
        "u1,1,4.5,0",
        "u2,1,3.5,0",
        "u1,2,2.0,0",
        "u2,3,4.0,0",
        "u3,3,4.0,0",
        "u1,4,2.0,0",
        "u1,5,4.0,0",
    ];
    let forward = run_pipeline(&movies, &ratings, &PipelineOptions::default()).unwrap();

    let mut movies_rev = movies.to_vec();
    movies_rev[1..].reverse();
    let mut ratings_rev = ratings.to_vec();
    ratings_rev[1..].reverse();
    let backward = run_pipeline(&movies_rev, &ratings_rev, &PipelineOptions::default()).unwrap();

    assert_eq!(forward, backward);
    assert_eq!(titles(&forward.top), vec!["A", "C", "E"]);
    assert_eq!(titles(&forward.bottom), vec!["B", "D"]);
}

#[test]
fn decimal_ratings_give_the_same_analysis_in_any_order() {
    let movies = ["movieId,title,genres", "1,A,x", "2,B,x", "3,C,x"];
    let ratings = [
        "userId,movieId,rating,timestamp",
        "u1,1,0.1,0",
        "u2,1,0.2,0",
        "u3,1,0.3,0",
        "u1,2,0.2,0",
        "u2,2,0.2,0",
        "u3,2,0.2,0",
        "u1,3,5.0,0",
    ];
    let opts = PipelineOptions::default();
    let forward = analyze(&movies, &ratings, &opts).unwrap();

    // A's exact sum rounds below B's, so only A is at the minimum.
    assert_eq!(titles(&forward.report.bottom), vec!["A"]);
    assert_eq!(titles(&forward.report.top), vec!["C"]);

    let data = &ratings[1..];
    for rot in 0..data.len() {
        let mut order = data.to_vec();
        order.rotate_left(rot);
        for reversed in [false, true] {
            if reversed {
                order.reverse();
            }
            let mut lines = vec![ratings[0]];
            lines.extend(order.iter().copied());
            let other = analyze(&movies, &lines, &opts).unwrap();
            assert_eq!(other.stats, forward.stats, "rotation {rot}, reversed {reversed}");
            assert_eq!(other.report, forward.report);
        }
    }

    for chunk_size in 1..=4 {
        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(2),
            chunk_size,
            max_in_flight_chunks: 2,
        });
        let parallel = engine.analyze(&movies, &ratings, &opts).unwrap();
        assert_eq!(parallel.stats, forward.stats, "chunk_size {chunk_size}");
        assert_eq!(parallel.report, forward.report);
    }
}

#[test]
fn tie_inclusive_top_five_can_return_more_than_five() {
    let mut movies = vec!["movieId,title,genres".to_string()];
    let mut ratings = vec!["userId,movieId,rating,timestamp".to_string()];
    // Counts 6,5,4,3,2,2,2,1 all at a perfect mean; threshold is the fifth count (2).
    let counts = [6, 5, 4, 3, 2, 2, 2, 1];
    for (i, count) in counts.iter().enumerate() {
        movies.push(format!("{i},Film {},Drama", (b'H' - i as u8) as char));
        for u in 0..*count {
            ratings.push(format!("u{u},{i},5.0,0"));
        }
    }
    movies.push("100,Dud,Drama".to_string());
    ratings.push("u1,100,1.0,0".to_string());

    let report = run_pipeline(&movies, &ratings, &PipelineOptions::default()).unwrap();
    assert_eq!(report.top.len(), 7);
    assert!(report.top.iter().all(|e| e.rating_count >= 2));
    assert!(report.top.windows(2).all(|w| w[0].title < w[1].title));
    assert_eq!(titles(&report.bottom), vec!["Dud"]);
}

#[test]
fn means_are_not_rounded_before_comparison() {
    let movies = ["h", "1,A,x", "2,B,x"];
    let ratings = ["h", "u1,1,4.5,0", "u2,1,4.0,0", "u1,2,4.0,0", "u2,2,4.0,0"];
    let report = run_pipeline(&movies, &ratings, &PipelineOptions::default()).unwrap();
    assert_eq!(titles(&report.top), vec!["A"]);
    assert_eq!(titles(&report.bottom), vec!["B"]);
    // Both print as 4 under the truncating display, and keep their precision otherwise.
    let lines = report.render_lines(&RenderOptions::default());
    assert!(lines.contains(&"A, rating: 4/5".to_string()));
    let precise = report.render_lines(&RenderOptions {
        rating_display: RatingDisplay::Decimal(2),
    });
    assert!(precise.contains(&"A, rating: 4.25/5".to_string()));
}

#[test]
fn fixture_files_produce_expected_report() {
    let report = run_pipeline_from_paths(
        "tests/fixtures/movies.csv",
        "tests/fixtures/ratings.csv",
        &PipelineOptions::default(),
    )
    .unwrap();

    assert_eq!(
        titles(&report.top),
        vec![
            "American President, The (1995)",
            "Leaving Las Vegas (1995)",
            "Usual Suspects, The (1995)",
        ]
    );
    assert_eq!(
        titles(&report.bottom),
        vec!["Dangerous Minds (1995)", "Jumanji (1995)"]
    );
    let suspects = &report.top[2];
    assert_eq!(suspects.rating_count, 3);
    assert_eq!(suspects.mean_rating, 5.0);
}

#[test]
fn partitioned_ratings_match_single_file() {
    let opts = PipelineOptions::default();
    let single = run_pipeline_from_paths("tests/fixtures/movies.csv", "tests/fixtures/ratings.csv", &opts).unwrap();
    let parts = run_pipeline_from_paths("tests/fixtures/movies.csv", "tests/fixtures/ratings_parts", &opts).unwrap();
    assert_eq!(single, parts);
}

#[test]
fn engine_matches_sequential_on_fixtures() {
    let opts = PipelineOptions::default();
    let engine = ExecutionEngine::new(ExecutionOptions {
        num_threads: Some(3),
        chunk_size: 2,
        max_in_flight_chunks: 2,
    });
    let sequential =
        run_pipeline_from_paths("tests/fixtures/movies.csv", "tests/fixtures/ratings.csv", &opts).unwrap();
    let parallel = engine
        .run_pipeline_from_paths("tests/fixtures/movies.csv", "tests/fixtures/ratings_parts", &opts)
        .unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn missing_input_is_an_io_error() {
    let err = run_pipeline_from_paths(
        "tests/fixtures/does_not_exist.csv",
        "tests/fixtures/ratings.csv",
        &PipelineOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
}
