//! Alphabetical report of the selected titles.

use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

use super::extrema::Selection;

/// Heading of the best-rated section.
pub const TOP_HEADING: &str = "Top Movies, sorted alphabetically:";
/// Heading of the worst-rated section.
pub const BOTTOM_HEADING: &str = "Bottom Movies, sorted alphabetically:";

/// How a mean rating is printed.
///
/// [`RatingDisplay::Truncated`] drops the fractional part (4.9 prints as `4`), which matches the
/// historical output of this report but loses precision for non-integral means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatingDisplay {
    /// Integer part only, truncated toward zero.
    #[default]
    Truncated,
    /// Fixed number of decimal places.
    Decimal(usize),
}

impl RatingDisplay {
    pub fn format(self, value: f64) -> String {
        match self {
            Self::Truncated => format!("{}", value.trunc() as i64),
            Self::Decimal(places) => format!("{value:.places$}"),
        }
    }
}

/// Rendering options for [`Report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub rating_display: RatingDisplay,
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub title: String,
    pub mean_rating: f64,
    pub rating_count: u64,
}

impl ReportEntry {
    /// `<title>, rating: <value>/5`
    pub fn render(&self, display: RatingDisplay) -> String {
        format!("{}, rating: {}/5", self.title, display.format(self.mean_rating))
    }
}

/// Both report sections, each sorted by title.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Report {
    pub top: Vec<ReportEntry>,
    pub bottom: Vec<ReportEntry>,
}

/// Entries of a selection sorted by title (code point order).
pub fn sorted_entries(selection: &Selection) -> Vec<ReportEntry> {
    let mut entries: Vec<ReportEntry> = selection
        .titles
        .iter()
        .map(|s| ReportEntry {
            title: s.title.clone(),
            mean_rating: s.mean_rating,
            rating_count: s.rating_count,
        })
        .collect();
    entries.sort_by(|a, b| a.title.cmp(&b.title));
    entries
}

/// Build the report from the highest and lowest selections.
pub fn build_report(top: &Selection, bottom: &Selection) -> Report {
    Report {
        top: sorted_entries(top),
        bottom: sorted_entries(bottom),
    }
}

impl Report {
    /// Render the report as output lines.
    ///
    /// Each section is its heading, a blank line, then one line per entry; sections are
    /// separated by a blank line.
    pub fn render_lines(&self, options: &RenderOptions) -> Vec<String> {
        let mut out = Vec::with_capacity(self.top.len() + self.bottom.len() + 5);
        out.push(TOP_HEADING.to_string());
        out.push(String::new());
        out.extend(self.top.iter().map(|e| e.render(options.rating_display)));
        out.push(String::new());
        out.push(BOTTOM_HEADING.to_string());
        out.push(String::new());
        out.extend(self.bottom.iter().map(|e| e.render(options.rating_display)));
        out
    }

    /// Write the rendered lines to `w`, one per line.
    pub fn write_to<W: Write>(&self, w: &mut W, options: &RenderOptions) -> io::Result<()> {
        for line in self.render_lines(options) {
            writeln!(w, "{line}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.render_lines(&RenderOptions::default()) {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
