//! Rendering of retrieved stories for the terminal.

use hnsample_pipeline::Story;
use std::fmt::Write;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const POSTED_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day], [year], [hour]:[minute]");
const INVALID_DATE: &str = "Invalid Date";
const TITLE_WIDTH: usize = 60;

/// Format a Unix timestamp (seconds) as `Oct 01, 2021, 07:20`, in UTC.
pub fn format_date(timestamp: i64) -> String {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()
        .and_then(|date| date.format(POSTED_FORMAT).ok())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

/// Truncate to at most `width` characters, marking the cut with an ellipsis.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// One line per story, in the given order, with a header.
pub fn table(stories: &[Story]) -> String {
    let author_width = stories.iter().map(|s| s.author.id.chars().count()).max().unwrap_or(0).max("AUTHOR".len());
    let mut out = String::new();
    // Writing into a String cannot fail.
    _ = writeln!(
        out,
        "{:>6}  {:>7}  {:<author_width$}  {:<19}  TITLE",
        "SCORE", "KARMA", "AUTHOR", "POSTED"
    );
    for story in stories {
        _ = writeln!(
            out,
            "{:>6}  {:>7}  {:<author_width$}  {:<19}  {}",
            story.item.score,
            story.author.karma,
            story.author.id,
            format_date(story.item.time),
            truncate(&story.item.title, TITLE_WIDTH),
        );
        let link = story.item.url.clone().unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", story.item.id));
        _ = writeln!(out, "{:>6}  {:>7}  {:<author_width$}  {:<19}  {}", "", "", "", "", link);
    }
    out
}
