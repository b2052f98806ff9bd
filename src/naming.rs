// Filename assembly
//
// `{rank}_{key}_{id}.mp4` with the rank zero-padded, so a lexicographic
// directory listing reproduces the sort order. The middle segment keeps
// the sort key visible: zero-padded view count for MostViewed, the
// publish date otherwise.

use time::macros::format_description;

use crate::models::{SortSpec, VideoRecord};

/// Digits needed for the rank prefix; at least two so small batches
/// still line up
pub fn rank_width(total: usize) -> usize {
    let mut width = 1;
    let mut rest = total.saturating_sub(1);
    while rest >= 10 {
        width += 1;
        rest /= 10;
    }
    width.max(2)
}

/// Strip characters that are unsafe in filenames, collapse whitespace
pub fn sanitize<S: Into<String>>(s: S) -> String {
    let t = s
        .into()
        .replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
        .replace(['\n', '\r', '\t'], " ");
    t.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sort_key_segment(spec: SortSpec, record: &VideoRecord) -> String {
    match spec {
        SortSpec::MostViewed => format!("{:010}v", record.view_count),
        _ => {
            let fmt = format_description!("[year][month][day]");
            record
                .created_at
                .and_then(|t| t.format(&fmt).ok())
                .unwrap_or_else(|| "00000000".to_string())
        }
    }
}

/// Deterministic filename for the task at `rank` within a batch of
/// `total` records sorted under `spec`
pub fn task_filename(rank: usize, total: usize, spec: SortSpec, record: &VideoRecord) -> String {
    let width = rank_width(total);
    format!(
        "{:0width$}_{}_{}.mp4",
        rank,
        sort_key_segment(spec, record),
        sanitize(record.id.as_str()),
        width = width
    )
}
