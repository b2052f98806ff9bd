// Bounded-window top-N selection
//
// The fetched window is sorted under the SortSpec with a stable sort so
// that records with equal keys keep their fetch order, then truncated to
// the requested count. When the window cannot satisfy the count the
// caller surfaces WindowTooSmall; nothing is fabricated here.

use crate::models::{SortSpec, VideoRecord};

/// Result of selecting from a fetched window
#[derive(Debug)]
pub struct Selection {
    pub picked: Vec<VideoRecord>,
    pub requested: usize,
}

impl Selection {
    /// How many records short of the request the window was, if any
    pub fn shortfall(&self) -> Option<usize> {
        if self.picked.len() < self.requested {
            Some(self.requested - self.picked.len())
        } else {
            None
        }
    }
}

/// Order `records` under `spec` and keep the first `count`.
///
/// `Vec::sort_by` is stable, which gives the deterministic tie-break on
/// fetch order: re-running on the same window always yields the same
/// output.
pub fn select_top(mut records: Vec<VideoRecord>, spec: SortSpec, count: usize) -> Selection {
    match spec {
        SortSpec::Recent => records.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortSpec::MostViewed => records.sort_by(|a, b| b.view_count.cmp(&a.view_count)),
        SortSpec::Oldest => records.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortSpec::OriginalOrder => {}
    }
    records.truncate(count);
    Selection {
        picked: records,
        requested: count,
    }
}
