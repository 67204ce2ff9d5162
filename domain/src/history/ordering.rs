//! Presentation ordering for history snapshots.
//!
//! Stores deliver records in no particular order. Consumers sort every
//! snapshot they receive with [`sort_newest_first`].

use super::record::HistoryRecord;
use std::cmp::Ordering;

/// Newest `created_at` first; ties broken by id, descending.
pub fn newest_first(a: &HistoryRecord, b: &HistoryRecord) -> Ordering {
    b.created_at()
        .cmp(&a.created_at())
        .then_with(|| b.id().cmp(a.id()))
}

/// Sort a snapshot in place into presentation order.
pub fn sort_newest_first(records: &mut [HistoryRecord]) {
    records.sort_by(newest_first);
}
