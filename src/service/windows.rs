use crate::types::{TimeRange, TimeWindow};
use chrono::TimeDelta;

/// Window width for sync requests against the history API.
pub const DAY: TimeDelta = TimeDelta::days(1);

/// Split `[from, to)` into consecutive full days starting at `from`, plus one
/// trailing partial window for any remainder. Ordered, gap-free, non-overlapping.
pub fn partition(range: &TimeRange) -> Vec<TimeWindow> {
    partition_by(range, DAY)
}

fn partition_by(range: &TimeRange, width: TimeDelta) -> Vec<TimeWindow> {
    let mut windows = Vec::new();
    let mut start = range.from();
    while range.to() - start >= width {
        let end = start + width;
        windows.push(TimeWindow { start, end });
        start = end;
    }
    if start < range.to() {
        windows.push(TimeWindow {
            start,
            end: range.to(),
        });
    }
    windows
}
