//! New-entry selection against the stored watermark.
//!
//! Feeds list entries newest first. Selection walks that order and stops at
//! the entry whose id equals the watermark; everything before it is new.

use crate::fetcher::Entry;
use crate::state::Watermark;

#[derive(Debug, PartialEq, Eq)]
pub enum Selection<'a> {
    /// The feed returned no entries at all.
    NoContent,
    /// The feed has entries but none are newer than the watermark.
    NoUpdate,
    /// Entries to deliver, newest first.
    Items(Vec<&'a Entry>),
}

impl<'a> Selection<'a> {
    /// Selected entries oldest first, the order they are displayed in.
    pub fn into_delivery_order(self) -> Vec<&'a Entry> {
        match self {
            Selection::Items(mut items) => {
                items.reverse();
                items
            }
            Selection::NoContent | Selection::NoUpdate => Vec::new(),
        }
    }
}

/// Entries strictly newer than `watermark`, newest first. On the first run
/// (empty watermark) only the newest entry is kept; otherwise at most
/// `max_items`. Anything past the cap is dropped.
pub fn select_new<'a>(
    entries: &'a [Entry],
    watermark: &Watermark,
    max_items: usize,
) -> Selection<'a> {
    if entries.is_empty() {
        return Selection::NoContent;
    }

    let limit = if watermark.is_empty() { 1 } else { max_items };

    let items: Vec<&Entry> = entries
        .iter()
        .take_while(|e| e.id != watermark.as_str())
        .take(limit)
        .collect();

    if items.is_empty() {
        Selection::NoUpdate
    } else {
        Selection::Items(items)
    }
}

/// The `count` newest entries regardless of the watermark, at least one.
pub fn select_forced(entries: &[Entry], count: usize) -> Selection<'_> {
    if entries.is_empty() {
        return Selection::NoContent;
    }
    Selection::Items(entries.iter().take(count.max(1)).collect())
}
