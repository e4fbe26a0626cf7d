//! Seen/unseen reconciliation.

use crate::models::{Announcement, SeenSet};

/// Announcements whose identifier is not in `seen`, in scrape order.
pub fn select_new<'a>(scraped: &'a [Announcement], seen: &SeenSet) -> Vec<&'a Announcement> {
    scraped.iter().filter(|a| !seen.contains(a.id())).collect()
}

/// New announcements in delivery order.
///
/// The page lists newest first, so the batch is reversed to deliver the
/// oldest new item first.
pub fn delivery_order<'a>(scraped: &'a [Announcement], seen: &SeenSet) -> Vec<&'a Announcement> {
    let mut new = select_new(scraped, seen);
    new.reverse();
    new
}
