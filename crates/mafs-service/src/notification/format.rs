//! Message text for notifications.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use mafs_entity::ticket::Ticket;

/// Builds a numbered ticket list under a header, capped at `max_items`,
/// with a trailing count of the tickets left out.
pub fn digest<F>(header: &str, tickets: &[Ticket], max_items: usize, url_base: &str, mut line: F) -> String
where
    F: FnMut(&Ticket) -> String,
{
    let mut text = String::from(header);
    for (i, ticket) in tickets.iter().take(max_items).enumerate() {
        let _ = write!(text, "\n{}. {}", i + 1, line(ticket));
        if !url_base.is_empty() {
            let _ = write!(text, "\n   {url_base}{}", ticket.id);
        }
    }
    if tickets.len() > max_items {
        let _ = write!(text, "\n...and {} more", tickets.len() - max_items);
    }
    text
}

/// Whole hours between `since` and `now`.
pub fn hours_since(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_hours().max(0)
}
