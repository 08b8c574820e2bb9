// Calendar queries over the read-only event list.

use chrono::{Datelike, Days, NaiveDate};

use crate::model::CalendarEvent;

/// Events dated yesterday or later, soonest first, at most `limit` of them.
pub fn upcoming_events(events: &[CalendarEvent], today: NaiveDate, limit: usize) -> Vec<&CalendarEvent> {
    let from = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    let mut upcoming: Vec<&CalendarEvent> = events.iter().filter(|e| e.date >= from).collect();
    upcoming.sort_by_key(|e| e.date);
    upcoming.truncate(limit);
    upcoming
}

pub fn events_on(events: &[CalendarEvent], date: NaiveDate) -> Vec<&CalendarEvent> {
    events.iter().filter(|e| e.date == date).collect()
}

/// Events in the given month, ordered by date.
pub fn events_in_month(events: &[CalendarEvent], year: i32, month: u32) -> Vec<&CalendarEvent> {
    let mut found: Vec<&CalendarEvent> = events
        .iter()
        .filter(|e| e.date.year() == year && e.date.month() == month)
        .collect();
    found.sort_by_key(|e| e.date);
    found
}
