//! Resolves an event's schedule back to its key in the shared schedule mapping.

use std::collections::BTreeMap;
use tracing::error;

use crate::error::{PipelineError, Result};
use crate::model::Schedule;

/// Structural equality as seen from one language: timezone, period count,
/// period times and that language's labels.
pub fn same_structure(a: &Schedule, b: &Schedule, language: &str) -> bool {
    a.timezone_country == b.timezone_country
        && a.timezone_id == b.timezone_id
        && a.periods.len() == b.periods.len()
        && a.periods.iter().zip(&b.periods).all(|(left, right)| {
            left.start == right.start
                && left.end == right.end
                && left.label.get(language) == right.label.get(language)
        })
}

/// First key (in mapping order) whose schedule matches `schedule`.
pub fn find_schedule_key<'a>(
    schedule: &Schedule,
    schedules: &'a BTreeMap<String, Schedule>,
    language: &str,
) -> Option<&'a str> {
    schedules
        .iter()
        .find(|(_, candidate)| same_structure(candidate, schedule, language))
        .map(|(key, _)| key.as_str())
}

/// Like [`find_schedule_key`], but a miss is fatal for `event_slug`.
pub fn resolve_schedule_key<'a>(
    event_slug: &str,
    schedule: &Schedule,
    schedules: &'a BTreeMap<String, Schedule>,
    language: &str,
) -> Result<&'a str> {
    find_schedule_key(schedule, schedules, language).ok_or_else(|| {
        error!(slug = %event_slug, "Event schedule matches no shared schedule");
        PipelineError::UnmatchedSchedule {
            slug: event_slug.to_string(),
        }
    })
}
