//! Merge engine: cross-validates the source and derived bundles and joins
//! them into one bilingual dataset.
//!
//! The source bundle owns every non-textual field. The derived bundle only
//! contributes text; its timing must agree with the source exactly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info};

use crate::error::{PipelineError, Result};
use crate::loader::Bundle;
use crate::model::{EventContent, Localized, Schedule, SchedulePeriod, Sections};
use crate::schedule::{resolve_schedule_key, same_structure};

/// The terminal artifact: one bilingual record per event, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedBundle {
    pub events: Vec<EventContent>,
}

pub fn merge_bundles(source: &Bundle, derived: &Bundle) -> Result<MergedBundle> {
    info!(
        source_language = %source.language,
        derived_language = %derived.language,
        events = source.events.len(),
        "Merging bundles"
    );
    let derived_by_slug: BTreeMap<&str, &EventContent> = derived
        .events
        .iter()
        .map(|event| (event.slug.as_str(), event))
        .collect();

    let mut events = Vec::with_capacity(source.events.len());
    for event in &source.events {
        let translated = derived_by_slug
            .get(event.slug.as_str())
            .copied()
            .ok_or_else(|| {
                error!(slug = %event.slug, "Derived bundle lacks an event");
                PipelineError::MissingDerivedEvent {
                    slug: event.slug.clone(),
                }
            })?;
        check_event_fields(event, translated)?;

        let key = resolve_schedule_key(
            &event.slug,
            &event.schedule,
            &source.shared.schedules,
            &source.language,
        )?;
        let derived_schedule = derived.shared.schedules.get(key).ok_or_else(|| {
            error!(key = %key, "Derived shared content lacks a schedule");
            PipelineError::MissingDerivedSchedule {
                key: key.to_string(),
            }
        })?;
        let schedule = merge_schedules(
            key,
            &event.schedule,
            derived_schedule,
            &source.language,
            &derived.language,
        )?;
        if !same_structure(&translated.schedule, derived_schedule, &derived.language) {
            error!(slug = %event.slug, key, "Derived event points at a different schedule");
            return Err(PipelineError::ScheduleReferenceMismatch {
                slug: event.slug.clone(),
                key: key.to_string(),
            });
        }

        events.push(EventContent {
            id: event.id,
            slug: event.slug.clone(),
            date: event.date.clone(),
            primary_language: event.primary_language.clone(),
            schedule,
            translations: merge_localized(
                &event.translations,
                &translated.translations,
                &source.language,
                &derived.language,
            ),
            sections: merge_sections(
                &event.sections,
                &translated.sections,
                &source.language,
                &derived.language,
            ),
        });
    }

    events.sort_by_key(|event| event.id);
    info!(events = events.len(), "Bundles merged");
    Ok(MergedBundle { events })
}

/// The derived record may not move any field the source owns.
fn check_event_fields(source: &EventContent, derived: &EventContent) -> Result<()> {
    let drifted = if derived.id != source.id {
        Some("id")
    } else if derived.date != source.date {
        Some("date")
    } else if derived.primary_language != source.primary_language {
        Some("primaryLanguage")
    } else {
        None
    };
    match drifted {
        Some(field) => {
            error!(slug = %source.slug, field, "Derived event drifted from source");
            Err(PipelineError::EventFieldMismatch {
                slug: source.slug.clone(),
                field: field.to_string(),
            })
        }
        None => Ok(()),
    }
}

/// Combines the two languages' views of the schedule stored under `key`.
pub fn merge_schedules(
    key: &str,
    source: &Schedule,
    derived: &Schedule,
    source_language: &str,
    derived_language: &str,
) -> Result<Schedule> {
    if source.timezone_country != derived.timezone_country
        || source.timezone_id != derived.timezone_id
    {
        error!(key, "Derived schedule timezone drifted from source");
        return Err(PipelineError::TimezoneMismatch { key: key.to_string() });
    }
    if source.periods.len() != derived.periods.len() {
        error!(key, "Derived schedule period count drifted from source");
        return Err(PipelineError::PeriodCountMismatch { key: key.to_string() });
    }

    let periods = source
        .periods
        .iter()
        .zip(&derived.periods)
        .map(|(period, translated)| {
            if period.start != translated.start || period.end != translated.end {
                error!(key, start = %period.start, end = %period.end, "Derived period times drifted");
                return Err(PipelineError::PeriodTimesMismatch { key: key.to_string() });
            }
            Ok(SchedulePeriod {
                start: period.start.clone(),
                end: period.end.clone(),
                label: merge_localized(
                    &period.label,
                    &translated.label,
                    source_language,
                    derived_language,
                ),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Schedule {
        timezone_country: source.timezone_country.clone(),
        timezone_id: source.timezone_id.clone(),
        periods,
    })
}

fn merge_sections(
    source: &Sections,
    derived: &Sections,
    source_language: &str,
    derived_language: &str,
) -> Sections {
    Sections {
        intro: merge_localized(&source.intro, &derived.intro, source_language, derived_language),
        how_it_works: merge_localized(
            &source.how_it_works,
            &derived.how_it_works,
            source_language,
            derived_language,
        ),
        plans: merge_localized(&source.plans, &derived.plans, source_language, derived_language),
    }
}

// Each side contributes only its own language; the loader guarantees presence.
fn merge_localized<T: Clone>(
    source: &Localized<T>,
    derived: &Localized<T>,
    source_language: &str,
    derived_language: &str,
) -> Localized<T> {
    let mut merged = Localized::default();
    if let Some(value) = source.get(source_language) {
        merged.insert(source_language, value.clone());
    }
    if let Some(value) = derived.get(derived_language) {
        merged.insert(derived_language, value.clone());
    }
    merged
}
