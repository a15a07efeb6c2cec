//! Renders the derived-language record set from a normalized translation
//! payload and the source-language bundle.
//!
//! Rendering is all-or-nothing: every file is produced in memory first, and
//! the derived directory is only replaced once every check has passed.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, Result};
use crate::loader::{event_file_name, shared_file_name, Bundle};
use crate::model::{
    EventRecord, Localized, Reference, Schedule, SchedulePeriod, SectionsRecord, SharedContent,
    SharedRef, SHARED_HOW_IT_WORKS, SHARED_INTRO, SHARED_PLANS,
};
use crate::payload::{SectionsOverride, SharedTranslation, TranslationBundle};
use crate::schedule::resolve_schedule_key;

/// A record file ready to be written into the derived directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub file_name: String,
    pub contents: String,
}

/// Derived shared content: source timing, translated labels and sections.
pub fn build_derived_shared(
    source: &SharedContent,
    translation: &SharedTranslation,
    language: &str,
) -> Result<SharedContent> {
    let mut schedules = BTreeMap::new();
    for (key, schedule) in &source.schedules {
        let translated = translation.schedules.get(key).ok_or_else(|| {
            error!(key = %key, "Translation lacks a source schedule");
            PipelineError::MissingTranslatedSchedule { key: key.clone() }
        })?;
        if translated.periods.len() != schedule.periods.len() {
            error!(
                key = %key,
                source = schedule.periods.len(),
                translated = translated.periods.len(),
                "Translated schedule changes the period count"
            );
            return Err(PipelineError::TranslatedPeriodMismatch { key: key.clone() });
        }
        if translated.timezone_country != schedule.timezone_country
            || translated.timezone_id != schedule.timezone_id
        {
            warn!(key = %key, "Translated schedule timezone differs, keeping the source timezone");
        }

        let periods = schedule
            .periods
            .iter()
            .zip(&translated.periods)
            .map(|(period, translated)| {
                if period.start != translated.start || period.end != translated.end {
                    error!(
                        key = %key,
                        start = %period.start,
                        end = %period.end,
                        "Translated schedule period times differ from the source"
                    );
                    return Err(PipelineError::TranslatedPeriodMismatch { key: key.clone() });
                }
                Ok(SchedulePeriod {
                    start: period.start.clone(),
                    end: period.end.clone(),
                    label: Localized::single(language, translated.label.clone()),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        schedules.insert(
            key.clone(),
            Schedule {
                timezone_country: schedule.timezone_country.clone(),
                timezone_id: schedule.timezone_id.clone(),
                periods,
            },
        );
    }

    for key in translation.schedules.keys() {
        if !source.schedules.contains_key(key) {
            warn!(key = %key, "Ignoring translated schedule with no source counterpart");
        }
    }

    Ok(SharedContent {
        schedules,
        intro: Localized::single(language, translation.intro.clone()),
        how_it_works: Localized::single(language, translation.how_it_works.clone()),
        plans: Localized::single(language, translation.plans.clone()),
    })
}

/// Every derived record file for `translation`, shared record first.
pub fn render_derived(
    source: &Bundle,
    translation: &TranslationBundle,
    language: &str,
) -> Result<Vec<RenderedFile>> {
    let shared = build_derived_shared(&source.shared, &translation.shared, language)?;
    let mut files = vec![render_file(shared_file_name(language), &shared)?];

    let by_slug: BTreeMap<&str, _> = translation
        .events
        .iter()
        .map(|entry| (entry.slug.as_str(), entry))
        .collect();
    let mut file_owners: BTreeMap<String, &str> = BTreeMap::new();

    for event in &source.events {
        let entry = by_slug.get(event.slug.as_str()).ok_or_else(|| {
            error!(slug = %event.slug, "Translation lacks an event");
            PipelineError::MissingTranslation {
                slug: event.slug.clone(),
            }
        })?;
        let key = resolve_schedule_key(
            &event.slug,
            &event.schedule,
            &source.shared.schedules,
            &source.language,
        )?;

        let record = EventRecord {
            id: event.id,
            slug: event.slug.clone(),
            date: event.date.clone(),
            primary_language: event.primary_language.clone(),
            schedule: Reference::Shared(SharedRef::schedule(key)),
            translations: Localized::single(language, entry.translations.clone()),
            sections: Some(section_references(entry.sections.as_ref(), language)),
        };

        let file_name = event_file_name(&event.slug, language);
        if let Some(first) = file_owners.insert(file_name.clone(), &event.slug) {
            return Err(PipelineError::FileNameCollision {
                first: first.to_string(),
                second: event.slug.clone(),
                file_name,
            });
        }
        debug!(slug = %event.slug, schedule = key, file = %file_name, "Rendered derived event");
        files.push(render_file(file_name, &record)?);
    }

    for slug in by_slug.keys() {
        if !source.events.iter().any(|event| event.slug == *slug) {
            warn!(slug = %slug, "Ignoring translation for unknown event slug");
        }
    }
    Ok(files)
}

fn section_references(overrides: Option<&SectionsOverride>, language: &str) -> SectionsRecord {
    let overrides = overrides.cloned().unwrap_or_default();
    SectionsRecord {
        intro: Some(inline_or_shared(overrides.intro, SHARED_INTRO, language)),
        how_it_works: Some(inline_or_shared(
            overrides.how_it_works,
            SHARED_HOW_IT_WORKS,
            language,
        )),
        plans: Some(inline_or_shared(overrides.plans, SHARED_PLANS, language)),
    }
}

fn inline_or_shared<T>(value: Option<T>, target: &str, language: &str) -> Reference<Localized<T>> {
    match value {
        Some(value) => Reference::Inline(Localized::single(language, value)),
        None => Reference::Shared(SharedRef::new(target)),
    }
}

fn render_file<T: Serialize>(file_name: String, value: &T) -> Result<RenderedFile> {
    let mut contents = serde_json::to_string_pretty(value).map_err(|e| PipelineError::Encode {
        what: file_name.clone(),
        source: e,
    })?;
    contents.push('\n');
    Ok(RenderedFile { file_name, contents })
}

/// Replaces `dir` wholesale with `files`.
pub fn write_records(dir: &Path, files: &[RenderedFile]) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| {
            error!(error = ?e, path = %dir.display(), "Failed to clear derived directory");
            PipelineError::io(dir, e)
        })?;
        debug!(path = %dir.display(), "Removed previous derived records");
    }
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;

    for file in files {
        let path = dir.join(&file.file_name);
        fs::write(&path, &file.contents).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to write derived record");
            PipelineError::io(&path, e)
        })?;
    }
    info!(path = %dir.display(), files = files.len(), "Derived records written");
    Ok(())
}
