//! Dataset loader: discovers and deserializes one language's record set.
//!
//! A record directory holds one `shared.<lang>.json` and any number of
//! `event_<slug>.<lang>.json` files. Files for other languages, and anything
//! not following the convention, are ignored. Events come back sorted by id so
//! downstream output never depends on directory enumeration order.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::error::{PipelineError, Result};
use crate::model::{
    EventContent, EventRecord, Localized, Reference, Schedule, Sections, SectionsRecord,
    SharedContent, SHARED_HOW_IT_WORKS, SHARED_INTRO, SHARED_PLANS, SHARED_SCHEDULES_PREFIX,
};
use crate::schedule::same_structure;

/// One language's shared content plus its events, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
    #[serde(skip)]
    pub language: String,
    pub shared: SharedContent,
    pub events: Vec<EventContent>,
}

pub fn shared_file_name(language: &str) -> String {
    format!("shared.{language}.json")
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `-`.
pub fn sanitize_slug(slug: &str) -> String {
    slug.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

pub fn event_file_name(slug: &str, language: &str) -> String {
    format!("event_{}.{language}.json", sanitize_slug(slug))
}

/// Loads and validates the bundle for `language` from `dir`.
pub fn load_bundle(dir: &Path, language: &str) -> Result<Bundle> {
    info!(dir = %dir.display(), language, "Loading record bundle");

    let shared_path = dir.join(shared_file_name(language));
    let shared: SharedContent = read_record(&shared_path)?;
    validate_shared(&shared_path, &shared, language)?;

    let mut loaded: Vec<(PathBuf, EventContent)> = Vec::new();
    for path in discover_event_files(dir, language)? {
        let record: EventRecord = read_record(&path)?;
        let event = resolve_event(&path, record, &shared, language)?;
        debug!(path = %path.display(), id = event.id, slug = %event.slug, "Loaded event record");
        loaded.push((path, event));
    }
    check_unique(&loaded)?;

    let mut events: Vec<EventContent> = loaded.into_iter().map(|(_, event)| event).collect();
    events.sort_by_key(|event| event.id);

    info!(
        dir = %dir.display(),
        language,
        events = events.len(),
        schedules = shared.schedules.len(),
        "Record bundle loaded"
    );
    Ok(Bundle {
        language: language.to_string(),
        shared,
        events,
    })
}

fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, path = %path.display(), "Failed to read record file");
        PipelineError::io(path, e)
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        error!(error = %e, path = %path.display(), "Record does not match the content model");
        PipelineError::record(path, e.to_string())
    })
}

fn discover_event_files(dir: &Path, language: &str) -> Result<Vec<PathBuf>> {
    let pattern = Regex::new(&format!(r"^event_.*\.{}\.json$", regex::escape(language)))
        .map_err(|e| PipelineError::Config(format!("bad language tag `{language}`: {e}")))?;

    let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| pattern.is_match(name))
            .unwrap_or(false);
        if matches {
            paths.push(path);
        } else {
            debug!(path = %path.display(), "Skipping file outside the record convention");
        }
    }
    paths.sort();
    Ok(paths)
}

fn validate_shared(path: &Path, shared: &SharedContent, language: &str) -> Result<()> {
    require_language(path, "intro", &shared.intro, language)?;
    require_language(path, "howItWorks", &shared.how_it_works, language)?;
    require_language(path, "plans", &shared.plans, language)?;

    for (key, schedule) in &shared.schedules {
        require_labels(path, &format!("schedules.{key}"), schedule, language)?;
    }

    let entries: Vec<(&String, &Schedule)> = shared.schedules.iter().collect();
    for (index, (first_key, first)) in entries.iter().enumerate() {
        for (second_key, second) in &entries[index + 1..] {
            if same_structure(first, second, language) {
                return Err(PipelineError::record(
                    path,
                    format!(
                        "shared schedules `{first_key}` and `{second_key}` are structurally identical"
                    ),
                ));
            }
        }
    }
    Ok(())
}

fn require_language<T>(path: &Path, field: &str, value: &Localized<T>, language: &str) -> Result<()> {
    if value.contains(language) {
        Ok(())
    } else {
        Err(PipelineError::record(
            path,
            format!("`{field}` has no `{language}` entry"),
        ))
    }
}

fn require_labels(path: &Path, field: &str, schedule: &Schedule, language: &str) -> Result<()> {
    for (index, period) in schedule.periods.iter().enumerate() {
        require_language(
            path,
            &format!("{field}.periods.{index}.label"),
            &period.label,
            language,
        )?;
    }
    Ok(())
}

fn resolve_event(
    path: &Path,
    record: EventRecord,
    shared: &SharedContent,
    language: &str,
) -> Result<EventContent> {
    let schedule = match record.schedule {
        Reference::Inline(schedule) => schedule,
        Reference::Shared(reference) => reference
            .target
            .strip_prefix(SHARED_SCHEDULES_PREFIX)
            .and_then(|key| shared.schedules.get(key))
            .cloned()
            .ok_or_else(|| {
                PipelineError::record(
                    path,
                    format!("`schedule` references unknown shared target `{}`", reference.target),
                )
            })?,
    };
    require_labels(path, "schedule", &schedule, language)?;
    require_language(path, "translations", &record.translations, language)?;

    let overrides = record.sections.unwrap_or_default();
    let sections = resolve_sections(path, overrides, shared)?;
    require_language(path, "sections.intro", &sections.intro, language)?;
    require_language(path, "sections.howItWorks", &sections.how_it_works, language)?;
    require_language(path, "sections.plans", &sections.plans, language)?;

    Ok(EventContent {
        id: record.id,
        slug: record.slug,
        date: record.date,
        primary_language: record.primary_language,
        schedule,
        translations: record.translations,
        sections,
    })
}

fn resolve_sections(path: &Path, overrides: SectionsRecord, shared: &SharedContent) -> Result<Sections> {
    Ok(Sections {
        intro: resolve_section(path, SHARED_INTRO, overrides.intro, &shared.intro)?,
        how_it_works: resolve_section(
            path,
            SHARED_HOW_IT_WORKS,
            overrides.how_it_works,
            &shared.how_it_works,
        )?,
        plans: resolve_section(path, SHARED_PLANS, overrides.plans, &shared.plans)?,
    })
}

fn resolve_section<T: Clone>(
    path: &Path,
    target: &str,
    value: Option<Reference<T>>,
    shared: &T,
) -> Result<T> {
    match value {
        None => Ok(shared.clone()),
        Some(Reference::Inline(inline)) => Ok(inline),
        Some(Reference::Shared(reference)) if reference.target == target => Ok(shared.clone()),
        Some(Reference::Shared(reference)) => Err(PipelineError::record(
            path,
            format!(
                "`sections.{target}` may only reference `{target}`, found `{}`",
                reference.target
            ),
        )),
    }
}

fn check_unique(loaded: &[(PathBuf, EventContent)]) -> Result<()> {
    let mut ids: BTreeMap<i64, &str> = BTreeMap::new();
    let mut slugs: BTreeMap<&str, i64> = BTreeMap::new();
    for (path, event) in loaded {
        if let Some(other) = ids.insert(event.id, &event.slug) {
            return Err(PipelineError::record(
                path,
                format!("duplicate event id {} (also used by slug `{other}`)", event.id),
            ));
        }
        if let Some(other) = slugs.insert(&event.slug, event.id) {
            return Err(PipelineError::record(
                path,
                format!("duplicate event slug `{}` (also used by id {other})", event.slug),
            ));
        }
    }
    Ok(())
}
