//! Content model shared by every stage of the pipeline.
//!
//! Two families of types live here:
//! - the *resolved* content types ([`SharedContent`], [`EventContent`]) that the
//!   loader produces and the merge engine consumes, and
//! - the *record* types ([`EventRecord`], [`SectionsRecord`]) describing the
//!   on-disk shape of an event file, where values may point at shared content
//!   through a [`Reference`] instead of repeating it.
//!
//! All JSON field names are camelCase.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference target for the shared intro card.
pub const SHARED_INTRO: &str = "intro";
/// Reference target for the shared how-it-works entries.
pub const SHARED_HOW_IT_WORKS: &str = "howItWorks";
/// Reference target for the shared plan set.
pub const SHARED_PLANS: &str = "plans";
/// Prefix of schedule reference targets (`schedules.<key>`).
pub const SHARED_SCHEDULES_PREFIX: &str = "schedules.";

/// A value keyed by language tag.
///
/// A per-language bundle carries exactly its own language; the merged bundle
/// carries both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Localized<T>(BTreeMap<String, T>);

impl<T> Default for Localized<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T> Localized<T> {
    pub fn single(language: &str, value: T) -> Self {
        let mut map = BTreeMap::new();
        map.insert(language.to_string(), value);
        Self(map)
    }

    pub fn get(&self, language: &str) -> Option<&T> {
        self.0.get(language)
    }

    pub fn contains(&self, language: &str) -> bool {
        self.0.contains_key(language)
    }

    pub fn insert(&mut self, language: &str, value: T) {
        self.0.insert(language.to_string(), value);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    pub start: String,
    pub end: String,
    pub label: Localized<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub timezone_country: String,
    pub timezone_id: String,
    pub periods: Vec<SchedulePeriod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroCard {
    pub title: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HowItWorksEntry {
    pub title: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub price: String,
    pub note: String,
    pub cta: String,
    /// Style token (`primary`, `outline`, ...), never translated.
    pub button: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSet {
    pub primary: Vec<Plan>,
    pub diamond: Vec<Plan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTranslation {
    pub title: String,
    pub subtitle: String,
    pub summary: String,
    pub location: String,
    pub hero_cta_label: String,
    pub secondary_cta_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sections {
    pub intro: Localized<IntroCard>,
    pub how_it_works: Localized<Vec<HowItWorksEntry>>,
    pub plans: Localized<PlanSet>,
}

/// Content shared by every event of one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedContent {
    pub schedules: BTreeMap<String, Schedule>,
    pub intro: Localized<IntroCard>,
    pub how_it_works: Localized<Vec<HowItWorksEntry>>,
    pub plans: Localized<PlanSet>,
}

/// A fully resolved event, either for one language or merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContent {
    pub id: i64,
    pub slug: String,
    pub date: String,
    pub primary_language: String,
    pub schedule: Schedule,
    pub translations: Localized<EventTranslation>,
    pub sections: Sections,
}

/// Marker pointing a record field at the shared content of its language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedRef {
    #[serde(rename = "$shared")]
    pub target: String,
}

impl SharedRef {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn schedule(key: &str) -> Self {
        Self::new(format!("{SHARED_SCHEDULES_PREFIX}{key}"))
    }
}

/// Either a reference into shared content or an inline value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<T> {
    Shared(SharedRef),
    Inline(T),
}

/// On-disk shape of an event's section overrides. Omitted fields inherit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<Reference<Localized<IntroCard>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how_it_works: Option<Reference<Localized<Vec<HowItWorksEntry>>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plans: Option<Reference<Localized<PlanSet>>>,
}

/// On-disk shape of an event file (`event_<slug>.<lang>.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: i64,
    pub slug: String,
    pub date: String,
    pub primary_language: String,
    pub schedule: Reference<Schedule>,
    pub translations: Localized<EventTranslation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<SectionsRecord>,
}
