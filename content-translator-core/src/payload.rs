//! The translation payload accepted by `apply`: wire types, parsing and
//! field-by-field shape validation.
//!
//! Validation walks the raw JSON value and records every violation with its
//! dotted field path, so a single reply lists all problems at once. Only a
//! payload with no violations is converted into the typed [`TranslationBundle`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error};

use crate::error::{PayloadIssue, PipelineError, Result};
use crate::model::{EventTranslation, HowItWorksEntry, IntroCard, PlanSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationBundle {
    pub shared: SharedTranslation,
    pub events: Vec<EventTranslationInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedTranslation {
    pub schedules: BTreeMap<String, ScheduleTranslation>,
    pub intro: IntroCard,
    pub how_it_works: Vec<HowItWorksEntry>,
    pub plans: PlanSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTranslation {
    pub timezone_country: String,
    pub timezone_id: String,
    pub periods: Vec<PeriodTranslation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTranslation {
    pub start: String,
    pub end: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTranslationInput {
    pub slug: String,
    pub translations: EventTranslation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<SectionsOverride>,
}

/// Per-event section overrides; omitted fields inherit the shared sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionsOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<IntroCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how_it_works: Option<Vec<HowItWorksEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plans: Option<PlanSet>,
}

/// Parses and validates a raw payload string.
pub fn parse_payload(raw: &str) -> Result<TranslationBundle> {
    if raw.trim().is_empty() {
        error!("Translation payload is empty");
        return Err(PipelineError::EmptyPayload);
    }

    let value: Value = serde_json::from_str(raw).map_err(|e| {
        error!(error = %e, "Translation payload is not valid JSON");
        PipelineError::MalformedPayload(e.to_string())
    })?;

    let issues = validate_payload(&value);
    if !issues.is_empty() {
        error!(issues = issues.len(), "Translation payload failed validation");
        return Err(PipelineError::InvalidPayload(issues));
    }

    let bundle: TranslationBundle = serde_json::from_value(value)
        .map_err(|e| PipelineError::MalformedPayload(e.to_string()))?;

    let mut seen = BTreeSet::new();
    for entry in &bundle.events {
        if !seen.insert(entry.slug.as_str()) {
            return Err(PipelineError::DuplicateTranslation {
                slug: entry.slug.clone(),
            });
        }
    }

    debug!(
        events = bundle.events.len(),
        schedules = bundle.shared.schedules.len(),
        "Translation payload parsed"
    );
    Ok(bundle)
}

/// Every shape violation in `value`, in document order.
pub fn validate_payload(value: &Value) -> Vec<PayloadIssue> {
    let mut checker = ShapeChecker::default();
    if let Some(root) = checker.object(value) {
        checker.field(root, "shared", true, |c, v| c.shared(v));
        checker.field(root, "events", true, |c, v| c.array(v, |c, e| c.event(e)));
    }
    checker.issues
}

#[derive(Default)]
struct ShapeChecker {
    path: Vec<String>,
    issues: Vec<PayloadIssue>,
}

impl ShapeChecker {
    fn report(&mut self, reason: impl Into<String>) {
        let path = if self.path.is_empty() {
            "payload".to_string()
        } else {
            self.path.join(".")
        };
        self.issues.push(PayloadIssue {
            path,
            reason: reason.into(),
        });
    }

    fn expect(&mut self, expected: &str, value: &Value) {
        self.report(format!(
            "Expected {expected}, received {}",
            type_name(value)
        ));
    }

    fn nested(&mut self, segment: String, check: impl FnOnce(&mut Self)) {
        self.path.push(segment);
        check(self);
        self.path.pop();
    }

    fn field<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        name: &str,
        required: bool,
        check: impl FnOnce(&mut Self, &'v Value),
    ) {
        let value = object.get(name);
        self.nested(name.to_string(), |c| match value {
            Some(value) if !(value.is_null() && !required) => check(c, value),
            Some(_) => {}
            None if required => c.report("Required"),
            None => {}
        });
    }

    fn object<'v>(&mut self, value: &'v Value) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.expect("object", other);
                None
            }
        }
    }

    fn string(&mut self, value: &Value) {
        if !value.is_string() {
            self.expect("string", value);
        }
    }

    fn array(&mut self, value: &Value, mut item: impl FnMut(&mut Self, &Value)) {
        match value {
            Value::Array(items) => {
                for (index, element) in items.iter().enumerate() {
                    self.nested(index.to_string(), |c| item(c, element));
                }
            }
            other => self.expect("array", other),
        }
    }

    fn strings(&mut self, value: &Value) {
        self.array(value, |c, v| c.string(v));
    }

    fn required_strings(&mut self, object: &Map<String, Value>, names: &[&str]) {
        for name in names {
            self.field(object, name, true, |c, v| c.string(v));
        }
    }

    fn shared(&mut self, value: &Value) {
        let Some(shared) = self.object(value) else {
            return;
        };
        self.field(shared, "schedules", true, |c, v| {
            let Some(schedules) = c.object(v) else {
                return;
            };
            for (key, schedule) in schedules {
                c.nested(key.clone(), |c| c.schedule(schedule));
            }
        });
        self.sections(shared, true);
    }

    fn sections(&mut self, object: &Map<String, Value>, required: bool) {
        self.field(object, "intro", required, |c, v| c.titled_items(v));
        self.field(object, "howItWorks", required, |c, v| {
            c.array(v, |c, entry| c.titled_items(entry))
        });
        self.field(object, "plans", required, |c, v| c.plan_set(v));
    }

    fn schedule(&mut self, value: &Value) {
        let Some(schedule) = self.object(value) else {
            return;
        };
        self.required_strings(schedule, &["timezoneCountry", "timezoneId"]);
        self.field(schedule, "periods", true, |c, v| {
            c.array(v, |c, period| {
                if let Some(period) = c.object(period) {
                    c.required_strings(period, &["start", "end", "label"]);
                }
            })
        });
    }

    fn titled_items(&mut self, value: &Value) {
        if let Some(card) = self.object(value) {
            self.field(card, "title", true, |c, v| c.string(v));
            self.field(card, "items", true, |c, v| c.strings(v));
        }
    }

    fn plan_set(&mut self, value: &Value) {
        let Some(plans) = self.object(value) else {
            return;
        };
        for group in ["primary", "diamond"] {
            self.field(plans, group, true, |c, v| c.array(v, |c, plan| c.plan(plan)));
        }
    }

    fn plan(&mut self, value: &Value) {
        let Some(plan) = self.object(value) else {
            return;
        };
        self.required_strings(plan, &["name", "price", "note", "cta", "button"]);
        self.field(plan, "badge", false, |c, v| c.string(v));
        self.field(plan, "features", true, |c, v| c.strings(v));
    }

    fn event(&mut self, value: &Value) {
        let Some(event) = self.object(value) else {
            return;
        };
        self.field(event, "slug", true, |c, v| c.string(v));
        self.field(event, "translations", true, |c, v| {
            if let Some(translations) = c.object(v) {
                c.required_strings(
                    translations,
                    &[
                        "title",
                        "subtitle",
                        "summary",
                        "location",
                        "heroCtaLabel",
                        "secondaryCtaLabel",
                    ],
                );
            }
        });
        self.field(event, "sections", false, |c, v| {
            if let Some(sections) = c.object(v) {
                c.sections(sections, false);
            }
        });
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
