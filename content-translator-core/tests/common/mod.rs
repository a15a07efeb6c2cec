#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use content_translator_core::config::PipelineConfig;

pub fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn plan(name: &str, price: &str, button: &str, badge: Option<&str>) -> Value {
    let mut plan = json!({
        "name": name,
        "price": price,
        "note": "por participante",
        "cta": "Quero este",
        "button": button,
        "features": ["Acesso ao evento", "Material digital"]
    });
    if let Some(badge) = badge {
        plan["badge"] = json!(badge);
    }
    plan
}

pub fn shared_pt() -> Value {
    json!({
        "schedules": {
            "br": {
                "timezoneCountry": "br",
                "timezoneId": "America/Sao_Paulo",
                "periods": [
                    { "start": "08:30", "end": "12:30", "label": { "pt": "Manhã:" } },
                    { "start": "13:30", "end": "17:30", "label": { "pt": "Tarde:" } }
                ]
            },
            "pt": {
                "timezoneCountry": "pt",
                "timezoneId": "Europe/Lisbon",
                "periods": [
                    { "start": "09:00", "end": "13:00", "label": { "pt": "Manhã:" } },
                    { "start": "14:00", "end": "18:00", "label": { "pt": "Tarde:" } }
                ]
            }
        },
        "intro": {
            "pt": { "title": "O que vais levar", "items": ["Prática guiada", "Ferramentas reais"] }
        },
        "howItWorks": {
            "pt": [
                { "title": "Antes", "items": ["Inscrição"] },
                { "title": "Durante", "items": ["Oficinas", "Mentoria"] }
            ]
        },
        "plans": {
            "pt": {
                "primary": [
                    plan("Bronze", "R$ 197", "outline", None),
                    plan("Prata", "R$ 297", "primary", Some("Mais escolhido"))
                ],
                "diamond": [plan("Diamante", "R$ 997", "primary", None)]
            }
        }
    })
}

fn event_translation_pt(title: &str) -> Value {
    json!({
        "title": title,
        "subtitle": "Um dia de imersão",
        "summary": "Aprende fazendo.",
        "location": "Online",
        "heroCtaLabel": "Garantir vaga",
        "secondaryCtaLabel": "Ver planos"
    })
}

pub fn event_pt(id: i64, slug: &str, date: &str, schedule: &str) -> Value {
    json!({
        "id": id,
        "slug": slug,
        "date": date,
        "primaryLanguage": "pt",
        "schedule": { "$shared": format!("schedules.{schedule}") },
        "translations": { "pt": event_translation_pt(&format!("Evento {slug}")) },
        "sections": {
            "intro": { "$shared": "intro" },
            "howItWorks": { "$shared": "howItWorks" },
            "plans": { "$shared": "plans" }
        }
    })
}

/// Writes the source records under `<root>/data/events` and returns the
/// matching configuration.
pub fn source_fixture(root: &Path) -> PipelineConfig {
    let config = PipelineConfig::new(root);
    let events = config.events_dir();
    write_json(&events.join("shared.pt.json"), &shared_pt());
    write_json(
        &events.join("event_1.pt.json"),
        &event_pt(1, "1", "2025-12-13", "br"),
    );
    // Inherits every section by omitting `sections`.
    let mut second = event_pt(2, "2", "2026-01-10", "pt");
    second.as_object_mut().unwrap().remove("sections");
    write_json(&events.join("event_2.pt.json"), &second);
    config
}

fn plan_en(name: &str, price: &str, button: &str, badge: Option<&str>) -> Value {
    let mut plan = json!({
        "name": name,
        "price": price,
        "note": "per attendee",
        "cta": "I want this",
        "button": button,
        "features": ["Event access", "Digital material"]
    });
    if let Some(badge) = badge {
        plan["badge"] = json!(badge);
    }
    plan
}

pub fn shared_intro_en() -> Value {
    json!({ "title": "What you take home", "items": ["Guided practice", "Real tools"] })
}

fn event_translation_en(slug: &str) -> Value {
    json!({
        "title": format!("Event {slug}"),
        "subtitle": "An immersive day",
        "summary": "Learn by doing.",
        "location": "Online",
        "heroCtaLabel": "Save my seat",
        "secondaryCtaLabel": "See plans"
    })
}

/// A complete English reply for [`source_fixture`].
///
/// Event `1` overrides the intro with different text, event `2` repeats the
/// shared sections verbatim.
pub fn translation_payload() -> Value {
    let intro = shared_intro_en();
    let how_it_works = json!([
        { "title": "Before", "items": ["Sign up"] },
        { "title": "During", "items": ["Workshops", "Mentoring"] }
    ]);
    let plans = json!({
        "primary": [
            plan_en("Bronze", "R$ 197", "outline", None),
            plan_en("Silver", "R$ 297", "primary", Some("Most chosen"))
        ],
        "diamond": [plan_en("Diamond", "R$ 997", "primary", None)]
    });

    json!({
        "shared": {
            "schedules": {
                "br": {
                    "timezoneCountry": "br",
                    "timezoneId": "America/Sao_Paulo",
                    "periods": [
                        { "start": "08:30", "end": "12:30", "label": "Morning:" },
                        { "start": "13:30", "end": "17:30", "label": "Afternoon:" }
                    ]
                },
                "pt": {
                    "timezoneCountry": "pt",
                    "timezoneId": "Europe/Lisbon",
                    "periods": [
                        { "start": "09:00", "end": "13:00", "label": "Morning:" },
                        { "start": "14:00", "end": "18:00", "label": "Afternoon:" }
                    ]
                }
            },
            "intro": intro.clone(),
            "howItWorks": how_it_works.clone(),
            "plans": plans.clone()
        },
        "events": [
            {
                "slug": "1",
                "translations": event_translation_en("1"),
                "sections": {
                    "intro": { "title": "Only for the first edition", "items": ["Bonus session"] }
                }
            },
            {
                "slug": "2",
                "translations": event_translation_en("2"),
                "sections": {
                    "intro": intro,
                    "howItWorks": how_it_works,
                    "plans": plans
                }
            }
        ]
    })
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}
