mod common;

use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use common::{read_json, source_fixture, translation_payload};
use content_translator_core::materialize::CopyMaterializer;
use content_translator_core::pipeline::{apply_translation, export_for_translation};
use content_translator_core::PipelineError;

fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            (name, fs::read(&path).unwrap())
        })
        .collect()
}

#[tokio::test]
async fn export_returns_source_dataset_and_instructions() {
    let root = tempdir().unwrap();
    let config = source_fixture(root.path());

    let output = export_for_translation(&config, &CopyMaterializer::new())
        .await
        .unwrap();
    assert_eq!(output.dataset.events.len(), 2);
    assert!(output.instructions.contains("`en`"));

    let value = serde_json::to_value(&output).unwrap();
    assert!(value["dataset"]["shared"]["schedules"]["br"].is_object());
    assert_eq!(value["dataset"]["events"][0]["slug"], "1");
}

#[tokio::test]
async fn apply_writes_references_for_pruned_sections() {
    let root = tempdir().unwrap();
    let config = source_fixture(root.path());
    let payload = translation_payload().to_string();

    let output = apply_translation(&config, &CopyMaterializer::new(), &payload)
        .await
        .unwrap();
    assert!(output.message.contains("`en`"), "{}", output.message);

    let generated = config.generated_dir();
    let files: Vec<String> = snapshot(&generated).into_keys().collect();
    assert_eq!(
        files,
        vec!["event_1.en.json", "event_2.en.json", "shared.en.json"]
    );

    let shared = read_json(&generated.join("shared.en.json"));
    assert_eq!(
        shared["schedules"]["br"]["periods"][0],
        json!({ "start": "08:30", "end": "12:30", "label": { "en": "Morning:" } })
    );

    // Identical override collapses back to shared references.
    let second = read_json(&generated.join("event_2.en.json"));
    assert_eq!(second["schedule"], json!({ "$shared": "schedules.pt" }));
    assert_eq!(
        second["sections"],
        json!({
            "intro": { "$shared": "intro" },
            "howItWorks": { "$shared": "howItWorks" },
            "plans": { "$shared": "plans" }
        })
    );

    // A genuine override stays inline, everything else inherits.
    let first = read_json(&generated.join("event_1.en.json"));
    assert_eq!(first["schedule"], json!({ "$shared": "schedules.br" }));
    assert_eq!(
        first["sections"]["intro"]["en"]["title"],
        "Only for the first edition"
    );
    assert_eq!(first["sections"]["plans"], json!({ "$shared": "plans" }));
    assert_eq!(first["translations"]["en"]["title"], "Event 1");
    assert_eq!(first["date"], "2025-12-13");
}

#[tokio::test]
async fn applying_the_same_payload_twice_is_byte_identical() {
    let root = tempdir().unwrap();
    let config = source_fixture(root.path());
    let payload = translation_payload().to_string();
    let materializer = CopyMaterializer::new();

    apply_translation(&config, &materializer, &payload).await.unwrap();
    let first = snapshot(&config.generated_dir());
    apply_translation(&config, &materializer, &payload).await.unwrap();
    let second = snapshot(&config.generated_dir());

    assert_eq!(first, second);
}

#[tokio::test]
async fn stale_derived_records_are_removed() {
    let root = tempdir().unwrap();
    let config = source_fixture(root.path());
    fs::create_dir_all(config.generated_dir()).unwrap();
    fs::write(config.generated_dir().join("event_gone.en.json"), "{}").unwrap();

    apply_translation(
        &config,
        &CopyMaterializer::new(),
        &translation_payload().to_string(),
    )
    .await
    .unwrap();
    assert!(!config.generated_dir().join("event_gone.en.json").exists());
}

#[tokio::test]
async fn shifted_period_end_writes_nothing() {
    let root = tempdir().unwrap();
    let config = source_fixture(root.path());
    let mut payload = translation_payload();
    payload["shared"]["schedules"]["br"]["periods"][1]["end"] = json!("18:00");

    let err = apply_translation(&config, &CopyMaterializer::new(), &payload.to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::TranslatedPeriodMismatch { ref key } if key == "br"));
    assert!(!config.generated_dir().exists());
}

#[tokio::test]
async fn failed_apply_keeps_previous_derived_records() {
    let root = tempdir().unwrap();
    let config = source_fixture(root.path());
    let materializer = CopyMaterializer::new();
    apply_translation(&config, &materializer, &translation_payload().to_string())
        .await
        .unwrap();
    let before = snapshot(&config.generated_dir());

    let mut payload = translation_payload();
    payload["events"].as_array_mut().unwrap().remove(1);
    let err = apply_translation(&config, &materializer, &payload.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "missing translation for event slug `2`");
    assert_eq!(snapshot(&config.generated_dir()), before);
}

#[tokio::test]
async fn payload_problems_are_reported_before_any_work() {
    let root = tempdir().unwrap();
    let config = source_fixture(root.path());
    let materializer = CopyMaterializer::new();

    let err = apply_translation(&config, &materializer, "   ").await.unwrap_err();
    assert!(matches!(err, PipelineError::EmptyPayload));

    let err = apply_translation(&config, &materializer, "{ nope").await.unwrap_err();
    assert!(err.to_string().starts_with("payload must be valid structured data"));

    let mut payload = translation_payload();
    payload["shared"]["schedules"]["pt"]["periods"][0]["label"] = json!(7);
    let err = apply_translation(&config, &materializer, &payload.to_string())
        .await
        .unwrap_err();
    assert!(
        err.to_string()
            .contains("shared.schedules.pt.periods.0.label: Expected string, received number"),
        "{err}"
    );
    assert!(!config.generated_dir().exists());
}

#[tokio::test]
async fn missing_translated_schedule_is_rejected() {
    let root = tempdir().unwrap();
    let config = source_fixture(root.path());
    let mut payload = translation_payload();
    payload["shared"]["schedules"]
        .as_object_mut()
        .unwrap()
        .remove("pt");

    let err = apply_translation(&config, &CopyMaterializer::new(), &payload.to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingTranslatedSchedule { ref key } if key == "pt"));
}

#[tokio::test]
async fn extra_translated_period_is_a_period_mismatch() {
    let root = tempdir().unwrap();
    let config = source_fixture(root.path());
    let mut payload = translation_payload();
    payload["shared"]["schedules"]["br"]["periods"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "start": "18:00", "end": "19:00", "label": "Evening:" }));

    let err = apply_translation(&config, &CopyMaterializer::new(), &payload.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "schedule `br` periods must match exactly");
    assert!(!config.generated_dir().exists());
}
