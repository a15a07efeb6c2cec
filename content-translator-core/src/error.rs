//! Error type shared by every pipeline stage.
//!
//! Variants fall into four groups: payload errors (bad translation input),
//! referential errors (a slug, schedule key or shared target that cannot be
//! resolved), structural drift (derived timing diverging from the source) and
//! external-process errors raised by the materializer.

use std::path::PathBuf;
use thiserror::Error;

use crate::contract::MaterializeError;

/// One shape violation found while validating a translation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadIssue {
    pub path: String,
    pub reason: String,
}

impl std::fmt::Display for PayloadIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

fn join_issues(issues: &[PayloadIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("translation payload is empty")]
    EmptyPayload,

    #[error("payload must be valid structured data: {0}")]
    MalformedPayload(String),

    #[error("invalid translation payload: {}", join_issues(.0))]
    InvalidPayload(Vec<PayloadIssue>),

    #[error("duplicate translation entry for event slug `{slug}`")]
    DuplicateTranslation { slug: String },

    #[error("invalid record {}: {reason}", .path.display())]
    Record { path: PathBuf, reason: String },

    #[error("missing translation for event slug `{slug}`")]
    MissingTranslation { slug: String },

    #[error("missing translated schedule for key `{key}`")]
    MissingTranslatedSchedule { key: String },

    #[error("missing derived schedule for key `{key}`")]
    MissingDerivedSchedule { key: String },

    #[error("unable to match schedule of event `{slug}` to a shared schedule")]
    UnmatchedSchedule { slug: String },

    #[error("missing derived event for slug `{slug}`")]
    MissingDerivedEvent { slug: String },

    #[error("events `{first}` and `{second}` both render to file `{file_name}`")]
    FileNameCollision {
        first: String,
        second: String,
        file_name: String,
    },

    #[error("schedule `{key}` periods must match exactly")]
    TranslatedPeriodMismatch { key: String },

    #[error("schedule timezone mismatch for key `{key}`")]
    TimezoneMismatch { key: String },

    #[error("schedule period count mismatch for key `{key}`")]
    PeriodCountMismatch { key: String },

    #[error("schedule periods must match start/end times for key `{key}`")]
    PeriodTimesMismatch { key: String },

    #[error("derived event `{slug}` changes source field `{field}`")]
    EventFieldMismatch { slug: String, field: String },

    #[error("derived event `{slug}` does not use schedule `{key}`")]
    ScheduleReferenceMismatch { slug: String, key: String },

    #[error("source materializer failed: {0}")]
    Materialize(#[from] MaterializeError),

    #[error("i/o error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {what}: {source}")]
    Encode {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn record(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PipelineError::Record {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_payload_lists_every_issue() {
        let err = PipelineError::InvalidPayload(vec![
            PayloadIssue {
                path: "shared.intro.title".into(),
                reason: "Required".into(),
            },
            PayloadIssue {
                path: "events.0.slug".into(),
                reason: "Expected string, received number".into(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "invalid translation payload: shared.intro.title: Required; \
             events.0.slug: Expected string, received number"
        );
    }

    #[test]
    fn referential_errors_name_the_identifier() {
        let err = PipelineError::MissingDerivedEvent { slug: "2".into() };
        assert!(err.to_string().contains("`2`"));
    }
}
