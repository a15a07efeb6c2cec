//! Prunes per-event section overrides that merely repeat the shared sections.
//!
//! Comparison is done on the typed values, so key order or whitespace in the
//! incoming JSON can never make two equal sections look different.

use tracing::debug;

use crate::payload::{SectionsOverride, SharedTranslation, TranslationBundle};

impl SectionsOverride {
    /// True when every supplied field equals the shared counterpart, i.e. the
    /// override changes nothing.
    pub fn is_redundant(&self, shared: &SharedTranslation) -> bool {
        self.intro.as_ref().map_or(true, |intro| intro == &shared.intro)
            && self
                .how_it_works
                .as_ref()
                .map_or(true, |entries| entries == &shared.how_it_works)
            && self.plans.as_ref().map_or(true, |plans| plans == &shared.plans)
    }
}

/// Drops redundant overrides in place and returns how many were dropped.
pub fn prune_shared_sections(bundle: &mut TranslationBundle) -> usize {
    let shared = &bundle.shared;
    let mut pruned = 0;
    for event in &mut bundle.events {
        let redundant = event
            .sections
            .as_ref()
            .is_some_and(|sections| sections.is_redundant(shared));
        if redundant {
            debug!(slug = %event.slug, "Dropping section override identical to shared content");
            event.sections = None;
            pruned += 1;
        }
    }
    pruned
}
