#![doc = "content-translator-core: the bilingual content merge & validation pipeline."]

//! This crate holds the data model and every pipeline stage; the
//! `content-translator` binary is only CLI glue on top of it.
//!
//! # Stages
//! - [`loader`]: discover and deserialize one language's records
//! - [`schedule`]: resolve an event schedule to its shared key
//! - [`payload`] / [`normalize`] / [`render`]: accept a translation and
//!   regenerate the derived-language records
//! - [`merge`]: join both languages into the final dataset
//! - [`pipeline`]: the three operations composing the stages above

pub mod config;
pub mod contract;
pub mod error;
pub mod loader;
pub mod materialize;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod payload;
pub mod pipeline;
pub mod render;
pub mod schedule;

pub use error::{PipelineError, Result};
