//! # Prompt Template Modules
//!
//! Prompt templates used by the `valorie` pipelines, grouped by the stage that
//! sends them to a model.

pub mod framework;
pub mod seed;
