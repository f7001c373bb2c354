//! Pipeline orchestration for the vault enricher.
//!
//! This crate ties together fetching, extraction, asset downloads, record
//! persistence and markdown rendering into the per-entry enrichment run
//! ([`pipeline::Enricher`]) and the catalog runner ([`batch`]).

pub mod batch;
pub mod pipeline;
pub mod select;
