//! Structural transformation engine for collapsible courseware sections.
//!
//! The engine rewrites the body region of semi-structured HTML files,
//! wrapping heading-delimited prose and embedded demo widgets in
//! `<section id="..." section-title="...">` containers. It reasons about
//! nested, possibly-malformed markup with purely lexical matching (no DOM)
//! and holds three invariants across arbitrary input:
//!
//! - reader-visible text never changes,
//! - section ids are unique within a document,
//! - the transform is idempotent.
//!
//! Passes run in a fixed order over one document at a time:
//! title normalization, standalone-demo wrapping, trailing-demo
//! relocation, heading segmentation (which re-normalizes), then cleanup.
//! See [`transform::transform_document`] for the harness.

pub mod cleanup;
pub mod demos;
pub mod error;
pub mod menu;
pub mod normalize;
pub mod scan;
pub mod segment;
pub mod transform;
pub mod walk;
