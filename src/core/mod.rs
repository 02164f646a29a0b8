// ActLens - core/mod.rs
//
// Core business logic layer: pattern matching, extraction, segmentation,
// analysis and rendering over in-memory text.
// Must NOT depend on: platform, app. The only filesystem access is the
// directory walk in `discovery`.

pub mod analyzer;
pub mod context;
pub mod discovery;
pub mod export;
pub mod extractor;
pub mod model;
pub mod patterns;
pub mod segment;
pub mod stacktrace;
