// ActLens - app/mod.rs
//
// Application layer: orchestration of multi-file work.
// Dependencies: core, platform.

pub mod batch;
