// ActLens - platform/mod.rs
//
// Platform abstraction layer: filesystem reads, config directories,
// config.toml.
// Dependencies: core types, directories crate.
// Must NOT depend on: app.

pub mod config;
pub mod fs;
