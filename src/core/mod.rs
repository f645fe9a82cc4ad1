// LogDiag - core/mod.rs
//
// Core business logic layer.
// Must NOT depend on: app, platform, or walk the filesystem directly.

pub mod catalog;
pub mod classifier;
pub mod merge;
pub mod model;
pub mod report;
pub mod scanner;
