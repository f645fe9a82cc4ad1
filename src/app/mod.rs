// LogDiag - app/mod.rs
//
// Application layer: catalog loading, file scanning, aggregation, and
// artifact output.
// Dependencies: core, platform.

pub mod aggregate;
pub mod catalog_mgr;
pub mod output;
pub mod scan;
