// LogDiag - lib.rs
//
// Library entry point, exposing every module for integration testing and
// for tools that want the verdict without going through the CLI.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
