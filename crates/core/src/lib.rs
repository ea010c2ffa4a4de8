//! ida2r2-core
//!
//! Core library for carrying IDA disassembly metadata over to radare2.
//!
//! Two front ends feed one script generator:
//! - an IDC log recognizer that builds an [`model::EntityModel`] before anything is written, and
//! - a database extractor that streams facts straight out of an [`db::AnalysisDatabase`].
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends; the CLI only parses arguments and prints banners.

pub mod db;
pub mod idc;
pub mod model;
pub mod script;
pub mod services;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
