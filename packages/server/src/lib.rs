// KBO Sync - API Core
//
// Keeps the KBO and OVO identifiers of the internal organization registry in
// line with the organisation registry, on demand and on a schedule.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
