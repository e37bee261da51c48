// Organization domain - keeps KBO and OVO identifiers in line with the registry
//
// Responsibilities:
// - Deciding create / update / skip for the KBO record of an organization
// - Resolving the OVO number without clobbering values the registry lacks
// - Full-population sweep and on-demand single-organization sync

pub mod activities;
pub mod models;
pub mod utils;

pub use activities::*;
pub use models::*;
