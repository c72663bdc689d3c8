//! Database seeding functionality
//!
//! Populates rows the service cannot run without. Currently that is only the
//! root zone, which every mirror pair must include.

pub mod root_zone;

pub use root_zone::seed_root_zone;
