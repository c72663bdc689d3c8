//! # Repository Layer
//!
//! Repository implementations that wrap SeaORM operations with zone-aware
//! methods. Repositories borrow a connection so they work on the pool and on
//! an open transaction alike.

pub mod identity_provider;
pub mod identity_zone;

pub use identity_provider::IdentityProviderRepository;
pub use identity_zone::{IdentityZoneRepository, NewIdentityZone};
