//! # IdP Registry Library
//!
//! This library provides the core functionality for the identity provider
//! registry, including the alias engine that keeps cross-zone mirrors
//! consistent, persistence, handlers, and server configuration.

pub mod alias;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub mod zone_context;
pub use migration;
