//! # Tests for Handlers
//!
//! This module contains unit tests for API handlers.

use std::sync::Arc;

use crate::alias::AliasEngine;
use crate::config::AppConfig;
use crate::handlers::{healthz, root};
use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

fn state_for(db: DatabaseConnection) -> AppState {
    AppState {
        engine: AliasEngine::new(db.clone(), "uaa"),
        config: Arc::new(AppConfig::default()),
        db,
    }
}

#[tokio::test]
async fn test_root_handler_returns_expected_service_info() {
    let Json(service_info) = root().await;

    assert_eq!(service_info.service, "idp-registry");
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_root_handler_returns_valid_json() {
    let Json(service_info) = root().await;

    let json = serde_json::to_value(&service_info).expect("service info serializes");
    assert!(json.get("service").is_some());
    assert!(json.get("version").is_some());
}

#[tokio::test]
async fn test_healthz_ok_with_live_database() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let (status, Json(body)) = healthz(State(state_for(db))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.status, "ok");
}
