//! End-to-end HTTP tests for the identity provider endpoints.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use idp_registry::config::AppConfig;
use idp_registry::server::{AppState, create_app};
use idp_registry::zone_context::{ZONE_ID_HEADER, ZONE_SUBDOMAIN_HEADER};
use serde_json::{Value, json};
use tower::ServiceExt;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{CUSTOM_ZONE, ROOT_ZONE, create_zone, setup_test_db};

async fn test_app() -> Router {
    let db = setup_test_db().await.unwrap();
    create_zone(&db, ROOT_ZONE).await.unwrap();
    create_zone(&db, CUSTOM_ZONE).await.unwrap();

    create_app(AppState::new(AppConfig::default(), db))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    zone: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(zone) = zone {
        builder = builder.header(ZONE_ID_HEADER, zone);
    }
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn saml_body(origin_key: &str, alias_zid: Option<&str>) -> Value {
    json!({
        "origin_key": origin_key,
        "name": "Corporate SAML",
        "type": "saml",
        "config": { "metaDataLocation": "https://idp.example.com/md" },
        "alias_zid": alias_zid,
    })
}

#[tokio::test]
async fn create_mirrored_provider_returns_201_with_location() {
    let app = test_app().await;

    let response = send(
        &app,
        "POST",
        "/identity-providers",
        None,
        Some(saml_body("corp-saml", Some(CUSTOM_ZONE))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get("Location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(response.headers().contains_key("x-trace-id"));

    let body = json_body(response).await;
    assert_eq!(body["identity_zone_id"], json!(ROOT_ZONE));
    assert_eq!(body["type"], json!("saml"));
    assert_eq!(body["alias_zid"], json!(CUSTOM_ZONE));
    assert_eq!(location, format!("/identity-providers/{}", body["id"].as_str().unwrap()));

    // The mirror is visible from the custom zone
    let alias_id = body["alias_id"].as_str().unwrap();
    let mirror = send(
        &app,
        "GET",
        &format!("/identity-providers/{alias_id}"),
        Some(CUSTOM_ZONE),
        None,
    )
    .await;
    assert_eq!(mirror.status(), StatusCode::OK);
    let mirror = json_body(mirror).await;
    assert_eq!(mirror["alias_id"], body["id"]);
    assert_eq!(mirror["alias_zid"], json!(ROOT_ZONE));
}

#[tokio::test]
async fn alias_rule_violation_returns_422_with_rule() {
    let app = test_app().await;

    let response = send(
        &app,
        "POST",
        "/identity-providers",
        None,
        Some(json!({
            "origin_key": "uaa-internal",
            "name": "Internal",
            "type": "uaa",
            "alias_zid": CUSTOM_ZONE,
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let body = json_body(response).await;
    assert_eq!(body["details"]["rule"], json!("type_not_mirrorable"));
}

#[tokio::test]
async fn origin_collision_in_mirror_zone_returns_409() {
    let app = test_app().await;

    let occupied = send(
        &app,
        "POST",
        "/identity-providers",
        Some(CUSTOM_ZONE),
        Some(saml_body("corp-saml", None)),
    )
    .await;
    assert_eq!(occupied.status(), StatusCode::CREATED);

    let response = send(
        &app,
        "POST",
        "/identity-providers",
        None,
        Some(saml_body("corp-saml", Some(CUSTOM_ZONE))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let listed = send(&app, "GET", "/identity-providers", None, None).await;
    assert_eq!(json_body(listed).await, json!([]));
}

#[tokio::test]
async fn invalid_body_returns_400() {
    let app = test_app().await;

    let response = send(
        &app,
        "POST",
        "/identity-providers",
        None,
        Some(json!({ "origin_key": "bad key!", "name": "", "type": "saml" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], json!("VALIDATION_FAILED"));

    let malformed = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/identity-providers")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_zone_header_returns_404() {
    let app = test_app().await;

    let response = send(&app, "GET", "/identity-providers", Some("nowhere"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let by_subdomain = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/identity-providers")
                .header(ZONE_SUBDOMAIN_HEADER, "nowhere")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(by_subdomain.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_and_delete_keep_pair_consistent() {
    let app = test_app().await;

    let created = send(
        &app,
        "POST",
        "/identity-providers",
        None,
        Some(saml_body("corp-saml", Some(CUSTOM_ZONE))),
    )
    .await;
    let created = json_body(created).await;
    let id = created["id"].as_str().unwrap().to_string();
    let alias_id = created["alias_id"].as_str().unwrap().to_string();

    let mut update = saml_body("corp-saml", Some(CUSTOM_ZONE));
    update["name"] = json!("Renamed");
    update["alias_id"] = json!(alias_id);
    let response = send(
        &app,
        "PUT",
        &format!("/identity-providers/{id}"),
        None,
        Some(update),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let mirror = send(
        &app,
        "GET",
        &format!("/identity-providers/{alias_id}"),
        Some(CUSTOM_ZONE),
        None,
    )
    .await;
    assert_eq!(json_body(mirror).await["name"], json!("Renamed"));

    // Clearing the alias fields of a mirrored provider is rejected
    let response = send(
        &app,
        "PUT",
        &format!("/identity-providers/{id}"),
        None,
        Some(saml_body("corp-saml", None)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let deleted = send(
        &app,
        "DELETE",
        &format!("/identity-providers/{id}"),
        None,
        None,
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(json_body(deleted).await["id"], json!(id));

    let mirror = send(
        &app,
        "GET",
        &format!("/identity-providers/{alias_id}"),
        Some(CUSTOM_ZONE),
        None,
    )
    .await;
    assert_eq!(mirror.status(), StatusCode::NOT_FOUND);

    let again = send(
        &app,
        "DELETE",
        &format!("/identity-providers/{id}"),
        None,
        None,
    )
    .await;
    assert_eq!(again.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn zone_directory_endpoints() {
    let app = test_app().await;

    let created = send(
        &app,
        "POST",
        "/identity-zones",
        None,
        Some(json!({ "id": "tenant-b", "name": "Tenant B", "subdomain": "Tenant-B" })),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(json_body(created).await["subdomain"], json!("tenant-b"));

    let duplicate = send(
        &app,
        "POST",
        "/identity-zones",
        None,
        Some(json!({ "id": "tenant-b", "name": "Again", "subdomain": "other" })),
    )
    .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let listed = send(&app, "GET", "/identity-zones", None, None).await;
    assert_eq!(json_body(listed).await.as_array().unwrap().len(), 3);

    let missing = send(&app, "GET", "/identity-zones/nowhere", None, None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn healthz_and_root_respond() {
    let app = test_app().await;

    let health = send(&app, "GET", "/healthz", None, None).await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(json_body(health).await["status"], json!("ok"));

    let root = send(&app, "GET", "/", None, None).await;
    assert_eq!(json_body(root).await["service"], json!("idp-registry"));
}
