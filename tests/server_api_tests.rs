use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use calciotto::notify::NoopPublisher;
use calciotto::server::{router, AppState};
use calciotto::variants::{GenerationConfig, InMemoryStore, VariantService};

fn app() -> Router {
    let service = VariantService::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(NoopPublisher),
        GenerationConfig {
            base_seed: Some(7),
            ..GenerationConfig::default()
        },
    );
    router(AppState::new(Arc::new(service)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let payload = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, payload)
}

fn ratings(value: u64) -> Value {
    json!({
        "defense": value, "attack": value, "speed": value,
        "power": value, "technique": value, "shot": value
    })
}

async fn create_full_match(app: &Router) -> String {
    let (status, created) =
        send(app, Method::POST, "/api/matches", Some(json!({ "format": "3v3" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let match_id = created["match"]["id"]
        .as_str()
        .expect("match id")
        .to_string();

    for (i, value) in [5, 5, 5, 1, 1, 1].into_iter().enumerate() {
        let (status, _) = send(
            app,
            Method::POST,
            &format!("/api/matches/{match_id}/signups"),
            Some(json!({ "player_id": format!("p{i}"), "ratings": ratings(value) })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    match_id
}

#[tokio::test]
async fn health_endpoint_returns_ok_json() {
    let (status, payload) = send(&app(), Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["service"], "calciotto-api");
}

#[tokio::test]
async fn balance_preview_is_deterministic_for_a_seed() {
    let app = app();
    let players: Vec<Value> = (0..8)
        .map(|i| {
            let mut entry = ratings(i % 5 + 1);
            entry["id"] = json!(format!("p{i}"));
            entry
        })
        .collect();
    let body = json!({ "players": players, "per_team": 4, "seed": 11, "algorithm": "random_seeded" });

    let (status_a, a) = send(&app, Method::POST, "/api/balance", Some(body.clone())).await;
    let (status_b, b) = send(&app, Method::POST, "/api/balance", Some(body)).await;
    assert_eq!(status_a, StatusCode::OK);
    assert_eq!(status_b, StatusCode::OK);
    assert_eq!(a, b);
    assert_eq!(a["light"].as_array().map(Vec::len), Some(4));
    assert_eq!(a["dark"].as_array().map(Vec::len), Some(4));
    assert_eq!(a["algorithm"], "random_seeded");
}

#[tokio::test]
async fn balance_preview_returns_validation_errors() {
    let (status, payload) = send(
        &app(),
        Method::POST,
        "/api/balance",
        Some(json!({ "players": [], "per_team": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["message"], "Validation failed");
    let fields: Vec<&str> = payload["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .filter_map(|issue| issue["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["players", "per_team"]);
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/matches")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("request should build");
    let response = app.oneshot(request).await.expect("router is infallible");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signups_generate_and_apply_teams() {
    let app = app();
    let match_id = create_full_match(&app).await;

    let (status, detail) = send(&app, Method::GET, &format!("/api/matches/{match_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["teams"]["light"].as_array().map(Vec::len), Some(3));
    assert_eq!(detail["teams"]["dark"].as_array().map(Vec::len), Some(3));

    let (status, listed) =
        send(&app, Method::GET, &format!("/api/matches/{match_id}/variants"), None).await;
    assert_eq!(status, StatusCode::OK);
    let variants = listed["variants"].as_array().expect("variants array");
    assert_eq!(variants.len(), 3);
    assert_eq!(variants[0]["kind"], "V1");
    assert_eq!(variants[0]["recommended"], true);
    assert_eq!(detail["recommended_variant"], variants[0]["id"]);
}

#[tokio::test]
async fn applying_a_variant_switches_live_teams() {
    let app = app();
    let match_id = create_full_match(&app).await;

    let (status, generated) =
        send(&app, Method::POST, &format!("/api/matches/{match_id}/variants"), None).await;
    assert_eq!(status, StatusCode::OK);
    let v2 = generated["variants"][1].clone();
    let v2_id = v2["id"].as_str().expect("variant id");

    let (status, _) = send(&app, Method::POST, &format!("/api/variants/{v2_id}/apply"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = send(&app, Method::GET, &format!("/api/matches/{match_id}"), None).await;
    assert_eq!(detail["teams"]["light"], v2["light"]);
    assert_eq!(detail["teams"]["dark"], v2["dark"]);
    assert_eq!(detail["recommended_variant"], v2["id"]);
}

#[tokio::test]
async fn manual_split_is_saved_and_applied() {
    let app = app();
    let match_id = create_full_match(&app).await;

    let (status, saved) = send(
        &app,
        Method::POST,
        &format!("/api/matches/{match_id}/variants/manual"),
        Some(json!({ "light": ["p0", "p3", "p4"], "dark": ["p1", "p2", "p5"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let mean_delta = saved["mean_delta"].as_f64().expect("mean delta");
    assert!((mean_delta - 4.0 / 3.0).abs() < 1e-9);

    let (_, detail) = send(&app, Method::GET, &format!("/api/matches/{match_id}"), None).await;
    assert_eq!(detail["teams"]["light"], json!(["p0", "p3", "p4"]));
    assert_eq!(detail["recommended_variant"], saved["variant_id"]);

    let (status, rejected) = send(
        &app,
        Method::POST,
        &format!("/api/matches/{match_id}/variants/manual"),
        Some(json!({ "light": ["p0", "ghost"], "dark": ["p1"] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(rejected["status"], "error");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = app();
    let missing = uuid::Uuid::new_v4();
    let (status, payload) = send(&app, Method::GET, &format!("/api/matches/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["status"], "error");

    let (status, _) = send(&app, Method::POST, &format!("/api/variants/{missing}/apply"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generating_for_an_empty_match_is_unprocessable() {
    let app = app();
    let (_, created) =
        send(&app, Method::POST, "/api/matches", Some(json!({ "format": "5v5" }))).await;
    let match_id = created["match"]["id"].as_str().expect("match id");
    let (status, payload) =
        send(&app, Method::POST, &format!("/api/matches/{match_id}/variants"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(payload["message"]
        .as_str()
        .is_some_and(|message| message.contains("no starters")));
}

#[tokio::test]
async fn withdrawing_promotes_a_reserve() {
    let app = app();
    let match_id = create_full_match(&app).await;
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/matches/{match_id}/signups"),
        Some(json!({ "player_id": "bench", "ratings": ratings(3) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, detail) = send(
        &app,
        Method::DELETE,
        &format!("/api/matches/{match_id}/signups/p0"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let signups = detail["match"]["signups"].as_array().expect("signups");
    let bench = signups
        .iter()
        .find(|s| s["player_id"] == "bench")
        .expect("bench still signed up");
    assert_eq!(bench["status"], "starter");
    let on_teams: Vec<&Value> = detail["teams"]["light"]
        .as_array()
        .into_iter()
        .flatten()
        .chain(detail["teams"]["dark"].as_array().into_iter().flatten())
        .collect();
    assert!(on_teams.iter().any(|id| **id == "bench"));
    assert!(!on_teams.iter().any(|id| **id == "p0"));
}

#[tokio::test]
async fn ratings_can_be_stored_before_signup() {
    let app = app();
    let (status, _) = send(&app, Method::PUT, "/api/players/zed/ratings", Some(ratings(4))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::PUT, "/api/players/zed/ratings", Some(ratings(6))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, created) =
        send(&app, Method::POST, "/api/matches", Some(json!({ "format": "3v3" }))).await;
    let match_id = created["match"]["id"].as_str().expect("match id");
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/matches/{match_id}/signups"),
        Some(json!({ "player_id": "zed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
