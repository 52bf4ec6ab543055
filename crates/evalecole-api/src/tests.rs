//! Router tests against a seeded `MemoryStore`.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::Utc;
use evalecole_core::{
  event::PointEvent, memory::MemoryStore, seed::demo, store::EntityStore,
};
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, router};

const ADMIN: (&str, &str) = ("Paul", "Paul2025.");
const STUDENT: (&str, &str) = ("eleve1", "123");

fn state() -> AppState<MemoryStore> {
  AppState::new(Arc::new(MemoryStore::seeded(demo())), "-- setup script")
}

async fn call(
  state: &AppState<MemoryStore>,
  method: &str,
  uri: &str,
  creds: Option<(&str, &str)>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some((user, pass)) = creds {
    builder = builder.header(
      header::AUTHORIZATION,
      format!("Basic {}", B64.encode(format!("{user}:{pass}"))),
    );
  }
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = router(state.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

fn ids(list: &Value) -> Vec<&str> {
  list.as_array().unwrap().iter().map(|m| m["id"].as_str().unwrap()).collect()
}

// ── Status and provisioning ───────────────────────────────────────────────────

#[tokio::test]
async fn status_needs_no_credentials() {
  let (status, body) = call(&state(), "GET", "/api/status", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ready");
  assert!(body["setup_script"].is_null());
}

#[tokio::test]
async fn unprovisioned_store_answers_with_the_setup_script() {
  let state = AppState::new(Arc::new(MemoryStore::unprovisioned()), "-- setup script");

  let (status, body) = call(&state, "GET", "/api/me", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
  assert_eq!(body["setup_script"], "-- setup script");

  let (status, body) = call(&state, "GET", "/api/status", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "needs_provisioning");
  assert_eq!(body["setup_script"], "-- setup script");

  state.store.provision(demo()).unwrap();
  let (status, _) = call(&state, "GET", "/api/me", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::OK);
}

// ── Authentication ────────────────────────────────────────────────────────────

#[tokio::test]
async fn wrong_password_is_401_with_challenge() {
  let req = Request::builder()
    .uri("/api/me")
    .header(header::AUTHORIZATION, format!("Basic {}", B64.encode("eleve1:nope")))
    .body(Body::empty())
    .unwrap();
  let resp = router(state()).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn deactivated_user_is_logged_out() {
  let state = state();
  let mut lucas = state.store.get_user("u_eleve1").await.unwrap().unwrap();
  lucas.active = false;
  state.store.upsert_user(lucas).await.unwrap();

  let (status, _) = call(&state, "GET", "/api/me", Some(STUDENT), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_menu_and_class_without_password() {
  let (status, body) = call(&state(), "GET", "/api/me", Some(STUDENT), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["user"]["id"], "u_eleve1");
  assert_eq!(body["user"]["password"], "");
  assert_eq!(body["menu"], json!(["dashboard", "my_class", "add_points", "rankings"]));
  assert_eq!(body["class_name"], "6ème A");
}

#[tokio::test]
async fn routes_outside_the_menu_are_forbidden() {
  let state = state();
  let (status, _) = call(&state, "GET", "/api/users", Some(STUDENT), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = call(&state, "DELETE", "/api/events", Some(STUDENT), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = call(&state, "GET", "/api/my-class", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

// ── Submission ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn student_targets_and_search() {
  let state = state();
  let (status, body) = call(&state, "GET", "/api/targets", Some(STUDENT), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ids(&body), ["u_prof1", "u_prof2", "u_surv1", "u_dir1"]);

  let (_, body) = call(&state, "GET", "/api/targets?search=DUR", Some(STUDENT), None).await;
  assert_eq!(ids(&body), ["u_prof2"]);
}

#[tokio::test]
async fn target_actions_follow_the_target_role() {
  let state = state();
  let (status, body) =
    call(&state, "GET", "/api/targets/u_surv1/actions", Some(STUDENT), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["actions"].as_array().unwrap().len(), 7);
  assert_eq!(body["actions"][0]["id"], "sd_help");
  assert_eq!(body["custom_action_id"], "custom_action");
  assert_eq!(body["custom_points"].as_array().unwrap().len(), 10);

  let (status, _) = call(&state, "GET", "/api/targets/u1/actions", Some(STUDENT), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submitted_event_feeds_rankings_and_dashboard() {
  let state = state();
  let request = json!({
    "target_user_id": "u_prof1",
    "action": { "kind": "catalog", "action_id": "p_help" },
  });
  let (status, event) = call(&state, "POST", "/api/events", Some(STUDENT), Some(request)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(event["points"], 5);
  assert_eq!(event["student_id"], "u_eleve1");
  assert_eq!(event["created_by_id"], "u_eleve1");

  let (_, board) = call(&state, "GET", "/api/rankings", Some(STUDENT), None).await;
  assert_eq!(board["all"][0]["user"]["id"], "u_prof1");
  assert_eq!(board["all"][0]["score"], 5);
  assert_eq!(board["all"][0]["rank"], 1);
  assert_eq!(board["top"].as_array().unwrap().len(), 4);
  assert_eq!(board["teachers"].as_array().unwrap().len(), 2);

  let (_, dash) = call(&state, "GET", "/api/dashboard", Some(STUDENT), None).await;
  assert_eq!(dash["greeting"], "Bonjour, Lucas");
  assert_eq!(dash["stats"]["actions_given_this_week"], 1);
  assert_eq!(dash["stats"]["weekly_leader"]["user_id"], "u_prof1");

  let (_, drill) = call(&state, "GET", "/api/rankings/u_prof1", Some(STUDENT), None).await;
  assert_eq!(drill["positives"][0]["label"], "M'a aidé");
  assert_eq!(drill["lifetime_score"], 5);
}

#[tokio::test]
async fn invalid_submissions_are_rejected() {
  let state = state();
  let wrong_catalog = json!({
    "target_user_id": "u_surv1",
    "action": { "kind": "catalog", "action_id": "p_help" },
  });
  let blank_label = json!({
    "target_user_id": "u_surv1",
    "action": { "kind": "custom", "label": "   ", "points": 2 },
  });
  let out_of_range = json!({
    "target_user_id": "u_surv1",
    "action": { "kind": "custom", "label": "Aide", "points": 9 },
  });
  let not_adult = json!({
    "target_user_id": "u1",
    "action": { "kind": "custom", "label": "Aide", "points": 2 },
  });

  for body in [wrong_catalog, blank_label, out_of_range, not_adult] {
    let (status, _) = call(&state, "POST", "/api/events", Some(STUDENT), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  }
  assert!(state.store.list_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn drill_down_is_for_adults_only() {
  let (status, _) = call(&state(), "GET", "/api/rankings/u_eleve1", Some(STUDENT), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Administration ────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_creates_a_student_who_can_log_in() {
  let state = state();
  let draft = json!({
    "full_name": " Léa ",
    "username": "lea",
    "password": "pw",
    "role": "student",
    "class_id": "c_6ème_B",
  });
  let (status, user) = call(&state, "POST", "/api/users", Some(ADMIN), Some(draft)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(user["full_name"], "Léa");
  assert_eq!(user["active"], true);

  let (status, me) = call(&state, "GET", "/api/me", Some(("lea", "pw")), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(me["class_name"], "6ème B");

  let blank = json!({ "full_name": "  ", "role": "teacher" });
  let (status, _) = call(&state, "POST", "/api/users", Some(ADMIN), Some(blank)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deactivating_a_target_hides_it() {
  let state = state();
  let draft = json!({ "full_name": "Mme Martin", "role": "supervisor", "active": false });
  let (status, user) = call(&state, "PUT", "/api/users/u_surv1", Some(ADMIN), Some(draft.clone())).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(user["active"], false);

  let (_, body) = call(&state, "GET", "/api/targets", Some(STUDENT), None).await;
  assert!(!ids(&body).contains(&"u_surv1"));

  let (status, _) = call(&state, "PUT", "/api/users/ghost", Some(ADMIN), Some(draft)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn score_adjustment_appends_one_compensating_event() {
  let state = state();
  state
    .store
    .append_event(PointEvent::custom("u_eleve1", "u_prof1", "Aide", 10, Utc::now()))
    .await
    .unwrap();

  let (status, report) =
    call(&state, "POST", "/api/users/u_prof1/score", Some(ADMIN), Some(json!({ "new_total": 4 })))
      .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["previous"], 10);
  assert_eq!(report["current"], 4);
  assert_eq!(report["event"]["points"], -6);
  assert_eq!(report["event"]["created_by_id"], "admin_adjust");

  let (_, report) =
    call(&state, "POST", "/api/users/u_prof1/score", Some(ADMIN), Some(json!({ "new_total": 4 })))
      .await;
  assert!(report["event"].is_null());

  let (_, score) = call(&state, "GET", "/api/users/u_prof1/score", Some(ADMIN), None).await;
  assert_eq!(score["lifetime_score"], 4);
  assert_eq!(state.store.list_events().await.unwrap().len(), 2);
}

#[tokio::test]
async fn score_adjustment_beyond_one_event_is_rejected() {
  let state = state();
  state
    .store
    .append_event(PointEvent::custom("u_eleve1", "u_prof1", "Retard", -10, Utc::now()))
    .await
    .unwrap();

  let too_far = i64::from(i32::MAX);
  let (status, body) = call(
    &state,
    "POST",
    "/api/users/u_prof1/score",
    Some(ADMIN),
    Some(json!({ "new_total": too_far })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("too large"));
  assert_eq!(state.store.list_events().await.unwrap().len(), 1);
}

#[tokio::test]
async fn extreme_totals_keep_scoring_screens_working() {
  let state = state();
  let (status, report) = call(
    &state,
    "POST",
    "/api/users/u_prof1/score",
    Some(ADMIN),
    Some(json!({ "new_total": i32::MAX })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["current"], i32::MAX);

  state
    .store
    .append_event(PointEvent::custom("u_eleve1", "u_prof1", "Aide", 5, Utc::now()))
    .await
    .unwrap();
  let expected = i64::from(i32::MAX) + 5;

  let (status, board) = call(&state, "GET", "/api/rankings", Some(STUDENT), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(board["all"][0]["score"], expected);

  let (status, drill) = call(&state, "GET", "/api/rankings/u_prof1", Some(STUDENT), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(drill["lifetime_score"], expected);

  let (status, _) = call(&state, "GET", "/api/dashboard", Some(STUDENT), None).await;
  assert_eq!(status, StatusCode::OK);

  let (_, score) = call(&state, "GET", "/api/users/u_prof1/score", Some(ADMIN), None).await;
  assert_eq!(score["lifetime_score"], expected);
}

#[tokio::test]
async fn resets_delete_in_bulk() {
  let state = state();
  for target in ["u_prof1", "u_prof2", "u_prof1"] {
    state
      .store
      .append_event(PointEvent::custom("u_eleve1", target, "Aide", 1, Utc::now()))
      .await
      .unwrap();
  }

  let (status, _) = call(&state, "DELETE", "/api/users/u_prof1/events", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (_, log) = call(&state, "GET", "/api/events", Some(ADMIN), None).await;
  assert_eq!(log.as_array().unwrap().len(), 1);

  let (status, _) = call(&state, "DELETE", "/api/events", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert!(state.store.list_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn classes_are_created_and_deleted_without_cascade() {
  let state = state();
  let (status, class) =
    call(&state, "POST", "/api/classes", Some(ADMIN), Some(json!({ "name": " 6ème G " }))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(class["name"], "6ème G");

  let (_, classes) = call(&state, "GET", "/api/classes", Some(STUDENT), None).await;
  assert_eq!(classes.as_array().unwrap().len(), 25);

  let (status, _) =
    call(&state, "POST", "/api/classes", Some(ADMIN), Some(json!({ "name": "" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(&state, "DELETE", "/api/classes/c_6%C3%A8me_A", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (_, me) = call(&state, "GET", "/api/me", Some(STUDENT), None).await;
  assert_eq!(me["class_name"], "Non assigné");
  assert_eq!(me["user"]["class_id"], "c_6ème_A");
}

#[tokio::test]
async fn deleting_a_user_keeps_their_events() {
  let state = state();
  state
    .store
    .append_event(PointEvent::custom("u_eleve1", "u_dir1", "Aide", 3, Utc::now()))
    .await
    .unwrap();

  let (status, _) = call(&state, "DELETE", "/api/users/u_dir1", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = call(&state, "GET", "/api/users/u_dir1", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, board) = call(&state, "GET", "/api/rankings", Some(STUDENT), None).await;
  let ranked: Vec<&str> =
    board["all"].as_array().unwrap().iter().map(|r| r["user"]["id"].as_str().unwrap()).collect();
  assert!(!ranked.contains(&"u_dir1"));
  assert_eq!(state.store.list_events().await.unwrap().len(), 1);
}
