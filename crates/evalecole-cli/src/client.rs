//! Async HTTP client wrapping the Éval'École JSON API.

use std::time::Duration;

use anyhow::{Context, Result};
use evalecole_core::{
  event::PointEvent,
  submission::EventRequest,
  user::{ClassGroup, User},
  views::{
    AdjustRequest, AdjustmentReport, ClassDraft, DashboardView, DrillDown, Me, Member,
    RankingsBoard, RosterView, ScoreReport, StatusReport, TargetActions, UserDraft,
  },
};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// A non-success answer from the server.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ServerError {
  pub status:       StatusCode,
  pub message:      String,
  /// Sent with `503` while the store needs provisioning.
  pub setup_script: Option<String>,
}

impl ServerError {
  /// The status of `err`, if it came from the server.
  pub fn status_of(err: &anyhow::Error) -> Option<StatusCode> {
    err.downcast_ref::<ServerError>().map(|e| e.status)
  }
}

/// Basic-auth credentials for every request after login.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the Éval'École JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:      Client,
  base_url:    String,
  credentials: Option<Credentials>,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base_url: base_url.into(), credentials: None })
  }

  pub fn set_credentials(&mut self, credentials: Option<Credentials>) {
    self.credentials = credentials;
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let req = self.client.request(method, self.url(path));
    match &self.credentials {
      Some(c) => req.basic_auth(&c.username, Some(&c.password)),
      None => req,
    }
  }

  /// Send `req`, turning error statuses into [`ServerError`].
  async fn send(req: RequestBuilder, what: &str) -> Result<reqwest::Response> {
    let resp = req.send().await.with_context(|| format!("{what} failed"))?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }

    let body: Value = resp.json().await.unwrap_or(Value::Null);
    let message = body["error"]
      .as_str()
      .map(str::to_owned)
      .unwrap_or_else(|| format!("{what} → {status}"));
    let setup_script = body["setup_script"].as_str().map(str::to_owned);
    tracing::debug!(%status, %message, "{what} refused");
    Err(ServerError { status, message, setup_script }.into())
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let what = format!("GET {path}");
    let resp = Self::send(self.request(Method::GET, path), &what).await?;
    resp.json().await.with_context(|| format!("deserialising {what}"))
  }

  async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let what = format!("{method} {path}");
    let resp = Self::send(self.request(method, path).json(body), &what).await?;
    resp.json().await.with_context(|| format!("deserialising {what}"))
  }

  async fn delete(&self, path: &str) -> Result<()> {
    Self::send(self.request(Method::DELETE, path), &format!("DELETE {path}")).await?;
    Ok(())
  }

  // ── Session ───────────────────────────────────────────────────────────────

  /// `GET /api/status`
  pub async fn status(&self) -> Result<StatusReport> { self.get("/status").await }

  /// `GET /api/me`
  pub async fn me(&self) -> Result<Me> { self.get("/me").await }

  // ── Screens ───────────────────────────────────────────────────────────────

  /// `GET /api/dashboard`
  pub async fn dashboard(&self) -> Result<DashboardView> { self.get("/dashboard").await }

  /// `GET /api/my-class`
  pub async fn my_class(&self) -> Result<RosterView> { self.get("/my-class").await }

  /// `GET /api/classes`
  pub async fn classes(&self) -> Result<Vec<ClassGroup>> { self.get("/classes").await }

  /// `GET /api/rankings`
  pub async fn rankings(&self) -> Result<RankingsBoard> { self.get("/rankings").await }

  /// `GET /api/rankings/{id}`
  pub async fn drill_down(&self, user_id: &str) -> Result<DrillDown> {
    self.get(&format!("/rankings/{user_id}")).await
  }

  // ── Points ────────────────────────────────────────────────────────────────

  /// `GET /api/targets?search=<term>`
  pub async fn targets(&self, search: &str) -> Result<Vec<Member>> {
    let what = "GET /targets";
    let req = self.request(Method::GET, "/targets").query(&[("search", search)]);
    let resp = Self::send(req, what).await?;
    resp.json().await.context("deserialising targets")
  }

  /// `GET /api/targets/{id}/actions`
  pub async fn target_actions(&self, target_id: &str) -> Result<TargetActions> {
    self.get(&format!("/targets/{target_id}/actions")).await
  }

  /// `POST /api/events`
  pub async fn submit(&self, request: &EventRequest) -> Result<PointEvent> {
    self.send_json(Method::POST, "/events", request).await
  }

  // ── Administration ────────────────────────────────────────────────────────

  /// `GET /api/users`
  pub async fn users(&self) -> Result<Vec<User>> { self.get("/users").await }

  /// `POST /api/users`
  pub async fn create_user(&self, draft: &UserDraft) -> Result<User> {
    self.send_json(Method::POST, "/users", draft).await
  }

  /// `PUT /api/users/{id}`
  pub async fn update_user(&self, id: &str, draft: &UserDraft) -> Result<User> {
    self.send_json(Method::PUT, &format!("/users/{id}"), draft).await
  }

  /// `DELETE /api/users/{id}`
  pub async fn delete_user(&self, id: &str) -> Result<()> {
    self.delete(&format!("/users/{id}")).await
  }

  /// `GET /api/users/{id}/score`
  pub async fn score(&self, id: &str) -> Result<ScoreReport> {
    self.get(&format!("/users/{id}/score")).await
  }

  /// `POST /api/users/{id}/score`
  pub async fn adjust(&self, id: &str, new_total: i64) -> Result<AdjustmentReport> {
    self
      .send_json(Method::POST, &format!("/users/{id}/score"), &AdjustRequest { new_total })
      .await
  }

  /// `DELETE /api/users/{id}/events`
  pub async fn reset_user(&self, id: &str) -> Result<()> {
    self.delete(&format!("/users/{id}/events")).await
  }

  /// `POST /api/classes`
  pub async fn create_class(&self, name: &str) -> Result<ClassGroup> {
    self
      .send_json(Method::POST, "/classes", &ClassDraft { name: name.to_owned() })
      .await
  }

  /// `DELETE /api/classes/{id}`
  pub async fn delete_class(&self, id: &str) -> Result<()> {
    self.delete(&format!("/classes/{id}")).await
  }

  /// `GET /api/events`
  pub async fn events(&self) -> Result<Vec<PointEvent>> { self.get("/events").await }

  /// `DELETE /api/events`
  pub async fn reset_all(&self) -> Result<()> { self.delete("/events").await }
}
