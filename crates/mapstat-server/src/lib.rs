//! JSON REST API for mapstat.
//!
//! Exposes an axum [`Router`] backed by any [`mapstat_core::store::ValueStore`].
//! Reads are public; mutating endpoints require the shared admin credential.

pub mod auth;
pub mod chat;
pub mod data;
pub mod error;
pub mod history;
pub mod layers;
pub mod raions;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json,
  Router,
  routing::{delete, get, post},
};
use mapstat_core::store::ValueStore;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, Authenticated};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub admin_username:      String,
  pub admin_password_hash: String,
  /// OpenAI-style chat-completions URL for the AI bridge. Unset disables
  /// the bridge (the endpoint answers with a canned fallback).
  #[serde(default)]
  pub chat_upstream_url:   Option<String>,
  #[serde(default)]
  pub chat_model:          Option<String>,
  #[serde(default)]
  pub chat_api_key:        Option<String>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: ValueStore> {
  pub store:  Arc<S>,
  pub auth:   Arc<AuthConfig>,
  pub config: Arc<ServerConfig>,
  pub http:   reqwest::Client,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the mapstat API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ValueStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Layers
    .route("/api/layers", get(layers::list::<S>).post(layers::create::<S>))
    .route("/api/layers/{layer_slug}", delete(layers::delete_one::<S>))
    // Region data
    .route("/api/data/{layer_slug}", get(data::resolve::<S>))
    .route("/api/data", post(data::write::<S>))
    // Raion data
    .route("/api/raion-data/{layer_slug}", get(raions::resolve::<S>))
    .route("/api/raion-data", post(raions::write::<S>))
    // Time series
    .route("/api/layer-history/{layer_slug}", get(history::layer::<S>))
    .route("/api/history/{layer_slug}", delete(history::clear::<S>))
    .route(
      "/api/history/{layer_slug}/{region_name}",
      get(history::region::<S>),
    )
    .route(
      "/api/raion-history/{layer_slug}/{raion_name}",
      get(history::raion::<S>),
    )
    .route("/api/periods/{layer_slug}", get(history::periods::<S>))
    // Admin + chat
    .route("/api/verify-admin", get(verify_admin::<S>))
    .route("/api/chat", post(chat::handler::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// `GET /api/verify-admin` — succeeds iff the credential is valid.
async fn verify_admin<S>(
  _auth: Authenticated,
) -> Json<serde_json::Value>
where
  S: ValueStore + Clone + Send + Sync + 'static,
{
  Json(json!({ "status": "ok" }))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use mapstat_core::store::ValueStore as _;
  use mapstat_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::Value;
  use tower::ServiceExt as _;

  async fn make_state(password: &str) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .seed_reference(
        &["Одеська область", "Львівська область"],
        &[
          ("Одеський район", "Одеська область"),
          ("Ізмаїльський район", "Одеська область"),
        ],
      )
      .await
      .unwrap();
    store
      .create_layer(mapstat_core::layer::NewLayer {
        name:        "Ветерани".into(),
        slug:        "veterans".into(),
        color_theme: None,
        suffix:      Some("осіб".into()),
      })
      .await
      .unwrap();

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    AppState {
      store:  Arc::new(store),
      auth:   Arc::new(AuthConfig {
        username:      "admin".to_string(),
        password_hash: hash.clone(),
      }),
      config: Arc::new(ServerConfig {
        host:                "127.0.0.1".to_string(),
        port:                3001,
        store_path:          PathBuf::from(":memory:"),
        admin_username:      "admin".to_string(),
        admin_password_hash: hash,
        chat_upstream_url:   None,
        chat_model:          None,
        chat_api_key:        None,
      }),
      http:   reqwest::Client::new(),
    }
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn oneshot_raw(
    state:  AppState<SqliteStore>,
    method: &str,
    uri:    &str,
    auth:   Option<&str>,
    body:   &str,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(a) = auth {
      builder = builder.header(header::AUTHORIZATION, a);
    }
    if !body.is_empty() {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  // ── Auth gating ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn mutating_endpoints_require_auth() {
    let state = make_state("secret").await;
    let body = r#"{"layer_slug":"veterans","data":[]}"#;
    let resp = oneshot_raw(state.clone(), "POST", "/api/data", None, body).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let resp =
      oneshot_raw(state, "DELETE", "/api/history/veterans", None, "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn verify_admin_accepts_correct_credentials() {
    let state = make_state("secret").await;
    let auth = auth_header("admin", "secret");
    let resp = oneshot_raw(
      state.clone(),
      "GET",
      "/api/verify-admin",
      Some(&auth),
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let bad = auth_header("admin", "wrong");
    let resp =
      oneshot_raw(state, "GET", "/api/verify-admin", Some(&bad), "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Write → resolve round trip ──────────────────────────────────────────────

  #[tokio::test]
  async fn direct_write_then_resolve() {
    let state = make_state("secret").await;
    let auth = auth_header("admin", "secret");
    let body = r#"{
      "layer_slug": "veterans",
      "data": [{"region_name": "Одеська область", "value": 1200}],
      "period": "2024-01-01"
    }"#;
    let resp =
      oneshot_raw(state.clone(), "POST", "/api/data", Some(&auth), body).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp =
      oneshot_raw(state, "GET", "/api/data/veterans", None, "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rows = json_body(resp).await;
    let odesa = rows
      .as_array()
      .unwrap()
      .iter()
      .find(|r| r["region"] == "Одеська область")
      .unwrap();
    assert_eq!(odesa["value"], 1200.0);
    assert_eq!(odesa["is_aggregated"], false);
    assert_eq!(odesa["suffix"], "осіб");
  }

  #[tokio::test]
  async fn raion_rollup_overrides_direct_entry() {
    let state = make_state("secret").await;
    let auth = auth_header("admin", "secret");

    let direct = r#"{
      "layer_slug": "veterans",
      "data": [{"region_name": "Одеська область", "value": 3000}],
      "period": "2024-01-01"
    }"#;
    oneshot_raw(state.clone(), "POST", "/api/data", Some(&auth), direct).await;

    let granular = r#"{
      "layer_slug": "veterans",
      "data": [
        {"raion_name": "Одеський район", "value": 2000},
        {"raion_name": "Ізмаїльський район", "value": 3000}
      ],
      "period": "2024-01-01"
    }"#;
    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/api/raion-data",
      Some(&auth),
      granular,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = oneshot_raw(state, "GET", "/api/data/veterans", None, "").await;
    let rows = json_body(resp).await;
    let odesa = rows
      .as_array()
      .unwrap()
      .iter()
      .find(|r| r["region"] == "Одеська область")
      .unwrap();
    assert_eq!(odesa["value"], 5000.0);
    assert_eq!(odesa["is_aggregated"], true);
  }

  #[tokio::test]
  async fn every_region_present_in_resolution() {
    let state = make_state("secret").await;
    let resp = oneshot_raw(state, "GET", "/api/data/veterans", None, "").await;
    let rows = json_body(resp).await;
    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert!(
      rows
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["value"] == 0.0)
    );
  }

  #[tokio::test]
  async fn unknown_slug_resolves_to_empty_set() {
    let state = make_state("secret").await;
    let resp = oneshot_raw(state, "GET", "/api/data/ghost", None, "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, serde_json::json!([]));
  }

  // ── Batch policies ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unknown_region_name_is_skipped_not_fatal() {
    let state = make_state("secret").await;
    let auth = auth_header("admin", "secret");
    let body = r#"{
      "layer_slug": "veterans",
      "data": [
        {"region_name": "Одеська область", "value": 42},
        {"region_name": "Нереальна область", "value": 7}
      ],
      "period": "2024-01-01"
    }"#;
    let resp =
      oneshot_raw(state.clone(), "POST", "/api/data", Some(&auth), body).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = oneshot_raw(state, "GET", "/api/data/veterans", None, "").await;
    let rows = json_body(resp).await;
    let odesa = rows
      .as_array()
      .unwrap()
      .iter()
      .find(|r| r["region"] == "Одеська область")
      .unwrap();
    assert_eq!(odesa["value"], 42.0);
  }

  #[tokio::test]
  async fn unknown_layer_slug_fails_the_batch() {
    let state = make_state("secret").await;
    let auth = auth_header("admin", "secret");
    let body = r#"{
      "layer_slug": "ghost",
      "data": [{"region_name": "Одеська область", "value": 42}]
    }"#;
    let resp = oneshot_raw(state, "POST", "/api/data", Some(&auth), body).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn overwrite_same_key_keeps_last_value() {
    let state = make_state("secret").await;
    let auth = auth_header("admin", "secret");
    for value in [42, 99] {
      let body = format!(
        r#"{{
          "layer_slug": "veterans",
          "data": [{{"region_name": "Одеська область", "value": {value}}}],
          "period": "2024-03-01"
        }}"#
      );
      oneshot_raw(state.clone(), "POST", "/api/data", Some(&auth), &body).await;
    }

    let resp = oneshot_raw(
      state,
      "GET",
      "/api/data/veterans?period=2024-03-01",
      None,
      "",
    )
    .await;
    let rows = json_body(resp).await;
    let odesa = rows
      .as_array()
      .unwrap()
      .iter()
      .find(|r| r["region"] == "Одеська область")
      .unwrap();
    assert_eq!(odesa["value"], 99.0);
  }

  // ── Periods and history ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn periods_are_ascending_union() {
    let state = make_state("secret").await;
    let auth = auth_header("admin", "secret");
    let first = r#"{
      "layer_slug": "veterans",
      "data": [{"region_name": "Одеська область", "value": 1}],
      "period": "2024-01-01"
    }"#;
    let second = r#"{
      "layer_slug": "veterans",
      "data": [{"raion_name": "Одеський район", "value": 2}],
      "period": "2023-08-01"
    }"#;
    oneshot_raw(state.clone(), "POST", "/api/data", Some(&auth), first).await;
    oneshot_raw(state.clone(), "POST", "/api/raion-data", Some(&auth), second)
      .await;

    let resp = oneshot_raw(state, "GET", "/api/periods/veterans", None, "").await;
    assert_eq!(
      json_body(resp).await,
      serde_json::json!(["2023-08-01", "2024-01-01"])
    );
  }

  #[tokio::test]
  async fn layer_history_groups_by_region() {
    let state = make_state("secret").await;
    let auth = auth_header("admin", "secret");
    let body = r#"{
      "layer_slug": "veterans",
      "data": [{"region_name": "Одеська область", "value": 5}],
      "period": "2024-01-01"
    }"#;
    oneshot_raw(state.clone(), "POST", "/api/data", Some(&auth), body).await;

    let resp =
      oneshot_raw(state, "GET", "/api/layer-history/veterans", None, "").await;
    let grouped = json_body(resp).await;
    assert_eq!(grouped["Одеська область"][0]["value"], 5.0);
    // Silent regions still get a series spanning the layer's periods.
    assert_eq!(grouped["Львівська область"][0]["value"], 0.0);
  }

  #[tokio::test]
  async fn raion_history_is_raw_and_ascending() {
    let state = make_state("secret").await;
    let auth = auth_header("admin", "secret");
    for (period, value) in [("2024-01-01", 2), ("2023-08-01", 1)] {
      let body = format!(
        r#"{{
          "layer_slug": "veterans",
          "data": [{{"raion_name": "Одеський район", "value": {value}}}],
          "period": "{period}"
        }}"#
      );
      oneshot_raw(state.clone(), "POST", "/api/raion-data", Some(&auth), &body)
        .await;
    }

    let resp = oneshot_raw(
      state,
      "GET",
      "/api/raion-history/veterans/%D0%9E%D0%B4%D0%B5%D1%81%D1%8C%D0%BA%D0%B8%D0%B9%20%D1%80%D0%B0%D0%B9%D0%BE%D0%BD",
      None,
      "",
    )
    .await;
    let series = json_body(resp).await;
    assert_eq!(series[0]["period"], "2023-08-01");
    assert_eq!(series[0]["value"], 1.0);
    assert_eq!(series[1]["period"], "2024-01-01");
  }

  #[tokio::test]
  async fn clear_history_scoped_to_period() {
    let state = make_state("secret").await;
    let auth = auth_header("admin", "secret");
    for period in ["2023-08-01", "2024-01-01"] {
      let body = format!(
        r#"{{
          "layer_slug": "veterans",
          "data": [{{"region_name": "Одеська область", "value": 1}}],
          "period": "{period}"
        }}"#
      );
      oneshot_raw(state.clone(), "POST", "/api/data", Some(&auth), &body).await;
    }

    let resp = oneshot_raw(
      state.clone(),
      "DELETE",
      "/api/history/veterans?period=2024-01-01",
      Some(&auth),
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let payload = json_body(resp).await;
    assert_eq!(payload["deleted_count"], 1);

    let resp = oneshot_raw(state, "GET", "/api/periods/veterans", None, "").await;
    assert_eq!(json_body(resp).await, serde_json::json!(["2023-08-01"]));
  }

  // ── Layer CRUD ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_list_delete_layer() {
    let state = make_state("secret").await;
    let auth = auth_header("admin", "secret");

    let body = r#"{"name": "Вакансії", "slug": "vacancies", "suffix": "шт."}"#;
    let resp =
      oneshot_raw(state.clone(), "POST", "/api/layers", Some(&auth), body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = oneshot_raw(state.clone(), "GET", "/api/layers", None, "").await;
    let layers = json_body(resp).await;
    assert_eq!(layers.as_array().unwrap().len(), 2);

    let resp = oneshot_raw(
      state.clone(),
      "DELETE",
      "/api/layers/vacancies",
      Some(&auth),
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = oneshot_raw(state, "GET", "/api/layers", None, "").await;
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn delete_unknown_layer_returns_404() {
    let state = make_state("secret").await;
    let auth = auth_header("admin", "secret");
    let resp =
      oneshot_raw(state, "DELETE", "/api/layers/ghost", Some(&auth), "").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Chat bridge ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn chat_without_upstream_returns_fallback() {
    let state = make_state("secret").await;
    let resp = oneshot_raw(
      state,
      "POST",
      "/api/chat",
      None,
      r#"{"message": "Скільки ветеранів в Одесі?"}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let payload = json_body(resp).await;
    assert!(payload["response"].as_str().unwrap().contains("Aura"));
  }
}
