//! Handlers for raion-level data — the drill-down editor's endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/raion-data/{layer_slug}` | optional `?period=`; one row per raion, no aggregation |
//! | `POST` | `/api/raion-data` | admin; atomic batch write of `{raion_name, value}` pairs |

use std::collections::HashMap;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{NaiveDate, Utc};
use mapstat_core::{
  resolve::resolve_raions,
  store::ValueStore,
  value::{ResolvedRaion, month_start},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, auth::Authenticated, data::PeriodParam, error::ApiError};

/// `GET /api/raion-data/{layer_slug}[?period=...]`
pub async fn resolve<S>(
  State(state): State<AppState<S>>,
  Path(layer_slug): Path<String>,
  Query(params): Query<PeriodParam>,
) -> Result<Json<Vec<ResolvedRaion>>, ApiError>
where
  S: ValueStore + Clone + Send + Sync + 'static,
{
  let Some(layer) = state
    .store
    .get_layer(&layer_slug)
    .await
    .map_err(ApiError::store)?
  else {
    return Ok(Json(Vec::new()));
  };

  let regions = state.store.list_regions().await.map_err(ApiError::store)?;
  let raions = state.store.list_raions().await.map_err(ApiError::store)?;
  let raion_values = state
    .store
    .raion_values(layer.id, params.period)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(resolve_raions(&regions, &raions, &raion_values, &layer)))
}

// ─── Write ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RaionRow {
  pub raion_name: String,
  pub value:      f64,
}

/// JSON body accepted by `POST /api/raion-data`.
#[derive(Debug, Deserialize)]
pub struct RaionWriteBody {
  pub layer_slug: String,
  pub data:       Vec<RaionRow>,
  pub period:     Option<NaiveDate>,
}

/// `POST /api/raion-data` — atomic batch write of raion values.
///
/// Same skip-unknown-names policy as the region write path; the store-level
/// batch is all-or-nothing.
pub async fn write<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Json(body): Json<RaionWriteBody>,
) -> Result<Json<Value>, ApiError>
where
  S: ValueStore + Clone + Send + Sync + 'static,
{
  if body.layer_slug.trim().is_empty() {
    return Err(ApiError::BadRequest("layer_slug is required".to_owned()));
  }

  let layer = state
    .store
    .get_layer(&body.layer_slug)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("layer {:?} not found", body.layer_slug))
    })?;

  let period = body
    .period
    .unwrap_or_else(|| month_start(Utc::now().date_naive()));

  let raions = state.store.list_raions().await.map_err(ApiError::store)?;
  let by_name: HashMap<&str, i64> =
    raions.iter().map(|r| (r.name.as_str(), r.id)).collect();

  let rows: Vec<(i64, f64)> = body
    .data
    .iter()
    .filter_map(|row| {
      by_name
        .get(row.raion_name.as_str())
        .map(|&id| (id, row.value))
    })
    .collect();

  state
    .store
    .upsert_raion_values(layer.id, period, &rows)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    layer = %layer.slug,
    period = %period,
    rows = rows.len(),
    skipped = body.data.len() - rows.len(),
    "raion values written"
  );

  Ok(Json(json!({ "success": true })))
}
