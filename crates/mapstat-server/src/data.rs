//! Handlers for region-level data.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/data/{layer_slug}` | optional `?period=YYYY-MM-DD`; resolved per-region rows |
//! | `POST` | `/api/data` | admin; batch write of `{region_name, value}` pairs |

use std::collections::HashMap;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{NaiveDate, Utc};
use mapstat_core::{
  resolve::resolve_regions,
  store::ValueStore,
  value::{ResolvedRegion, month_start},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, auth::Authenticated, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct PeriodParam {
  pub period: Option<NaiveDate>,
}

/// `GET /api/data/{layer_slug}[?period=...]`
///
/// An unknown slug resolves to an empty set, not an error — the map client
/// treats missing layers as "no data yet".
pub async fn resolve<S>(
  State(state): State<AppState<S>>,
  Path(layer_slug): Path<String>,
  Query(params): Query<PeriodParam>,
) -> Result<Json<Vec<ResolvedRegion>>, ApiError>
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
  let region_values = state
    .store
    .region_values(layer.id, params.period)
    .await
    .map_err(ApiError::store)?;
  let raion_values = state
    .store
    .raion_values(layer.id, params.period)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(resolve_regions(
    &regions,
    &raions,
    &region_values,
    &raion_values,
    &layer,
  )))
}

// ─── Write ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegionRow {
  pub region_name: String,
  pub value:       f64,
}

/// JSON body accepted by `POST /api/data`.
#[derive(Debug, Deserialize)]
pub struct RegionWriteBody {
  pub layer_slug: String,
  pub data:       Vec<RegionRow>,
  /// Defaults to the first day of the current month.
  pub period:     Option<NaiveDate>,
}

/// `POST /api/data` — batch write of region values.
///
/// Unknown region names are skipped silently (best effort per row); an
/// unknown layer slug fails the whole batch before anything is written.
pub async fn write<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Json(body): Json<RegionWriteBody>,
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

  let regions = state.store.list_regions().await.map_err(ApiError::store)?;
  let by_name: HashMap<&str, i64> =
    regions.iter().map(|r| (r.name.as_str(), r.id)).collect();

  let rows: Vec<(i64, f64)> = body
    .data
    .iter()
    .filter_map(|row| {
      by_name
        .get(row.region_name.as_str())
        .map(|&id| (id, row.value))
    })
    .collect();

  state
    .store
    .upsert_region_values(layer.id, period, &rows)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    layer = %layer.slug,
    period = %period,
    rows = rows.len(),
    skipped = body.data.len() - rows.len(),
    "region values written"
  );

  Ok(Json(json!({ "success": true })))
}
