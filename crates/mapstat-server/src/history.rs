//! Time-series and period endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/layer-history/{layer_slug}` | `{region: [{period, value}]}` for sparklines |
//! | `GET`  | `/api/history/{layer_slug}/{region_name}` | one region's series |
//! | `GET`  | `/api/raion-history/{layer_slug}/{raion_name}` | one raion's raw series |
//! | `GET`  | `/api/periods/{layer_slug}` | ascending list of stored periods |
//! | `DELETE` | `/api/history/{layer_slug}` | admin; clear values, optional `?period=` scope |

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use mapstat_core::{history, store::ValueStore, value::Sample};
use serde_json::{Value, json};

use crate::{AppState, auth::Authenticated, data::PeriodParam, error::ApiError};

/// `GET /api/layer-history/{layer_slug}` — every region's full series.
pub async fn layer<S>(
  State(state): State<AppState<S>>,
  Path(layer_slug): Path<String>,
) -> Result<Json<BTreeMap<String, Vec<Sample>>>, ApiError>
where
  S: ValueStore + Clone + Send + Sync + 'static,
{
  let Some(layer) = state
    .store
    .get_layer(&layer_slug)
    .await
    .map_err(ApiError::store)?
  else {
    return Ok(Json(BTreeMap::new()));
  };

  let regions = state.store.list_regions().await.map_err(ApiError::store)?;
  let raions = state.store.list_raions().await.map_err(ApiError::store)?;
  let region_values = state
    .store
    .region_values(layer.id, None)
    .await
    .map_err(ApiError::store)?;
  let raion_values = state
    .store
    .raion_values(layer.id, None)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(history::layer_history(
    &regions,
    &raions,
    &region_values,
    &raion_values,
  )))
}

/// `GET /api/history/{layer_slug}/{region_name}` — one region's series,
/// raion aggregates folded in per period.
pub async fn region<S>(
  State(state): State<AppState<S>>,
  Path((layer_slug, region_name)): Path<(String, String)>,
) -> Result<Json<Vec<Sample>>, ApiError>
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
  let Some(region) = regions.iter().find(|r| r.name == region_name) else {
    return Ok(Json(Vec::new()));
  };

  let raions = state.store.list_raions().await.map_err(ApiError::store)?;
  let region_values = state
    .store
    .region_values(layer.id, None)
    .await
    .map_err(ApiError::store)?;
  let raion_values = state
    .store
    .raion_values(layer.id, None)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(history::region_history(
    region,
    &raions,
    &region_values,
    &raion_values,
  )))
}

/// `GET /api/raion-history/{layer_slug}/{raion_name}` — one raion's raw
/// stored values, ascending.
pub async fn raion<S>(
  State(state): State<AppState<S>>,
  Path((layer_slug, raion_name)): Path<(String, String)>,
) -> Result<Json<Vec<Sample>>, ApiError>
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

  let raions = state.store.list_raions().await.map_err(ApiError::store)?;
  let Some(raion) = raions.iter().find(|r| r.name == raion_name) else {
    return Ok(Json(Vec::new()));
  };

  let raion_values = state
    .store
    .raion_values(layer.id, None)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(history::raion_history(raion.id, &raion_values)))
}

/// `GET /api/periods/{layer_slug}` — distinct stored periods, ascending.
pub async fn periods<S>(
  State(state): State<AppState<S>>,
  Path(layer_slug): Path<String>,
) -> Result<Json<Vec<NaiveDate>>, ApiError>
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

  let region_values = state
    .store
    .region_values(layer.id, None)
    .await
    .map_err(ApiError::store)?;
  let raion_values = state
    .store
    .raion_values(layer.id, None)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(history::periods(&region_values, &raion_values)))
}

/// `DELETE /api/history/{layer_slug}[?period=...]` — clear stored values for
/// a layer from both fact tables, optionally scoped to one period.
pub async fn clear<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(layer_slug): Path<String>,
  Query(params): Query<PeriodParam>,
) -> Result<Json<Value>, ApiError>
where
  S: ValueStore + Clone + Send + Sync + 'static,
{
  let layer = state
    .store
    .get_layer(&layer_slug)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("layer {layer_slug:?} not found")))?;

  let deleted = state
    .store
    .delete_values(layer.id, params.period)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(layer = %layer.slug, deleted, "history cleared");

  Ok(Json(json!({ "success": true, "deleted_count": deleted })))
}
