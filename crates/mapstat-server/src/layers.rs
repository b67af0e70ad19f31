//! Layer CRUD handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/layers` | active layers, id order |
//! | `POST` | `/api/layers` | admin; body [`NewLayer`] |
//! | `DELETE` | `/api/layers/{layer_slug}` | admin; cascades all values |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use mapstat_core::{
  layer::{Layer, NewLayer},
  store::ValueStore,
};
use serde_json::json;

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /api/layers`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Layer>>, ApiError>
where
  S: ValueStore + Clone + Send + Sync + 'static,
{
  let layers = state
    .store
    .list_layers(true)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(layers))
}

/// `POST /api/layers` — returns 201 + the stored [`Layer`].
pub async fn create<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Json(body): Json<NewLayer>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ValueStore + Clone + Send + Sync + 'static,
{
  if body.name.trim().is_empty() || body.slug.trim().is_empty() {
    return Err(ApiError::BadRequest("name and slug are required".to_owned()));
  }

  let layer = state
    .store
    .create_layer(body)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(layer = %layer.slug, "layer created");
  Ok((StatusCode::CREATED, Json(layer)))
}

/// `DELETE /api/layers/{layer_slug}` — removes the layer and every value
/// recorded for it.
pub async fn delete_one<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(layer_slug): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: ValueStore + Clone + Send + Sync + 'static,
{
  let deleted = state
    .store
    .delete_layer(&layer_slug)
    .await
    .map_err(ApiError::store)?;

  if !deleted {
    return Err(ApiError::NotFound(format!("layer {layer_slug:?} not found")));
  }

  tracing::info!(layer = %layer_slug, "layer deleted");
  Ok(Json(json!({ "success": true })))
}
