//! The `ValueStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `mapstat-store-sqlite`).
//! The HTTP layer (`mapstat-server`) depends on this abstraction, not on any
//! concrete backend. The store holds no business logic: the rollup and
//! precedence rules live in [`crate::resolve`] and [`crate::history`] and
//! operate on the raw rows these methods return.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  geo::{Raion, Region},
  layer::{Layer, NewLayer},
  value::{RaionValue, RegionValue},
};

/// Abstraction over a mapstat fact-store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ValueStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Layers ────────────────────────────────────────────────────────────

  /// List layers in id order. With `only_active`, inactive layers are
  /// filtered out.
  fn list_layers(
    &self,
    only_active: bool,
  ) -> impl Future<Output = Result<Vec<Layer>, Self::Error>> + Send + '_;

  /// Look up a layer by slug. Returns `None` if not found.
  fn get_layer<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Layer>, Self::Error>> + Send + 'a;

  /// Create and persist a new layer.
  fn create_layer(
    &self,
    input: NewLayer,
  ) -> impl Future<Output = Result<Layer, Self::Error>> + Send + '_;

  /// Delete a layer and every region/raion value recorded for it.
  /// Returns `false` if the slug is unknown.
  fn delete_layer<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Geography ─────────────────────────────────────────────────────────

  fn list_regions(
    &self,
  ) -> impl Future<Output = Result<Vec<Region>, Self::Error>> + Send + '_;

  fn list_raions(
    &self,
  ) -> impl Future<Output = Result<Vec<Raion>, Self::Error>> + Send + '_;

  // ── Facts ─────────────────────────────────────────────────────────────

  /// Write a batch of (region_id, value) rows for one layer and period.
  ///
  /// Insert-or-overwrite per (layer, region, period). The batch is atomic:
  /// either every row lands or none do.
  fn upsert_region_values<'a>(
    &'a self,
    layer_id: i64,
    period: NaiveDate,
    rows: &'a [(i64, f64)],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Same semantics as [`ValueStore::upsert_region_values`], for raions.
  fn upsert_raion_values<'a>(
    &'a self,
    layer_id: i64,
    period: NaiveDate,
    rows: &'a [(i64, f64)],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Raw region facts for a layer. `Some(p)` restricts to exactly that
  /// period; `None` returns every stored period.
  fn region_values(
    &self,
    layer_id: i64,
    period: Option<NaiveDate>,
  ) -> impl Future<Output = Result<Vec<RegionValue>, Self::Error>> + Send + '_;

  /// Raw raion facts for a layer, same filter semantics.
  fn raion_values(
    &self,
    layer_id: i64,
    period: Option<NaiveDate>,
  ) -> impl Future<Output = Result<Vec<RaionValue>, Self::Error>> + Send + '_;

  /// Delete all values for a layer from both fact tables, optionally scoped
  /// to one period. Returns the number of region-value rows removed.
  fn delete_values(
    &self,
    layer_id: i64,
    period: Option<NaiveDate>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
