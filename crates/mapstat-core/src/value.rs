//! Raw facts and resolved (displayed) rows.
//!
//! Only raw [`RegionValue`] / [`RaionValue`] rows are ever persisted. The
//! effective per-region value is always derived on read — see
//! [`crate::resolve`].

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};

// ─── Raw facts ───────────────────────────────────────────────────────────────

/// A directly-entered fact: (layer, region, period) → value.
///
/// At most one row exists per (layer, region, period); writing the same key
/// again overwrites the value in place. No edit history is kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionValue {
  pub layer_id:  i64,
  pub region_id: i64,
  pub value:     f64,
  pub period:    NaiveDate,
}

/// A per-raion fact with the same uniqueness and overwrite semantics as
/// [`RegionValue`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaionValue {
  pub layer_id: i64,
  pub raion_id: i64,
  pub value:    f64,
  pub period:   NaiveDate,
}

// ─── Resolved output ─────────────────────────────────────────────────────────

/// One resolved per-region row as served to the map client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRegion {
  pub region:        String,
  pub value:         f64,
  pub suffix:        String,
  /// Period the value was taken from; `None` when the region has no data.
  pub period:        Option<NaiveDate>,
  /// `true` exactly when the value was summed from raions rather than taken
  /// from the region's own entry.
  pub is_aggregated: bool,
}

/// One resolved per-raion row, used by the drill-down editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRaion {
  pub raion:         String,
  pub parent_oblast: String,
  pub value:         f64,
  pub suffix:        String,
  pub period:        Option<NaiveDate>,
}

/// One time-series point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
  pub period: NaiveDate,
  pub value:  f64,
}

// ─── Period helpers ──────────────────────────────────────────────────────────

/// Normalize a date to the first day of its month — the conventional period
/// key for a batch write that did not name one.
pub fn month_start(date: NaiveDate) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}
