//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Periods are stored as ISO 8601 `YYYY-MM-DD` strings, which sort correctly
//! as text.

use chrono::NaiveDate;
use mapstat_core::value::{RaionValue, RegionValue};

use crate::{Error, Result};

// ─── Period ──────────────────────────────────────────────────────────────────

pub fn encode_period(d: NaiveDate) -> String {
  d.format("%Y-%m-%d").to_string()
}

pub fn decode_period(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `region_values` row as read from SQLite, before period decoding.
pub struct RawRegionValue {
  pub layer_id:  i64,
  pub region_id: i64,
  pub value:     f64,
  pub period:    String,
}

impl RawRegionValue {
  pub fn into_value(self) -> Result<RegionValue> {
    Ok(RegionValue {
      layer_id:  self.layer_id,
      region_id: self.region_id,
      value:     self.value,
      period:    decode_period(&self.period)?,
    })
  }
}

/// A `raion_values` row as read from SQLite.
pub struct RawRaionValue {
  pub layer_id: i64,
  pub raion_id: i64,
  pub value:    f64,
  pub period:   String,
}

impl RawRaionValue {
  pub fn into_value(self) -> Result<RaionValue> {
    Ok(RaionValue {
      layer_id: self.layer_id,
      raion_id: self.raion_id,
      value:    self.value,
      period:   decode_period(&self.period)?,
    })
  }
}
