//! Geographic reference data — oblasts and raions.
//!
//! The hierarchy is exactly two levels: a raion belongs to one region, and
//! regions have no parent. Both tables are static reference data; they are
//! seeded at startup, not created through normal operation.

use serde::{Deserialize, Serialize};

/// A top-level administrative unit (oblast).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
  pub id:   i64,
  pub name: String,
}

/// A second-level administrative unit (raion), child of exactly one region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Raion {
  pub id:               i64,
  pub name:             String,
  pub parent_region_id: i64,
}
