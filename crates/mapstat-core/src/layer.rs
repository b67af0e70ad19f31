//! Layer — a named statistical category ("metric") shown on the map.

use serde::{Deserialize, Serialize};

/// A statistical category tracked over time and geography.
///
/// Deleting a layer cascades deletion of every region-level and raion-level
/// value recorded for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
  pub id:          i64,
  pub name:        String,
  /// Unique URL/API key, e.g. `"veterans"`.
  pub slug:        String,
  pub color_theme: String,
  /// Unit suffix appended to displayed values, e.g. `"осіб"`.
  pub suffix:      String,
  pub is_active:   bool,
}

/// Input for creating a layer. `id` and `is_active` are store-assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLayer {
  pub name:        String,
  pub slug:        String,
  #[serde(default)]
  pub color_theme: Option<String>,
  #[serde(default)]
  pub suffix:      Option<String>,
}
