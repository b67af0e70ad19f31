//! The rollup/precedence engine.
//!
//! Given raw facts for one layer, compute the effective value per region (or
//! per raion). The rules, in order:
//!
//! 1. Per raion, select its value at the requested period — or, when the
//!    facts were fetched unfiltered, its own most recent value. Sum the
//!    selections across a region's raions to get that region's `aggregate`.
//! 2. Select the region's own entry the same way (`direct`).
//! 3. Effective value = `aggregate` if it is present and nonzero, else
//!    `direct`, else 0. `is_aggregated` is true exactly when the aggregate
//!    branch was taken: once granular raion data exists, a coarse region
//!    entry becomes a display-only fallback.
//!
//! An all-zero aggregate counts as absent and falls through to `direct`.
//!
//! Callers resolve the period question before calling in: a period-filtered
//! query hands us facts for exactly one period, so "own latest per unit"
//! degenerates to "the one stored value" and both cases share a single code
//! path. "Latest" is per unit — two regions may report different periods for
//! the same layer.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::{
  geo::{Raion, Region},
  layer::Layer,
  value::{RaionValue, RegionValue, ResolvedRaion, ResolvedRegion},
};

// ─── Per-unit latest selection ───────────────────────────────────────────────

/// Reduce raw rows to each unit's single newest (value, period) pair.
fn latest_per_unit<I>(rows: I) -> HashMap<i64, (f64, NaiveDate)>
where
  I: IntoIterator<Item = (i64, f64, NaiveDate)>,
{
  let mut latest: HashMap<i64, (f64, NaiveDate)> = HashMap::new();
  for (unit_id, value, period) in rows {
    match latest.get(&unit_id) {
      Some(&(_, newest)) if newest >= period => {}
      _ => {
        latest.insert(unit_id, (value, period));
      }
    }
  }
  latest
}

// ─── Region resolution ───────────────────────────────────────────────────────

/// Resolve one effective row per region.
///
/// Every region appears in the output, value 0 when it has no data at all.
/// Output is sorted by region name. The reported period is the newest
/// contributing raion period when aggregated, else the direct row's period.
pub fn resolve_regions(
  regions: &[Region],
  raions: &[Raion],
  region_values: &[RegionValue],
  raion_values: &[RaionValue],
  layer: &Layer,
) -> Vec<ResolvedRegion> {
  let direct = latest_per_unit(
    region_values.iter().map(|v| (v.region_id, v.value, v.period)),
  );
  let raion_latest = latest_per_unit(
    raion_values.iter().map(|v| (v.raion_id, v.value, v.period)),
  );

  // Fold each raion's selected value into its parent's aggregate.
  let mut aggregate: HashMap<i64, (f64, NaiveDate)> = HashMap::new();
  for raion in raions {
    if let Some(&(value, period)) = raion_latest.get(&raion.id) {
      let entry = aggregate
        .entry(raion.parent_region_id)
        .or_insert((0.0, period));
      entry.0 += value;
      entry.1 = entry.1.max(period);
    }
  }

  let mut out: Vec<ResolvedRegion> = regions
    .iter()
    .map(|region| {
      let agg = aggregate.get(&region.id).copied();
      let dir = direct.get(&region.id).copied();

      let (value, period, is_aggregated) = match (agg, dir) {
        (Some((a, ap)), _) if a != 0.0 => (a, Some(ap), true),
        (_, Some((d, dp))) => (d, Some(dp), false),
        // Zero aggregate with no direct entry: present, but not flagged.
        (Some((_, ap)), None) => (0.0, Some(ap), false),
        (None, None) => (0.0, None, false),
      };

      ResolvedRegion {
        region: region.name.clone(),
        value,
        suffix: layer.suffix.clone(),
        period,
        is_aggregated,
      }
    })
    .collect();

  out.sort_by(|a, b| a.region.cmp(&b.region));
  out
}

// ─── Raion resolution ────────────────────────────────────────────────────────

/// Resolve one row per raion — leaves never aggregate further down.
///
/// Every raion appears, value 0 when it has no data.
pub fn resolve_raions(
  regions: &[Region],
  raions: &[Raion],
  raion_values: &[RaionValue],
  layer: &Layer,
) -> Vec<ResolvedRaion> {
  let latest = latest_per_unit(
    raion_values.iter().map(|v| (v.raion_id, v.value, v.period)),
  );
  let region_names: HashMap<i64, &str> =
    regions.iter().map(|r| (r.id, r.name.as_str())).collect();

  let mut out: Vec<ResolvedRaion> = raions
    .iter()
    .map(|raion| {
      let (value, period) = match latest.get(&raion.id) {
        Some(&(v, p)) => (v, Some(p)),
        None => (0.0, None),
      };
      ResolvedRaion {
        raion: raion.name.clone(),
        parent_oblast: region_names
          .get(&raion.parent_region_id)
          .map(|s| (*s).to_owned())
          .unwrap_or_default(),
        value,
        suffix: layer.suffix.clone(),
        period,
      }
    })
    .collect();

  out.sort_by(|a, b| a.raion.cmp(&b.raion));
  out
}
