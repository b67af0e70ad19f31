//! The time-series assembler.
//!
//! Re-evaluates the [`crate::resolve`] precedence rule independently at each
//! period — no carry-forward between periods. A period where a unit recorded
//! nothing resolves to 0 at that period, full stop.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;

use crate::{
  geo::{Raion, Region},
  value::{RaionValue, RegionValue, Sample},
};

/// Precedence at a single period: nonzero raion aggregate, else the direct
/// entry, else 0 if either side stored anything, else nothing.
fn effective_at(aggregate: Option<f64>, direct: Option<f64>) -> Option<f64> {
  match (aggregate, direct) {
    (Some(a), _) if a != 0.0 => Some(a),
    (_, Some(d)) => Some(d),
    (Some(_), None) => Some(0.0),
    (None, None) => None,
  }
}

/// Distinct union of every period stored in either fact table, ascending.
pub fn periods(
  region_values: &[RegionValue],
  raion_values: &[RaionValue],
) -> Vec<NaiveDate> {
  let set: BTreeSet<NaiveDate> = region_values
    .iter()
    .map(|v| v.period)
    .chain(raion_values.iter().map(|v| v.period))
    .collect();
  set.into_iter().collect()
}

/// Full per-region history for one layer, keyed by region name.
///
/// Every region's series spans the union of the layer's periods — including
/// periods where that region contributed nothing (value 0). Samples ascend
/// by period.
pub fn layer_history(
  regions: &[Region],
  raions: &[Raion],
  region_values: &[RegionValue],
  raion_values: &[RaionValue],
) -> BTreeMap<String, Vec<Sample>> {
  let all_periods = periods(region_values, raion_values);
  let parent_of: HashMap<i64, i64> =
    raions.iter().map(|r| (r.id, r.parent_region_id)).collect();

  let mut direct: HashMap<(i64, NaiveDate), f64> = HashMap::new();
  for v in region_values {
    direct.insert((v.region_id, v.period), v.value);
  }

  let mut aggregate: HashMap<(i64, NaiveDate), f64> = HashMap::new();
  for v in raion_values {
    if let Some(&parent) = parent_of.get(&v.raion_id) {
      *aggregate.entry((parent, v.period)).or_insert(0.0) += v.value;
    }
  }

  regions
    .iter()
    .map(|region| {
      let samples = all_periods
        .iter()
        .map(|&period| Sample {
          period,
          value: effective_at(
            aggregate.get(&(region.id, period)).copied(),
            direct.get(&(region.id, period)).copied(),
          )
          .unwrap_or(0.0),
        })
        .collect();
      (region.name.clone(), samples)
    })
    .collect()
}

/// One region's history: the periods where it has any contribution (its own
/// entry or any of its raions'), precedence applied per period, ascending.
pub fn region_history(
  region: &Region,
  raions: &[Raion],
  region_values: &[RegionValue],
  raion_values: &[RaionValue],
) -> Vec<Sample> {
  let own_raions: HashSet<i64> = raions
    .iter()
    .filter(|r| r.parent_region_id == region.id)
    .map(|r| r.id)
    .collect();

  let direct: BTreeMap<NaiveDate, f64> = region_values
    .iter()
    .filter(|v| v.region_id == region.id)
    .map(|v| (v.period, v.value))
    .collect();

  let mut aggregate: BTreeMap<NaiveDate, f64> = BTreeMap::new();
  for v in raion_values.iter().filter(|v| own_raions.contains(&v.raion_id)) {
    *aggregate.entry(v.period).or_insert(0.0) += v.value;
  }

  let union: BTreeSet<NaiveDate> =
    direct.keys().chain(aggregate.keys()).copied().collect();

  union
    .into_iter()
    .map(|period| Sample {
      period,
      value: effective_at(
        aggregate.get(&period).copied(),
        direct.get(&period).copied(),
      )
      .unwrap_or(0.0),
    })
    .collect()
}

/// One raion's raw stored values, ascending by period. No aggregation —
/// raions are leaves.
pub fn raion_history(raion_id: i64, raion_values: &[RaionValue]) -> Vec<Sample> {
  let mut samples: Vec<Sample> = raion_values
    .iter()
    .filter(|v| v.raion_id == raion_id)
    .map(|v| Sample { period: v.period, value: v.value })
    .collect();
  samples.sort_by_key(|s| s.period);
  samples
}
