//! [`SqliteStore`] — the SQLite implementation of [`ValueStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;

use mapstat_core::{
  geo::{Raion, Region},
  layer::{Layer, NewLayer},
  store::ValueStore,
  value::{RaionValue, RegionValue},
};

use crate::{
  encode::{encode_period, RawRaionValue, RawRegionValue},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A mapstat value store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub(crate) fn conn(&self) -> &tokio_rusqlite::Connection {
    &self.conn
  }
}

// ─── ValueStore impl ─────────────────────────────────────────────────────────

impl ValueStore for SqliteStore {
  type Error = Error;

  // ── Layers ────────────────────────────────────────────────────────────────

  async fn list_layers(&self, only_active: bool) -> Result<Vec<Layer>> {
    let layers = self
      .conn
      .call(move |conn| {
        let sql = if only_active {
          "SELECT id, name, slug, color_theme, suffix, is_active
           FROM layers WHERE is_active = 1 ORDER BY id ASC"
        } else {
          "SELECT id, name, slug, color_theme, suffix, is_active
           FROM layers ORDER BY id ASC"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Layer {
              id:          row.get(0)?,
              name:        row.get(1)?,
              slug:        row.get(2)?,
              color_theme: row.get(3)?,
              suffix:      row.get(4)?,
              is_active:   row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(layers)
  }

  async fn get_layer(&self, slug: &str) -> Result<Option<Layer>> {
    let slug = slug.to_owned();
    let layer = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, name, slug, color_theme, suffix, is_active
               FROM layers WHERE slug = ?1",
              rusqlite::params![slug],
              |row| {
                Ok(Layer {
                  id:          row.get(0)?,
                  name:        row.get(1)?,
                  slug:        row.get(2)?,
                  color_theme: row.get(3)?,
                  suffix:      row.get(4)?,
                  is_active:   row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(layer)
  }

  async fn create_layer(&self, input: NewLayer) -> Result<Layer> {
    let name        = input.name;
    let slug        = input.slug;
    let color_theme = input.color_theme.unwrap_or_else(|| "blue".to_owned());
    let suffix      = input.suffix.unwrap_or_default();

    let (name_c, slug_c, theme_c, suffix_c) =
      (name.clone(), slug.clone(), color_theme.clone(), suffix.clone());

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO layers (name, slug, color_theme, suffix)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![name_c, slug_c, theme_c, suffix_c],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Layer { id, name, slug, color_theme, suffix, is_active: true })
  }

  async fn delete_layer(&self, slug: &str) -> Result<bool> {
    let slug = slug.to_owned();
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let id: Option<i64> = tx
          .query_row(
            "SELECT id FROM layers WHERE slug = ?1",
            rusqlite::params![slug],
            |r| r.get(0),
          )
          .optional()?;
        let Some(id) = id else {
          return Ok(false);
        };
        tx.execute("DELETE FROM region_values WHERE layer_id = ?1", rusqlite::params![id])?;
        tx.execute("DELETE FROM raion_values  WHERE layer_id = ?1", rusqlite::params![id])?;
        tx.execute("DELETE FROM layers WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(true)
      })
      .await?;
    Ok(deleted)
  }

  // ── Geography ─────────────────────────────────────────────────────────────

  async fn list_regions(&self) -> Result<Vec<Region>> {
    let regions = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT id, name FROM regions ORDER BY id ASC")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Region { id: row.get(0)?, name: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(regions)
  }

  async fn list_raions(&self) -> Result<Vec<Raion>> {
    let raions = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, name, parent_region_id FROM raions ORDER BY id ASC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Raion {
              id:               row.get(0)?,
              name:             row.get(1)?,
              parent_region_id: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raions)
  }

  // ── Facts ─────────────────────────────────────────────────────────────────

  async fn upsert_region_values(
    &self,
    layer_id: i64,
    period: NaiveDate,
    rows: &[(i64, f64)],
  ) -> Result<()> {
    let period_str = encode_period(period);
    let rows = rows.to_vec();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (region_id, value) in &rows {
          tx.execute(
            "INSERT INTO region_values (layer_id, region_id, value, period)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (layer_id, region_id, period)
             DO UPDATE SET value = excluded.value",
            rusqlite::params![layer_id, region_id, value, period_str],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn upsert_raion_values(
    &self,
    layer_id: i64,
    period: NaiveDate,
    rows: &[(i64, f64)],
  ) -> Result<()> {
    let period_str = encode_period(period);
    let rows = rows.to_vec();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (raion_id, value) in &rows {
          tx.execute(
            "INSERT INTO raion_values (layer_id, raion_id, value, period)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (layer_id, raion_id, period)
             DO UPDATE SET value = excluded.value",
            rusqlite::params![layer_id, raion_id, value, period_str],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn region_values(
    &self,
    layer_id: i64,
    period: Option<NaiveDate>,
  ) -> Result<Vec<RegionValue>> {
    let period_str = period.map(encode_period);
    let raws: Vec<RawRegionValue> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT layer_id, region_id, value, period
           FROM region_values
           WHERE layer_id = ?1 AND (?2 IS NULL OR period = ?2)",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![layer_id, period_str], |row| {
            Ok(RawRegionValue {
              layer_id:  row.get(0)?,
              region_id: row.get(1)?,
              value:     row.get(2)?,
              period:    row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRegionValue::into_value).collect()
  }

  async fn raion_values(
    &self,
    layer_id: i64,
    period: Option<NaiveDate>,
  ) -> Result<Vec<RaionValue>> {
    let period_str = period.map(encode_period);
    let raws: Vec<RawRaionValue> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT layer_id, raion_id, value, period
           FROM raion_values
           WHERE layer_id = ?1 AND (?2 IS NULL OR period = ?2)",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![layer_id, period_str], |row| {
            Ok(RawRaionValue {
              layer_id: row.get(0)?,
              raion_id: row.get(1)?,
              value:    row.get(2)?,
              period:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRaionValue::into_value).collect()
  }

  async fn delete_values(
    &self,
    layer_id: i64,
    period: Option<NaiveDate>,
  ) -> Result<u64> {
    let period_str = period.map(encode_period);
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let regions_deleted = tx.execute(
          "DELETE FROM region_values
           WHERE layer_id = ?1 AND (?2 IS NULL OR period = ?2)",
          rusqlite::params![layer_id, period_str],
        )?;
        tx.execute(
          "DELETE FROM raion_values
           WHERE layer_id = ?1 AND (?2 IS NULL OR period = ?2)",
          rusqlite::params![layer_id, period_str],
        )?;
        tx.commit()?;
        Ok(regions_deleted as u64)
      })
      .await?;
    Ok(deleted)
  }
}
