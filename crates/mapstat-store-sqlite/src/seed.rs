//! Reference-data seeding.
//!
//! Oblasts (and, if supplied, raions) are static geography: they are loaded
//! once at startup with insert-if-absent semantics and never touched by the
//! normal write path.

use crate::{Result, SqliteStore};

/// The 24 oblasts plus Kyiv city, named as they appear on the map client.
pub const OBLASTS: [&str; 25] = [
  "Вінницька область",
  "Волинська область",
  "Дніпропетровська область",
  "Донецька область",
  "Житомирська область",
  "Закарпатська область",
  "Запорізька область",
  "Івано-Франківська область",
  "Київська область",
  "Кіровоградська область",
  "Луганська область",
  "Львівська область",
  "Миколаївська область",
  "Одеська область",
  "Полтавська область",
  "Рівненська область",
  "Сумська область",
  "Тернопільська область",
  "Харківська область",
  "Херсонська область",
  "Хмельницька область",
  "Черкаська область",
  "Чернівецька область",
  "Чернігівська область",
  "м. Київ",
];

impl SqliteStore {
  /// Idempotently load reference geography.
  ///
  /// `raions` pairs are `(raion_name, parent_region_name)`; a pair whose
  /// parent name is unknown is skipped, matching the best-effort policy of
  /// the write path.
  pub async fn seed_reference(
    &self,
    regions: &[&str],
    raions: &[(&str, &str)],
  ) -> Result<()> {
    let regions: Vec<String> = regions.iter().map(|s| (*s).to_owned()).collect();
    let raions: Vec<(String, String)> = raions
      .iter()
      .map(|(n, p)| ((*n).to_owned(), (*p).to_owned()))
      .collect();

    self
      .conn()
      .call(move |conn| {
        let tx = conn.transaction()?;
        for name in &regions {
          tx.execute(
            "INSERT OR IGNORE INTO regions (name) VALUES (?1)",
            rusqlite::params![name],
          )?;
        }
        for (name, parent) in &raions {
          tx.execute(
            "INSERT OR IGNORE INTO raions (name, parent_region_id)
             SELECT ?1, id FROM regions WHERE name = ?2",
            rusqlite::params![name, parent],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
