use std::path::PathBuf;

use rusqlite::{Connection, OpenFlags, types::ValueRef};

use super::{Dataset, RecordSource, SourceError};
use crate::map::marker::Category;

/// Reads one table per category from a SQLite database.
pub struct SqliteSource {
  path: PathBuf,
}

impl SqliteSource {
  #[must_use]
  pub fn new(path: PathBuf) -> Self {
    Self { path }
  }

  fn table_names(conn: &Connection) -> Result<Vec<String>, SourceError> {
    let mut stmt =
      conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let names = stmt
      .query_map([], |row| row.get::<_, String>(0))?
      .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
  }

  fn read_table(conn: &Connection, table: &str) -> Result<Dataset, SourceError> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{}\"", table.replace('"', "\"\"")))?;
    let columns: Vec<String> = stmt.column_names().iter().map(ToString::to_string).collect();
    let width = columns.len();
    let mut dataset = Dataset::new(table, columns);

    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
      let mut cells = Vec::with_capacity(width);
      for i in 0..width {
        cells.push(cell_to_string(row.get_ref(i)?));
      }
      dataset.rows.push(cells);
    }
    Ok(dataset)
  }
}

fn cell_to_string(value: ValueRef<'_>) -> Option<String> {
  match value {
    ValueRef::Null | ValueRef::Blob(_) => None,
    ValueRef::Integer(i) => Some(i.to_string()),
    ValueRef::Real(f) => Some(f.to_string()),
    ValueRef::Text(t) => Some(String::from_utf8_lossy(t).to_string()),
  }
}

impl RecordSource for SqliteSource {
  fn describe(&self) -> String {
    format!("sqlite database {}", self.path.display())
  }

  fn load(&self) -> Result<Vec<Dataset>, SourceError> {
    if !self.path.is_file() {
      return Err(SourceError::NotFound(self.path.clone()));
    }
    let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let tables = Self::table_names(&conn)?;

    let found: Vec<_> = Category::all()
      .iter()
      .filter(|c| tables.iter().any(|t| t == c.name()))
      .collect();
    if found.is_empty() {
      return Err(SourceError::NoDatasets {
        expected: Category::all().iter().map(ToString::to_string).collect(),
        available: tables,
      });
    }
    log::debug!("Found project tables: {found:?}");

    let mut datasets = Vec::with_capacity(found.len());
    for category in found {
      match Self::read_table(&conn, category.name()) {
        Ok(dataset) => {
          log::info!("Table '{category}': {} rows", dataset.rows.len());
          datasets.push(dataset);
        }
        Err(e) => log::warn!("Skipping table '{category}': {e}"),
      }
    }
    Ok(datasets)
  }
}
