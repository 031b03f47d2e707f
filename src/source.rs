//! Loading of project records, one data set per category.

mod csv;
mod sqlite;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::csv::CsvDirectorySource;
pub use self::sqlite::SqliteSource;

/// Errors in a [`RecordSource`] or while reading a [`Dataset`].
#[derive(Error, Debug)]
pub enum SourceError {
  #[error("data source not found: {0}")]
  NotFound(PathBuf),
  #[error("failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("invalid csv in {path}: {source}")]
  Csv {
    path: PathBuf,
    source: ::csv::Error,
  },
  #[error("database error: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("no project tables found, expected one of {expected:?}, available: {available:?}")]
  NoDatasets {
    expected: Vec<String>,
    available: Vec<String>,
  },
  #[error("data set '{dataset}' lacks required columns {missing:?}")]
  MissingColumns {
    dataset: String,
    missing: Vec<&'static str>,
  },
}

/// Columns of the input schema. Each has a canonical name and the header used by the project
/// spreadsheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
  AssetType,
  ReferenceId,
  Name,
  Status,
  PostalCode,
  Customer,
  MeasurementInstalled,
  Country,
}

impl Column {
  pub const REQUIRED: [Column; 5] = [
    Column::AssetType,
    Column::ReferenceId,
    Column::Name,
    Column::Status,
    Column::PostalCode,
  ];

  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      Column::AssetType => "asset_type",
      Column::ReferenceId => "reference_id",
      Column::Name => "name",
      Column::Status => "status",
      Column::PostalCode => "postal_code",
      Column::Customer => "customer",
      Column::MeasurementInstalled => "measurement_installed",
      Column::Country => "country",
    }
  }

  #[must_use]
  pub fn alias(&self) -> &'static str {
    match self {
      Column::AssetType => "Art",
      Column::ReferenceId => "VN",
      Column::Name => "Name",
      Column::Status => "Status",
      Column::PostalCode => "PLZ",
      Column::Customer => "Kunde",
      Column::MeasurementInstalled => "Messtechnik eingebaut",
      Column::Country => "Land",
    }
  }

  fn matches(&self, header: &str) -> bool {
    let header = header.trim();
    header == self.name() || header == self.alias()
  }
}

/// One input row. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
  pub asset_type: Option<String>,
  pub reference_id: Option<String>,
  pub name: Option<String>,
  pub status: Option<String>,
  pub postal_code: Option<String>,
  pub customer: Option<String>,
  pub measurement_installed: Option<String>,
  pub country: Option<String>,
}

/// A raw table as delivered by a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
  pub name: String,
  pub columns: Vec<String>,
  pub rows: Vec<Vec<Option<String>>>,
}

impl Dataset {
  #[must_use]
  pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
    Self {
      name: name.into(),
      columns,
      rows: Vec::new(),
    }
  }

  #[must_use]
  pub fn with_row<S: AsRef<str>>(mut self, row: &[Option<S>]) -> Self {
    self
      .rows
      .push(row.iter().map(|c| c.as_ref().map(|s| s.as_ref().to_string())).collect());
    self
  }

  fn column_index(&self, column: Column) -> Option<usize> {
    self.columns.iter().position(|h| column.matches(h))
  }

  /// Interprets the table with the input schema. A table without all required columns is
  /// rejected as a whole.
  pub fn records(&self) -> Result<Vec<ProjectRecord>, SourceError> {
    let missing: Vec<_> = Column::REQUIRED
      .iter()
      .filter(|c| self.column_index(**c).is_none())
      .map(Column::name)
      .collect();
    if !missing.is_empty() {
      return Err(SourceError::MissingColumns {
        dataset: self.name.clone(),
        missing,
      });
    }

    let index = |column| self.column_index(column);
    let (asset_type, reference_id, name, status, postal_code) = (
      index(Column::AssetType),
      index(Column::ReferenceId),
      index(Column::Name),
      index(Column::Status),
      index(Column::PostalCode),
    );
    let (customer, measurement_installed, country) = (
      index(Column::Customer),
      index(Column::MeasurementInstalled),
      index(Column::Country),
    );

    Ok(
      self
        .rows
        .iter()
        .map(|row| {
          let cell = |i: Option<usize>| {
            i.and_then(|i| row.get(i))
              .and_then(Clone::clone)
              .filter(|v| !v.trim().is_empty())
          };
          ProjectRecord {
            asset_type: cell(asset_type),
            reference_id: cell(reference_id),
            name: cell(name),
            status: cell(status),
            postal_code: cell(postal_code),
            customer: cell(customer),
            measurement_installed: cell(measurement_installed),
            country: cell(country),
          }
        })
        .collect(),
    )
  }
}

/// Where the project tables come from.
pub trait RecordSource {
  /// Human readable description for diagnostics.
  fn describe(&self) -> String;

  /// Loads all tables. Failing here means no data set at all could be read.
  fn load(&self) -> Result<Vec<Dataset>, SourceError>;
}

/// Configured kind of record source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataSourceConfig {
  /// A directory with one `<CATEGORY>.csv` per category.
  Csv { dir: PathBuf },
  /// A SQLite database with one table per category.
  Sqlite { path: PathBuf },
}

impl DataSourceConfig {
  #[must_use]
  pub fn open(&self) -> Box<dyn RecordSource> {
    match self {
      DataSourceConfig::Csv { dir } => Box::new(CsvDirectorySource::new(dir.clone())),
      DataSourceConfig::Sqlite { path } => Box::new(SqliteSource::new(path.clone())),
    }
  }
}
