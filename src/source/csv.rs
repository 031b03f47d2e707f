use std::path::{Path, PathBuf};

use ::csv::{ReaderBuilder, StringRecord};

use super::{Dataset, RecordSource, SourceError};

/// Reads every `*.csv` file of a directory as one data set named after the file stem.
pub struct CsvDirectorySource {
  dir: PathBuf,
}

impl CsvDirectorySource {
  #[must_use]
  pub fn new(dir: PathBuf) -> Self {
    Self { dir }
  }

  fn read_file(path: &Path) -> Result<Dataset, SourceError> {
    let csv_error = |source| SourceError::Csv {
      path: path.to_path_buf(),
      source,
    };
    let mut reader = ReaderBuilder::new()
      .flexible(true)
      .trim(::csv::Trim::Headers)
      .from_path(path)
      .map_err(csv_error)?;

    let columns = reader
      .headers()
      .map_err(csv_error)?
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>();
    let name = path
      .file_stem()
      .map(|s| s.to_string_lossy().to_string())
      .unwrap_or_default();

    let mut dataset = Dataset::new(name, columns);
    let mut record = StringRecord::new();
    while reader.read_record(&mut record).map_err(csv_error)? {
      dataset.rows.push(
        record
          .iter()
          .map(|cell| Some(cell.to_string()).filter(|c| !c.is_empty()))
          .collect(),
      );
    }
    Ok(dataset)
  }
}

impl RecordSource for CsvDirectorySource {
  fn describe(&self) -> String {
    format!("csv directory {}", self.dir.display())
  }

  fn load(&self) -> Result<Vec<Dataset>, SourceError> {
    if !self.dir.is_dir() {
      return Err(SourceError::NotFound(self.dir.clone()));
    }
    let entries = std::fs::read_dir(&self.dir).map_err(|source| SourceError::Io {
      path: self.dir.clone(),
      source,
    })?;

    let mut paths: Vec<_> = entries
      .filter_map(Result::ok)
      .map(|e| e.path())
      .filter(|p| {
        p.extension()
          .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("csv"))
      })
      .collect();
    paths.sort();

    let mut datasets = Vec::with_capacity(paths.len());
    for path in paths {
      match Self::read_file(&path) {
        Ok(dataset) => {
          log::info!("Data set '{}': {} rows", dataset.name, dataset.rows.len());
          datasets.push(dataset);
        }
        Err(e) => log::warn!("Skipping {}: {e}", path.display()),
      }
    }
    Ok(datasets)
  }
}
