use std::path::PathBuf;

use dirs::home_dir;
use log::error;

use crate::geocode::GeocoderConfig;
use crate::map::boundaries::DEFAULT_NAME_PROPERTY;
use crate::map::placement::DEFAULT_STEP_METERS;
use crate::source::DataSourceConfig;

pub const DEFAULT_PORT: u16 = 12346;
const DEFAULT_OUTPUT: &str = "assetmap_payload.json";
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Default)]
pub struct Config {
  pub config_path: Option<PathBuf>,
  pub data_source: Option<DataSourceConfig>,
  #[serde(default)]
  pub geocoders: Vec<GeocoderConfig>,
  pub boundaries_path: Option<PathBuf>,
  pub boundary_name_property: Option<String>,
  pub output: Option<PathBuf>,
  pub jitter_step_meters: Option<f64>,
  pub listen_port: Option<u16>,
}

impl Config {
  /// Environment first, then `config.json`, then defaults.
  #[must_use]
  pub fn new() -> Self {
    let from_env = Self::from_env();
    let from_file = Self::from_file();
    let default = Self::defaults();

    let mut merged = from_env;
    if let Some(from_file) = &from_file {
      merged = merged.merge(from_file);
    }
    merged = merged.merge(&default);

    if merged.config_path.is_some() && from_file.is_none() {
      merged.init_cfg_file();
    }

    merged
  }

  fn from_env() -> Self {
    Self::from_vars(|name| std::env::var(name).ok())
  }

  fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
    let data_source = var("ASSETMAP_DATA_PATH").map(PathBuf::from).map(|path| {
      match var("ASSETMAP_DATA_SOURCE").as_deref().map(str::trim) {
        Some(kind) if kind.eq_ignore_ascii_case("sqlite") => DataSourceConfig::Sqlite { path },
        Some(_) => DataSourceConfig::Csv { dir: path },
        None if path.is_file() => DataSourceConfig::Sqlite { path },
        None => DataSourceConfig::Csv { dir: path },
      }
    });

    let geocoders = var("ASSETMAP_POSTAL_CODE_DIR").map_or_else(Vec::new, |dir| {
      vec![GeocoderConfig::GeoNames {
        dir: PathBuf::from(dir),
      }]
    });

    let listen_port = var("ASSETMAP_PORT").and_then(|p| {
      p.trim()
        .parse()
        .inspect_err(|e| error!("Invalid ASSETMAP_PORT {p:?}: {e}"))
        .ok()
    });

    Self {
      config_path: var("ASSETMAP_CONFIG").map(PathBuf::from),
      data_source,
      geocoders,
      boundaries_path: var("ASSETMAP_BOUNDARIES").map(PathBuf::from),
      boundary_name_property: None,
      output: var("ASSETMAP_OUTPUT").map(PathBuf::from),
      jitter_step_meters: None,
      listen_port,
    }
  }

  fn merge(mut self, other: &Self) -> Self {
    self.config_path = self.config_path.or(other.config_path.clone());
    self.data_source = self.data_source.or(other.data_source.clone());

    for geocoder in &other.geocoders {
      if !self.geocoders.iter().any(|g| g == geocoder) {
        self.geocoders.push(geocoder.clone());
      }
    }

    self.boundaries_path = self.boundaries_path.or(other.boundaries_path.clone());
    self.boundary_name_property = self
      .boundary_name_property
      .or(other.boundary_name_property.clone());
    self.output = self.output.or(other.output.clone());
    self.jitter_step_meters = self.jitter_step_meters.or(other.jitter_step_meters);
    self.listen_port = self.listen_port.or(other.listen_port);

    self
  }

  fn config_dir() -> Option<PathBuf> {
    std::env::var("ASSETMAP_CONFIG")
      .ok()
      .map(PathBuf::from)
      .or_else(|| home_dir().map(|p| p.join(".config").join("assetmap")))
  }

  fn from_file() -> Option<Self> {
    let config_path = Self::config_dir()?.join("config.json");

    serde_json::from_str(&std::fs::read_to_string(&config_path).ok()?)
      .inspect_err(|e| error!("Failed to read config file: {e}"))
      .ok()?
  }

  fn init_cfg_file(&self) {
    if let Some(path) = &self.config_path {
      if !path.exists() {
        let _ = std::fs::create_dir_all(path).inspect_err(|e| {
          error!("Failed to create config directory: {e}");
        });
      }

      let path = path.join("config.json");
      if !path.exists() {
        let config = serde_json::to_string_pretty(self);
        if let Ok(config) = config {
          let _ = std::fs::write(path, config).inspect_err(|e| {
            error!("Failed to write config file: {e}");
          });
        } else {
          error!("Failed to serialize config");
        }
      }
    }
  }

  fn defaults() -> Self {
    let config_path = home_dir().map(|p| p.join(".config").join("assetmap"));
    let geocoders = config_path
      .as_ref()
      .map(|p| GeocoderConfig::GeoNames {
        dir: p.join("postal_codes"),
      })
      .into_iter()
      .collect();
    Self {
      config_path,
      data_source: Some(DataSourceConfig::Csv {
        dir: PathBuf::from(DEFAULT_DATA_DIR),
      }),
      geocoders,
      boundaries_path: None,
      boundary_name_property: Some(DEFAULT_NAME_PROPERTY.to_string()),
      output: Some(PathBuf::from(DEFAULT_OUTPUT)),
      jitter_step_meters: Some(DEFAULT_STEP_METERS),
      listen_port: Some(DEFAULT_PORT),
    }
  }

  #[must_use]
  pub fn data_source(&self) -> DataSourceConfig {
    self.data_source.clone().unwrap_or(DataSourceConfig::Csv {
      dir: PathBuf::from(DEFAULT_DATA_DIR),
    })
  }

  #[must_use]
  pub fn boundary_name_property(&self) -> &str {
    self
      .boundary_name_property
      .as_deref()
      .unwrap_or(DEFAULT_NAME_PROPERTY)
  }

  #[must_use]
  pub fn output(&self) -> PathBuf {
    self
      .output
      .clone()
      .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
  }

  #[must_use]
  pub fn jitter_step_meters(&self) -> f64 {
    self
      .jitter_step_meters
      .filter(|s| s.is_finite() && *s >= 0.)
      .unwrap_or(DEFAULT_STEP_METERS)
  }

  #[must_use]
  pub fn listen_port(&self) -> u16 {
    self.listen_port.unwrap_or(DEFAULT_PORT)
  }
}
