//! From project tables to placed markers.

mod rows;

pub use rows::{PLACEHOLDER, clean_text, display_text, is_measurement_negative, parse_asset_type};

use crate::config::Config;
use crate::country::{CountryCode, normalize_country};
use crate::geocode::{Geocoder, clean_postal_code};
use crate::map::boundaries::load_boundaries;
use crate::map::marker::{Category, MarkerDescriptor, MarkerDetails, MarkerId, Status};
use crate::map::payload::{CountryOverlay, Diagnostics, MapPayload};
use crate::map::placement::Placement;
use crate::source::{Dataset, ProjectRecord, RecordSource};

/// Geocodes, filters and places the rows of all data sets.
pub struct Pipeline {
  geocoder: Geocoder,
  step_meters: f64,
}

struct Candidate {
  category: Category,
  country: CountryCode,
  record: ProjectRecord,
}

impl Pipeline {
  #[must_use]
  pub fn new(geocoder: Geocoder, step_meters: f64) -> Self {
    Self {
      geocoder,
      step_meters,
    }
  }

  #[must_use]
  pub fn with_config(config: &Config) -> Self {
    let geocoder = Geocoder::with_config(&config.geocoders);
    log::debug!("Geocoders: {:?}", geocoder.provider_names());
    Self::new(geocoder, config.jitter_step_meters())
  }

  /// Loads the records from `source` and builds the payload. A source that cannot be read at all
  /// results in an empty map.
  pub async fn run(&self, source: &dyn RecordSource, overlays: Vec<CountryOverlay>) -> MapPayload {
    log::info!("Loading projects from {}", source.describe());
    let datasets = match source.load() {
      Ok(datasets) => datasets,
      Err(e) => {
        log::error!("No projects loaded: {e}");
        let diagnostics = Diagnostics {
          skipped_datasets: vec![(source.describe(), e.to_string())],
          ..Default::default()
        };
        return MapPayload::new(Vec::new(), overlays, diagnostics);
      }
    };
    let (markers, diagnostics) = self.build_markers(&datasets).await;
    MapPayload::new(markers, overlays, diagnostics)
  }

  /// Turns data sets into markers. Marker ids follow the order of `datasets` and their rows.
  pub async fn build_markers(&self, datasets: &[Dataset]) -> (Vec<MarkerDescriptor>, Diagnostics) {
    let mut diagnostics = Diagnostics::default();
    let candidates = Self::collect_candidates(datasets, &mut diagnostics);

    let requests: Vec<(CountryCode, String)> = candidates
      .iter()
      .map(|c| (c.country, c.record.postal_code.clone().unwrap_or_default()))
      .collect();
    let outcome = self.geocoder.geocode(&requests).await;
    diagnostics.geocode_dropped = outcome.unresolved;
    diagnostics.failed_lookups = outcome.failed_groups;

    let mut placement = Placement::new(self.step_meters);
    let mut markers = Vec::new();
    for (candidate, point) in candidates.into_iter().zip(outcome.points) {
      let Some(point) = point else {
        continue;
      };
      let record = &candidate.record;
      if is_measurement_negative(record.measurement_installed.as_deref()) {
        diagnostics.excluded_measurement += 1;
        continue;
      }
      let Some(asset_type) = parse_asset_type(record.asset_type.as_deref()) else {
        diagnostics.excluded_asset_type += 1;
        continue;
      };

      let id = MarkerId(u32::try_from(markers.len()).unwrap_or(u32::MAX));
      markers.push(MarkerDescriptor {
        id,
        category: candidate.category,
        asset_type,
        status: Status::normalize(record.status.as_deref()),
        country: candidate.country,
        name: display_text(record.name.as_deref()),
        coordinate: placement.place(point),
        details: MarkerDetails {
          reference_id: display_text(record.reference_id.as_deref()),
          customer: display_text(record.customer.as_deref()),
          postal_code: display_text(record.postal_code.as_deref().map(clean_postal_code).as_deref()),
        },
      });
    }

    diagnostics.markers = markers.len();
    log::info!(
      "{} markers from {} rows ({} without coordinates, {} by asset type, {} without measurement)",
      diagnostics.markers,
      diagnostics.rows_read,
      diagnostics.geocode_dropped_total(),
      diagnostics.excluded_asset_type,
      diagnostics.excluded_measurement
    );
    (markers, diagnostics)
  }

  fn collect_candidates(datasets: &[Dataset], diagnostics: &mut Diagnostics) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for dataset in datasets {
      let Ok(category) = dataset.name.parse::<Category>() else {
        log::warn!("Skipping data set '{}': not a project category", dataset.name);
        diagnostics
          .skipped_datasets
          .push((dataset.name.clone(), "not a project category".to_string()));
        continue;
      };
      let records = match dataset.records() {
        Ok(records) => records,
        Err(e) => {
          log::warn!("Skipping data set '{}': {e}", dataset.name);
          diagnostics
            .skipped_datasets
            .push((dataset.name.clone(), e.to_string()));
          continue;
        }
      };
      log::debug!("{category}: {} rows", records.len());
      diagnostics.rows_read += records.len();
      candidates.extend(records.into_iter().map(|record| Candidate {
        category,
        country: normalize_country(record.country.as_deref()),
        record,
      }));
    }
    candidates
  }
}

/// The country overlays of the configured boundary file. Without a usable file there are none
/// and the country filter has no effect.
#[must_use]
pub fn load_overlays(config: &Config) -> Vec<CountryOverlay> {
  let Some(path) = &config.boundaries_path else {
    log::info!("No boundary file configured, country overlays are disabled");
    return Vec::new();
  };
  load_boundaries(path, config.boundary_name_property()).unwrap_or_else(|e| {
    log::warn!("Country overlays disabled: {e}");
    Vec::new()
  })
}

/// Runs the whole pipeline as configured.
pub async fn build_payload(config: &Config) -> MapPayload {
  let source = config.data_source().open();
  Pipeline::with_config(config)
    .run(source.as_ref(), load_overlays(config))
    .await
}
