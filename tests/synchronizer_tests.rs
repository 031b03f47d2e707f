use std::collections::BTreeSet;
use std::sync::mpsc;

use assetmap::country::{CountryCode, HOME_COUNTRY};
use assetmap::map::boundaries::{DEFAULT_NAME_PROPERTY, load_boundaries};
use assetmap::map::coordinates::WGS84Coordinate;
use assetmap::map::marker::{AssetType, Category, MarkerDescriptor, MarkerDetails, MarkerId, Status};
use assetmap::map::payload::{Diagnostics, MapPayload};
use assetmap::sync::{ClientEvent, CommandBuffer, RenderCommand, SyncError, Synchronizer};
use proptest::prelude::*;

fn code(value: &str) -> CountryCode {
  CountryCode::parse(value).unwrap()
}

fn marker(
  id: u32,
  name: &str,
  category: Category,
  asset_type: AssetType,
  country: &str,
) -> MarkerDescriptor {
  MarkerDescriptor {
    id: MarkerId(id),
    category,
    asset_type,
    status: Status::Order,
    country: code(country),
    name: name.to_string(),
    coordinate: WGS84Coordinate::new(50. + f64::from(id) / 10., 10.),
    details: MarkerDetails {
      reference_id: id.to_string(),
      customer: "—".to_string(),
      postal_code: "—".to_string(),
    },
  }
}

fn markers() -> Vec<MarkerDescriptor> {
  vec![
    marker(0, "Windpark Nord", Category::Eza, AssetType::Wind, "DE"),
    marker(1, "zentrale", Category::Eze, AssetType::Hkw, "DE"),
    marker(2, "Windpark Wien", Category::Eza, AssetType::Wind, "AT"),
    marker(3, "Speicher Graz", Category::Osnv, AssetType::Batterie, "AT"),
    marker(4, "Dach Amsterdam", Category::Eze, AssetType::Pv, "NL"),
    marker(5, "Ärztehaus", Category::Ezar, AssetType::Bhkw, "DE"),
    marker(6, "Centrale Idroelettrica", Category::Eza, AssetType::Wasser, "IT"),
    marker(7, "Parc Solaire", Category::Eze, AssetType::Pv, "FR"),
    marker(8, "Österreichring", Category::Eza, AssetType::Ezar, "AT"),
  ]
}

fn payload() -> MapPayload {
  let path = format!(
    "{}/tests/resources/boundaries.geojson",
    env!("CARGO_MANIFEST_DIR")
  );
  let overlays = load_boundaries(path.as_ref(), DEFAULT_NAME_PROPERTY).unwrap();
  MapPayload::new(markers(), overlays, Diagnostics::default())
}

fn hidden_markers(commands: &[RenderCommand]) -> Vec<MarkerId> {
  commands
    .iter()
    .filter_map(|c| match c {
      RenderCommand::SetMarkerVisible { id, visible: false } => Some(*id),
      _ => None,
    })
    .collect()
}

#[test]
fn test_initial_state() {
  let sync = Synchronizer::new(&payload(), CommandBuffer::default());

  // Italy is no neighbor and starts hidden, France has no overlay and is never shown.
  assert!(!sync.is_visible(MarkerId(6)));
  assert!(!sync.is_visible(MarkerId(7)));
  assert!(!sync.filters().visible_countries.contains(&code("FR")));
  assert_eq!(sync.visible_count(), 7);
  assert_eq!(sync.active(), None);

  let commands = sync_commands(sync);
  assert!(commands.contains(&RenderCommand::SetOverlayVisible {
    country: code("AT"),
    visible: true
  }));
  assert!(commands.contains(&RenderCommand::SetCapitalLabelVisible {
    country: code("NL"),
    visible: true
  }));
  assert!(!commands.iter().any(|c| matches!(
    c,
    RenderCommand::SetOverlayVisible { country, .. } if country.as_str() == "IT"
  )));
  assert_eq!(
    commands
      .iter()
      .filter(|c| matches!(c, RenderCommand::SetMarkerVisible { .. }))
      .count(),
    9
  );
  assert!(commands.contains(&RenderCommand::SetMarkerVisible {
    id: MarkerId(7),
    visible: false
  }));
  assert_eq!(commands.last(), Some(&RenderCommand::SetVisibleCount(7)));
}

fn sync_commands(mut sync: Synchronizer<CommandBuffer>) -> Vec<RenderCommand> {
  sync.renderer_mut().drain()
}

#[test]
fn test_hiding_a_country() {
  let mut sync = Synchronizer::new(&payload(), CommandBuffer::default());
  sync.renderer_mut().drain();
  let before = sync.visible_count();

  sync.toggle_country(code("AT")).unwrap();
  let commands = sync.renderer_mut().drain();

  assert!(commands.contains(&RenderCommand::SetOverlayVisible {
    country: code("AT"),
    visible: false
  }));
  assert!(commands.contains(&RenderCommand::SetCapitalLabelVisible {
    country: code("AT"),
    visible: false
  }));
  let hidden = hidden_markers(&commands);
  assert_eq!(hidden, vec![MarkerId(2), MarkerId(3), MarkerId(8)]);
  assert_eq!(sync.visible_count(), before - hidden.len());
  // One recompute: a single list update and a single count.
  assert_eq!(
    commands
      .iter()
      .filter(|c| matches!(c, RenderCommand::SetList(_)))
      .count(),
    1
  );
  assert!(commands.contains(&RenderCommand::SetVisibleCount(before - 3)));
  assert!(sync.list().iter().all(|e| e.country.as_str() != "AT"));

  sync.toggle_country(code("AT")).unwrap();
  assert_eq!(sync.visible_count(), before);
}

#[test]
fn test_only_overlay_countries_can_be_toggled() {
  let mut sync = Synchronizer::new(&payload(), CommandBuffer::default());
  sync.renderer_mut().drain();

  assert_eq!(
    sync.toggle_country(HOME_COUNTRY),
    Err(SyncError::UnknownCountry(HOME_COUNTRY))
  );
  assert_eq!(
    sync.handle(ClientEvent::ToggleCountry(code("FR"))),
    Err(SyncError::UnknownCountry(code("FR")))
  );
  assert!(sync.renderer_mut().commands().is_empty());
  assert!(sync.is_visible(MarkerId(0)));
  assert!(!sync.is_visible(MarkerId(7)));
}

#[test]
fn test_show_neighbors() {
  let mut sync = Synchronizer::new(&payload(), CommandBuffer::default());
  sync.toggle_country(code("AT")).unwrap();
  sync.toggle_country(code("NL")).unwrap();
  sync.toggle_country(code("IT")).unwrap();
  sync.renderer_mut().drain();

  sync.handle(ClientEvent::ShowNeighbors).unwrap();
  let commands = sync.renderer_mut().drain();

  let shown: BTreeSet<_> = commands
    .iter()
    .filter_map(|c| match c {
      RenderCommand::SetOverlayVisible { country, visible: true } => Some(country.as_str()),
      _ => None,
    })
    .collect();
  assert_eq!(shown, BTreeSet::from(["AT", "NL"]));
  assert_eq!(
    commands
      .iter()
      .filter(|c| matches!(c, RenderCommand::SetVisibleCount(_)))
      .count(),
    1
  );
  // Italy was shown by hand and stays, France has no overlay and stays hidden.
  assert!(sync.is_visible(MarkerId(6)));
  assert!(!sync.is_visible(MarkerId(7)));
  assert_eq!(sync.visible_count(), 8);
}

#[test]
fn test_selection() {
  let mut sync = Synchronizer::new(&payload(), CommandBuffer::default());
  sync.renderer_mut().drain();

  assert_eq!(
    sync.select(MarkerId(6)),
    Err(SyncError::HiddenMarker(MarkerId(6)))
  );
  assert_eq!(
    sync.select(MarkerId(42)),
    Err(SyncError::UnknownMarker(MarkerId(42)))
  );
  assert_eq!(sync.active(), None);

  sync.handle(ClientEvent::ViewChanged { zoom: 4 }).unwrap();
  sync.select(MarkerId(2)).unwrap();
  assert_eq!(sync.active(), Some(MarkerId(2)));
  assert_eq!(sync.zoom(), 7);
  assert_eq!(
    sync.renderer_mut().drain(),
    vec![
      RenderCommand::SetActive(Some(MarkerId(2))),
      RenderCommand::FlyTo {
        coordinate: markers()[2].coordinate,
        zoom: 7
      },
      RenderCommand::OpenPopup(MarkerId(2)),
    ]
  );

  // Zoomed in further, selecting keeps the zoom.
  sync.view_changed(12);
  sync.select(MarkerId(4)).unwrap();
  assert_eq!(sync.zoom(), 12);
  assert_eq!(sync.active(), Some(MarkerId(4)));

  // Hiding the active marker clears the selection.
  sync.toggle_country(code("NL")).unwrap();
  assert_eq!(sync.active(), None);
  assert_eq!(
    sync.renderer_mut().commands().last(),
    Some(&RenderCommand::SetActive(None))
  );
}

#[test]
fn test_list_is_sorted_by_name() {
  let sync = Synchronizer::new(&payload(), CommandBuffer::default());
  let names: Vec<_> = sync.list().iter().map(|e| e.name.as_str()).collect();
  assert_eq!(
    names,
    vec![
      "Ärztehaus",
      "Dach Amsterdam",
      "Österreichring",
      "Speicher Graz",
      "Windpark Nord",
      "Windpark Wien",
      "zentrale",
    ]
  );
}

#[test]
fn test_channel_renderer() {
  let (tx, rx) = mpsc::channel();
  let mut sync = Synchronizer::new(&payload(), tx);
  let initial = rx.try_iter().count();
  assert!(initial > 0);

  sync.toggle_category(Category::Eze);
  let commands: Vec<_> = rx.try_iter().collect();
  assert_eq!(hidden_markers(&commands), vec![MarkerId(1), MarkerId(4)]);
  assert_eq!(commands.last(), Some(&RenderCommand::SetVisibleCount(5)));
}

fn event() -> impl Strategy<Value = ClientEvent> {
  prop_oneof![
    proptest::sample::select(Category::all().to_vec()).prop_map(ClientEvent::ToggleCategory),
    proptest::sample::select(AssetType::all().to_vec()).prop_map(ClientEvent::ToggleAssetType),
    proptest::sample::select(vec!["AT", "NL", "IT", "DE", "FR"])
      .prop_map(|c| ClientEvent::ToggleCountry(code(c))),
    Just(ClientEvent::ShowNeighbors),
    (0u32..10).prop_map(|id| ClientEvent::Select(MarkerId(id))),
    (0u8..19).prop_map(|zoom| ClientEvent::ViewChanged { zoom }),
  ]
}

proptest! {
  #[test]
  fn test_visibility_follows_the_filters(events in proptest::collection::vec(event(), 0..40)) {
    let payload = payload();
    let mut sync = Synchronizer::new(&payload, CommandBuffer::default());
    let mut shown: Vec<bool> = sync.visibility().to_vec();
    for (id, visible) in sync.renderer_mut().drain().iter().filter_map(|c| match c {
      RenderCommand::SetMarkerVisible { id, visible } => Some((*id, *visible)),
      _ => None,
    }) {
      shown[id.0 as usize] = visible;
    }

    for event in events {
      let _ = sync.handle(event);
      for command in sync.renderer_mut().drain() {
        if let RenderCommand::SetMarkerVisible { id, visible } = command {
          prop_assert_ne!(shown[id.0 as usize], visible);
          shown[id.0 as usize] = visible;
        }
      }

      let filters = sync.filters();
      for marker in &payload.markers {
        let expected = filters.categories.contains(&marker.category)
          && filters.asset_types.contains(&marker.asset_type)
          && (marker.country.is_home() || filters.visible_countries.contains(&marker.country));
        prop_assert_eq!(sync.is_visible(marker.id), expected);
        prop_assert_eq!(shown[marker.id.0 as usize], expected);
      }

      let listed: BTreeSet<_> = sync.list().iter().map(|e| e.id).collect();
      let visible: BTreeSet<_> = payload
        .markers
        .iter()
        .filter(|m| sync.is_visible(m.id))
        .map(|m| m.id)
        .collect();
      prop_assert_eq!(&listed, &visible);
      prop_assert_eq!(sync.visible_count(), visible.len());
      if let Some(active) = sync.active() {
        prop_assert!(sync.is_visible(active));
      }
    }
  }
}
