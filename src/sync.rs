//! Keeps marker visibility, the sorted list and the active selection consistent with the filters.

pub mod filter;
pub mod list;
pub mod render;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use filter::{FilterState, VisibilityRule};
pub use list::{ListEntry, sorted_entries};
pub use render::{CommandBuffer, RenderCommand, Renderer};

use crate::country::CountryCode;
use crate::map::marker::{AssetType, Category, MarkerDescriptor, MarkerId};
use crate::map::payload::{CountryOverlay, MapPayload};

/// Selecting a marker zooms in at least this far.
pub const SELECTION_MIN_ZOOM: u8 = 7;

/// Zoom assumed until the renderer reports one.
pub const INITIAL_ZOOM: u8 = 6;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SyncError {
  #[error("no marker {0}")]
  UnknownMarker(MarkerId),
  #[error("marker {0} is hidden")]
  HiddenMarker(MarkerId),
  #[error("no overlay for country {0}")]
  UnknownCountry(CountryCode),
}

/// User interactions sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientEvent {
  ToggleCategory(Category),
  ToggleAssetType(AssetType),
  ToggleCountry(CountryCode),
  ShowNeighbors,
  Select(MarkerId),
  ViewChanged { zoom: u8 },
}

/// Snapshot of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
  pub filters: FilterState,
  pub visible_count: usize,
  pub list: Vec<ListEntry>,
  pub active: Option<MarkerId>,
  pub zoom: u8,
}

/// The visibility state machine of one session. Every filter change is followed by a full
/// recompute; only markers whose visibility changed are sent to the renderer.
pub struct Synchronizer<R: Renderer> {
  markers: Vec<MarkerDescriptor>,
  index: HashMap<MarkerId, usize>,
  overlays: Vec<CountryOverlay>,
  rule: VisibilityRule,
  state: FilterState,
  visible: Vec<bool>,
  list: Vec<ListEntry>,
  active: Option<MarkerId>,
  zoom: u8,
  renderer: R,
}

impl<R: Renderer> Synchronizer<R> {
  /// Sets up the initial state and renders it completely.
  pub fn new(payload: &MapPayload, renderer: R) -> Self {
    let state = FilterState::initial(&payload.overlays);
    let rule = VisibilityRule::new(&payload.overlays);
    let visible = rule.visibility(&payload.markers, &state);
    let list = sorted_entries(&payload.markers, &visible);
    let mut sync = Self {
      index: payload
        .markers
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id, i))
        .collect(),
      markers: payload.markers.clone(),
      overlays: payload.overlays.clone(),
      rule,
      state,
      visible,
      list,
      active: None,
      zoom: INITIAL_ZOOM,
      renderer,
    };
    sync.render_initial();
    sync
  }

  fn render_initial(&mut self) {
    let shown: Vec<_> = self
      .overlays
      .iter()
      .filter(|o| self.state.visible_countries.contains(&o.code))
      .map(|o| o.code)
      .collect();
    for country in shown {
      self.render_country(country, true);
    }
    for (marker, visible) in self.markers.iter().zip(&self.visible) {
      self.renderer.apply(RenderCommand::SetMarkerVisible {
        id: marker.id,
        visible: *visible,
      });
    }
    self.render_list();
  }

  /// Dispatches a client event.
  ///
  /// # Errors
  /// If the event refers to an unknown country or an unknown or hidden marker. The state is left
  /// unchanged in that case.
  pub fn handle(&mut self, event: ClientEvent) -> Result<(), SyncError> {
    log::debug!("{event:?}");
    match event {
      ClientEvent::ToggleCategory(category) => self.toggle_category(category),
      ClientEvent::ToggleAssetType(asset_type) => self.toggle_asset_type(asset_type),
      ClientEvent::ToggleCountry(country) => self.toggle_country(country)?,
      ClientEvent::ShowNeighbors => self.show_neighbors(),
      ClientEvent::Select(id) => self.select(id)?,
      ClientEvent::ViewChanged { zoom } => self.view_changed(zoom),
    }
    Ok(())
  }

  pub fn toggle_category(&mut self, category: Category) {
    self.state.toggle_category(category);
    self.recompute();
  }

  pub fn toggle_asset_type(&mut self, asset_type: AssetType) {
    self.state.toggle_asset_type(asset_type);
    self.recompute();
  }

  /// Shows or hides the overlay of a country together with its capital and its markers.
  ///
  /// # Errors
  /// If the country has no overlay.
  pub fn toggle_country(&mut self, country: CountryCode) -> Result<(), SyncError> {
    if !self.rule.is_switchable(country) {
      return Err(SyncError::UnknownCountry(country));
    }
    let shown = self.state.toggle_country(country);
    self.render_country(country, shown);
    self.recompute();
    Ok(())
  }

  /// Shows all neighbor overlays that are hidden.
  pub fn show_neighbors(&mut self) {
    let hidden: Vec<_> = self
      .overlays
      .iter()
      .filter(|o| o.neighbor && !self.state.visible_countries.contains(&o.code))
      .map(|o| o.code)
      .collect();
    for country in hidden {
      self.state.visible_countries.insert(country);
      self.render_country(country, true);
    }
    self.recompute();
  }

  /// Makes a visible marker the only active one and moves the view to it.
  ///
  /// # Errors
  /// If the marker does not exist or is hidden.
  pub fn select(&mut self, id: MarkerId) -> Result<(), SyncError> {
    let Some(&i) = self.index.get(&id) else {
      return Err(SyncError::UnknownMarker(id));
    };
    if !self.visible[i] {
      return Err(SyncError::HiddenMarker(id));
    }
    self.active = Some(id);
    self.zoom = self.zoom.max(SELECTION_MIN_ZOOM);
    self.renderer.apply(RenderCommand::SetActive(Some(id)));
    self.renderer.apply(RenderCommand::FlyTo {
      coordinate: self.markers[i].coordinate,
      zoom: self.zoom,
    });
    self.renderer.apply(RenderCommand::OpenPopup(id));
    Ok(())
  }

  pub fn view_changed(&mut self, zoom: u8) {
    self.zoom = zoom;
  }

  fn render_country(&mut self, country: CountryCode, visible: bool) {
    self
      .renderer
      .apply(RenderCommand::SetOverlayVisible { country, visible });
    let has_capital = self
      .overlays
      .iter()
      .any(|o| o.code == country && o.capital.is_some());
    if has_capital {
      self
        .renderer
        .apply(RenderCommand::SetCapitalLabelVisible { country, visible });
    }
  }

  fn render_list(&mut self) {
    self
      .renderer
      .apply(RenderCommand::SetList(self.list.clone()));
    self
      .renderer
      .apply(RenderCommand::SetVisibleCount(self.list.len()));
  }

  fn recompute(&mut self) {
    let visible = self.rule.visibility(&self.markers, &self.state);
    for ((marker, old), new) in self.markers.iter().zip(&self.visible).zip(&visible) {
      if old != new {
        self.renderer.apply(RenderCommand::SetMarkerVisible {
          id: marker.id,
          visible: *new,
        });
      }
    }
    self.visible = visible;
    self.list = sorted_entries(&self.markers, &self.visible);
    self.render_list();

    if self.active.is_some_and(|id| !self.is_visible(id)) {
      self.active = None;
      self.renderer.apply(RenderCommand::SetActive(None));
    }
  }

  #[must_use]
  pub fn is_visible(&self, id: MarkerId) -> bool {
    self.index.get(&id).is_some_and(|i| self.visible[*i])
  }

  #[must_use]
  pub fn visible_count(&self) -> usize {
    self.list.len()
  }

  #[must_use]
  pub fn markers(&self) -> &[MarkerDescriptor] {
    &self.markers
  }

  #[must_use]
  pub fn visibility(&self) -> &[bool] {
    &self.visible
  }

  #[must_use]
  pub fn filters(&self) -> &FilterState {
    &self.state
  }

  #[must_use]
  pub fn list(&self) -> &[ListEntry] {
    &self.list
  }

  #[must_use]
  pub fn active(&self) -> Option<MarkerId> {
    self.active
  }

  #[must_use]
  pub fn zoom(&self) -> u8 {
    self.zoom
  }

  pub fn renderer_mut(&mut self) -> &mut R {
    &mut self.renderer
  }

  #[must_use]
  pub fn snapshot(&self) -> SessionState {
    SessionState {
      filters: self.state.clone(),
      visible_count: self.visible_count(),
      list: self.list.clone(),
      active: self.active,
      zoom: self.zoom,
    }
  }
}
