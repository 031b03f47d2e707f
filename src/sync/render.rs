use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};

use super::list::ListEntry;
use crate::country::CountryCode;
use crate::map::coordinates::WGS84Coordinate;
use crate::map::marker::MarkerId;

/// Instructions for the map renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
  SetMarkerVisible { id: MarkerId, visible: bool },
  SetOverlayVisible { country: CountryCode, visible: bool },
  SetCapitalLabelVisible { country: CountryCode, visible: bool },
  SetList(Vec<ListEntry>),
  SetVisibleCount(usize),
  /// `None` clears the highlight.
  SetActive(Option<MarkerId>),
  FlyTo { coordinate: WGS84Coordinate, zoom: u8 },
  OpenPopup(MarkerId),
}

/// Whatever paints the map.
pub trait Renderer {
  fn apply(&mut self, command: RenderCommand);
}

/// Collects commands until they are picked up.
#[derive(Debug, Default)]
pub struct CommandBuffer {
  commands: Vec<RenderCommand>,
}

impl CommandBuffer {
  #[must_use]
  pub fn commands(&self) -> &[RenderCommand] {
    &self.commands
  }

  pub fn drain(&mut self) -> Vec<RenderCommand> {
    std::mem::take(&mut self.commands)
  }
}

impl Renderer for CommandBuffer {
  fn apply(&mut self, command: RenderCommand) {
    self.commands.push(command);
  }
}

impl Renderer for Sender<RenderCommand> {
  fn apply(&mut self, command: RenderCommand) {
    if let Err(e) = self.send(command) {
      log::warn!("Renderer is gone: {e}");
    }
  }
}
