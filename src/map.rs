/// Country polygons shown as switchable overlays.
pub mod boundaries;
/// Contains everything needed to handle coordinates.
pub mod coordinates;
/// The marker model.
pub mod marker;
/// What is handed to the renderer.
pub mod payload;
/// Spreading of markers sharing a point.
pub mod placement;
