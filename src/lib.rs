pub mod config;
pub mod country;
pub mod geocode;
pub mod map;
pub mod pipeline;
pub mod remote;
pub mod source;
pub mod sync;

pub use map::payload::MapPayload;
pub use sync::{ClientEvent, RenderCommand, Synchronizer};
