pub mod model;

pub use model::{ClientId, RoomId, RoomSummary, SignalMessage};
