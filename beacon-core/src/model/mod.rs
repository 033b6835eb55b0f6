mod ids;
mod room;
mod signal;

pub use ids::{ClientId, RoomId};
pub use room::RoomSummary;
pub use signal::SignalMessage;
