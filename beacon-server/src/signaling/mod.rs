mod http_api;
mod router;
mod ws_handler;

pub use http_api::*;
pub use router::*;
pub use ws_handler::*;
