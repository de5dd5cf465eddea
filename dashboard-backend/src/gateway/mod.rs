//! Event gateway
//!
//! Pushes transaction lifecycle and vote tally changes to browsers over a
//! WebSocket on the same port as the REST API.

pub mod actix_ws;
pub mod events;
pub mod protocol;

pub use events::EventBroadcaster;
