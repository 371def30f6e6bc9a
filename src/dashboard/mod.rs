//! Dashboard model, update loop, and rendering (spec.md §4.4-§4.6).

pub mod controller;
pub mod message;
pub mod render;
pub mod rows;
pub mod settings;
pub mod style;
pub mod table;

pub use controller::{backoff, fetch_timeout, ActiveTable, ConnectionState, Dashboard, Overlay};
pub use message::{Command, Message};
pub use render::render;
