//! pairmark - Paired-image landmark annotation
//!
//! Images are imported as a flat list and grouped into two-image
//! sequences by name prefix. On each sequence the user places at most one
//! `index` and one `thumb` point per image; points are stored in original
//! image coordinates, persisted per sequence, and exported as one JSON
//! document.

pub mod config;
pub mod constants;
pub mod coords;
pub mod engine;
pub mod format;
pub mod grouping;
pub mod images;
pub mod keybindings;
pub mod message;
pub mod model;
pub mod navigator;
pub mod presenter;
pub mod session;
pub mod store;
pub mod zoom;

pub use config::AppConfig;
pub use message::Command;
pub use presenter::Presenter;
pub use session::{Session, SessionError};
