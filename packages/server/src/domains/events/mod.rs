//! Events domain - capacity-bounded events with race-safe admission.
//!
//! The admission decision (join a full-or-not event) is a single conditional
//! UPDATE evaluated by Postgres against live state. Ownership checks gate
//! update/delete before any side effect, including image cleanup.

pub mod assets;
pub mod models;
pub mod service;

pub use assets::AssetCoordinator;
pub use models::event::{CreateEvent, Event, EventWithOrganizer, UpdateEvent};
pub use service::EventService;
