// Gatherly - event RSVP API
//
// Backend for publishing capacity-bounded events and joining/leaving them.
// Admission under concurrent joins is decided by a single conditional UPDATE
// evaluated by Postgres, never by an application-level read-then-write.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
