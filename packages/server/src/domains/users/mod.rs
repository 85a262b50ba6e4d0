//! Users domain - read model over the externally managed user accounts.

pub mod models;

pub use models::user::User;
