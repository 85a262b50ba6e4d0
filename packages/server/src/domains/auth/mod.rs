//! Auth domain - verifies tokens issued by the external auth service.
//!
//! Registration, login and token issuance live outside this server; the
//! shared secret and issuer are the contract between the two.

pub mod jwt;

pub use jwt::{Claims, JwtService};
