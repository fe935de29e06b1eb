//! HTTP surface for Signet: envelope document and page-image delivery,
//! uploads, and the authorization gate in front of all of it.

pub mod api;
pub mod auth;
pub mod backfill;
pub mod config;
pub mod delivery;
pub mod error;
pub mod extract;

pub use config::SignetConfig;
pub use error::ServerError;
