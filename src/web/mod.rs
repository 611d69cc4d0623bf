//! Web API module for Folio.
//!
//! A JSON REST surface over the document library. Every route lives under
//! `/api/projects/:project_id` and requires a bearer token.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
