//! shinime library
//!
//! A typed client for an anime catalog API that normalizes its inconsistent
//! JSON, and the forwarding gateway that relays the client's logical requests
//! to the upstream with fixed credentials.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod models;
pub mod normalize;
pub mod pagination;
pub mod playback;
pub mod routes;
