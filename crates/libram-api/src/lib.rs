//! HTTP surface and process wiring for the Libram catalog.
//!
//! Two entry paths carry commands: the HTTP routes and the command-feed
//! consumer. Both funnel into the same dispatch point, so validation and
//! error classification cannot drift apart. Queries are served from the
//! projected read model, fronted by a TTL cache for the hot lookups.

pub mod cache;
pub mod error;
pub mod routes;
pub mod state;
pub mod worker;
