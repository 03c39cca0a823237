//! Backend for the Hoa Mai school site: public content API, admin
//! dashboard API, and the parent and teacher portals, each behind its own
//! encrypted-cookie session.

pub mod auth;
pub mod config;
pub mod err;
pub mod guard;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod validate;
