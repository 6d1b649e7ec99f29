//! Domain logic for the invite dispatch and RSVP engine.
//!
//! Everything in this crate is pure: no database access, no network I/O.
//! The `db`, `provider` and `engine` crates feed data in and persist the
//! decisions made here.

pub mod audience;
pub mod audit;
pub mod dispatch;
pub mod error;
pub mod guest;
pub mod lifecycle;
pub mod phone;
pub mod policy;
pub mod recipients;
pub mod roles;
pub mod rsvp;
pub mod status;
pub mod types;
pub mod webhook;
