//! Domain types and pure logic for the operator statistics service.
//!
//! Nothing in this crate performs I/O; persistence lives in `opstats-db`
//! and HTTP plumbing in `opstats-api`.

pub mod error;
pub mod pagination;
pub mod roles;
pub mod stats;
pub mod types;
