//! Medbasket API server library.
//!
//! The binary in `main.rs` wires these modules together; they are exposed as
//! a library so integration tests can reach the router and repositories.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
