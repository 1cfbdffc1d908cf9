//! Core type definitions.

pub mod id;
pub mod phone;
pub mod price;
pub mod status;
