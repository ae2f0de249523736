//! Key storage module.
//!
//! - [`name`] validates key identifiers
//! - [`backend`] defines the transactional engine interface
//! - [`sled_store`] and [`memory`] implement it
//! - [`keystore`] ties validation, encryption and storage together

pub mod backend;
pub mod keystore;
pub mod memory;
pub mod name;
pub mod sled_store;
