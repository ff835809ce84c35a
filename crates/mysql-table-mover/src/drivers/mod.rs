//! Database drivers.

pub mod mysql;
