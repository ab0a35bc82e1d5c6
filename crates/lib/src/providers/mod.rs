//! # Providers
//!
//! External systems the library talks to: text-generation models under `ai`
//! and the SQLite database under `db`.

pub mod ai;
pub mod db;
pub mod factory;
