// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export the store trait and its backends

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::*;
pub use postgres::*;
pub use store::*;
